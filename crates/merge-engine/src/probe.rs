//! Media validation through an external prober.
//!
//! A file is usable when it exists, the prober exits cleanly, and the
//! reported container duration is a positive number. Every check spawns a
//! fresh probe; results are not cached.

use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use quadcam_common::error::QuadcamResult;

use crate::process::run_tool;

/// Raw answer from a prober asked for container duration.
#[derive(Debug, Clone)]
pub struct ProbeReport {
    /// Whether the prober exited with status zero.
    pub success: bool,
    /// Human-readable exit status.
    pub status: String,
    pub stdout: String,
    pub stderr: String,
}

/// External collaborator that reports container duration.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    /// Probe `path`. `Err` only when the prober itself could not be run.
    async fn probe_duration(&self, path: &Path) -> QuadcamResult<ProbeReport>;

    fn name(&self) -> &str;
}

/// `ffprobe`-backed prober.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    binary: String,
}

impl FfprobeProbe {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Ask for the container duration alone, as a bare number on stdout.
    pub fn build_args(path: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        args.push(path.as_os_str().to_owned());
        args
    }
}

#[async_trait]
impl MediaProbe for FfprobeProbe {
    async fn probe_duration(&self, path: &Path) -> QuadcamResult<ProbeReport> {
        let output = run_tool(&self.binary, Self::build_args(path)).await?;

        Ok(ProbeReport {
            success: output.success(),
            status: output.status.to_string(),
            stderr: output.stderr_tail(),
            stdout: output.stdout,
        })
    }

    fn name(&self) -> &str {
        "ffprobe"
    }
}

/// Outcome of validating one media file.
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    Valid { duration_secs: f64 },
    Missing,
    ProbeFailed { reason: String },
    NoDuration { raw: String },
    NonPositiveDuration { duration_secs: f64 },
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid { .. })
    }
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validation::Valid { duration_secs } => write!(f, "valid ({duration_secs:.3}s)"),
            Validation::Missing => f.write_str("file does not exist"),
            Validation::ProbeFailed { reason } => write!(f, "probe failed: {reason}"),
            Validation::NoDuration { raw } => {
                write!(f, "no parseable duration in probe output {raw:?}")
            }
            Validation::NonPositiveDuration { duration_secs } => {
                write!(f, "duration {duration_secs} is not positive")
            }
        }
    }
}

/// Predicate over media files, backed by a [`MediaProbe`].
#[derive(Clone)]
pub struct MediaValidator {
    probe: Arc<dyn MediaProbe>,
}

impl MediaValidator {
    pub fn new(probe: Arc<dyn MediaProbe>) -> Self {
        Self { probe }
    }

    /// Validate `path` and say why it failed. Never errors.
    pub async fn check(&self, path: &Path) -> Validation {
        if !path.exists() {
            return Validation::Missing;
        }

        let report = match self.probe.probe_duration(path).await {
            Ok(report) => report,
            Err(e) => {
                return Validation::ProbeFailed {
                    reason: e.to_string(),
                }
            }
        };

        if !report.success {
            return Validation::ProbeFailed {
                reason: format!(
                    "{} exited with {}: {}",
                    self.probe.name(),
                    report.status,
                    report.stderr
                ),
            };
        }

        match parse_duration(&report.stdout) {
            None => Validation::NoDuration {
                raw: report.stdout.trim().to_string(),
            },
            Some(duration_secs) if duration_secs <= 0.0 => {
                Validation::NonPositiveDuration { duration_secs }
            }
            Some(duration_secs) => Validation::Valid { duration_secs },
        }
    }

    /// `true` when `path` exists and has a positive duration.
    pub async fn is_valid(&self, path: &Path) -> bool {
        let validation = self.check(path).await;
        match &validation {
            Validation::Valid { duration_secs } => {
                tracing::debug!(path = %path.display(), duration_secs, "Media valid");
            }
            Validation::Missing => {
                tracing::debug!(path = %path.display(), "Media missing");
            }
            other => {
                tracing::warn!(path = %path.display(), reason = %other, "Media invalid");
            }
        }
        validation.is_valid()
    }
}

/// First non-empty line of prober output as a finite number of seconds.
pub fn parse_duration(stdout: &str) -> Option<f64> {
    let line = stdout.lines().map(str::trim).find(|l| !l.is_empty())?;
    line.parse::<f64>().ok().filter(|d| d.is_finite())
}
