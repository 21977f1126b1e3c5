//! Application configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{QuadcamError, QuadcamResult};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Clip discovery settings.
    pub scan: ScanConfig,

    /// Output naming and composition canvas.
    pub merge: MergeConfig,

    /// Encoder selection passed to the composer.
    pub encoder: EncoderConfig,

    /// External tool binaries.
    pub tools: ToolsConfig,

    /// Retry/backoff/timeout policy for merge jobs.
    pub retry: RetryConfig,

    /// Worker pool size. `None` uses the host's available parallelism.
    pub workers: Option<usize>,

    /// Exit with a non-zero status when any job failed permanently.
    pub fail_on_failures: bool,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Clip discovery parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// File extension of raw clips, without the dot. Matched case-insensitively.
    pub clip_extension: String,
}

/// Output and canvas parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Extension of composited output files.
    pub output_extension: String,

    /// Name of the permanent-failure log inside the output directory.
    pub failure_log: String,

    /// Composite canvas size in pixels.
    pub canvas_width: u32,
    pub canvas_height: u32,

    /// Camera role to screen quadrant table.
    pub layout: LayoutConfig,
}

/// Which quadrant each camera lands in.
///
/// Values are `top_left`, `top_right`, `bottom_left` or `bottom_right`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub front: String,
    pub right: String,
    pub left: String,
    pub back: String,
}

/// Encoder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub video_codec: String,
    pub preset: String,
    pub crf: u8,
    pub pixel_format: String,
}

/// External tool binaries (names resolved through `PATH`, or absolute paths).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg: String,
    pub ffprobe: String,
}

/// Retry policy for a single merge job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt. Total attempts = `max_retries + 1`.
    pub max_retries: u32,

    /// Delay strategy between attempts.
    pub backoff: BackoffConfig,

    /// Deadline for one attempt. `None` disables the timeout.
    pub attempt_timeout_secs: Option<u64>,
}

/// Delay between failed attempts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackoffConfig {
    /// Retry right away.
    Immediate,
    /// Same delay before every retry.
    Fixed { delay_ms: u64 },
    /// `base_ms * 2^(retry - 1)`, capped at `max_ms`.
    Exponential { base_ms: u64, max_ms: u64 },
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "quadcam=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scan: ScanConfig::default(),
            merge: MergeConfig::default(),
            encoder: EncoderConfig::default(),
            tools: ToolsConfig::default(),
            retry: RetryConfig::default(),
            workers: None,
            fail_on_failures: true,
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            clip_extension: "mp4".to_string(),
        }
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            output_extension: "mp4".to_string(),
            failure_log: "failures.log".to_string(),
            canvas_width: 1920,
            canvas_height: 1080,
            layout: LayoutConfig::default(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            front: "top_left".to_string(),
            right: "top_right".to_string(),
            left: "bottom_left".to_string(),
            back: "bottom_right".to_string(),
        }
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            preset: "ultrafast".to_string(),
            crf: 23,
            pixel_format: "yuv420p".to_string(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff: BackoffConfig::Immediate,
            attempt_timeout_secs: Some(3600),
        }
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self::Immediate
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load config from `path`, falling back to defaults.
    ///
    /// A missing file is not an error. A file that cannot be read or parsed
    /// also yields defaults, and the error is handed back so the caller can
    /// report it once logging is up.
    pub fn load_or_default(path: &Path) -> (Self, Option<QuadcamError>) {
        if !path.exists() {
            return (Self::default(), None);
        }
        match Self::load_from(path) {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Load config from an explicit path. Errors are not swallowed.
    pub fn load_from(path: &Path) -> QuadcamResult<Self> {
        if !path.exists() {
            return Err(QuadcamError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            QuadcamError::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Effective worker pool size (always at least one).
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get).max(1)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("quadcam").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_dashcam_batch() {
        let config = AppConfig::default();
        assert_eq!(config.scan.clip_extension, "mp4");
        assert_eq!(config.merge.failure_log, "failures.log");
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.retry.backoff, BackoffConfig::Immediate);
        assert_eq!(config.encoder.crf, 23);
        assert_eq!(config.merge.layout.front, "top_left");
        assert!(config.fail_on_failures);
        assert!(config.worker_count() >= 1);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let json = r#"{
            "retry": { "max_retries": 5, "backoff": { "kind": "fixed", "delay_ms": 250 } },
            "workers": 3
        }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.backoff, BackoffConfig::Fixed { delay_ms: 250 });
        assert_eq!(config.retry.attempt_timeout_secs, Some(3600));
        assert_eq!(config.worker_count(), 3);
        assert_eq!(config.tools.ffprobe, "ffprobe");
    }

    #[test]
    fn test_zero_workers_clamps_to_one() {
        let config = AppConfig {
            workers: Some(0),
            ..Default::default()
        };
        assert_eq!(config.worker_count(), 1);
    }

    #[test]
    fn test_load_or_default_without_file_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let (config, problem) = AppConfig::load_or_default(&dir.path().join("config.json"));
        assert!(problem.is_none());
        assert_eq!(config.merge.failure_log, "failures.log");
    }

    #[test]
    fn test_load_or_default_reports_unparseable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let (config, problem) = AppConfig::load_or_default(&path);
        assert!(matches!(problem, Some(QuadcamError::Json(_))));
        assert!(config.fail_on_failures);
        assert_eq!(config.retry.max_retries, 2);
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            AppConfig::load_from(&dir.path().join("absent.json")),
            Err(QuadcamError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_load_from_reports_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(QuadcamError::Json(_))
        ));
    }
}
