//! Merge jobs and the single-attempt executor.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use quadcam_clip_model::{creation_time_for_key, CameraRole, ClipGroup, QuadrantLayout};
use quadcam_common::error::{QuadcamError, QuadcamResult};

use crate::compose::{ComposeRequest, Composer, CompositeInput};
use crate::probe::MediaValidator;

/// Lifecycle of a merge job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    Pending,
    Running,
    /// Output already present and valid; nothing was composed.
    Skipped,
    Succeeded,
    /// Retries exhausted.
    Failed,
    /// Aborted by a batch shutdown before reaching another terminal state.
    Cancelled,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobState::Pending | JobState::Running)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Skipped => "skipped",
            JobState::Succeeded => "succeeded",
            JobState::Failed => "failed",
            JobState::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One complete group on its way to a composite.
///
/// Owned and mutated only by the supervisor running it.
#[derive(Debug, Clone)]
pub struct MergeJob {
    pub group: ClipGroup,
    pub output_path: PathBuf,
    pub state: JobState,
    /// Attempts started so far.
    pub attempts: u32,
    pub last_error: Option<String>,
}

impl MergeJob {
    pub fn new(group: ClipGroup, output_path: PathBuf) -> Self {
        Self {
            group,
            output_path,
            state: JobState::Pending,
            attempts: 0,
            last_error: None,
        }
    }

    pub fn timestamp(&self) -> &str {
        &self.group.timestamp
    }
}

/// `<output_dir>/<timestamp>.<extension>`
pub fn output_path_for(output_dir: &Path, timestamp: &str, extension: &str) -> PathBuf {
    output_dir.join(format!("{timestamp}.{extension}"))
}

/// Runs one merge attempt: skip check, input validation, composition.
pub struct MergeExecutor {
    validator: MediaValidator,
    composer: Arc<dyn Composer>,
    layout: QuadrantLayout,
    output_dir: PathBuf,
    output_extension: String,
}

impl MergeExecutor {
    pub fn new(
        validator: MediaValidator,
        composer: Arc<dyn Composer>,
        layout: QuadrantLayout,
        output_dir: impl Into<PathBuf>,
        output_extension: impl Into<String>,
    ) -> Self {
        Self {
            validator,
            composer,
            layout,
            output_dir: output_dir.into(),
            output_extension: output_extension.into(),
        }
    }

    pub fn output_path(&self, timestamp: &str) -> PathBuf {
        output_path_for(&self.output_dir, timestamp, &self.output_extension)
    }

    /// Run a single attempt for `group`.
    ///
    /// Returns `Skipped` when a valid output already exists and
    /// `Succeeded` once the composer exits cleanly.
    pub async fn run(&self, group: &ClipGroup) -> QuadcamResult<JobState> {
        let output = self.output_path(&group.timestamp);

        if self.validator.is_valid(&output).await {
            tracing::info!(
                timestamp = %group.timestamp,
                output = %output.display(),
                "Output already valid, skipping"
            );
            return Ok(JobState::Skipped);
        }

        let missing: Vec<_> = CameraRole::REQUIRED
            .iter()
            .filter(|role| group.get(**role).is_none())
            .map(|role| role.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(QuadcamError::IncompleteGroup {
                timestamp: group.timestamp.clone(),
                missing: missing.join(", "),
            });
        }

        let mut invalid = Vec::new();
        for role in CameraRole::REQUIRED {
            if let Some(path) = group.path(role) {
                if !self.validator.is_valid(path).await {
                    invalid.push(path.to_path_buf());
                }
            }
        }
        if !invalid.is_empty() {
            return Err(QuadcamError::InvalidInputs { paths: invalid });
        }

        let creation_time = creation_time_for_key(&group.timestamp)?;
        let request = self.compose_request(group, creation_time, output)?;

        tracing::info!(
            timestamp = %group.timestamp,
            composer = self.composer.name(),
            output = %request.output.display(),
            "Composing quadrant video"
        );
        if let Err(err) = self.composer.compose(&request).await {
            discard_partial_output(&request.output);
            return Err(err);
        }
        Ok(JobState::Succeeded)
    }

    fn compose_request(
        &self,
        group: &ClipGroup,
        creation_time: String,
        output: PathBuf,
    ) -> QuadcamResult<ComposeRequest> {
        let inputs = self
            .layout
            .placements()
            .into_iter()
            .map(|(quadrant, role)| {
                group
                    .path(role)
                    .map(|path| CompositeInput {
                        quadrant,
                        role,
                        path: path.to_path_buf(),
                    })
                    .ok_or_else(|| QuadcamError::IncompleteGroup {
                        timestamp: group.timestamp.clone(),
                        missing: role.to_string(),
                    })
            })
            .collect::<QuadcamResult<Vec<_>>>()?;

        Ok(ComposeRequest {
            timestamp: group.timestamp.clone(),
            inputs,
            creation_time,
            output,
        })
    }
}

/// A failed composer run may leave a truncated file that would later
/// probe as valid and be skipped.
pub(crate) fn discard_partial_output(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed partial output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial output")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_for() {
        assert_eq!(
            output_path_for(Path::new("/out"), "2023-05-01_10-00-00", "mp4"),
            PathBuf::from("/out/2023-05-01_10-00-00.mp4")
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(!JobState::Pending.is_terminal());
        assert!(!JobState::Running.is_terminal());
        for state in [
            JobState::Skipped,
            JobState::Succeeded,
            JobState::Failed,
            JobState::Cancelled,
        ] {
            assert!(state.is_terminal());
        }
        assert_eq!(JobState::Succeeded.to_string(), "succeeded");
    }

    #[test]
    fn test_new_job_is_pending() {
        let job = MergeJob::new(
            ClipGroup::new("2023-05-01_10-00-00"),
            PathBuf::from("/out/x.mp4"),
        );
        assert_eq!(job.state, JobState::Pending);
        assert_eq!(job.attempts, 0);
        assert_eq!(job.timestamp(), "2023-05-01_10-00-00");
    }
}
