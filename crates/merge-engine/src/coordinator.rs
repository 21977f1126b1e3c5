//! Batch coordinator: a fixed-size pool of supervised merge jobs.

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::{JoinError, JoinSet};

use quadcam_clip_model::{ClipGroup, QuadrantLayout};
use quadcam_common::config::AppConfig;
use quadcam_common::error::{QuadcamError, QuadcamResult};

use crate::compose::{Canvas, FfmpegComposer};
use crate::job::{JobState, MergeExecutor};
use crate::probe::{FfprobeProbe, MediaValidator};
use crate::retry::{FailureRecord, JobOutcome, JobReport, RetryPolicy, RetrySupervisor};

/// Called on the coordinating task each time a job reaches a terminal state.
pub type ProgressCallback<'a> = dyn Fn(&JobReport) + Send + Sync + 'a;

/// Everything a batch run produced, in completion order.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub jobs: Vec<JobReport>,
    pub failures: Vec<FailureRecord>,
    pub elapsed: Duration,
    /// Whether the batch was stopped by a shutdown request.
    pub cancelled: bool,
}

impl BatchReport {
    pub fn count(&self, state: JobState) -> usize {
        self.jobs.iter().filter(|job| job.state == state).count()
    }

    pub fn succeeded(&self) -> usize {
        self.count(JobState::Succeeded)
    }

    pub fn skipped(&self) -> usize {
        self.count(JobState::Skipped)
    }

    pub fn failed(&self) -> usize {
        self.count(JobState::Failed)
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    fn record(&mut self, outcome: JobOutcome, progress: Option<&ProgressCallback<'_>>) {
        if let Some(progress) = progress {
            progress(&outcome.report);
        }
        if let Some(failure) = outcome.failure {
            self.failures.push(failure);
        }
        self.jobs.push(outcome.report);
    }
}

/// Runs one supervised job per group with at most `workers` in flight.
pub struct BatchCoordinator {
    supervisor: RetrySupervisor,
    workers: usize,
}

impl BatchCoordinator {
    pub fn new(supervisor: RetrySupervisor, workers: usize) -> Self {
        Self {
            supervisor,
            workers: workers.max(1),
        }
    }

    /// Wire the ffprobe/ffmpeg adapters from configuration.
    pub fn from_config(config: &AppConfig, output_dir: impl Into<PathBuf>) -> QuadcamResult<Self> {
        let canvas = Canvas::from_config(&config.merge)?;
        let layout = QuadrantLayout::from_config(&config.merge.layout)?;

        let validator = MediaValidator::new(Arc::new(FfprobeProbe::new(&config.tools.ffprobe)));
        let composer = Arc::new(FfmpegComposer::new(
            &config.tools.ffmpeg,
            canvas,
            config.encoder.clone(),
        ));
        let executor = MergeExecutor::new(
            validator,
            composer,
            layout,
            output_dir,
            &config.merge.output_extension,
        );
        let supervisor = RetrySupervisor::new(
            Arc::new(executor),
            RetryPolicy::from_config(&config.retry),
        );

        Ok(Self::new(supervisor, config.worker_count()))
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run every group to a terminal state, or until `shutdown` resolves.
    ///
    /// On shutdown, in-flight jobs are aborted (killing their child
    /// processes) and every job that had not finished is reported as
    /// `Cancelled`. Returns once nothing is left running.
    pub async fn run<F>(
        &self,
        groups: Vec<ClipGroup>,
        shutdown: F,
        progress: Option<&ProgressCallback<'_>>,
    ) -> BatchReport
    where
        F: Future<Output = ()>,
    {
        let started = Instant::now();
        let mut report = BatchReport::default();

        tracing::info!(jobs = groups.len(), workers = self.workers, "Starting batch");

        let mut queue = groups.into_iter();
        let mut running: JoinSet<JobOutcome> = JoinSet::new();
        let mut in_flight: HashMap<tokio::task::Id, String> = HashMap::new();
        let mut shutdown = std::pin::pin!(shutdown);

        loop {
            while !report.cancelled && running.len() < self.workers {
                let Some(group) = queue.next() else { break };
                let timestamp = group.timestamp.clone();
                let supervisor = self.supervisor.clone();
                let handle = running.spawn(async move { supervisor.run_with_retry(group).await });
                in_flight.insert(handle.id(), timestamp);
            }

            if running.is_empty() {
                break;
            }

            tokio::select! {
                biased;

                _ = &mut shutdown, if !report.cancelled => {
                    tracing::warn!(in_flight = running.len(), "Shutdown requested, cancelling jobs");
                    report.cancelled = true;
                    running.abort_all();
                }

                joined = running.join_next_with_id() => match joined {
                    Some(Ok((id, outcome))) => {
                        in_flight.remove(&id);
                        report.record(outcome, progress);
                    }
                    Some(Err(err)) => {
                        let timestamp = in_flight.remove(&err.id()).unwrap_or_default();
                        report.record(self.lost_job(timestamp, err), progress);
                    }
                    None => break,
                },
            }
        }

        for group in queue {
            report.record(self.cancelled_job(group.timestamp), progress);
        }

        report.elapsed = started.elapsed();
        tracing::info!(
            succeeded = report.succeeded(),
            skipped = report.skipped(),
            failed = report.failed(),
            cancelled = report.count(JobState::Cancelled),
            elapsed_secs = report.elapsed.as_secs_f64(),
            "Batch finished"
        );
        report
    }

    /// Outcome for a task that ended without returning one.
    fn lost_job(&self, timestamp: String, err: JoinError) -> JobOutcome {
        if err.is_cancelled() {
            return self.cancelled_job(timestamp);
        }

        tracing::error!(timestamp = %timestamp, error = %err, "Merge task panicked");
        let error = format!("merge task panicked: {err}");
        JobOutcome {
            failure: Some(FailureRecord {
                timestamp: timestamp.clone(),
                error: error.clone(),
            }),
            report: JobReport {
                output_path: self.supervisor.output_path(&timestamp),
                timestamp,
                state: JobState::Failed,
                attempts: 0,
                error: Some(error),
            },
        }
    }

    fn cancelled_job(&self, timestamp: String) -> JobOutcome {
        JobOutcome {
            failure: None,
            report: JobReport {
                output_path: self.supervisor.output_path(&timestamp),
                timestamp,
                state: JobState::Cancelled,
                attempts: 0,
                error: Some(QuadcamError::Cancelled.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(state: JobState) -> JobReport {
        JobReport {
            timestamp: "2023-05-01_10-00-00".to_string(),
            output_path: PathBuf::from("/out/2023-05-01_10-00-00.mp4"),
            state,
            attempts: 1,
            error: None,
        }
    }

    #[test]
    fn test_batch_report_counts() {
        let report = BatchReport {
            jobs: vec![
                job(JobState::Succeeded),
                job(JobState::Skipped),
                job(JobState::Succeeded),
                job(JobState::Failed),
            ],
            failures: vec![FailureRecord {
                timestamp: "2023-05-01_10-00-00".to_string(),
                error: "boom".to_string(),
            }],
            ..BatchReport::default()
        };
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.count(JobState::Cancelled), 0);
        assert!(report.has_failures());
    }

    #[test]
    fn test_from_config_rejects_bad_layout() {
        let mut config = AppConfig::default();
        config.merge.layout.back = "top_left".to_string();
        assert!(BatchCoordinator::from_config(&config, "/out").is_err());
    }

    #[test]
    fn test_from_config_uses_configured_workers() {
        let config = AppConfig {
            workers: Some(3),
            ..AppConfig::default()
        };
        let coordinator = BatchCoordinator::from_config(&config, "/out").unwrap();
        assert_eq!(coordinator.workers(), 3);
    }
}
