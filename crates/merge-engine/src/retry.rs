//! Bounded retry around the merge executor.
//!
//! The supervisor is the containment boundary for per-job errors: it
//! never returns an error, only a [`JobOutcome`] carrying the terminal
//! state and, for permanent failures, a [`FailureRecord`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use quadcam_clip_model::ClipGroup;
use quadcam_common::config::{BackoffConfig, RetryConfig};
use quadcam_common::error::QuadcamError;

use crate::job::{discard_partial_output, JobState, MergeExecutor, MergeJob};

/// Delay inserted before each retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Immediate,
    Fixed(Duration),
    Exponential { base: Duration, max: Duration },
}

impl Backoff {
    pub fn from_config(config: &BackoffConfig) -> Self {
        match *config {
            BackoffConfig::Immediate => Backoff::Immediate,
            BackoffConfig::Fixed { delay_ms } => Backoff::Fixed(Duration::from_millis(delay_ms)),
            BackoffConfig::Exponential { base_ms, max_ms } => Backoff::Exponential {
                base: Duration::from_millis(base_ms),
                max: Duration::from_millis(max_ms),
            },
        }
    }

    /// Delay before retry number `retry` (1 for the first retry).
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        match *self {
            Backoff::Immediate => Duration::ZERO,
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { base, max } => {
                let factor = 2u32.saturating_pow(retry.saturating_sub(1));
                base.saturating_mul(factor).min(max)
            }
        }
    }
}

/// How often and how long a job may try.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub backoff: Backoff,
    /// Deadline per attempt; the attempt's child process is killed when it passes.
    pub attempt_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff: Backoff::from_config(&config.backoff),
            attempt_timeout: config.attempt_timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// A job that exhausted its retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub timestamp: String,
    pub error: String,
}

/// Terminal summary of one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub timestamp: String,
    pub output_path: PathBuf,
    pub state: JobState,
    pub attempts: u32,
    pub error: Option<String>,
}

/// What a supervised job hands back to the coordinator.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub report: JobReport,
    /// Present only when `report.state` is `Failed`.
    pub failure: Option<FailureRecord>,
}

impl JobOutcome {
    fn from_job(job: MergeJob) -> Self {
        let failure = (job.state == JobState::Failed).then(|| FailureRecord {
            timestamp: job.group.timestamp.clone(),
            error: job.last_error.clone().unwrap_or_default(),
        });
        Self {
            report: JobReport {
                timestamp: job.group.timestamp,
                output_path: job.output_path,
                state: job.state,
                attempts: job.attempts,
                error: job.last_error,
            },
            failure,
        }
    }
}

/// Runs the executor for one group until it succeeds, skips, or runs out of attempts.
#[derive(Clone)]
pub struct RetrySupervisor {
    executor: Arc<MergeExecutor>,
    policy: RetryPolicy,
}

impl RetrySupervisor {
    pub fn new(executor: Arc<MergeExecutor>, policy: RetryPolicy) -> Self {
        Self { executor, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn output_path(&self, timestamp: &str) -> PathBuf {
        self.executor.output_path(timestamp)
    }

    pub async fn run_with_retry(&self, group: ClipGroup) -> JobOutcome {
        let output_path = self.executor.output_path(&group.timestamp);
        let mut job = MergeJob::new(group, output_path);
        let max_attempts = self.policy.max_attempts();

        loop {
            job.attempts += 1;
            job.state = JobState::Running;

            match self.attempt(&job).await {
                Ok(state) => {
                    job.state = state;
                    tracing::info!(
                        timestamp = %job.timestamp(),
                        state = %state,
                        attempt = job.attempts,
                        "Job finished"
                    );
                    return JobOutcome::from_job(job);
                }
                Err(err) => {
                    job.last_error = Some(err.to_string());
                    if job.attempts >= max_attempts {
                        job.state = JobState::Failed;
                        tracing::error!(
                            timestamp = %job.timestamp(),
                            attempts = job.attempts,
                            error = %err,
                            "Job failed permanently"
                        );
                        return JobOutcome::from_job(job);
                    }

                    let delay = self.policy.backoff.delay_for_retry(job.attempts);
                    tracing::warn!(
                        timestamp = %job.timestamp(),
                        attempt = job.attempts,
                        max_attempts,
                        retry_in = ?delay,
                        error = %err,
                        "Attempt failed, retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }

    async fn attempt(&self, job: &MergeJob) -> Result<JobState, QuadcamError> {
        let Some(limit) = self.policy.attempt_timeout else {
            return self.executor.run(&job.group).await;
        };
        match tokio::time::timeout(limit, self.executor.run(&job.group)).await {
            Ok(result) => result,
            Err(_) => {
                discard_partial_output(&job.output_path);
                Err(QuadcamError::Timeout { limit })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_immediate_backoff_has_no_delay() {
        assert_eq!(Backoff::Immediate.delay_for_retry(1), Duration::ZERO);
        assert_eq!(Backoff::Immediate.delay_for_retry(7), Duration::ZERO);
    }

    #[test]
    fn test_exponential_backoff_doubles_and_caps() {
        let backoff = Backoff::from_config(&BackoffConfig::Exponential {
            base_ms: 100,
            max_ms: 350,
        });
        assert_eq!(backoff.delay_for_retry(1), Duration::from_millis(100));
        assert_eq!(backoff.delay_for_retry(2), Duration::from_millis(200));
        assert_eq!(backoff.delay_for_retry(3), Duration::from_millis(350));
        assert_eq!(backoff.delay_for_retry(40), Duration::from_millis(350));
    }

    #[test]
    fn test_fixed_backoff() {
        let backoff = Backoff::from_config(&BackoffConfig::Fixed { delay_ms: 25 });
        assert_eq!(backoff.delay_for_retry(3), Duration::from_millis(25));
    }

    #[test]
    fn test_default_policy_allows_three_attempts() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.backoff, Backoff::Immediate);
        assert_eq!(policy.attempt_timeout, Some(Duration::from_secs(3600)));
    }

    #[test]
    fn test_failure_record_only_for_failed_jobs() {
        let mut job = MergeJob::new(
            ClipGroup::new("2023-05-01_10-00-00"),
            PathBuf::from("/out/2023-05-01_10-00-00.mp4"),
        );
        job.state = JobState::Skipped;
        job.attempts = 1;
        assert!(JobOutcome::from_job(job.clone()).failure.is_none());

        job.state = JobState::Failed;
        job.attempts = 3;
        job.last_error = Some("ffmpeg failed".to_string());
        let outcome = JobOutcome::from_job(job);
        assert_eq!(
            outcome.failure,
            Some(FailureRecord {
                timestamp: "2023-05-01_10-00-00".to_string(),
                error: "ffmpeg failed".to_string(),
            })
        );
        assert_eq!(outcome.report.attempts, 3);
    }
}
