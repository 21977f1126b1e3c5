//! Merge every complete clip group under the input directory.

use std::path::Path;

use anyhow::Context;

use quadcam_clip_model::scan_clips;
use quadcam_common::config::AppConfig;
use quadcam_merge_engine::process::check_tools;
use quadcam_merge_engine::{
    write_failure_log, BatchCoordinator, BatchReport, JobReport, JobState, ProgressCallback,
};

pub async fn run(input: &Path, output: &Path, config: &AppConfig) -> anyhow::Result<BatchReport> {
    check_tools(&config.tools)?;
    std::fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory {}", output.display()))?;

    let scan = scan_clips(input, &config.scan)?;
    let groups = scan.complete_groups();
    println!(
        "Found {} complete group(s) in {} ({} clip file(s), {} incomplete group(s), {} unrecognized file(s))",
        groups.len(),
        input.display(),
        scan.files_seen,
        scan.incomplete_count(),
        scan.unrecognized.len(),
    );
    for collision in &scan.collisions {
        println!(
            "  [WARN] {} has two {} clips; using {}",
            collision.timestamp,
            collision.role,
            collision.kept.display()
        );
    }

    let coordinator = BatchCoordinator::from_config(config, output)?;
    tracing::debug!(workers = coordinator.workers(), "Coordinator ready");

    let print_status = |job: &JobReport| match (&job.state, &job.error) {
        (JobState::Failed, Some(error)) => println!("{}: {} ({error})", job.timestamp, job.state),
        _ => println!("{}: {}", job.timestamp, job.state),
    };
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Ctrl-C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    let report = coordinator
        .run(groups, shutdown, Some(&print_status as &ProgressCallback<'_>))
        .await;

    println!(
        "Processed {} job(s) in {:.1}s: {} succeeded, {} skipped, {} failed, {} cancelled",
        report.jobs.len(),
        report.elapsed.as_secs_f64(),
        report.succeeded(),
        report.skipped(),
        report.failed(),
        report.count(JobState::Cancelled),
    );

    if let Some(path) = write_failure_log(output, &config.merge.failure_log, &report.failures)? {
        println!("Failures written to {}", path.display());
    }

    Ok(report)
}
