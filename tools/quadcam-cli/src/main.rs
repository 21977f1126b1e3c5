//! Quadcam CLI: merge four-camera dashcam clips into 2x2 quadrant videos.
//!
//! Usage:
//!   quadcam [OPTIONS] <INPUT> <OUTPUT>
//!
//! Scans INPUT recursively for clip groups and writes one composite per
//! complete group to OUTPUT. Permanent failures go to `failures.log` in
//! OUTPUT.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;

use quadcam_common::config::{config_file_path, AppConfig};
use quadcam_common::error::QuadcamError;

mod commands;

/// Exit status when the run finished but some jobs failed permanently.
const EXIT_JOB_FAILURES: i32 = 2;

#[derive(Parser)]
#[command(
    name = "quadcam",
    about = "Merge front/back/left/right dashcam clips into quadrant videos",
    version,
    author
)]
struct Cli {
    /// Directory scanned recursively for clips
    input: PathBuf,

    /// Directory receiving the merged videos (created if missing)
    output: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/quadcam/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of merge jobs run in parallel
    #[arg(short, long)]
    workers: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (mut config, config_problem) = load_config(cli.config.as_deref(), &config_file_path())?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    if cli.workers.is_some() {
        config.workers = cli.workers;
    }

    quadcam_common::logging::init_logging(&config.logging)?;
    if let Some(e) = config_problem {
        tracing::warn!(
            path = %config_file_path().display(),
            error = %e,
            "Ignoring unreadable config file, using defaults"
        );
    }

    let report = commands::merge::run(&cli.input, &cli.output, &config).await?;

    if report.has_failures() && config.fail_on_failures {
        std::process::exit(EXIT_JOB_FAILURES);
    }
    Ok(())
}

/// An explicit `--config` must load; the default location falls back to
/// defaults and hands back what went wrong.
fn load_config(
    explicit: Option<&Path>,
    default_path: &Path,
) -> anyhow::Result<(AppConfig, Option<QuadcamError>)> {
    match explicit {
        Some(path) => {
            let config = AppConfig::load_from(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            Ok((config, None))
        }
        None => Ok(AppConfig::load_or_default(default_path)),
    }
}
