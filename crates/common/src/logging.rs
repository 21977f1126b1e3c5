//! Tracing setup for the `quadcam` binary.
//!
//! Diagnostics always go to stderr; stdout is reserved for the per-job
//! status lines. A bare level such as `"debug"` applies to the quadcam
//! crates only, everything else stays at `warn`.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::error::{QuadcamError, QuadcamResult};

/// Tracing targets of the workspace crates.
const QUADCAM_TARGETS: [&str; 4] = [
    "quadcam",
    "quadcam_common",
    "quadcam_clip_model",
    "quadcam_merge_engine",
];

/// Expand a configured level into filter directives.
///
/// Values that already look like directives (`target=level`, lists) are
/// used as given.
pub fn filter_directives(level: &str) -> String {
    let level = level.trim();
    if level.contains('=') || level.contains(',') {
        return level.to_string();
    }
    let mut directives = vec!["warn".to_string()];
    directives.extend(QUADCAM_TARGETS.iter().map(|target| format!("{target}={level}")));
    directives.join(",")
}

/// Filter from `RUST_LOG` when set, else from the configured level.
pub fn build_filter(config: &LoggingConfig) -> QuadcamResult<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(filter_directives(&config.level)).map_err(|e| {
        QuadcamError::config(format!("invalid log level '{}': {e}", config.level))
    })
}

/// Install the global subscriber. Fails on a bad level or a second call.
pub fn init_logging(config: &LoggingConfig) -> QuadcamResult<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(build_filter(config)?)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
    installed.map_err(|e| QuadcamError::config(format!("failed to install logger: {e}")))
}
