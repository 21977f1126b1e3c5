//! Error types shared across Quadcam crates.

use std::path::PathBuf;
use std::time::Duration;

/// Top-level error type for Quadcam operations.
#[derive(Debug, thiserror::Error)]
pub enum QuadcamError {
    #[error("Scan error: {message}")]
    Scan { message: String },

    #[error("Invalid input(s): {}", format_paths(.paths))]
    InvalidInputs { paths: Vec<PathBuf> },

    #[error("Invalid timestamp key '{key}' (expected YYYY-MM-DD_HH-MM-SS)")]
    InvalidTimestamp { key: String },

    #[error("{tool} failed (status {status}): {stderr}")]
    ExternalTool {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("Group {timestamp} is missing camera(s): {missing}")]
    IncompleteGroup { timestamp: String, missing: String },

    #[error("Attempt timed out after {limit:?}")]
    Timeout { limit: Duration },

    #[error("Required tool not found in PATH: {tool}")]
    ToolMissing { tool: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using QuadcamError.
pub type QuadcamResult<T> = Result<T, QuadcamError>;

impl QuadcamError {
    pub fn scan(msg: impl Into<String>) -> Self {
        Self::Scan {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn external_tool(
        tool: impl Into<String>,
        status: impl ToString,
        stderr: impl Into<String>,
    ) -> Self {
        Self::ExternalTool {
            tool: tool.into(),
            status: status.to_string(),
            stderr: stderr.into(),
        }
    }

    pub fn tool_missing(tool: impl Into<String>) -> Self {
        Self::ToolMissing { tool: tool.into() }
    }
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
