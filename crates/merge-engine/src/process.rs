//! External tool invocation.

use std::ffi::OsStr;
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use tokio::process::Command;

use quadcam_common::config::ToolsConfig;
use quadcam_common::error::{QuadcamError, QuadcamResult};

/// Longest stderr excerpt carried into error messages.
const STDERR_TAIL_CHARS: usize = 2000;

/// Captured result of one external tool run.
#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Trailing part of stderr, trimmed.
    pub fn stderr_tail(&self) -> String {
        tail(self.stderr.trim(), STDERR_TAIL_CHARS).to_string()
    }
}

/// Run `program` to completion and capture its output.
///
/// The child is killed if the returned future is dropped, so a timed-out
/// or cancelled caller never leaves the process running.
pub async fn run_tool<I, S>(program: &str, args: I) -> QuadcamResult<ToolOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| QuadcamError::external_tool(program, "not started", e.to_string()))?;

    Ok(ToolOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Whether `binary` can be executed: an existing path, or a name on `PATH`.
pub fn command_exists(binary: &str) -> bool {
    if binary.contains(std::path::MAIN_SEPARATOR) {
        return Path::new(binary).is_file();
    }
    std::process::Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Fail fast when the prober or composer is not installed.
pub fn check_tools(tools: &ToolsConfig) -> QuadcamResult<()> {
    for binary in [&tools.ffprobe, &tools.ffmpeg] {
        if !command_exists(binary) {
            return Err(QuadcamError::tool_missing(binary.as_str()));
        }
    }
    Ok(())
}

fn tail(s: &str, max_chars: usize) -> &str {
    let count = s.chars().count();
    if count <= max_chars {
        return s;
    }
    let skip = count - max_chars;
    let start = s.char_indices().nth(skip).map(|(i, _)| i).unwrap_or(0);
    &s[start..]
}
