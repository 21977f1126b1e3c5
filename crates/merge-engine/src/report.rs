//! Failure log.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use quadcam_common::error::QuadcamResult;

use crate::retry::FailureRecord;

/// Write one `<timestamp>: <error>` line per failure to `output_dir/file_name`.
///
/// The file is replaced on every run that has failures. With no failures
/// nothing is written, any previous log is left alone, and `None` is
/// returned.
pub fn write_failure_log(
    output_dir: &Path,
    file_name: &str,
    failures: &[FailureRecord],
) -> QuadcamResult<Option<PathBuf>> {
    if failures.is_empty() {
        return Ok(None);
    }

    let path = output_dir.join(file_name);
    let mut writer = BufWriter::new(File::create(&path)?);
    for failure in failures {
        writeln!(writer, "{}: {}", failure.timestamp, one_line(&failure.error))?;
    }
    writer.flush()?;

    tracing::info!(path = %path.display(), failures = failures.len(), "Wrote failure log");
    Ok(Some(path))
}

/// External tool stderr can span many lines; keep one record per line.
fn one_line(error: &str) -> String {
    error.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(timestamp: &str, error: &str) -> FailureRecord {
        FailureRecord {
            timestamp: timestamp.to_string(),
            error: error.to_string(),
        }
    }

    #[test]
    fn test_no_failures_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let written = write_failure_log(dir.path(), "failures.log", &[]).unwrap();
        assert!(written.is_none());
        assert!(!dir.path().join("failures.log").exists());
    }

    #[test]
    fn test_log_lines_and_truncation() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("failures.log");
        std::fs::write(&log, "stale: old entry\nstale2: another\nstale3: more\n").unwrap();

        let written = write_failure_log(
            dir.path(),
            "failures.log",
            &[
                failure("2023-05-01_10-00-00", "ffmpeg failed (status 1): bad\ninput"),
                failure("2023-05-01_10-01-00", "Attempt timed out after 5s"),
            ],
        )
        .unwrap();

        assert_eq!(written, Some(log.clone()));
        assert_eq!(
            std::fs::read_to_string(&log).unwrap(),
            "2023-05-01_10-00-00: ffmpeg failed (status 1): bad input\n\
             2023-05-01_10-01-00: Attempt timed out after 5s\n"
        );
    }

    #[test]
    fn test_missing_output_dir_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = write_failure_log(
            &dir.path().join("missing"),
            "failures.log",
            &[failure("2023-05-01_10-00-00", "x")],
        );
        assert!(result.is_err());
    }
}
