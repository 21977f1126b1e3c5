//! Clip discovery and grouping.
//!
//! Walks an input tree, classifies every clip by its file-name suffix and
//! accumulates a `timestamp -> role -> clip` map. Only complete groups
//! become merge jobs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use quadcam_common::config::ScanConfig;
use quadcam_common::error::{QuadcamError, QuadcamResult};

use crate::clip::{ClipFile, ClipGroup};
use crate::role::{classify_stem, CameraRole};

/// Two clips claimed the same `(timestamp, role)` slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleCollision {
    pub timestamp: String,
    pub role: CameraRole,
    /// Later-scanned clip, the one retained.
    pub kept: PathBuf,
    /// Earlier clip that was overwritten.
    pub replaced: PathBuf,
}

/// Everything the scanner learned about an input tree.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Groups keyed by timestamp, including incomplete ones.
    pub groups: BTreeMap<String, ClipGroup>,

    /// Clip files with the configured extension.
    pub files_seen: usize,

    /// Clips whose stem carried no known role suffix.
    pub unrecognized: Vec<PathBuf>,

    /// Same-role collisions, in scan order.
    pub collisions: Vec<RoleCollision>,
}

impl ScanReport {
    /// Record a scanned clip. A clip for an already-filled role replaces it.
    pub fn add(&mut self, clip: ClipFile) {
        let group = self
            .groups
            .entry(clip.timestamp.clone())
            .or_insert_with(|| ClipGroup::new(clip.timestamp.clone()));
        let kept = clip.path.clone();
        let role = clip.role;
        if let Some(previous) = group.insert(clip) {
            tracing::warn!(
                timestamp = %group.timestamp,
                role = %role,
                kept = %kept.display(),
                replaced = %previous.path.display(),
                "Duplicate clip for camera role, keeping the later one"
            );
            self.collisions.push(RoleCollision {
                timestamp: group.timestamp.clone(),
                role,
                kept,
                replaced: previous.path,
            });
        }
    }

    /// Groups that contain all four required roles, sorted by timestamp.
    pub fn complete_groups(&self) -> Vec<ClipGroup> {
        self.groups
            .values()
            .filter(|group| {
                let complete = group.is_complete();
                if !complete {
                    tracing::debug!(
                        timestamp = %group.timestamp,
                        roles = group.role_count(),
                        "Skipping incomplete group"
                    );
                }
                complete
            })
            .cloned()
            .collect()
    }

    /// Number of groups missing at least one required role.
    pub fn incomplete_count(&self) -> usize {
        self.groups.values().filter(|g| !g.is_complete()).count()
    }
}

/// Recursively scan `root` for clips.
///
/// Entries are visited sorted by file name, so which duplicate wins is
/// reproducible. An unreadable root is an error; unreadable entries below
/// it are logged and skipped.
pub fn scan_clips(root: &Path, config: &ScanConfig) -> QuadcamResult<ScanReport> {
    if !root.is_dir() {
        return Err(QuadcamError::scan(format!(
            "input root is not a readable directory: {}",
            root.display()
        )));
    }

    let mut report = ScanReport::default();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(QuadcamError::scan(format!(
                    "failed to read input root {}: {err}",
                    root.display()
                )));
            }
            Err(err) => {
                tracing::warn!(error = %err, "Skipping unreadable entry");
                continue;
            }
        };

        if !entry.file_type().is_file() || !has_extension(entry.path(), &config.clip_extension) {
            continue;
        }
        report.files_seen += 1;

        let path = entry.into_path();
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            tracing::debug!(path = %path.display(), "Skipping clip with non UTF-8 name");
            report.unrecognized.push(path);
            continue;
        };

        let (key, role) = classify_stem(stem);
        if role == CameraRole::Unknown {
            tracing::debug!(path = %path.display(), "No camera suffix, dropping clip");
            report.unrecognized.push(path);
            continue;
        }

        let clip = ClipFile {
            timestamp: key.to_string(),
            role,
            path,
        };
        report.add(clip);
    }

    tracing::info!(
        root = %root.display(),
        files = report.files_seen,
        groups = report.groups.len(),
        incomplete = report.incomplete_count(),
        unrecognized = report.unrecognized.len(),
        collisions = report.collisions.len(),
        "Scan complete"
    );

    Ok(report)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, b"").unwrap();
        path
    }

    fn scan(dir: &Path) -> ScanReport {
        scan_clips(dir, &ScanConfig::default()).unwrap()
    }

    #[test]
    fn test_full_set_forms_complete_group() {
        let dir = tempfile::tempdir().unwrap();
        for suffix in ["front", "back", "left_repeater", "right_repeater"] {
            touch(dir.path(), &format!("2023-05-01_10-00-00-{suffix}.mp4"));
        }

        let report = scan(dir.path());
        let groups = report.complete_groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].timestamp, "2023-05-01_10-00-00");
        assert!(report.unrecognized.is_empty());
    }

    #[test]
    fn test_missing_back_yields_no_jobs() {
        let dir = tempfile::tempdir().unwrap();
        for suffix in ["front", "left_repeater", "right_repeater"] {
            touch(dir.path(), &format!("2023-05-01_10-00-00-{suffix}.mp4"));
        }

        let report = scan(dir.path());
        assert!(report.complete_groups().is_empty());
        assert_eq!(report.incomplete_count(), 1);
    }

    #[test]
    fn test_recurses_and_filters_extension() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a/2023-05-01_10-00-00-front.mp4");
        touch(dir.path(), "a/b/2023-05-01_10-00-00-back.MP4");
        touch(dir.path(), "c/2023-05-01_10-00-00-left_repeater.mp4");
        touch(dir.path(), "2023-05-01_10-00-00-right_repeater.mp4");
        touch(dir.path(), "2023-05-01_10-00-00-front.txt");
        touch(dir.path(), "event.json");

        let report = scan(dir.path());
        assert_eq!(report.files_seen, 4);
        assert_eq!(report.complete_groups().len(), 1);
    }

    #[test]
    fn test_unknown_suffix_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let odd = touch(dir.path(), "2023-05-01_10-00-00-cabin.mp4");

        let report = scan(dir.path());
        assert!(report.groups.is_empty());
        assert_eq!(report.unrecognized, vec![odd]);
    }

    #[test]
    fn test_later_scanned_duplicate_wins() {
        let dir = tempfile::tempdir().unwrap();
        let first = touch(dir.path(), "a/2023-05-01_10-00-00-front.mp4");
        let second = touch(dir.path(), "b/2023-05-01_10-00-00-front.mp4");

        let report = scan(dir.path());
        let group = &report.groups["2023-05-01_10-00-00"];
        assert_eq!(group.path(CameraRole::Front), Some(second.as_path()));
        assert_eq!(
            report.collisions,
            vec![RoleCollision {
                timestamp: "2023-05-01_10-00-00".to_string(),
                role: CameraRole::Front,
                kept: second,
                replaced: first,
            }]
        );
    }

    #[test]
    fn test_missing_root_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            scan_clips(&missing, &ScanConfig::default()),
            Err(QuadcamError::Scan { .. })
        ));
    }

    #[test]
    fn test_complete_groups_sorted_by_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        for ts in ["2023-05-02_08-00-00", "2023-05-01_10-00-00"] {
            for suffix in ["front", "back", "left_repeater", "right_repeater"] {
                touch(dir.path(), &format!("{ts}-{suffix}.mp4"));
            }
        }

        let keys: Vec<_> = scan(dir.path())
            .complete_groups()
            .into_iter()
            .map(|g| g.timestamp)
            .collect();
        assert_eq!(keys, vec!["2023-05-01_10-00-00", "2023-05-02_08-00-00"]);
    }
}
