//! Clip files and timestamp groups.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::role::CameraRole;

/// One single-camera recording segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipFile {
    /// Absolute or root-relative path on disk.
    pub path: PathBuf,

    /// Camera that recorded the clip.
    pub role: CameraRole,

    /// Recording timestamp key shared by the clip's group.
    pub timestamp: String,
}

/// Clips sharing a timestamp key, keyed by camera role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipGroup {
    pub timestamp: String,
    clips: BTreeMap<CameraRole, ClipFile>,
}

impl ClipGroup {
    pub fn new(timestamp: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            clips: BTreeMap::new(),
        }
    }

    /// Insert a clip under its role, returning the clip it replaced.
    pub fn insert(&mut self, clip: ClipFile) -> Option<ClipFile> {
        self.clips.insert(clip.role, clip)
    }

    pub fn get(&self, role: CameraRole) -> Option<&ClipFile> {
        self.clips.get(&role)
    }

    pub fn path(&self, role: CameraRole) -> Option<&Path> {
        self.get(role).map(|clip| clip.path.as_path())
    }

    /// Number of distinct roles present.
    pub fn role_count(&self) -> usize {
        self.clips.len()
    }

    pub fn roles(&self) -> impl Iterator<Item = CameraRole> + '_ {
        self.clips.keys().copied()
    }

    /// True when exactly the four required roles are present.
    pub fn is_complete(&self) -> bool {
        self.clips.len() == CameraRole::REQUIRED.len()
            && CameraRole::REQUIRED
                .iter()
                .all(|role| self.clips.contains_key(role))
    }
}
