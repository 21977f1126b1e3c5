//! Camera roles and file-name classification.
//!
//! A recorder writes one file per camera per segment, named
//! `<timestamp>-<suffix>.<ext>`. The suffix identifies the camera.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which camera a clip was recorded by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraRole {
    Front,
    Back,
    Left,
    Right,
    /// File name carried none of the known suffixes.
    Unknown,
}

impl CameraRole {
    /// Roles a group must contain to be merged, in validation order.
    pub const REQUIRED: [CameraRole; 4] = [
        CameraRole::Front,
        CameraRole::Back,
        CameraRole::Left,
        CameraRole::Right,
    ];

    /// File-stem suffix token for this role. `None` for `Unknown`.
    pub fn suffix(self) -> Option<&'static str> {
        match self {
            CameraRole::Front => Some("-front"),
            CameraRole::Back => Some("-back"),
            CameraRole::Left => Some("-left_repeater"),
            CameraRole::Right => Some("-right_repeater"),
            CameraRole::Unknown => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CameraRole::Front => "front",
            CameraRole::Back => "back",
            CameraRole::Left => "left",
            CameraRole::Right => "right",
            CameraRole::Unknown => "unknown",
        }
    }

    /// Parse a role name as used in configuration (`front`, `back`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "front" => Some(CameraRole::Front),
            "back" => Some(CameraRole::Back),
            "left" => Some(CameraRole::Left),
            "right" => Some(CameraRole::Right),
            _ => None,
        }
    }
}

impl fmt::Display for CameraRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split a file stem into its timestamp key and camera role.
///
/// The suffix set is mutually exclusive, so at most one token matches.
/// A stem with no known suffix comes back whole with `CameraRole::Unknown`.
pub fn classify_stem(stem: &str) -> (&str, CameraRole) {
    for role in CameraRole::REQUIRED {
        if let Some(key) = role.suffix().and_then(|token| stem.strip_suffix(token)) {
            return (key, role);
        }
    }
    (stem, CameraRole::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_each_suffix() {
        assert_eq!(
            classify_stem("2023-05-01_10-00-00-front"),
            ("2023-05-01_10-00-00", CameraRole::Front)
        );
        assert_eq!(
            classify_stem("2023-05-01_10-00-00-back"),
            ("2023-05-01_10-00-00", CameraRole::Back)
        );
        assert_eq!(
            classify_stem("2023-05-01_10-00-00-left_repeater"),
            ("2023-05-01_10-00-00", CameraRole::Left)
        );
        assert_eq!(
            classify_stem("2023-05-01_10-00-00-right_repeater"),
            ("2023-05-01_10-00-00", CameraRole::Right)
        );
    }

    #[test]
    fn test_unknown_suffix_keeps_stem() {
        assert_eq!(
            classify_stem("2023-05-01_10-00-00-event"),
            ("2023-05-01_10-00-00-event", CameraRole::Unknown)
        );
        // Role token in the middle of the stem is not a suffix.
        assert_eq!(
            classify_stem("front-2023-05-01"),
            ("front-2023-05-01", CameraRole::Unknown)
        );
    }

    #[test]
    fn test_from_name_is_case_insensitive() {
        assert_eq!(CameraRole::from_name("Front"), Some(CameraRole::Front));
        assert_eq!(CameraRole::from_name(" right "), Some(CameraRole::Right));
        assert_eq!(CameraRole::from_name("unknown"), None);
    }

    #[test]
    fn test_unknown_has_no_suffix() {
        assert!(CameraRole::Unknown.suffix().is_none());
        for role in CameraRole::REQUIRED {
            assert!(role.suffix().is_some());
        }
    }
}
