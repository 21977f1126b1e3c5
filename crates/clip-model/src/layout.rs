//! Camera-to-quadrant layout of the composite canvas.
//!
//! The composite is a 2x2 grid. The layout table is the single source for
//! both the composer's positional input order and the overlay offsets, so
//! the two can never disagree.

use std::fmt;

use serde::{Deserialize, Serialize};

use quadcam_common::config::LayoutConfig;
use quadcam_common::error::{QuadcamError, QuadcamResult};

use crate::role::CameraRole;

/// One cell of the 2x2 composite grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quadrant {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Quadrant {
    /// Quadrants in composition order (row-major).
    pub const ALL: [Quadrant; 4] = [
        Quadrant::TopLeft,
        Quadrant::TopRight,
        Quadrant::BottomLeft,
        Quadrant::BottomRight,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Quadrant::TopLeft => "top_left",
            Quadrant::TopRight => "top_right",
            Quadrant::BottomLeft => "bottom_left",
            Quadrant::BottomRight => "bottom_right",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "top_left" => Some(Quadrant::TopLeft),
            "top_right" => Some(Quadrant::TopRight),
            "bottom_left" => Some(Quadrant::BottomLeft),
            "bottom_right" => Some(Quadrant::BottomRight),
            _ => None,
        }
    }

    fn index(self) -> usize {
        match self {
            Quadrant::TopLeft => 0,
            Quadrant::TopRight => 1,
            Quadrant::BottomLeft => 2,
            Quadrant::BottomRight => 3,
        }
    }

    /// Pixel offset of this quadrant's top-left corner on a canvas.
    pub fn offset(self, canvas_width: u32, canvas_height: u32) -> (u32, u32) {
        let (half_w, half_h) = (canvas_width / 2, canvas_height / 2);
        match self {
            Quadrant::TopLeft => (0, 0),
            Quadrant::TopRight => (half_w, 0),
            Quadrant::BottomLeft => (0, half_h),
            Quadrant::BottomRight => (half_w, half_h),
        }
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bijective mapping from the four required roles to the four quadrants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuadrantLayout {
    /// Role placed in each quadrant, indexed by `Quadrant::index`.
    slots: [CameraRole; 4],
}

impl Default for QuadrantLayout {
    /// front -> top-left, right -> top-right, left -> bottom-left, back -> bottom-right.
    fn default() -> Self {
        Self {
            slots: [
                CameraRole::Front,
                CameraRole::Right,
                CameraRole::Left,
                CameraRole::Back,
            ],
        }
    }
}

impl QuadrantLayout {
    /// Build a layout from explicit assignments.
    ///
    /// Fails unless every required role appears exactly once and every
    /// quadrant is used exactly once.
    pub fn new(assignments: [(CameraRole, Quadrant); 4]) -> QuadcamResult<Self> {
        let mut slots: [Option<CameraRole>; 4] = [None; 4];
        for (role, quadrant) in assignments {
            if role == CameraRole::Unknown {
                return Err(QuadcamError::config("layout cannot place an unknown camera"));
            }
            let slot = &mut slots[quadrant.index()];
            if let Some(existing) = slot {
                return Err(QuadcamError::config(format!(
                    "layout assigns both {existing} and {role} to {quadrant}"
                )));
            }
            *slot = Some(role);
        }

        let mut roles = [CameraRole::Unknown; 4];
        for (dst, src) in roles.iter_mut().zip(slots) {
            // Four distinct quadrants filled by four assignments.
            *dst = src.ok_or_else(|| QuadcamError::config("layout leaves a quadrant empty"))?;
        }
        for role in CameraRole::REQUIRED {
            if !roles.contains(&role) {
                return Err(QuadcamError::config(format!(
                    "layout does not place the {role} camera"
                )));
            }
        }
        Ok(Self { slots: roles })
    }

    /// Parse the layout section of the application config.
    pub fn from_config(config: &LayoutConfig) -> QuadcamResult<Self> {
        let parse = |role: CameraRole, value: &str| -> QuadcamResult<(CameraRole, Quadrant)> {
            Quadrant::from_name(value)
                .map(|q| (role, q))
                .ok_or_else(|| {
                    QuadcamError::config(format!("unknown quadrant '{value}' for {role} camera"))
                })
        };
        Self::new([
            parse(CameraRole::Front, &config.front)?,
            parse(CameraRole::Right, &config.right)?,
            parse(CameraRole::Left, &config.left)?,
            parse(CameraRole::Back, &config.back)?,
        ])
    }

    /// Role shown in the given quadrant.
    pub fn role_at(&self, quadrant: Quadrant) -> CameraRole {
        self.slots[quadrant.index()]
    }

    /// Quadrant a role is placed in. `None` for `Unknown`.
    pub fn quadrant_of(&self, role: CameraRole) -> Option<Quadrant> {
        Quadrant::ALL
            .into_iter()
            .find(|q| self.slots[q.index()] == role)
    }

    /// `(quadrant, role)` pairs in composition order.
    pub fn placements(&self) -> [(Quadrant, CameraRole); 4] {
        Quadrant::ALL.map(|q| (q, self.role_at(q)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_order() {
        let layout = QuadrantLayout::default();
        let roles: Vec<_> = layout.placements().iter().map(|(_, r)| *r).collect();
        assert_eq!(
            roles,
            vec![
                CameraRole::Front,
                CameraRole::Right,
                CameraRole::Left,
                CameraRole::Back
            ]
        );
        assert_eq!(layout.quadrant_of(CameraRole::Back), Some(Quadrant::BottomRight));
        assert_eq!(layout.quadrant_of(CameraRole::Unknown), None);
    }

    #[test]
    fn test_default_config_matches_default_layout() {
        let layout = QuadrantLayout::from_config(&LayoutConfig::default()).unwrap();
        assert_eq!(layout, QuadrantLayout::default());
    }

    #[test]
    fn test_offsets_on_full_hd_canvas() {
        assert_eq!(Quadrant::TopLeft.offset(1920, 1080), (0, 0));
        assert_eq!(Quadrant::TopRight.offset(1920, 1080), (960, 0));
        assert_eq!(Quadrant::BottomLeft.offset(1920, 1080), (0, 540));
        assert_eq!(Quadrant::BottomRight.offset(1920, 1080), (960, 540));
    }

    #[test]
    fn test_swapped_layout_is_respected() {
        let config = LayoutConfig {
            front: "bottom_right".to_string(),
            back: "top_left".to_string(),
            ..LayoutConfig::default()
        };
        let layout = QuadrantLayout::from_config(&config).unwrap();
        assert_eq!(layout.role_at(Quadrant::TopLeft), CameraRole::Back);
        assert_eq!(layout.role_at(Quadrant::BottomRight), CameraRole::Front);
    }

    #[test]
    fn test_duplicate_quadrant_rejected() {
        let config = LayoutConfig {
            back: "top_left".to_string(),
            ..LayoutConfig::default()
        };
        let err = QuadrantLayout::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("top_left"));
    }

    #[test]
    fn test_unknown_quadrant_name_rejected() {
        let config = LayoutConfig {
            left: "middle".to_string(),
            ..LayoutConfig::default()
        };
        assert!(QuadrantLayout::from_config(&config).is_err());
    }
}
