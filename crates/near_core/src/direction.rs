//! Viewer-relative compass direction.
//!
//! Labels are relative to where the viewer is looking: "north" is straight
//! ahead, "east" is to the viewer's right.

use crate::settings::DirectionLabels;
use crate::types::{Location, Position};

/// One of the eight compass octants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Octant {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Octant {
    /// Octant of a relative angle in degrees, `[0, 360)` after normalisation.
    /// Each octant is 45° wide and centred on its heading.
    pub fn from_relative_angle(angle: f64) -> Self {
        let angle = normalize_degrees(angle);
        match angle {
            a if a >= 337.5 || a < 22.5 => Octant::North,
            a if a < 67.5 => Octant::NorthEast,
            a if a < 112.5 => Octant::East,
            a if a < 157.5 => Octant::SouthEast,
            a if a < 202.5 => Octant::South,
            a if a < 247.5 => Octant::SouthWest,
            a if a < 292.5 => Octant::West,
            _ => Octant::NorthWest,
        }
    }

    pub fn label<'a>(&self, labels: &'a DirectionLabels) -> &'a str {
        match self {
            Octant::North => &labels.north,
            Octant::NorthEast => &labels.northeast,
            Octant::East => &labels.east,
            Octant::SouthEast => &labels.southeast,
            Octant::South => &labels.south,
            Octant::SouthWest => &labels.southwest,
            Octant::West => &labels.west,
            Octant::NorthWest => &labels.northwest,
        }
    }
}

fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Octant of `target` as seen from `viewer` facing `viewer_yaw` degrees.
///
/// Coincident points resolve to [`Octant::North`].
pub fn resolve(viewer: &Position, viewer_yaw: f32, target: &Position) -> Octant {
    let dx = target.x - viewer.x;
    let dz = target.z - viewer.z;
    if dx == 0.0 && dz == 0.0 {
        return Octant::North;
    }
    let target_angle = normalize_degrees(dz.atan2(dx).to_degrees() - 90.0);
    let yaw = normalize_degrees(viewer_yaw as f64);
    Octant::from_relative_angle(target_angle - yaw)
}

/// Configured label for the direction from `viewer` to `target`.
pub fn label_between<'a>(viewer: &Location, target: &Location, labels: &'a DirectionLabels) -> &'a str {
    resolve(&viewer.position, viewer.yaw, &target.position).label(labels)
}
