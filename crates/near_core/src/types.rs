//! # Core Type Definitions
//!
//! Identity and spatial types shared by every part of the proximity feature.
//!
//! ## Key Types
//!
//! - [`PlayerId`] - Stable identifier for a connected player
//! - [`Position`] - 3D position with double precision
//! - [`Location`] - Position plus world name and facing yaw
//! - [`PlayerSnapshot`] - What the host reports about one online player

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Identity
// ============================================================================

/// Unique identifier for a player in the game world.
///
/// This is a wrapper around UUID that provides type safety and keeps player
/// identities from being confused with other identifiers.
///
/// # Examples
///
/// ```rust
/// use near_core::PlayerId;
///
/// let player_id = PlayerId::new();
/// let parsed: PlayerId = "550e8400-e29b-41d4-a716-446655440000".parse().unwrap();
/// println!("Player ID: {}", parsed);
/// # let _ = player_id;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Creates a new random player ID using UUID v4.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::str::FromStr for PlayerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Spatial Types
// ============================================================================

/// Represents a 3D position in the game world.
///
/// `y` is the vertical axis; the horizontal plane is `x`/`z`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    /// Creates a new position with the specified coordinates.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance in all three axes.
    pub fn distance(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// A position inside a named world, with the facing direction of whoever
/// stands there.
///
/// `yaw` is in degrees: 0 faces +z, 90 faces -x. Any value is accepted and
/// normalised by the consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub world: String,
    pub position: Position,
    pub yaw: f32,
}

impl Location {
    pub fn new(world: impl Into<String>, position: Position, yaw: f32) -> Self {
        Self {
            world: world.into(),
            position,
            yaw,
        }
    }

    /// Distance to another location, or `None` when the two are in different
    /// worlds and the distance is meaningless.
    pub fn distance(&self, other: &Location) -> Option<f64> {
        if self.world != other.world {
            return None;
        }
        Some(self.position.distance(&other.position))
    }
}

/// Everything the core needs to know about one online player at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    pub location: Location,
    /// Under an invisibility effect; treated like vanish by the scan.
    #[serde(default)]
    pub invisible: bool,
}
