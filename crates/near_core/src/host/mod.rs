//! # Host Capabilities
//!
//! The proximity feature never talks to the game server directly. Everything
//! it needs from its host is expressed as one of the traits below and
//! injected at construction time:
//!
//! - [`Presence`] - who is online, where they stand, who can see whom
//! - [`Permissions`] - capability checks, primary groups, held nodes
//! - [`Display`] - chat lines, sounds and the per-viewer progress bar
//!
//! [`memory`] provides an in-process implementation of all three.

pub mod memory;

use crate::types::{PlayerId, PlayerSnapshot};

/// Identity and presence queries against the host's world model.
pub trait Presence: Send + Sync {
    /// Current state of an online player, `None` when offline.
    fn player(&self, id: PlayerId) -> Option<PlayerSnapshot>;

    /// Online player by exact (case-insensitive) name.
    fn player_by_name(&self, name: &str) -> Option<PlayerSnapshot>;

    /// Players in `world`, in the host's native enumeration order.
    fn players_in_world(&self, world: &str) -> Vec<PlayerSnapshot>;

    /// Every online player, in the host's native enumeration order.
    fn online_players(&self) -> Vec<PlayerSnapshot>;

    /// Whether `viewer` is allowed to see `target` (vanish plugins etc).
    fn can_see(&self, viewer: PlayerId, target: PlayerId) -> bool;
}

/// Permission system queries.
pub trait Permissions: Send + Sync {
    /// Whether `id` holds `node`.
    fn has_permission(&self, id: PlayerId, node: &str) -> bool;

    /// Server operators pass the same checks a capability holder would.
    fn is_operator(&self, id: PlayerId) -> bool {
        let _ = id;
        false
    }

    fn primary_group(&self, id: PlayerId) -> Option<String>;

    /// Nodes currently held by `id` that start with `prefix`, in the
    /// permission system's enumeration order. `None` when the user cannot be
    /// resolved (for example because they are offline).
    fn nodes_with_prefix(&self, id: PlayerId, prefix: &str) -> Option<Vec<String>>;
}

/// Colour of the tracker bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BarColor {
    Pink,
    Blue,
    Red,
    Green,
    Yellow,
    Purple,
    White,
}

impl BarColor {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "PINK" => Some(BarColor::Pink),
            "BLUE" => Some(BarColor::Blue),
            "RED" => Some(BarColor::Red),
            "GREEN" => Some(BarColor::Green),
            "YELLOW" => Some(BarColor::Yellow),
            "PURPLE" => Some(BarColor::Purple),
            "WHITE" => Some(BarColor::White),
            _ => None,
        }
    }
}

/// Segmentation of the tracker bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BarStyle {
    Solid,
    Segmented6,
    Segmented10,
    Segmented12,
    Segmented20,
}

impl BarStyle {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "SOLID" => Some(BarStyle::Solid),
            "SEGMENTED_6" => Some(BarStyle::Segmented6),
            "SEGMENTED_10" => Some(BarStyle::Segmented10),
            "SEGMENTED_12" => Some(BarStyle::Segmented12),
            "SEGMENTED_20" => Some(BarStyle::Segmented20),
            _ => None,
        }
    }
}

/// A piece of a chat line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    /// Clickable text that runs `command` for the viewer
    Button {
        text: String,
        hover: String,
        command: String,
    },
}

/// One chat line. Formatting codes inside text are left for the host.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChatLine {
    pub segments: Vec<Segment>,
}

impl ChatLine {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::Text(text.into())],
        }
    }

    /// Concatenated text of every segment, buttons included.
    pub fn plain(&self) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Text(text) => text.as_str(),
                Segment::Button { text, .. } => text.as_str(),
            })
            .collect()
    }
}

/// Output towards a player's client.
pub trait Display: Send + Sync {
    fn send_line(&self, viewer: PlayerId, line: ChatLine);

    fn play_sound(&self, viewer: PlayerId, sound: &str, volume: f32, pitch: f32);

    /// Creates (or replaces) the viewer's bar.
    fn show_bar(&self, viewer: PlayerId, color: BarColor, style: BarStyle);

    /// `progress` is always within `[0, 1]`.
    fn update_bar(&self, viewer: PlayerId, title: &str, progress: f64);

    fn clear_bar(&self, viewer: PlayerId);
}
