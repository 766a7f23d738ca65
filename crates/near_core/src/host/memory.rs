//! In-process host used by the console harness and by tests.
//!
//! [`InMemoryWorld`] keeps players in join order, which is the "native
//! enumeration order" the scan reports in. [`RecordingDisplay`] keeps every
//! display call so callers can inspect what a viewer would have seen, and
//! [`RecordingNotifier`] does the same for tracker notices.

use std::collections::{HashMap, HashSet};

use parking_lot::{Mutex, RwLock};

use super::{BarColor, BarStyle, ChatLine, Display, Permissions, Presence};
use crate::tracker::{Notice, Notifier};
use crate::types::{Location, PlayerId, PlayerSnapshot};

#[derive(Debug, Clone, Default)]
struct PermissionEntry {
    nodes: Vec<String>,
    group: Option<String>,
    operator: bool,
}

/// Players, visibility and permissions held in memory.
#[derive(Default)]
pub struct InMemoryWorld {
    players: RwLock<Vec<PlayerSnapshot>>,
    permissions: RwLock<HashMap<PlayerId, PermissionEntry>>,
    /// (viewer, target) pairs where the viewer cannot see the target
    hidden: RwLock<HashSet<(PlayerId, PlayerId)>>,
}

impl InMemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an online player and returns their id. Permissions granted while
    /// the player was offline are kept.
    pub fn join(&self, name: impl Into<String>, location: Location) -> PlayerId {
        let id = PlayerId::new();
        self.join_with_id(id, name, location);
        id
    }

    pub fn join_with_id(&self, id: PlayerId, name: impl Into<String>, location: Location) {
        let mut players = self.players.write();
        players.retain(|p| p.id != id);
        players.push(PlayerSnapshot {
            id,
            name: name.into(),
            location,
            invisible: false,
        });
        self.permissions.write().entry(id).or_default();
    }

    /// Removes the player from the online list. Returns false if they were
    /// not online.
    pub fn quit(&self, id: PlayerId) -> bool {
        let mut players = self.players.write();
        let before = players.len();
        players.retain(|p| p.id != id);
        before != players.len()
    }

    /// Moves an online player. Returns the previous location.
    pub fn move_to(&self, id: PlayerId, location: Location) -> Option<Location> {
        let mut players = self.players.write();
        let player = players.iter_mut().find(|p| p.id == id)?;
        Some(std::mem::replace(&mut player.location, location))
    }

    pub fn set_invisible(&self, id: PlayerId, invisible: bool) {
        if let Some(player) = self.players.write().iter_mut().find(|p| p.id == id) {
            player.invisible = invisible;
        }
    }

    pub fn hide_from(&self, viewer: PlayerId, target: PlayerId) {
        self.hidden.write().insert((viewer, target));
    }

    pub fn grant(&self, id: PlayerId, node: impl Into<String>) {
        let node = node.into();
        let mut permissions = self.permissions.write();
        let entry = permissions.entry(id).or_default();
        if !entry.nodes.contains(&node) {
            entry.nodes.push(node);
        }
    }

    /// Returns whether the node was held.
    pub fn revoke(&self, id: PlayerId, node: &str) -> bool {
        let mut permissions = self.permissions.write();
        let Some(entry) = permissions.get_mut(&id) else {
            return false;
        };
        let before = entry.nodes.len();
        entry.nodes.retain(|n| n != node);
        before != entry.nodes.len()
    }

    pub fn set_group(&self, id: PlayerId, group: Option<String>) {
        self.permissions.write().entry(id).or_default().group = group;
    }

    pub fn set_operator(&self, id: PlayerId, operator: bool) {
        self.permissions.write().entry(id).or_default().operator = operator;
    }

    fn is_online(&self, id: PlayerId) -> bool {
        self.players.read().iter().any(|p| p.id == id)
    }
}

impl Presence for InMemoryWorld {
    fn player(&self, id: PlayerId) -> Option<PlayerSnapshot> {
        self.players.read().iter().find(|p| p.id == id).cloned()
    }

    fn player_by_name(&self, name: &str) -> Option<PlayerSnapshot> {
        self.players
            .read()
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .cloned()
    }

    fn players_in_world(&self, world: &str) -> Vec<PlayerSnapshot> {
        self.players
            .read()
            .iter()
            .filter(|p| p.location.world == world)
            .cloned()
            .collect()
    }

    fn online_players(&self) -> Vec<PlayerSnapshot> {
        self.players.read().clone()
    }

    fn can_see(&self, viewer: PlayerId, target: PlayerId) -> bool {
        !self.hidden.read().contains(&(viewer, target))
    }
}

impl Permissions for InMemoryWorld {
    fn has_permission(&self, id: PlayerId, node: &str) -> bool {
        self.permissions
            .read()
            .get(&id)
            .is_some_and(|entry| entry.nodes.iter().any(|n| n == node))
    }

    fn is_operator(&self, id: PlayerId) -> bool {
        self.permissions.read().get(&id).is_some_and(|entry| entry.operator)
    }

    fn primary_group(&self, id: PlayerId) -> Option<String> {
        self.permissions.read().get(&id).and_then(|entry| entry.group.clone())
    }

    fn nodes_with_prefix(&self, id: PlayerId, prefix: &str) -> Option<Vec<String>> {
        if !self.is_online(id) {
            return None;
        }
        let permissions = self.permissions.read();
        let entry = permissions.get(&id)?;
        Some(
            entry
                .nodes
                .iter()
                .filter(|n| n.starts_with(prefix))
                .cloned()
                .collect(),
        )
    }
}

/// One call made against a [`RecordingDisplay`].
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayEvent {
    Line(PlayerId, ChatLine),
    Sound(PlayerId, String),
    BarShown(PlayerId, BarColor, BarStyle),
    BarUpdated(PlayerId, String, f64),
    BarCleared(PlayerId),
}

/// Display sink that remembers everything it was asked to show.
#[derive(Default)]
pub struct RecordingDisplay {
    events: Mutex<Vec<DisplayEvent>>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DisplayEvent> {
        self.events.lock().clone()
    }

    /// Removes and returns everything recorded so far.
    pub fn take(&self) -> Vec<DisplayEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Plain text of every line sent to `viewer`.
    pub fn lines_for(&self, viewer: PlayerId) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                DisplayEvent::Line(id, line) if *id == viewer => Some(line.plain()),
                _ => None,
            })
            .collect()
    }

    /// Last title and progress shown on `viewer`'s bar, if any update was made.
    pub fn last_bar(&self, viewer: PlayerId) -> Option<(String, f64)> {
        self.events.lock().iter().rev().find_map(|event| match event {
            DisplayEvent::BarUpdated(id, title, progress) if *id == viewer => {
                Some((title.clone(), *progress))
            }
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl Display for RecordingDisplay {
    fn send_line(&self, viewer: PlayerId, line: ChatLine) {
        self.events.lock().push(DisplayEvent::Line(viewer, line));
    }

    fn play_sound(&self, viewer: PlayerId, sound: &str, _volume: f32, _pitch: f32) {
        self.events
            .lock()
            .push(DisplayEvent::Sound(viewer, sound.to_string()));
    }

    fn show_bar(&self, viewer: PlayerId, color: BarColor, style: BarStyle) {
        self.events
            .lock()
            .push(DisplayEvent::BarShown(viewer, color, style));
    }

    fn update_bar(&self, viewer: PlayerId, title: &str, progress: f64) {
        self.events
            .lock()
            .push(DisplayEvent::BarUpdated(viewer, title.to_string(), progress));
    }

    fn clear_bar(&self, viewer: PlayerId) {
        self.events.lock().push(DisplayEvent::BarCleared(viewer));
    }
}

/// Notifier that remembers every notice as `(viewer, notice, target name)`.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<(PlayerId, Notice, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<(PlayerId, Notice, String)> {
        self.notices.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, viewer: PlayerId, notice: Notice, target_name: &str) {
        self.notices
            .lock()
            .push((viewer, notice, target_name.to_string()));
    }
}
