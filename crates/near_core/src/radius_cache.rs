//! Radius overrides granted through permission nodes.
//!
//! The cache is fed by permission-change notifications and read by radius
//! resolution. Notifications are applied under the same lock readers take,
//! in the order they are delivered.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::host::Permissions;
use crate::permissions::{parse_radius_node, RADIUS_PREFIX};
use crate::types::PlayerId;

/// Player → radius override, kept current by permission notifications.
pub struct RadiusCache {
    permissions: Arc<dyn Permissions>,
    entries: Mutex<HashMap<PlayerId, f64>>,
}

impl RadiusCache {
    pub fn new(permissions: Arc<dyn Permissions>) -> Self {
        Self {
            permissions,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, id: PlayerId) -> Option<f64> {
        self.entries.lock().get(&id).copied()
    }

    /// A node was added to `id`. The newest parseable radius node wins.
    pub fn on_permission_granted(&self, id: PlayerId, node: &str) {
        if !node.starts_with(RADIUS_PREFIX) {
            return;
        }
        let Some(radius) = parse_radius_node(node) else {
            debug!("Ignoring malformed radius node {} for {}", node, id);
            return;
        };

        self.entries.lock().insert(id, radius);
        info!("📏 Updated radius for player {} to {}", id, radius);
    }

    /// A node was removed from `id`. The override is recomputed from the
    /// radius nodes the user still holds.
    pub fn on_permission_revoked(&self, id: PlayerId, node: &str) {
        if !node.starts_with(RADIUS_PREFIX) {
            return;
        }
        self.refresh(id);
    }

    /// Rebuilds the override for `id` from the permission source: the last
    /// parseable radius node enumerated wins, and the entry is evicted when
    /// none remain or the user is offline.
    pub fn refresh(&self, id: PlayerId) -> Option<f64> {
        let mut entries = self.entries.lock();
        let Some(remaining) = self.permissions.nodes_with_prefix(id, RADIUS_PREFIX) else {
            if entries.remove(&id).is_some() {
                info!("📏 Removed radius for offline player {}", id);
            }
            return None;
        };

        match remaining.iter().filter_map(|n| parse_radius_node(n)).last() {
            Some(radius) => {
                entries.insert(id, radius);
                info!("📏 Updated radius for player {} to {}", id, radius);
                Some(radius)
            }
            None => {
                if entries.remove(&id).is_some() {
                    info!(
                        "📏 Removed radius for player {} as no radius permissions remain",
                        id
                    );
                }
                None
            }
        }
    }

    /// Drops the override for a player that left.
    pub fn evict(&self, id: PlayerId) -> Option<f64> {
        self.entries.lock().remove(&id)
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::InMemoryWorld;
    use crate::types::{Location, Position};

    fn setup() -> (Arc<InMemoryWorld>, RadiusCache, PlayerId) {
        let world = Arc::new(InMemoryWorld::new());
        let id = world.join("Alex", Location::new("world", Position::default(), 0.0));
        let cache = RadiusCache::new(world.clone());
        (world, cache, id)
    }

    fn grant(world: &InMemoryWorld, cache: &RadiusCache, id: PlayerId, node: &str) {
        world.grant(id, node);
        cache.on_permission_granted(id, node);
    }

    fn revoke(world: &InMemoryWorld, cache: &RadiusCache, id: PlayerId, node: &str) {
        world.revoke(id, node);
        cache.on_permission_revoked(id, node);
    }

    #[test]
    fn malformed_suffix_leaves_state_unchanged() {
        let (world, cache, id) = setup();
        grant(&world, &cache, id, "nearmanager.near-radius.40");
        for node in [
            "nearmanager.near-radius.abc",
            "nearmanager.near-radius.",
            "nearmanager.near-radius.1e400",
            "nearmanager.near-radius.-3",
        ] {
            grant(&world, &cache, id, node);
            assert_eq!(cache.get(id), Some(40.0), "node {node}");
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn grant_then_revoke_leaves_no_entry() {
        let (world, cache, id) = setup();
        grant(&world, &cache, id, "nearmanager.near-radius.50");
        assert_eq!(cache.get(id), Some(50.0));
        revoke(&world, &cache, id, "nearmanager.near-radius.50");
        assert_eq!(cache.get(id), None);
    }

    #[test]
    fn last_grant_wins() {
        let (world, cache, id) = setup();
        grant(&world, &cache, id, "nearmanager.near-radius.50");
        grant(&world, &cache, id, "nearmanager.near-radius.30");
        assert_eq!(cache.get(id), Some(30.0));
    }

    #[test]
    fn revoke_recomputes_from_last_enumerated_node() {
        let (world, cache, id) = setup();
        grant(&world, &cache, id, "nearmanager.near-radius.80");
        grant(&world, &cache, id, "nearmanager.near-radius.20");
        grant(&world, &cache, id, "nearmanager.near-radius.60");
        revoke(&world, &cache, id, "nearmanager.near-radius.60");
        // Not the maximum (80): the last node still held in enumeration order.
        assert_eq!(cache.get(id), Some(20.0));
    }

    #[test]
    fn revoke_skips_unparseable_remaining_nodes() {
        let (world, cache, id) = setup();
        grant(&world, &cache, id, "nearmanager.near-radius.25");
        grant(&world, &cache, id, "nearmanager.near-radius.oops");
        grant(&world, &cache, id, "nearmanager.near-radius.75");
        revoke(&world, &cache, id, "nearmanager.near-radius.75");
        assert_eq!(cache.get(id), Some(25.0));
    }

    #[test]
    fn revoke_for_offline_player_evicts() {
        let (world, cache, id) = setup();
        grant(&world, &cache, id, "nearmanager.near-radius.25");
        grant(&world, &cache, id, "nearmanager.near-radius.35");
        world.quit(id);
        revoke(&world, &cache, id, "nearmanager.near-radius.35");
        assert_eq!(cache.get(id), None);
    }

    #[test]
    fn unrelated_nodes_are_ignored() {
        let (world, cache, id) = setup();
        grant(&world, &cache, id, "nearmanager.near-radius.25");
        grant(&world, &cache, id, "nearmanager.near");
        revoke(&world, &cache, id, "essentials.fly");
        assert_eq!(cache.get(id), Some(25.0));
    }

    #[test]
    fn refresh_rebuilds_evicted_override_from_held_nodes() {
        let (world, cache, id) = setup();
        grant(&world, &cache, id, "nearmanager.near-radius.500");
        grant(&world, &cache, id, "nearmanager.near-radius.bad");
        cache.evict(id);
        assert_eq!(cache.get(id), None);

        assert_eq!(cache.refresh(id), Some(500.0));
        assert_eq!(cache.get(id), Some(500.0));

        world.revoke(id, "nearmanager.near-radius.500");
        assert_eq!(cache.refresh(id), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn evict_and_clear() {
        let (world, cache, id) = setup();
        grant(&world, &cache, id, "nearmanager.near-radius.25");
        assert_eq!(cache.evict(id), Some(25.0));
        assert!(cache.is_empty());
        grant(&world, &cache, id, "nearmanager.near-radius.25");
        cache.clear();
        assert!(cache.is_empty());
    }
}
