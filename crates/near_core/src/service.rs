//! # Near Service
//!
//! The entry point a host wires up once. It owns the radius cache, radius
//! policy, scanner and tracker registry, holds the current settings, and
//! routes host events (permission changes, world changes, quits) to the part
//! that cares about them.
//!
//! Settings are swapped atomically on [`NearService::reload`]. Requests read
//! the settings that were current when they began; running trackers keep the
//! snapshot they started with.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::error::{NearResult, PolicyRejection, Unreachable};
use crate::host::{Display, Permissions, Presence};
use crate::radius_cache::RadiusCache;
use crate::radius_policy::RadiusPolicy;
use crate::scan::{Candidate, ProximityScan};
use crate::scheduler::Scheduler;
use crate::settings::NearSettings;
use crate::tracker::{Notifier, SessionRegistry, StopReason, TrackerSession};
use crate::types::PlayerId;

/// Capabilities the host provides to the service.
#[derive(Clone)]
pub struct NearHost {
    pub presence: Arc<dyn Presence>,
    pub permissions: Arc<dyn Permissions>,
    pub display: Arc<dyn Display>,
    pub notifier: Arc<dyn Notifier>,
    pub scheduler: Arc<dyn Scheduler>,
}

pub struct NearService {
    settings: RwLock<Arc<NearSettings>>,
    presence: Arc<dyn Presence>,
    cache: Arc<RadiusCache>,
    policy: RadiusPolicy,
    scan: ProximityScan,
    trackers: Arc<SessionRegistry>,
}

impl NearService {
    pub fn new(mut settings: NearSettings, host: NearHost) -> Self {
        settings.sanitize();

        let cache = Arc::new(RadiusCache::new(host.permissions.clone()));
        let policy = RadiusPolicy::new(cache.clone(), host.permissions.clone());
        let scan = ProximityScan::new(host.presence.clone(), host.permissions.clone());
        let trackers = SessionRegistry::new(
            host.presence.clone(),
            host.display,
            host.notifier,
            host.scheduler,
        );

        Self {
            settings: RwLock::new(Arc::new(settings)),
            presence: host.presence,
            cache,
            policy,
            scan,
            trackers,
        }
    }

    /// Settings currently in effect.
    pub fn settings(&self) -> Arc<NearSettings> {
        self.settings.read().clone()
    }

    /// Replaces the settings. Returns the repairs made to the new values.
    pub fn reload(&self, mut settings: NearSettings) -> Vec<String> {
        let repairs = settings.sanitize();
        *self.settings.write() = Arc::new(settings);
        info!(
            "🔄 Settings reloaded, {} tracker(s) keep their previous snapshot",
            self.trackers.len()
        );
        repairs
    }

    // ========================================================================
    // Requests
    // ========================================================================

    /// Effective radius for `viewer`, optionally from an explicit argument.
    pub fn resolve_radius(&self, viewer: PlayerId, argument: Option<&str>) -> NearResult<f64> {
        self.policy.resolve(viewer, &self.settings(), argument)
    }

    /// Players within `radius` of `viewer` in the viewer's world.
    pub fn scan_nearby(&self, viewer: PlayerId, radius: f64) -> NearResult<Vec<Candidate>> {
        let me = self
            .presence
            .player(viewer)
            .ok_or_else(|| Unreachable::PlayerOffline(viewer.to_string()))?;
        let world_players = self.presence.players_in_world(&me.location.world);
        let candidates = self
            .scan
            .scan(&me, radius, &world_players, &self.settings())?;
        debug!(
            "Scan for {} within {} found {} player(s)",
            me.name,
            radius,
            candidates.len()
        );
        Ok(candidates)
    }

    pub fn start_tracker(
        &self,
        viewer: PlayerId,
        target: PlayerId,
        ignore_distance: bool,
    ) -> NearResult<Arc<TrackerSession>> {
        let settings = self.settings();
        if !settings.bossbar.enabled {
            return Err(PolicyRejection::TrackerDisabled.into());
        }
        self.trackers
            .start(viewer, target, ignore_distance, &settings)
    }

    /// Stops `viewer`'s tracker if it follows `target`; `NotActive` otherwise.
    pub fn stop_tracker(&self, viewer: PlayerId, target: PlayerId) -> NearResult<()> {
        self.trackers.stop_target(viewer, target)
    }

    pub fn active_tracker(&self, viewer: PlayerId) -> Option<Arc<TrackerSession>> {
        self.trackers.get(viewer)
    }

    pub fn has_active_tracker(&self, viewer: PlayerId) -> bool {
        self.trackers.is_active(viewer)
    }

    // ========================================================================
    // Host events
    // ========================================================================

    pub fn on_permission_granted(&self, player: PlayerId, node: &str) {
        self.cache.on_permission_granted(player, node);
    }

    pub fn on_permission_revoked(&self, player: PlayerId, node: &str) {
        self.cache.on_permission_revoked(player, node);
    }

    /// `player` moved from world `from` to world `to`.
    pub fn on_world_change(&self, player: PlayerId, from: &str, to: &str) {
        if from == to {
            return;
        }
        if self.trackers.on_viewer_changed_world(player) {
            debug!("Tracker for {} ended on move from {} to {}", player, from, to);
        }
    }

    /// Restores `player`'s radius override from the nodes they hold.
    pub fn on_player_join(&self, player: PlayerId) {
        self.cache.refresh(player);
    }

    pub fn on_player_quit(&self, player: PlayerId) {
        self.cache.evict(player);
        self.trackers.on_player_quit(player);
    }

    /// Stops every tracker and forgets every cached radius.
    pub fn shutdown(&self) {
        let stopped = self.trackers.stop_all(StopReason::Shutdown);
        self.cache.clear();
        info!("🧹 Proximity service shut down, {} tracker(s) stopped", stopped);
    }

    pub fn radius_cache(&self) -> &RadiusCache {
        &self.cache
    }

    pub fn trackers(&self) -> &Arc<SessionRegistry> {
        &self.trackers
    }
}
