//! Session registry: at most one tracker per viewer.
//!
//! Scheduled callbacks only hold weak references to the registry and their
//! session, so a dropped registry or a removed session simply stops being
//! driven. No map guard is ever held while a session is stopped.

use std::sync::{Arc, Weak};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::MutexGuard;
use tracing::{debug, info};

use super::session::{Phase, SessionState, TrackerSession};
use super::{Notice, Notifier, StopReason, TrackerConfig};
use crate::direction;
use crate::error::{NearResult, PolicyRejection, Unreachable};
use crate::host::{Display, Presence};
use crate::scheduler::{Scheduler, TaskHandle};
use crate::settings::NearSettings;
use crate::types::{PlayerId, PlayerSnapshot};

pub struct SessionRegistry {
    sessions: DashMap<PlayerId, Arc<TrackerSession>>,
    presence: Arc<dyn Presence>,
    display: Arc<dyn Display>,
    notifier: Arc<dyn Notifier>,
    scheduler: Arc<dyn Scheduler>,
}

impl SessionRegistry {
    pub fn new(
        presence: Arc<dyn Presence>,
        display: Arc<dyn Display>,
        notifier: Arc<dyn Notifier>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Arc<Self> {
        Arc::new(Self {
            sessions: DashMap::new(),
            presence,
            display,
            notifier,
            scheduler,
        })
    }

    /// Starts tracking `target` for `viewer`.
    ///
    /// Unless `ignore_distance` is set the target must currently sit between
    /// the enabled distance gates. On success the bar is shown and rendered
    /// once, the periodic tick is scheduled and, when configured, the
    /// timeout.
    pub fn start(
        self: &Arc<Self>,
        viewer: PlayerId,
        target: PlayerId,
        ignore_distance: bool,
        settings: &NearSettings,
    ) -> NearResult<Arc<TrackerSession>> {
        if viewer == target {
            return Err(PolicyRejection::SelfTarget.into());
        }
        if self.sessions.contains_key(&viewer) {
            return Err(PolicyRejection::AlreadyActive.into());
        }

        let viewer_snapshot = self
            .presence
            .player(viewer)
            .ok_or_else(|| Unreachable::PlayerOffline(viewer.to_string()))?;
        let target_snapshot = self
            .presence
            .player(target)
            .ok_or_else(|| Unreachable::PlayerOffline(target.to_string()))?;
        let distance = viewer_snapshot
            .location
            .distance(&target_snapshot.location)
            .ok_or_else(|| Unreachable::OtherWorld(target_snapshot.name.clone()))?;

        let config = TrackerConfig::from_settings(settings);
        if !ignore_distance {
            match config.gate(distance) {
                Some(Notice::GoneClose) => return Err(PolicyRejection::TooClose.into()),
                Some(_) => return Err(PolicyRejection::TooFar.into()),
                None => {}
            }
        }

        let session = Arc::new(TrackerSession::new(
            viewer,
            target,
            target_snapshot.name.clone(),
            target_snapshot.location.world.clone(),
            self.scheduler.now(),
            distance,
            ignore_distance,
            config,
        ));

        match self.sessions.entry(viewer) {
            Entry::Occupied(_) => return Err(PolicyRejection::AlreadyActive.into()),
            Entry::Vacant(slot) => {
                slot.insert(session.clone());
            }
        }

        {
            // A concurrent stop may have won since the insert; its clear must
            // not be followed by a show.
            let state = session.lock();
            if state.phase != Phase::Stopped {
                let config = session.config();
                self.display.show_bar(viewer, config.color, config.style);
                self.render(&session, &viewer_snapshot, &target_snapshot, distance);
            }
        }

        let tick = self.schedule_tick(&session);
        let timeout = self.schedule_timeout(&session);
        session.attach(tick, timeout);

        info!(
            "🎯 {} started tracking {} at {:.1} blocks{}",
            viewer_snapshot.name,
            target_snapshot.name,
            distance,
            if ignore_distance { " (distance gates off)" } else { "" }
        );
        Ok(session)
    }

    /// Stops `viewer`'s session if it follows `target`.
    pub fn stop_target(&self, viewer: PlayerId, target: PlayerId) -> NearResult<()> {
        match self.get(viewer) {
            Some(session) if session.target() == target => {
                self.finish(&session, None, StopReason::Command);
                Ok(())
            }
            _ => Err(PolicyRejection::NotActive.into()),
        }
    }

    /// Stops `viewer`'s session without a notice. Returns whether one was
    /// running.
    pub fn stop(&self, viewer: PlayerId, reason: StopReason) -> bool {
        self.get(viewer)
            .is_some_and(|session| self.finish(&session, None, reason))
    }

    /// The viewer moved to another world.
    pub fn on_viewer_changed_world(&self, viewer: PlayerId) -> bool {
        self.get(viewer).is_some_and(|session| {
            self.finish(
                &session,
                Some(Notice::SelfChangedWorld),
                StopReason::ViewerChangedWorld,
            )
        })
    }

    /// The player left. Sessions targeting them end on their next tick.
    pub fn on_player_quit(&self, player: PlayerId) -> bool {
        self.stop(player, StopReason::ViewerQuit)
    }

    pub fn stop_all(&self, reason: StopReason) -> usize {
        let sessions: Vec<_> = self
            .sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        sessions
            .iter()
            .filter(|session| self.finish(session, None, reason))
            .count()
    }

    pub fn get(&self, viewer: PlayerId) -> Option<Arc<TrackerSession>> {
        self.sessions.get(&viewer).map(|entry| entry.value().clone())
    }

    pub fn is_active(&self, viewer: PlayerId) -> bool {
        self.sessions.contains_key(&viewer)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    // ========================================================================
    // Scheduling
    // ========================================================================

    fn schedule_tick(self: &Arc<Self>, session: &Arc<TrackerSession>) -> TaskHandle {
        let registry = Arc::downgrade(self);
        let weak = Arc::downgrade(session);
        self.scheduler.schedule_every(
            session.config().update_interval,
            Arc::new(move || {
                if let Some((registry, session)) = upgrade(&registry, &weak) {
                    registry.tick(&session);
                }
            }),
        )
    }

    fn schedule_timeout(self: &Arc<Self>, session: &Arc<TrackerSession>) -> Option<TaskHandle> {
        let after = session.config().timeout?;
        let registry = Arc::downgrade(self);
        let weak = Arc::downgrade(session);
        Some(self.scheduler.schedule_once(
            after,
            Box::new(move || {
                if let Some((registry, session)) = upgrade(&registry, &weak) {
                    registry.expire(&session);
                }
            }),
        ))
    }

    fn tick(&self, session: &Arc<TrackerSession>) {
        let viewer = self.presence.player(session.viewer());
        let target = self.presence.player(session.target());

        let mut state = session.lock();
        if state.phase == Phase::Stopped {
            return;
        }

        let notice = match (&viewer, &target) {
            (Some(viewer), Some(target)) => self.evaluate(session, &mut state, viewer, target),
            _ => Some(Notice::PlayerOffline),
        };
        let Some(notice) = notice else {
            return;
        };

        // An offline viewer has nobody to read the notice.
        let notice_for_viewer = viewer.is_some().then_some(notice);
        self.finish_locked(session, state, notice_for_viewer, notice.reason());
    }

    fn expire(&self, session: &Arc<TrackerSession>) {
        let online = self.presence.player(session.viewer()).is_some();
        let state = session.lock();
        self.finish_locked(
            session,
            state,
            online.then_some(Notice::Timeout),
            StopReason::Timeout,
        );
    }

    /// Renders the bar, or names the condition that ends the session.
    fn evaluate(
        &self,
        session: &TrackerSession,
        state: &mut SessionState,
        viewer: &PlayerSnapshot,
        target: &PlayerSnapshot,
    ) -> Option<Notice> {
        if target.location.world != state.last_world {
            return Some(Notice::PlayerChangedWorld);
        }
        let Some(distance) = viewer.location.distance(&target.location) else {
            return Some(Notice::SelfChangedWorld);
        };
        if !session.ignores_distance() {
            if let Some(notice) = session.config().gate(distance) {
                return Some(notice);
            }
        }

        self.render(session, viewer, target, distance);
        state.last_world.clone_from(&target.location.world);
        None
    }

    fn render(
        &self,
        session: &TrackerSession,
        viewer: &PlayerSnapshot,
        target: &PlayerSnapshot,
        distance: f64,
    ) {
        let label = direction::label_between(
            &viewer.location,
            &target.location,
            &session.config().directions,
        );
        let title = session.title(distance, label);
        let progress = session.progress(distance, self.scheduler.now());
        debug!(
            "Tracker {} → {}: {:.1} blocks, progress {:.2}",
            viewer.name, target.name, distance, progress
        );
        self.display.update_bar(viewer.id, &title, progress);
    }

    // ========================================================================
    // Stopping
    // ========================================================================

    fn finish(&self, session: &Arc<TrackerSession>, notice: Option<Notice>, reason: StopReason) -> bool {
        let state = session.lock();
        self.finish_locked(session, state, notice, reason)
    }

    /// Halts the session, then notifies, clears the bar and unregisters it,
    /// in that order. A no-op for a session that already stopped.
    fn finish_locked(
        &self,
        session: &Arc<TrackerSession>,
        mut state: MutexGuard<'_, SessionState>,
        notice: Option<Notice>,
        reason: StopReason,
    ) -> bool {
        if !TrackerSession::halt(&mut state) {
            return false;
        }
        drop(state);

        let viewer = session.viewer();
        if let Some(notice) = notice {
            self.notifier.notify(viewer, notice, session.target_name());
        }
        self.display.clear_bar(viewer);
        self.sessions
            .remove_if(&viewer, |_, current| Arc::ptr_eq(current, session));

        info!(
            "🛑 Tracker {} → {} ended: {}",
            viewer,
            session.target_name(),
            reason
        );
        true
    }
}

fn upgrade(
    registry: &Weak<SessionRegistry>,
    session: &Weak<TrackerSession>,
) -> Option<(Arc<SessionRegistry>, Arc<TrackerSession>)> {
    Some((registry.upgrade()?, session.upgrade()?))
}
