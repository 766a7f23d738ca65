use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};

use super::progress::ProgressInput;
use super::TrackerConfig;
use crate::scheduler::TaskHandle;
use crate::types::PlayerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Registered, timers not attached yet
    Starting,
    Active,
    Stopped,
}

pub(crate) struct SessionState {
    pub(crate) phase: Phase,
    pub(crate) last_world: String,
    tick: Option<TaskHandle>,
    timeout: Option<TaskHandle>,
}

/// One viewer tracking one target.
pub struct TrackerSession {
    viewer: PlayerId,
    target: PlayerId,
    target_name: String,
    started_at: Duration,
    initial_distance: f64,
    ignore_distance: bool,
    config: TrackerConfig,
    state: Mutex<SessionState>,
}

impl TrackerSession {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        viewer: PlayerId,
        target: PlayerId,
        target_name: String,
        world: String,
        started_at: Duration,
        initial_distance: f64,
        ignore_distance: bool,
        config: TrackerConfig,
    ) -> Self {
        Self {
            viewer,
            target,
            target_name,
            started_at,
            initial_distance,
            ignore_distance,
            config,
            state: Mutex::new(SessionState {
                phase: Phase::Starting,
                last_world: world,
                tick: None,
                timeout: None,
            }),
        }
    }

    pub fn viewer(&self) -> PlayerId {
        self.viewer
    }

    pub fn target(&self) -> PlayerId {
        self.target
    }

    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    pub fn initial_distance(&self) -> f64 {
        self.initial_distance
    }

    pub fn ignores_distance(&self) -> bool {
        self.ignore_distance
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.state.lock().phase
    }

    pub fn is_stopped(&self) -> bool {
        self.phase() == Phase::Stopped
    }

    /// Bar fill for the current distance at scheduler time `now`.
    pub fn progress(&self, distance: f64, now: Duration) -> f64 {
        self.config.progress.progress(&ProgressInput {
            distance,
            initial_distance: self.initial_distance,
            ignore_distance: self.ignore_distance,
            elapsed: now.saturating_sub(self.started_at),
            timeout: self.config.timeout,
        })
    }

    /// Title with `{player}`, `{distance}` and `{direction}` filled in.
    pub fn title(&self, distance: f64, direction: &str) -> String {
        self.config
            .title
            .replace("{player}", &self.target_name)
            .replace("{distance}", &(distance as i64).to_string())
            .replace("{direction}", direction)
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock()
    }

    /// Hands the scheduled tasks to the session. When the session was stopped
    /// before they could be attached they are cancelled on the spot.
    pub(crate) fn attach(&self, tick: TaskHandle, timeout: Option<TaskHandle>) {
        let mut state = self.state.lock();
        if state.phase == Phase::Stopped {
            drop(state);
            tick.cancel();
            if let Some(timeout) = timeout {
                timeout.cancel();
            }
            return;
        }
        state.tick = Some(tick);
        state.timeout = timeout;
        state.phase = Phase::Active;
    }

    /// Moves to `Stopped` and cancels both timers. Returns false when the
    /// session had already stopped.
    pub(crate) fn halt(state: &mut SessionState) -> bool {
        if state.phase == Phase::Stopped {
            return false;
        }
        state.phase = Phase::Stopped;
        if let Some(tick) = state.tick.take() {
            tick.cancel();
        }
        if let Some(timeout) = state.timeout.take() {
            timeout.cancel();
        }
        true
    }
}

impl std::fmt::Debug for TrackerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackerSession")
            .field("viewer", &self.viewer)
            .field("target", &self.target)
            .field("target_name", &self.target_name)
            .field("initial_distance", &self.initial_distance)
            .field("ignore_distance", &self.ignore_distance)
            .field("phase", &self.phase())
            .finish()
    }
}
