//! # Live Trackers
//!
//! A tracker keeps one viewer's bar pointed at one target until a stop
//! condition fires. [`SessionRegistry`] owns every running
//! [`TrackerSession`], admits at most one per viewer, and drives them from
//! the injected scheduler.
//!
//! ## Lifecycle
//!
//! ```text
//! start() ──► Starting ──► Active ──► Stopped (removed, timers cancelled)
//!                 │                      ▲
//!                 └──────────────────────┘  stop while starting
//! ```
//!
//! A stopped session is never revived; starting again creates a new one.

mod progress;
mod registry;
mod session;

pub use progress::{ProgressConfig, ProgressInput, ProgressMode};
pub use registry::SessionRegistry;
pub use session::{Phase, TrackerSession};

use std::time::Duration;

use tracing::warn;

use crate::host::{BarColor, BarStyle};
use crate::settings::{DirectionLabels, NearSettings};
use crate::types::PlayerId;

/// Why a session ended, for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Command,
    Timeout,
    PlayerOffline,
    TargetChangedWorld,
    ViewerChangedWorld,
    GoneClose,
    GoneFar,
    ViewerQuit,
    Shutdown,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            StopReason::Command => "stopped by command",
            StopReason::Timeout => "timed out",
            StopReason::PlayerOffline => "player went offline",
            StopReason::TargetChangedWorld => "target changed world",
            StopReason::ViewerChangedWorld => "viewer changed world",
            StopReason::GoneClose => "target came too close",
            StopReason::GoneFar => "target went too far",
            StopReason::ViewerQuit => "viewer quit",
            StopReason::Shutdown => "shutdown",
        };
        f.write_str(reason)
    }
}

/// Notice shown to a viewer when their tracker ends on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Timeout,
    PlayerOffline,
    PlayerChangedWorld,
    GoneClose,
    GoneFar,
    SelfChangedWorld,
}

impl Notice {
    pub fn message_key(&self) -> &'static str {
        match self {
            Notice::Timeout => "plugin-messages.bossbar-messages.timeout",
            Notice::PlayerOffline => "plugin-messages.bossbar-messages.player-offline",
            Notice::PlayerChangedWorld => "plugin-messages.bossbar-messages.player-changed-world",
            Notice::GoneClose => "plugin-messages.bossbar-messages.gone-close",
            Notice::GoneFar => "plugin-messages.bossbar-messages.gone-far",
            Notice::SelfChangedWorld => "plugin-messages.bossbar-messages.self-changed-world",
        }
    }

    pub(crate) fn reason(&self) -> StopReason {
        match self {
            Notice::Timeout => StopReason::Timeout,
            Notice::PlayerOffline => StopReason::PlayerOffline,
            Notice::PlayerChangedWorld => StopReason::TargetChangedWorld,
            Notice::GoneClose => StopReason::GoneClose,
            Notice::GoneFar => StopReason::GoneFar,
            Notice::SelfChangedWorld => StopReason::ViewerChangedWorld,
        }
    }
}

/// Delivers tracker notices to viewers. `target_name` fills `{player}`.
pub trait Notifier: Send + Sync {
    fn notify(&self, viewer: PlayerId, notice: Notice, target_name: &str);
}

/// Settings a session captures when it starts. Reloads do not reach running
/// sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    pub update_interval: Duration,
    /// Stop once the target is this close or closer
    pub min_distance: Option<f64>,
    /// Stop once the target is this far or farther
    pub max_distance: Option<f64>,
    pub timeout: Option<Duration>,
    pub progress: ProgressConfig,
    pub color: BarColor,
    pub style: BarStyle,
    pub title: String,
    pub directions: DirectionLabels,
}

impl TrackerConfig {
    pub fn from_settings(settings: &NearSettings) -> Self {
        let bar = &settings.bossbar;

        let color = BarColor::parse(&bar.color).unwrap_or_else(|| {
            warn!("⚠️ Unknown bar color '{}', using YELLOW", bar.color);
            BarColor::Yellow
        });
        let style = BarStyle::parse(&bar.style).unwrap_or_else(|| {
            warn!("⚠️ Unknown bar style '{}', using SOLID", bar.style);
            BarStyle::Solid
        });

        let timeout = (bar.timeout.enabled && bar.timeout.seconds > 0)
            .then(|| Duration::from_secs(bar.timeout.seconds));

        let zero_distance = if bar.progress.use_min_distance_as_zero {
            f64::from(bar.min_distance.distance)
        } else {
            0.0
        };

        Self {
            update_interval: Duration::from_millis(bar.update_interval_ms.max(1)),
            min_distance: bar
                .min_distance
                .enabled
                .then(|| f64::from(bar.min_distance.distance)),
            max_distance: bar
                .max_distance
                .enabled
                .then(|| f64::from(bar.max_distance.distance)),
            timeout,
            progress: ProgressConfig {
                enabled: bar.progress.enabled,
                mode: ProgressMode::parse(&bar.progress.mode),
                min_fraction: bar.progress.min_progress / 100.0,
                max_fraction: bar.progress.max_progress / 100.0,
                zero_distance,
            },
            color,
            style,
            title: bar.text.clone(),
            directions: settings.directions.clone(),
        }
    }

    /// Gate check before starting and on every tick.
    pub(crate) fn gate(&self, distance: f64) -> Option<Notice> {
        if self.min_distance.is_some_and(|min| distance <= min) {
            return Some(Notice::GoneClose);
        }
        if self.max_distance.is_some_and(|max| distance >= max) {
            return Some(Notice::GoneFar);
        }
        None
    }
}
