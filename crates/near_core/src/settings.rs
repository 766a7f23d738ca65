//! Configuration settings structures
//!
//! Every group carries `#[serde(default)]` so a partial TOML file only needs
//! to name the values it changes. [`NearSettings::sanitize`] repairs values
//! that would break the feature at runtime.

use std::collections::BTreeMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ConfigError, ConfigResult};

/// Root settings for the proximity feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NearSettings {
    /// Per-viewer cooldown between `/near` invocations
    pub cooldown: CooldownSettings,
    /// Radius used when nothing more specific applies
    pub default_radius: f64,
    /// Explicit radius argument on `/near <radius>`
    pub custom_radius: CustomRadiusSettings,
    pub hide_vanished: Toggle,
    pub ignored_players: IgnoredPlayersSettings,
    pub max_players: MaxPlayersSettings,
    /// Primary permission group → radius
    pub radius_groups: RadiusGroupSettings,
    pub directions: DirectionLabels,
    pub bossbar: BossBarSettings,
}

impl Default for NearSettings {
    fn default() -> Self {
        Self {
            cooldown: CooldownSettings::default(),
            default_radius: 100.0,
            custom_radius: CustomRadiusSettings::default(),
            hide_vanished: Toggle { enabled: true },
            ignored_players: IgnoredPlayersSettings::default(),
            max_players: MaxPlayersSettings::default(),
            radius_groups: RadiusGroupSettings::default(),
            directions: DirectionLabels::default(),
            bossbar: BossBarSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Toggle {
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownSettings {
    pub enabled: bool,
    pub seconds: u64,
}

impl Default for CooldownSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            seconds: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomRadiusSettings {
    pub enabled: bool,
    pub min_radius: f64,
    /// Absolute ceiling for privileged viewers
    pub max_radius: f64,
}

impl Default for CustomRadiusSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            min_radius: 0.0,
            max_radius: 100_000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoredPlayersSettings {
    pub enabled: bool,
    pub players: Vec<String>,
}

impl Default for IgnoredPlayersSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            players: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaxPlayersSettings {
    pub enabled: bool,
    pub max: u32,
}

impl Default for MaxPlayersSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max: 10,
        }
    }
}

/// A group radius as written in the config file. Text values are accepted
/// and parsed on lookup; a value that does not parse is a miss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupRadius {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl GroupRadius {
    pub fn as_radius(&self) -> Option<f64> {
        match self {
            GroupRadius::Integer(value) => Some(*value as f64),
            GroupRadius::Float(value) => Some(*value),
            GroupRadius::Text(text) => text.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RadiusGroupSettings {
    pub enabled: bool,
    pub groups: BTreeMap<String, GroupRadius>,
}

/// Text shown for each of the eight compass octants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionLabels {
    pub north: String,
    pub northeast: String,
    pub east: String,
    pub southeast: String,
    pub south: String,
    pub southwest: String,
    pub west: String,
    pub northwest: String,
}

impl Default for DirectionLabels {
    fn default() -> Self {
        Self {
            north: "⬆".to_string(),
            northeast: "⬈".to_string(),
            east: "➡".to_string(),
            southeast: "⬊".to_string(),
            south: "⬇".to_string(),
            southwest: "⬋".to_string(),
            west: "⬅".to_string(),
            northwest: "⬉".to_string(),
        }
    }
}

/// Hides the bar while the target is closer than `distance`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinDistanceGate {
    pub enabled: bool,
    pub distance: u32,
}

impl Default for MinDistanceGate {
    fn default() -> Self {
        Self {
            enabled: true,
            distance: 15,
        }
    }
}

/// Hides the bar while the target is farther than `distance`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaxDistanceGate {
    pub enabled: bool,
    pub distance: u32,
}

impl Default for MaxDistanceGate {
    fn default() -> Self {
        Self {
            enabled: true,
            distance: 150,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    pub enabled: bool,
    pub seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressSettings {
    pub enabled: bool,
    /// "distance" or "time"; anything else shows a full bar
    pub mode: String,
    /// Percent, 0-100
    pub min_progress: f64,
    /// Percent, 0-100
    pub max_progress: f64,
    pub use_min_distance_as_zero: bool,
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: "distance".to_string(),
            min_progress: 10.0,
            max_progress: 100.0,
            use_min_distance_as_zero: false,
        }
    }
}

/// Live tracker (boss bar) settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossBarSettings {
    pub enabled: bool,
    pub update_interval_ms: u64,
    pub color: String,
    pub style: String,
    /// Title template: `{player}`, `{distance}`, `{direction}`
    pub text: String,
    pub min_distance: MinDistanceGate,
    pub max_distance: MaxDistanceGate,
    pub timeout: TimeoutSettings,
    pub progress: ProgressSettings,
}

impl Default for BossBarSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            update_interval_ms: DEFAULT_UPDATE_INTERVAL_MS,
            color: "YELLOW".to_string(),
            style: "SOLID".to_string(),
            text: "◆ Player {player} is {distance} blocks away ({direction})".to_string(),
            min_distance: MinDistanceGate::default(),
            max_distance: MaxDistanceGate::default(),
            timeout: TimeoutSettings::default(),
            progress: ProgressSettings::default(),
        }
    }
}

const DEFAULT_UPDATE_INTERVAL_MS: u64 = 250;

impl NearSettings {
    /// Repairs values that cannot work at runtime and returns one line per
    /// repair. Each repair is also logged.
    pub fn sanitize(&mut self) -> Vec<String> {
        let mut repairs = Vec::new();

        if self.bossbar.update_interval_ms == 0 {
            repairs.push(format!(
                "Invalid bossbar.update_interval_ms, defaulting to {DEFAULT_UPDATE_INTERVAL_MS}"
            ));
            self.bossbar.update_interval_ms = DEFAULT_UPDATE_INTERVAL_MS;
        }
        if !(self.custom_radius.min_radius >= 0.0) {
            repairs.push("Invalid custom_radius.min_radius, defaulting to 0".to_string());
            self.custom_radius.min_radius = 0.0;
        }
        if !(self.custom_radius.max_radius >= 0.0) {
            repairs.push("Invalid custom_radius.max_radius, defaulting to 100000".to_string());
            self.custom_radius.max_radius = 100_000.0;
        }

        for repair in &repairs {
            warn!("⚠️ {}", repair);
        }
        repairs
    }
}

/// Loads a TOML settings file, writing `T::default()` to `path` first when
/// the file does not exist yet.
pub async fn load_or_create<T>(path: &Path) -> ConfigResult<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    if tokio::fs::try_exists(path).await.unwrap_or(false) {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::FileRead(path.to_path_buf(), e))?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    } else {
        warn!("Configuration file not found: {}, using defaults", path.display());
        let default_config = T::default();
        let content = toml::to_string_pretty(&default_config)?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| ConfigError::FileWrite(path.to_path_buf(), e))?;
        info!("Created default configuration file: {}", path.display());
        Ok(default_config)
    }
}
