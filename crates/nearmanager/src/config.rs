//! Configuration management for the NearManager host.
//!
//! One TOML file carries logging settings plus everything the plugin reads:
//! `[near]` settings, `[messages]` and `[sounds]`. Every section is optional.

use std::path::{Path, PathBuf};

use near_core::settings::load_or_create;
use near_core::{ConfigError, ConfigResult, NearSettings};
use near_plugin::{ConfigSource, MessageCatalog, PluginConfig, PluginResult, SoundSettings};
use serde::{Deserialize, Serialize};
use tokio::runtime::{Handle, RuntimeFlavor};

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Logging configuration settings
    pub logging: LoggingSettings,
    pub near: NearSettings,
    pub messages: MessageCatalog,
    pub sounds: SoundSettings,
}

/// Logging system configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to output logs in JSON format
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl AppConfig {
    /// Loads configuration from `path`, writing a default file first when
    /// it does not exist.
    pub async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        load_or_create(path).await
    }

    /// Checks values the plugin cannot repair on its own.
    pub fn validate(&self) -> Result<(), String> {
        if !VALID_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {VALID_LEVELS:?}",
                &self.logging.level
            ));
        }
        Ok(())
    }

    /// The part of the file the plugin consumes.
    pub fn plugin_config(&self) -> PluginConfig {
        PluginConfig {
            near: self.near.clone(),
            messages: self.messages.clone(),
            sounds: self.sounds.clone(),
        }
    }
}

/// Re-reads the configuration file on `/nm reload`.
pub struct FileConfigSource {
    path: PathBuf,
}

impl FileConfigSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigSource for FileConfigSource {
    fn load(&self) -> PluginResult<PluginConfig> {
        let content = read_blocking(&self.path)
            .map_err(|e| ConfigError::FileRead(self.path.clone(), e))?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config.plugin_config())
    }
}

/// Reads `path` without stalling a multi-threaded runtime's worker. Other
/// callers, including current-thread runtimes, read in place.
fn read_blocking(path: &Path) -> std::io::Result<String> {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(|| std::fs::read_to_string(path))
        }
        _ => std::fs::read_to_string(path),
    }
}
