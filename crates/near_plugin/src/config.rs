//! Plugin configuration and where it is (re)loaded from.

use near_core::NearSettings;
use serde::{Deserialize, Serialize};

use crate::error::PluginResult;
use crate::messages::MessageCatalog;
use crate::sounds::SoundSettings;

/// Everything `/nm reload` refreshes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    pub near: NearSettings,
    pub messages: MessageCatalog,
    pub sounds: SoundSettings,
}

impl PluginConfig {
    pub fn from_toml_str(content: &str) -> PluginResult<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Produces a fresh configuration on reload.
pub trait ConfigSource: Send + Sync {
    fn load(&self) -> PluginResult<PluginConfig>;
}

/// A source that always yields the same configuration.
pub struct StaticConfig(pub PluginConfig);

impl ConfigSource for StaticConfig {
    fn load(&self) -> PluginResult<PluginConfig> {
        Ok(self.0.clone())
    }
}
