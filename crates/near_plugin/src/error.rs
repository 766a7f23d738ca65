use near_core::ConfigError;
use thiserror::Error;

/// Plugin-level failures. Command-level problems are replies, not errors.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

pub type PluginResult<T> = Result<T, PluginError>;
