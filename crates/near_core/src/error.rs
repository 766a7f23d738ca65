//! Error types for the proximity feature
//!
//! Everything in [`NearError`] is recoverable: it is rendered to the viewer as
//! a message and never tears anything down.

use std::path::PathBuf;
use thiserror::Error;

/// A request the policy refused to carry out.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyRejection {
    #[error("radius is below the minimum of {min}")]
    BelowMinimum { min: f64 },

    #[error("radius is above the maximum of {max}")]
    AboveMaximum { max: f64 },

    #[error("more than {max} players are in range")]
    TooManyCandidates { max: u32 },

    #[error("a tracker is already active")]
    AlreadyActive,

    #[error("no tracker is active for that target")]
    NotActive,

    #[error("target is too close to start tracking")]
    TooClose,

    #[error("target is too far to start tracking")]
    TooFar,

    #[error("cannot track yourself")]
    SelfTarget,

    #[error("trackers are disabled")]
    TrackerDisabled,
}

/// A party of the request can no longer be reached.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Unreachable {
    #[error("player {0} is offline")]
    PlayerOffline(String),

    #[error("player {0} is in another world")]
    OtherWorld(String),
}

/// Proximity operation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NearError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("rejected: {0}")]
    PolicyRejected(#[from] PolicyRejection),

    #[error("unreachable: {0}")]
    Unreachable(#[from] Unreachable),
}

impl NearError {
    /// Message catalog key the command layer renders for this error.
    pub fn message_key(&self) -> &'static str {
        match self {
            NearError::InvalidInput(_) => "near-messages.invalid-radius",
            NearError::PolicyRejected(rejection) => match rejection {
                PolicyRejection::BelowMinimum { .. } => "near-messages.invalid-min-radius",
                PolicyRejection::AboveMaximum { .. } => "near-messages.invalid-max-radius",
                PolicyRejection::TooManyCandidates { .. } => "near-messages.too-many-players",
                PolicyRejection::AlreadyActive => "plugin-messages.bossbar-messages.already-active",
                PolicyRejection::NotActive => "plugin-messages.bossbar-messages.already-off",
                PolicyRejection::TooClose => "plugin-messages.bossbar-messages.close",
                PolicyRejection::TooFar => "plugin-messages.bossbar-messages.too-far",
                PolicyRejection::SelfTarget => "plugin-messages.bossbar-messages.self-target",
                PolicyRejection::TrackerDisabled => "plugin-messages.bossbar-messages.disabled",
            },
            NearError::Unreachable(_) => "plugin-messages.bossbar-messages.player-not-found",
        }
    }

    /// Placeholder values carried by the error, as `(placeholder, value)`.
    pub fn placeholders(&self) -> Vec<(&'static str, String)> {
        match self {
            NearError::PolicyRejected(PolicyRejection::BelowMinimum { min }) => {
                vec![("{min-radius}", (*min as i64).to_string())]
            }
            NearError::PolicyRejected(PolicyRejection::AboveMaximum { max }) => {
                vec![("{max-radius}", (*max as i64).to_string())]
            }
            NearError::PolicyRejected(PolicyRejection::TooManyCandidates { max }) => {
                vec![("{max-players}", max.to_string())]
            }
            NearError::Unreachable(Unreachable::PlayerOffline(name))
            | NearError::Unreachable(Unreachable::OtherWorld(name)) => {
                vec![("{player}", name.clone())]
            }
            _ => Vec::new(),
        }
    }
}

/// Settings loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    FileRead(PathBuf, std::io::Error),

    #[error("Failed to write config file {0}: {1}")]
    FileWrite(PathBuf, std::io::Error),

    #[error("Failed to parse config file {0}: {1}")]
    Parse(PathBuf, toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type NearResult<T> = Result<T, NearError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
