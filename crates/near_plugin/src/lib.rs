//! # NearManager Plugin
//!
//! Player-facing surface of the proximity feature, built on [`near_core`]:
//!
//! - `/near [radius]` lists nearby players with distance, bearing and
//!   optional buttons
//! - `/nm reload` and `/nm bossbar <player> [on|off] [-nodist]` for admins
//! - message catalog with placeholders, per-message sound cues
//! - per-player cooldown, tab completion and command list filtering
//!
//! The host creates one [`NearPlugin`], forwards commands to
//! [`NearPlugin::dispatch`] and host events to the `on_*` methods.

pub mod commands;
mod completion;
pub mod config;
pub mod cooldown;
pub mod error;
pub mod messages;
pub mod output;
pub mod plugin;
pub mod sounds;

pub use commands::Sender;
pub use config::{ConfigSource, PluginConfig, StaticConfig};
pub use error::{PluginError, PluginResult};
pub use messages::{MessageCatalog, MessageValue};
pub use plugin::{NearPlugin, PluginHost, PLUGIN_NAME, PLUGIN_VERSION};
pub use sounds::{SoundCue, SoundSettings};
