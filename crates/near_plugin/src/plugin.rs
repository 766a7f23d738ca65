//! The NearManager plugin: wires the proximity service to the command
//! surface and routes host events to it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use near_core::host::{Display, Permissions, Presence};
use near_core::scheduler::Scheduler;
use near_core::{NearHost, NearService, PlayerId};
use tracing::{error, info, warn};

use crate::commands::{self, Command, Sender};
use crate::completion;
use crate::config::{ConfigSource, PluginConfig};
use crate::cooldown::CooldownTracker;
use crate::error::PluginResult;
use crate::output::Messenger;

pub const PLUGIN_NAME: &str = "NearManager";
pub const PLUGIN_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Host capabilities the plugin needs.
#[derive(Clone)]
pub struct PluginHost {
    pub presence: Arc<dyn Presence>,
    pub permissions: Arc<dyn Permissions>,
    pub display: Arc<dyn Display>,
    pub scheduler: Arc<dyn Scheduler>,
}

pub struct NearPlugin {
    pub(crate) service: Arc<NearService>,
    pub(crate) messenger: Arc<Messenger>,
    pub(crate) presence: Arc<dyn Presence>,
    pub(crate) permissions: Arc<dyn Permissions>,
    pub(crate) scheduler: Arc<dyn Scheduler>,
    pub(crate) cooldowns: CooldownTracker,
    source: Arc<dyn ConfigSource>,
}

impl NearPlugin {
    pub fn new(config: PluginConfig, host: PluginHost, source: Arc<dyn ConfigSource>) -> Self {
        let started = Instant::now();

        let messenger = Arc::new(Messenger::new(
            config.messages,
            config.sounds,
            host.display.clone(),
        ));
        let service = Arc::new(NearService::new(
            config.near,
            NearHost {
                presence: host.presence.clone(),
                permissions: host.permissions.clone(),
                display: host.display,
                notifier: messenger.clone(),
                scheduler: host.scheduler.clone(),
            },
        ));

        info!(
            "✅ {} v{} loaded in {} ms",
            PLUGIN_NAME,
            PLUGIN_VERSION,
            started.elapsed().as_millis()
        );

        Self {
            service,
            messenger,
            presence: host.presence,
            permissions: host.permissions,
            scheduler: host.scheduler,
            cooldowns: CooldownTracker::new(),
            source,
        }
    }

    /// Runs the command behind `label`. Returns false for labels this plugin
    /// does not own.
    pub fn dispatch(&self, sender: Sender, label: &str, args: &[&str]) -> bool {
        match Command::from_label(label) {
            Some(Command::Near) => commands::near::execute(self, sender, label, args),
            Some(Command::Nm) => commands::nm::execute(self, sender, args),
            None => return false,
        }
        true
    }

    /// Suggestions for the argument being typed, `args` including it.
    pub fn complete(&self, sender: Sender, label: &str, args: &[&str]) -> Vec<String> {
        completion::complete(self, sender, label, args)
    }

    /// Removes the commands `player` cannot use from a client command list.
    pub fn filter_commands(&self, player: PlayerId, commands: &mut Vec<String>) {
        completion::filter_visible(self, player, commands);
    }

    /// Reloads settings, messages and sounds. Returns how long it took.
    /// On failure the current configuration stays active.
    pub fn reload(&self) -> PluginResult<Duration> {
        let started = Instant::now();
        let config = self.source.load().inspect_err(|e| {
            error!("❌ Failed to reload configuration: {}", e);
        })?;

        for repair in self.service.reload(config.near) {
            warn!("⚠️ Reload repaired a setting: {}", repair);
        }
        self.messenger.replace(config.messages, config.sounds);

        let elapsed = started.elapsed();
        info!("🔄 Configuration reloaded in {} ms", elapsed.as_millis());
        Ok(elapsed)
    }

    pub fn on_permission_granted(&self, player: PlayerId, node: &str) {
        self.service.on_permission_granted(player, node);
    }

    pub fn on_permission_revoked(&self, player: PlayerId, node: &str) {
        self.service.on_permission_revoked(player, node);
    }

    pub fn on_world_change(&self, player: PlayerId, from: &str, to: &str) {
        self.service.on_world_change(player, from, to);
    }

    pub fn on_player_join(&self, player: PlayerId) {
        self.service.on_player_join(player);
    }

    pub fn on_player_quit(&self, player: PlayerId) {
        self.service.on_player_quit(player);
        self.cooldowns.evict(player);
    }

    pub fn shutdown(&self) {
        let started = Instant::now();
        self.service.shutdown();
        self.cooldowns.clear();
        info!(
            "🛑 {} v{} unloaded in {} ms",
            PLUGIN_NAME,
            PLUGIN_VERSION,
            started.elapsed().as_millis()
        );
    }

    pub fn service(&self) -> &Arc<NearService> {
        &self.service
    }

    pub(crate) fn has(&self, player: PlayerId, node: &str) -> bool {
        self.permissions.has_permission(player, node)
    }

    /// Permission or operator status.
    pub(crate) fn allowed(&self, player: PlayerId, node: &str) -> bool {
        self.has(player, node) || self.permissions.is_operator(player)
    }

    pub(crate) fn player_name(&self, player: PlayerId) -> String {
        self.presence
            .player(player)
            .map(|p| p.name)
            .unwrap_or_else(|| player.to_string())
    }
}
