//! Tab completion and client command list filtering.

use near_core::permissions::{BOSSBAR, BUTTON_BOSSBAR, NEAR, RELOAD};
use near_core::PlayerId;

use crate::commands::{Command, Sender};
use crate::plugin::NearPlugin;

pub(crate) fn complete(plugin: &NearPlugin, sender: Sender, label: &str, args: &[&str]) -> Vec<String> {
    // The console holds every permission.
    let can = |node: &str| match sender {
        Sender::Console => true,
        Sender::Player(id) => plugin.has(id, node),
    };
    let settings = plugin.service.settings();

    match Command::from_label(label) {
        Some(Command::Near) => {
            if can(NEAR) && args.len() == 1 && settings.custom_radius.enabled {
                vec!["<radius>".to_string()]
            } else {
                Vec::new()
            }
        }
        Some(Command::Nm) => {
            if !(can(RELOAD) || can(BOSSBAR) || can(BUTTON_BOSSBAR)) {
                return Vec::new();
            }
            let tracker = settings.bossbar.enabled && (can(BOSSBAR) || can(BUTTON_BOSSBAR));
            let on_bossbar = args
                .first()
                .is_some_and(|sub| sub.eq_ignore_ascii_case("bossbar"));

            match args.len() {
                1 => {
                    let mut suggestions = Vec::new();
                    if can(RELOAD) {
                        suggestions.push("reload".to_string());
                    }
                    if tracker {
                        suggestions.push("bossbar".to_string());
                    }
                    suggestions
                }
                2 if on_bossbar && tracker => plugin
                    .presence
                    .online_players()
                    .into_iter()
                    .map(|player| player.name)
                    .collect(),
                3 if on_bossbar && tracker => vec!["on".to_string(), "off".to_string()],
                4 if on_bossbar && tracker && args[2].eq_ignore_ascii_case("on") => {
                    vec!["-nodist".to_string()]
                }
                _ => Vec::new(),
            }
        }
        None => Vec::new(),
    }
}

/// Drops `/near` without the near permission and `/nm` without any of the
/// admin permissions.
pub(crate) fn filter_visible(plugin: &NearPlugin, player: PlayerId, commands: &mut Vec<String>) {
    let has = |node: &str| plugin.has(player, node);

    if !has(NEAR) {
        commands.retain(|c| !Command::Near.labels().contains(&c.as_str()));
    }
    if !(has(RELOAD) || has(BOSSBAR) || has(BUTTON_BOSSBAR)) {
        commands.retain(|c| !Command::Nm.labels().contains(&c.as_str()));
    }
}
