//! `/nm`, `/nm reload` and `/nm bossbar <player> [on|off] [-nodist]`.

use near_core::permissions::{BOSSBAR, BUTTON_BOSSBAR, RELOAD};
use near_core::PlayerId;

use super::Sender;
use crate::plugin::NearPlugin;

pub(crate) fn execute(plugin: &NearPlugin, sender: Sender, args: &[&str]) {
    let Sender::Player(viewer) = sender else {
        plugin.messenger.send(sender, "plugin-messages.no-console", &[]);
        return;
    };

    match args.first() {
        Some(sub) if sub.eq_ignore_ascii_case("reload") => reload(plugin, viewer),
        Some(sub) if sub.eq_ignore_ascii_case("bossbar") => bossbar(plugin, viewer, args),
        _ => help(plugin, viewer),
    }
}

fn help(plugin: &NearPlugin, viewer: PlayerId) {
    let tracker_enabled = plugin.service.settings().bossbar.enabled;
    let admin = plugin.has(viewer, RELOAD)
        || (tracker_enabled && (plugin.has(viewer, BOSSBAR) || plugin.has(viewer, BUTTON_BOSSBAR)));

    let key = if admin {
        "plugin-messages.help-for-admins"
    } else {
        "plugin-messages.help-for-players"
    };
    plugin.messenger.send_lines(viewer, key);
}

fn reload(plugin: &NearPlugin, viewer: PlayerId) {
    let sender = Sender::Player(viewer);
    if !plugin.allowed(viewer, RELOAD) {
        plugin.messenger.send(sender, "plugin-messages.no-permission", &[]);
        return;
    }

    match plugin.reload() {
        Ok(elapsed) => plugin.messenger.send(
            sender,
            "plugin-messages.reload",
            &[("{time}", elapsed.as_millis().to_string())],
        ),
        Err(_) => plugin
            .messenger
            .send(sender, "plugin-messages.reload-failed", &[]),
    }
}

fn bossbar(plugin: &NearPlugin, viewer: PlayerId, args: &[&str]) {
    let sender = Sender::Player(viewer);
    if !plugin.service.settings().bossbar.enabled {
        plugin
            .messenger
            .send(sender, "plugin-messages.bossbar-messages.disabled", &[]);
        return;
    }

    if !(plugin.allowed(viewer, BOSSBAR) || plugin.has(viewer, BUTTON_BOSSBAR)) {
        plugin.messenger.send(sender, "plugin-messages.no-permission", &[]);
        return;
    }

    if !(2..=4).contains(&args.len()) {
        help(plugin, viewer);
        return;
    }

    let Some(target) = plugin.presence.player_by_name(args[1]) else {
        plugin.messenger.send(
            sender,
            "plugin-messages.bossbar-messages.player-not-found",
            &[("{player}", args[1].to_string())],
        );
        return;
    };

    if target.id == viewer {
        plugin
            .messenger
            .send(sender, "plugin-messages.bossbar-messages.self-target", &[]);
        return;
    }

    let turn_on = match args.get(2) {
        Some(toggle) => toggle.eq_ignore_ascii_case("on"),
        None => !plugin.service.has_active_tracker(viewer),
    };
    let ignore_distance = args.len() == 4 && args[3].eq_ignore_ascii_case("-nodist");
    let name = [("{player}", target.name.clone())];

    if turn_on {
        match plugin.service.start_tracker(viewer, target.id, ignore_distance) {
            Ok(_) => plugin
                .messenger
                .send(sender, "plugin-messages.bossbar-messages.activated", &name),
            Err(e) => {
                let mut placeholders = e.placeholders();
                placeholders.retain(|(key, _)| *key != "{player}");
                placeholders.extend(name);
                plugin.messenger.send(sender, e.message_key(), &placeholders);
            }
        }
        return;
    }

    let key = match plugin.service.stop_tracker(viewer, target.id) {
        Ok(()) => "plugin-messages.bossbar-messages.turned-off",
        Err(_) => "plugin-messages.bossbar-messages.already-off",
    };
    plugin.messenger.send(sender, key, &name);
}
