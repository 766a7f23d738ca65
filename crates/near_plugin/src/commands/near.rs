//! `/near [radius]`: lists the players around the sender.
//!
//! Checks run in order: player sender, permission, cooldown, radius, scan.
//! The cooldown is only consumed by an invocation that passes its check.

use std::sync::Arc;
use std::time::Duration;

use near_core::host::{ChatLine, Segment};
use near_core::permissions::{
    BUTTON_BOSSBAR, BUTTON_OPEN_INVENTORY, BUTTON_TELEPORT, BYPASS_COOLDOWN, NEAR,
};
use near_core::{Candidate, NearError, PlayerId};
use tracing::warn;

use super::Sender;
use crate::messages::{fill, MessageCatalog};
use crate::plugin::NearPlugin;

const NEAR_PLAYERS: &str = "{near-players}";

struct Button {
    placeholder: &'static str,
    permission: &'static str,
    key: &'static str,
    command: &'static str,
}

const BUTTONS: [Button; 3] = [
    Button {
        placeholder: "{open-inventory-button}",
        permission: BUTTON_OPEN_INVENTORY,
        key: "near-messages.open-inventory-button",
        command: "/invsee {player}",
    },
    Button {
        placeholder: "{teleport-button}",
        permission: BUTTON_TELEPORT,
        key: "near-messages.teleport-button",
        command: "/tp {player}",
    },
    Button {
        placeholder: "{bossbar-button}",
        permission: BUTTON_BOSSBAR,
        key: "near-messages.bossbar-button",
        command: "/nm bossbar {player}",
    },
];

pub(crate) fn execute(plugin: &NearPlugin, sender: Sender, label: &str, args: &[&str]) {
    let Sender::Player(viewer) = sender else {
        plugin.messenger.send(sender, "plugin-messages.no-console", &[]);
        return;
    };

    if !plugin.allowed(viewer, NEAR) {
        warn!(
            "⚠️ Player {} attempted /{} without {} permission or operator status",
            plugin.player_name(viewer),
            label,
            NEAR
        );
        plugin.messenger.send(sender, "plugin-messages.no-permission", &[]);
        return;
    }

    let settings = plugin.service.settings();
    if settings.cooldown.enabled && !plugin.has(viewer, BYPASS_COOLDOWN) {
        let window = Duration::from_secs(settings.cooldown.seconds);
        if let Err(left) = plugin
            .cooldowns
            .try_acquire(viewer, plugin.scheduler.now(), window)
        {
            plugin
                .messenger
                .send(sender, "near-messages.cooldown", &[("{time}", left.to_string())]);
            return;
        }
    }

    let radius = match plugin.service.resolve_radius(viewer, args.first().copied()) {
        Ok(radius) => radius,
        Err(e) => return reply_error(plugin, viewer, &e),
    };

    let candidates = match plugin.service.scan_nearby(viewer, radius) {
        Ok(candidates) => candidates,
        Err(e) => return reply_error(plugin, viewer, &e),
    };

    if candidates.is_empty() {
        plugin.messenger.send(sender, "near-messages.no-players", &[]);
        return;
    }

    send_listing(plugin, viewer, &candidates, radius);
}

fn reply_error(plugin: &NearPlugin, viewer: PlayerId, error: &NearError) {
    plugin
        .messenger
        .send(Sender::Player(viewer), error.message_key(), &error.placeholders());
}

/// Sends the `near-messages.near` lines. The line holding `{near-players}`
/// expands to one line per candidate, keeping a single leading space when
/// the placeholder had one.
fn send_listing(plugin: &NearPlugin, viewer: PlayerId, candidates: &[Candidate], radius: f64) {
    let catalog = plugin.messenger.catalog();
    let lines = catalog.lines("near-messages.near");

    let prefix = lines
        .iter()
        .find_map(|line| {
            line.find(NEAR_PLAYERS)
                .map(|index| if line[..index].ends_with(' ') { " " } else { "" })
        })
        .unwrap_or("");

    let entries: Vec<Vec<Segment>> = candidates
        .iter()
        .enumerate()
        .map(|(index, candidate)| candidate_segments(plugin, &catalog, viewer, index + 1, candidate))
        .collect();

    let radius_text = (radius as i64).to_string();
    for line in &lines {
        if !line.contains(NEAR_PLAYERS) {
            let text = line.replace("{radius}", &radius_text);
            plugin
                .messenger
                .send_line(viewer, ChatLine::text(text), "near-messages.near");
            continue;
        }

        for entry in &entries {
            let mut segments = Vec::with_capacity(entry.len() + 1);
            if !prefix.is_empty() {
                segments.push(Segment::Text(prefix.to_string()));
            }
            segments.extend(entry.iter().cloned());
            plugin
                .messenger
                .send_line(viewer, ChatLine { segments }, "near-messages.near-players");
        }
    }
}

/// One candidate's line: the `near-players` format with its button
/// placeholders turned into buttons the viewer is allowed to use.
fn candidate_segments(
    plugin: &NearPlugin,
    catalog: &Arc<MessageCatalog>,
    viewer: PlayerId,
    number: usize,
    candidate: &Candidate,
) -> Vec<Segment> {
    let text = fill(
        &catalog.text("near-messages.near-players"),
        &[
            ("{number}", number.to_string()),
            ("{player}", candidate.name.clone()),
            ("{blocks}", candidate.distance.to_string()),
            ("{direction}", candidate.direction.clone()),
        ],
    );

    let mut segments = Vec::new();
    let mut rest = text.as_str();
    loop {
        let next = BUTTONS
            .iter()
            .filter_map(|button| rest.find(button.placeholder).map(|index| (index, button)))
            .min_by_key(|(index, _)| *index);

        let Some((index, button)) = next else {
            if !rest.is_empty() {
                segments.push(Segment::Text(rest.to_string()));
            }
            break;
        };

        if index > 0 {
            segments.push(Segment::Text(rest[..index].to_string()));
        }
        if plugin.has(viewer, button.permission) {
            segments.push(Segment::Button {
                text: catalog.text(&format!("{}.text", button.key)),
                hover: catalog.text(&format!("{}.hover-text", button.key)),
                command: button.command.replace("{player}", &candidate.name),
            });
        }
        rest = &rest[index + button.placeholder.len()..];
    }

    segments
}
