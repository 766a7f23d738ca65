//! # Message Catalog
//!
//! Every reply the plugin sends is looked up by a dotted key such as
//! `near-messages.cooldown` and filled with `{placeholder}` values. A config
//! file only needs to list the keys it changes; anything missing falls back
//! to the built-in English text. An empty message is never sent.
//!
//! Formatting codes (`&e`, `&#FFFF00`) are passed through untouched; turning
//! them into colours is the host's business.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single line or a list of lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageValue {
    Line(String),
    Lines(Vec<String>),
}

/// Keyed message texts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageCatalog {
    entries: BTreeMap<String, MessageValue>,
}

const DEFAULT_LINES: &[(&str, &str)] = &[
    ("plugin-messages.no-console", "This command can only be used by players."),
    ("plugin-messages.no-permission", "&cYou don't have permission to do that."),
    ("plugin-messages.reload", "&aConfiguration reloaded in &e{time} ms&a."),
    ("plugin-messages.reload-failed", "&cReload failed, the previous configuration stays active."),
    ("near-messages.cooldown", "&cPlease wait &e{time} &cseconds before using this again."),
    ("near-messages.no-players", "&eNobody is nearby."),
    (
        "near-messages.too-many-players",
        "&cMore than &e{max-players} &cplayers are nearby, try a smaller radius.",
    ),
    ("near-messages.invalid-radius", "&cThe radius must be a number."),
    ("near-messages.invalid-min-radius", "&cThe radius must be at least &e{min-radius}&c."),
    ("near-messages.invalid-max-radius", "&cThe radius must be at most &e{max-radius}&c."),
    (
        "near-messages.near-players",
        "&e{number}. &f{player} &7- &e{blocks} &7blocks {direction} {open-inventory-button} {teleport-button} {bossbar-button}",
    ),
    ("near-messages.open-inventory-button.text", "&f| &e[Inv]"),
    (
        "near-messages.open-inventory-button.hover-text",
        "&e◆ &fClick to &eopen &fthe player's inventory",
    ),
    ("near-messages.teleport-button.text", "&e[Tp]"),
    (
        "near-messages.teleport-button.hover-text",
        "&e◆ &fClick to &eteleport &fto the player",
    ),
    ("near-messages.bossbar-button.text", "&e[Bar]"),
    (
        "near-messages.bossbar-button.hover-text",
        "&e◆ &fClick to &etoggle &fthe tracker bar",
    ),
    ("plugin-messages.bossbar-messages.disabled", "&cThe tracker bar is disabled."),
    (
        "plugin-messages.bossbar-messages.player-not-found",
        "&cPlayer &e{player} &cis not online.",
    ),
    ("plugin-messages.bossbar-messages.self-target", "&cYou cannot track yourself."),
    (
        "plugin-messages.bossbar-messages.already-active",
        "&cYou are already tracking someone.",
    ),
    (
        "plugin-messages.bossbar-messages.close",
        "&c{player} is too close to start tracking.",
    ),
    (
        "plugin-messages.bossbar-messages.too-far",
        "&c{player} is too far away to start tracking.",
    ),
    ("plugin-messages.bossbar-messages.activated", "&aNow tracking &e{player}&a."),
    ("plugin-messages.bossbar-messages.turned-off", "&eStopped tracking &f{player}&e."),
    (
        "plugin-messages.bossbar-messages.already-off",
        "&cYou are not tracking &e{player}&c.",
    ),
    ("plugin-messages.bossbar-messages.timeout", "&eTracking &f{player} &etimed out."),
    (
        "plugin-messages.bossbar-messages.player-offline",
        "&e{player} &cwent offline, tracking stopped.",
    ),
    (
        "plugin-messages.bossbar-messages.player-changed-world",
        "&e{player} &cleft this world, tracking stopped.",
    ),
    (
        "plugin-messages.bossbar-messages.gone-close",
        "&aYou reached &e{player}&a, tracking stopped.",
    ),
    (
        "plugin-messages.bossbar-messages.gone-far",
        "&e{player} &cis too far away now, tracking stopped.",
    ),
    (
        "plugin-messages.bossbar-messages.self-changed-world",
        "&cYou changed world, tracking of &e{player} &cstopped.",
    ),
];

const DEFAULT_LISTS: &[(&str, &[&str])] = &[
    (
        "near-messages.near",
        &["&ePlayers within &f{radius} &eblocks:", " {near-players}"],
    ),
    (
        "plugin-messages.help-for-players",
        &["&e/near [radius] &f- list players around you"],
    ),
    (
        "plugin-messages.help-for-admins",
        &[
            "&e/near [radius] &f- list players around you",
            "&e/nm reload &f- reload the configuration",
            "&e/nm bossbar <player> [on|off] [-nodist] &f- toggle the tracker bar",
        ],
    ),
];

impl Default for MessageCatalog {
    fn default() -> Self {
        let mut entries = BTreeMap::new();
        for (key, text) in DEFAULT_LINES {
            entries.insert(key.to_string(), MessageValue::Line(text.to_string()));
        }
        for (key, lines) in DEFAULT_LISTS {
            entries.insert(
                key.to_string(),
                MessageValue::Lines(lines.iter().map(|l| l.to_string()).collect()),
            );
        }
        Self { entries }
    }
}

impl MessageCatalog {
    pub fn set(&mut self, key: impl Into<String>, value: MessageValue) {
        self.entries.insert(key.into(), value);
    }

    /// Text for `key`; lists are joined with newlines. Empty when unknown.
    pub fn text(&self, key: &str) -> String {
        match self.lookup(key) {
            Some(MessageValue::Line(text)) => text,
            Some(MessageValue::Lines(lines)) => lines.join("\n"),
            None => String::new(),
        }
    }

    /// Lines for `key`. A single-line entry is a one-line list.
    pub fn lines(&self, key: &str) -> Vec<String> {
        match self.lookup(key) {
            Some(MessageValue::Line(text)) => vec![text],
            Some(MessageValue::Lines(lines)) => lines,
            None => Vec::new(),
        }
    }

    /// Filled text for `key`, or `None` when the message is empty.
    pub fn render(&self, key: &str, placeholders: &[(&str, String)]) -> Option<String> {
        let text = self.text(key);
        (!text.is_empty()).then(|| fill(&text, placeholders))
    }

    fn lookup(&self, key: &str) -> Option<MessageValue> {
        if let Some(value) = self.entries.get(key) {
            return Some(value.clone());
        }
        if let Some((_, text)) = DEFAULT_LINES.iter().find(|(k, _)| *k == key) {
            return Some(MessageValue::Line(text.to_string()));
        }
        DEFAULT_LISTS
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, lines)| MessageValue::Lines(lines.iter().map(|l| l.to_string()).collect()))
    }
}

/// Replaces every `(placeholder, value)` pair in `template`.
pub fn fill(template: &str, placeholders: &[(&str, String)]) -> String {
    placeholders
        .iter()
        .fold(template.to_string(), |text, (placeholder, value)| {
            text.replace(placeholder, value)
        })
}
