//! Sound cues keyed by message key.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One sound cue. Disabled unless the config turns it on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundCue {
    pub enabled: bool,
    pub sound: String,
    pub volume: f32,
    pub pitch: f32,
}

impl Default for SoundCue {
    fn default() -> Self {
        Self {
            enabled: false,
            sound: String::new(),
            volume: 1.0,
            pitch: 1.0,
        }
    }
}

/// Message key → cue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SoundSettings {
    pub cues: BTreeMap<String, SoundCue>,
}

impl Default for SoundSettings {
    fn default() -> Self {
        let cue = |sound: &str| SoundCue {
            enabled: false,
            sound: sound.to_string(),
            volume: 1.0,
            pitch: 1.0,
        };

        let mut cues = BTreeMap::new();
        cues.insert("near-messages.near".to_string(), cue("BLOCK_NOTE_BLOCK_PLING"));
        cues.insert(
            "near-messages.near-players".to_string(),
            cue("BLOCK_NOTE_BLOCK_HAT"),
        );
        cues.insert("near-messages.cooldown".to_string(), cue("ENTITY_VILLAGER_NO"));
        cues.insert(
            "plugin-messages.no-permission".to_string(),
            cue("ENTITY_VILLAGER_NO"),
        );
        cues.insert(
            "plugin-messages.bossbar-messages.activated".to_string(),
            cue("BLOCK_BEACON_ACTIVATE"),
        );
        cues.insert(
            "plugin-messages.bossbar-messages.turned-off".to_string(),
            cue("BLOCK_BEACON_DEACTIVATE"),
        );
        Self { cues }
    }
}

impl SoundSettings {
    /// The cue for `key` when it is enabled and names a sound.
    pub fn cue(&self, key: &str) -> Option<&SoundCue> {
        self.cues
            .get(key)
            .filter(|cue| cue.enabled && !cue.sound.trim().is_empty())
    }
}
