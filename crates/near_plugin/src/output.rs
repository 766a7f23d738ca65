//! Rendering catalog messages to viewers, with their sound cues.

use std::sync::Arc;

use near_core::host::{ChatLine, Display};
use near_core::{Notice, Notifier, PlayerId};
use parking_lot::RwLock;
use tracing::info;

use crate::commands::Sender;
use crate::messages::MessageCatalog;
use crate::sounds::SoundSettings;

/// Sends catalog messages and plays their cues. Also the tracker notifier.
pub struct Messenger {
    catalog: RwLock<Arc<MessageCatalog>>,
    sounds: RwLock<Arc<SoundSettings>>,
    display: Arc<dyn Display>,
}

impl Messenger {
    pub fn new(catalog: MessageCatalog, sounds: SoundSettings, display: Arc<dyn Display>) -> Self {
        Self {
            catalog: RwLock::new(Arc::new(catalog)),
            sounds: RwLock::new(Arc::new(sounds)),
            display,
        }
    }

    pub fn replace(&self, catalog: MessageCatalog, sounds: SoundSettings) {
        *self.catalog.write() = Arc::new(catalog);
        *self.sounds.write() = Arc::new(sounds);
    }

    pub fn catalog(&self) -> Arc<MessageCatalog> {
        self.catalog.read().clone()
    }

    /// Sends the message under `key`. Empty messages are skipped, cue
    /// included. Console replies go to the log.
    pub fn send(&self, sender: Sender, key: &str, placeholders: &[(&str, String)]) {
        let Some(text) = self.catalog().render(key, placeholders) else {
            return;
        };
        match sender {
            Sender::Console => info!("💬 {}", text),
            Sender::Player(viewer) => {
                self.display.send_line(viewer, ChatLine::text(text));
                self.play(viewer, key);
            }
        }
    }

    /// Sends every line of a list message, one cue per line.
    pub fn send_lines(&self, viewer: PlayerId, key: &str) {
        for line in self.catalog().lines(key) {
            self.display.send_line(viewer, ChatLine::text(line));
            self.play(viewer, key);
        }
    }

    /// Sends a prebuilt line and plays the cue of `sound_key`.
    pub fn send_line(&self, viewer: PlayerId, line: ChatLine, sound_key: &str) {
        self.display.send_line(viewer, line);
        self.play(viewer, sound_key);
    }

    pub fn play(&self, viewer: PlayerId, key: &str) {
        let sounds = self.sounds.read().clone();
        if let Some(cue) = sounds.cue(key) {
            self.display
                .play_sound(viewer, &cue.sound, cue.volume, cue.pitch);
        }
    }
}

impl Notifier for Messenger {
    fn notify(&self, viewer: PlayerId, notice: Notice, target_name: &str) {
        self.send(
            Sender::Player(viewer),
            notice.message_key(),
            &[("{player}", target_name.to_string())],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sounds::SoundCue;
    use near_core::host::memory::{DisplayEvent, RecordingDisplay};

    fn messenger() -> (Arc<RecordingDisplay>, Messenger) {
        let display = Arc::new(RecordingDisplay::new());
        let mut sounds = SoundSettings::default();
        sounds.cues.insert(
            "plugin-messages.bossbar-messages.timeout".into(),
            SoundCue {
                enabled: true,
                sound: "BLOCK_BELL_USE".into(),
                ..SoundCue::default()
            },
        );
        let messenger = Messenger::new(MessageCatalog::default(), sounds, display.clone());
        (display, messenger)
    }

    #[test]
    fn notices_render_with_target_name_and_cue() {
        let (display, messenger) = messenger();
        let viewer = PlayerId::new();
        messenger.notify(viewer, Notice::Timeout, "Steve");

        assert_eq!(
            display.events(),
            vec![
                DisplayEvent::Line(viewer, ChatLine::text("&eTracking &fSteve &etimed out.")),
                DisplayEvent::Sound(viewer, "BLOCK_BELL_USE".into()),
            ]
        );
    }

    #[test]
    fn console_replies_do_not_reach_the_display() {
        let (display, messenger) = messenger();
        messenger.send(Sender::Console, "plugin-messages.no-console", &[]);
        assert!(display.is_empty());
    }

    #[test]
    fn list_messages_send_one_line_each() {
        let (display, messenger) = messenger();
        let viewer = PlayerId::new();
        messenger.send_lines(viewer, "plugin-messages.help-for-admins");
        assert_eq!(display.lines_for(viewer).len(), 3);
    }
}
