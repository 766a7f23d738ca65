use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use near_core::PlayerId;

/// Per-player command cooldown. Times are scheduler clock readings.
#[derive(Debug, Default)]
pub struct CooldownTracker {
    last_used: DashMap<PlayerId, Duration>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a use at `now` unless the previous use is less than `window`
    /// ago, in which case the whole seconds left are returned and nothing is
    /// recorded.
    pub fn try_acquire(&self, id: PlayerId, now: Duration, window: Duration) -> Result<(), u64> {
        match self.last_used.entry(id) {
            Entry::Occupied(mut entry) => {
                let elapsed = now.saturating_sub(*entry.get());
                if elapsed < window {
                    return Err((window - elapsed).as_secs());
                }
                entry.insert(now);
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
            }
        }
        Ok(())
    }

    /// Forgets `id`'s last use.
    pub fn evict(&self, id: PlayerId) -> bool {
        self.last_used.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.last_used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_used.is_empty()
    }

    pub fn clear(&self) {
        self.last_used.clear();
    }
}
