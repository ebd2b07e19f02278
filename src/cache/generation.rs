//! Invalidation Generation Tracker
//!
//! Per-key counter bumped on every invalidation. A fetch snapshots the
//! counter when it starts and refuses to store its result if the counter
//! moved in the meantime.
//!
//! A key's counter is only pruned once no running fetch holds a snapshot
//! of it, so pruning can never make an older snapshot look current again.
//! Bumps draw from one clock so that a reset by `clear` is still outranked
//! by later invalidations.

use std::collections::HashMap;

#[derive(Debug, Default)]
struct Tracked {
    generation: u64,
    /// Running fetches that snapshotted this key.
    holders: usize,
    /// Evicted while held; pruned once the last holder releases.
    forgotten: bool,
}

#[derive(Debug, Default)]
pub struct GenerationTracker {
    keys: HashMap<String, Tracked>,
    /// Last generation handed out, across all keys.
    clock: u64,
}

impl GenerationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation of `key`; 0 if untracked.
    pub fn current(&self, key: &str) -> u64 {
        self.keys.get(key).map_or(0, |tracked| tracked.generation)
    }

    // == Snapshot ==
    /// Returns the current generation of `key` and holds it until the
    /// matching `release`.
    pub fn snapshot(&mut self, key: &str) -> u64 {
        let tracked = self.keys.entry(key.to_string()).or_default();
        tracked.holders += 1;
        tracked.generation
    }

    /// Drops one hold on `key`, pruning it if nothing is left to compare
    /// against it.
    pub fn release(&mut self, key: &str) {
        let Some(tracked) = self.keys.get_mut(key) else {
            return;
        };
        tracked.holders = tracked.holders.saturating_sub(1);
        if tracked.holders == 0 && (tracked.forgotten || tracked.generation == 0) {
            self.keys.remove(key);
        }
    }

    /// Advances the generation of `key` and returns the new value.
    pub fn bump(&mut self, key: &str) -> u64 {
        self.clock += 1;
        self.keys.entry(key.to_string()).or_default().generation = self.clock;
        self.clock
    }

    /// Stops tracking an evicted `key`, deferred while a fetch holds it.
    pub fn forget(&mut self, key: &str) {
        if let Some(tracked) = self.keys.get_mut(key) {
            if tracked.holders == 0 {
                self.keys.remove(key);
            } else {
                tracked.forgotten = true;
            }
        }
    }

    /// Resets every counter to 0. Fetches already in flight store normally
    /// unless their key is invalidated again afterwards. Holds survive so
    /// their releases stay balanced.
    pub fn clear(&mut self) {
        self.keys.retain(|_, tracked| tracked.holders > 0);
        for tracked in self.keys.values_mut() {
            tracked.generation = 0;
        }
    }

    pub fn holders(&self, key: &str) -> usize {
        self.keys.get(key).map_or(0, |tracked| tracked.holders)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
