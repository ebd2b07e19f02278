//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, and evictions.

use serde::{Serialize, Serializer};

// == Cache Stats ==
/// Snapshot of one cache instance's counters.
///
/// Counters live as long as the cache that owns them; `clear()` on the
/// cache leaves them untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStats {
    /// Lookups served without starting a fetch, coalesced ones included
    pub hits: u64,
    /// Lookups that started a fetch
    pub misses: u64,
    /// Hits that attached to an in-flight fetch rather than a stored entry
    pub deduped: u64,
    /// Entries dropped by the LRU policy
    pub evictions: u64,
    /// Keys removed by invalidation
    pub invalidations: u64,
    /// Current number of stored entries
    pub size: usize,
    /// Fetches currently in flight
    pub pending: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    /// A coalesced request counts as a hit and is also tallied separately.
    pub fn record_dedup(&mut self) {
        self.hits += 1;
        self.deduped += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_invalidations(&mut self, count: usize) {
        self.invalidations += count as u64;
    }

    // == Merge ==
    /// Adds another snapshot into this one, for cross-cache totals.
    pub fn merge(&mut self, other: &CacheStats) {
        self.hits += other.hits;
        self.misses += other.misses;
        self.deduped += other.deduped;
        self.evictions += other.evictions;
        self.invalidations += other.invalidations;
        self.size += other.size;
        self.pending += other.pending;
    }
}

impl Serialize for CacheStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("CacheStats", 8)?;
        state.serialize_field("hits", &self.hits)?;
        state.serialize_field("misses", &self.misses)?;
        state.serialize_field("hit_rate", &self.hit_rate())?;
        state.serialize_field("deduped", &self.deduped)?;
        state.serialize_field("evictions", &self.evictions)?;
        state.serialize_field("invalidations", &self.invalidations)?;
        state.serialize_field("size", &self.size)?;
        state.serialize_field("pending", &self.pending)?;
        state.end()
    }
}
