//! Entry Store Module
//!
//! Capacity-bounded key -> entry map combining HashMap storage with LRU
//! tracking and lazy TTL expiration.

use std::collections::HashMap;
use std::time::Duration;

use crate::cache::{CacheEntry, LruTracker};

// == Lookup ==
/// Outcome of looking a key up in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// Live entry; recency was refreshed.
    Hit(T),
    /// Entry existed but its deadline had passed; it has been removed.
    Expired,
    /// No entry for this key.
    Absent,
}

// == Entry Store ==
/// Primary cache storage with LRU eviction and TTL support.
#[derive(Debug)]
pub struct EntryStore<T> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<T>>,
    /// LRU access tracker
    lru: LruTracker,
    /// Maximum number of entries allowed
    max_entries: usize,
}

impl<T: Clone> EntryStore<T> {
    // == Constructor ==
    /// Creates an empty store holding at most `max_entries` entries.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            max_entries,
        }
    }

    // == Lookup ==
    /// Retrieves a live value and marks it as most recently used.
    ///
    /// Expired entries are dropped here; there is no background sweep.
    pub fn lookup(&mut self, key: &str) -> Lookup<T> {
        match self.entries.get(key) {
            Some(entry) if entry.is_expired() => {
                self.remove(key);
                Lookup::Expired
            }
            Some(entry) => {
                let value = entry.value.clone();
                self.lru.touch(key);
                Lookup::Hit(value)
            }
            None => Lookup::Absent,
        }
    }

    // == Insert ==
    /// Stores `value` under `key` for `ttl`, replacing any previous entry.
    ///
    /// When a new key arrives at capacity, exactly one least recently used
    /// entry is dropped first. Its key is returned so the caller can purge
    /// it from the auxiliary indexes. A zero-capacity store keeps nothing
    /// and hands the inserted key straight back.
    pub fn insert(&mut self, key: String, value: T, ttl: Duration) -> Option<String> {
        if self.max_entries == 0 {
            return Some(key);
        }
        let mut evicted = None;

        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            if let Some(oldest) = self.lru.evict_oldest() {
                self.entries.remove(&oldest);
                evicted = Some(oldest);
            }
        }

        self.lru.touch(&key);
        self.entries.insert(key, CacheEntry::new(value, ttl));

        evicted
    }

    // == Remove ==
    /// Removes an entry. Returns true if it existed.
    pub fn remove(&mut self, key: &str) -> bool {
        self.lru.remove(key);
        self.entries.remove(key).is_some()
    }

    /// Checks for a live entry without touching recency.
    pub fn contains_live(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired())
    }

    /// Iterates over every stored key, expired or not.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_entries
    }
}
