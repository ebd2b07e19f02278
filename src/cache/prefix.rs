//! Prefix Index Module
//!
//! Maps a key's namespace prefix (everything before the first `:`) to the
//! set of stored keys sharing it, so prefix-scoped invalidation does not
//! have to scan the whole store.

use std::collections::{HashMap, HashSet};

use crate::cache::KEY_DELIMITER;

/// Returns the namespace prefix of `key`.
///
/// `"workspace:12"` -> `"workspace"`, `"customFields:board:4"` ->
/// `"customFields"`. A key without a delimiter is its own prefix.
pub fn key_prefix(key: &str) -> &str {
    key.split_once(KEY_DELIMITER)
        .map_or(key, |(prefix, _)| prefix)
}

// == Prefix Index ==
#[derive(Debug, Default)]
pub struct PrefixIndex {
    buckets: HashMap<String, HashSet<String>>,
}

impl PrefixIndex {
    pub fn new() -> Self {
        Self::default()
    }

    // == Insert ==
    /// Adds `key` to the bucket of its prefix.
    pub fn insert(&mut self, key: &str) {
        self.buckets
            .entry(key_prefix(key).to_string())
            .or_default()
            .insert(key.to_string());
    }

    // == Remove ==
    /// Removes `key` from its bucket, dropping the bucket once empty.
    pub fn remove(&mut self, key: &str) {
        let prefix = key_prefix(key);
        if let Some(bucket) = self.buckets.get_mut(prefix) {
            bucket.remove(key);
            if bucket.is_empty() {
                self.buckets.remove(prefix);
            }
        }
    }

    // == Keys For ==
    /// Iterates over the keys indexed under `prefix`.
    pub fn keys_for<'a>(&'a self, prefix: &str) -> impl Iterator<Item = &'a String> + 'a {
        self.buckets.get(prefix).into_iter().flatten()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.buckets
            .get(key_prefix(key))
            .is_some_and(|bucket| bucket.contains(key))
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Total number of indexed keys across all buckets.
    pub fn len(&self) -> usize {
        self.buckets.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }
}
