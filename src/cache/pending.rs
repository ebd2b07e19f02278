//! Pending Request Registry
//!
//! Tracks fetches that have started but not finished, so concurrent callers
//! asking for the same key attach to one shared computation.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{BoxFuture, Shared};

/// Result produced by a fetch. Errors are shared between coalesced callers.
pub type FetchResult<T, E> = Result<T, Arc<E>>;

/// Cloneable handle to an in-flight fetch.
pub type SharedFetch<T, E> = Shared<BoxFuture<'static, FetchResult<T, E>>>;

// == Pending Fetch ==
pub struct PendingFetch<T, E> {
    /// Unique per registry; lets the owner remove only its own entry.
    pub id: u64,
    pub future: SharedFetch<T, E>,
}

// == Pending Registry ==
pub struct PendingRegistry<T, E> {
    fetches: HashMap<String, PendingFetch<T, E>>,
    next_id: u64,
}

impl<T, E> Default for PendingRegistry<T, E> {
    fn default() -> Self {
        Self {
            fetches: HashMap::new(),
            next_id: 0,
        }
    }
}

impl<T: Clone, E> PendingRegistry<T, E> {
    /// Returns a handle to the in-flight fetch for `key`, if any.
    pub fn get(&self, key: &str) -> Option<SharedFetch<T, E>> {
        self.fetches.get(key).map(|pending| pending.future.clone())
    }
}

impl<T, E> PendingRegistry<T, E> {
    pub fn new() -> Self {
        Self::default()
    }

    // == Register ==
    /// Records `future` as the in-flight fetch for `key` and returns its id.
    ///
    /// Any previous entry for `key` is replaced; callers check `get` first
    /// while holding the cache lock, so this only happens once the old
    /// entry was dropped by an invalidation or a clear.
    pub fn register(&mut self, key: &str, future: SharedFetch<T, E>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        self.fetches
            .insert(key.to_string(), PendingFetch { id, future });
        id
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.fetches.remove(key).is_some()
    }

    // == Remove If Owned ==
    /// Removes the entry for `key` only if it still belongs to fetch `id`.
    ///
    /// A fetch that was invalidated and superseded must not unregister the
    /// newer fetch that replaced it.
    pub fn remove_if_owned(&mut self, key: &str, id: u64) -> bool {
        match self.fetches.get(key) {
            Some(pending) if pending.id == id => {
                self.fetches.remove(key);
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fetches.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fetches.keys()
    }

    pub fn len(&self) -> usize {
        self.fetches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fetches.is_empty()
    }

    pub fn clear(&mut self) {
        self.fetches.clear();
    }
}
