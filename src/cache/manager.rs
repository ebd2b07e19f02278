//! Cache Manager
//!
//! Ties the entry store, prefix index, generation tracker and pending
//! registry together behind a single lock.
//!
//! A `get` either returns a live entry, joins a fetch already in flight
//! for the same key, or starts the fetch itself. Only the caller that
//! started a fetch stores its result, and only if the key was not
//! invalidated while the fetch was outstanding.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::cache::{
    CacheStats, EntryStore, FetchResult, GenerationTracker, InvalidationPattern, Lookup,
    PendingRegistry, PrefixIndex, SharedFetch,
};
use crate::config::CacheConfig;
use crate::error::Result;

const DEFAULT_NAME: &str = "default";

// == Cache State ==
/// Everything guarded by the cache lock.
struct CacheState<T, E> {
    entries: EntryStore<T>,
    prefixes: PrefixIndex,
    generations: GenerationTracker,
    pending: PendingRegistry<T, E>,
    stats: CacheStats,
}

/// What `get` has to do after inspecting the state.
enum Begin<T, E> {
    Hit(T),
    Join(SharedFetch<T, E>),
    Fetch {
        fetch: SharedFetch<T, E>,
        id: u64,
        generation: u64,
    },
}

// == Cache Manager ==
/// Memoizing front for an expensive async fetch, keyed by string.
///
/// Keys follow the `"<resourceKind>:<id-or-all>"` convention; the part
/// before the first `:` drives the invalidation fast path. Cloning is cheap
/// and clones share the same storage.
pub struct CacheManager<T, E = anyhow::Error> {
    name: Arc<str>,
    default_ttl: Duration,
    state: Arc<Mutex<CacheState<T, E>>>,
}

impl<T, E> Clone for CacheManager<T, E> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            default_ttl: self.default_ttl,
            state: Arc::clone(&self.state),
        }
    }
}

impl<T, E> CacheManager<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a cache holding at most `max_entries` values, using
    /// `default_ttl` whenever `get` is given no TTL.
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        Self {
            name: Arc::from(DEFAULT_NAME),
            default_ttl,
            state: Arc::new(Mutex::new(CacheState {
                entries: EntryStore::new(max_entries),
                prefixes: PrefixIndex::new(),
                generations: GenerationTracker::new(),
                pending: PendingRegistry::new(),
                stats: CacheStats::new(),
            })),
        }
    }

    /// Creates a cache from validated configuration.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config.max_entries, config.default_ttl))
    }

    /// Labels this cache in logs and in the registry.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Arc::from(name.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    // == Get ==
    /// Returns the cached value for `key`, or runs `fetcher` to produce it.
    ///
    /// Concurrent callers for the same key share one invocation of
    /// `fetcher` and all observe its outcome, error included. Successful
    /// results are kept for `ttl` (or the default TTL); failures are never
    /// stored. `fetcher` is invoked lazily, outside the cache lock.
    pub async fn get<F, Fut>(
        &self,
        key: &str,
        fetcher: F,
        ttl: Option<Duration>,
    ) -> FetchResult<T, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
    {
        let (fetch, id, generation) = match self.begin(key, fetcher) {
            Begin::Hit(value) => return Ok(value),
            Begin::Join(fetch) => return fetch.await,
            Begin::Fetch {
                fetch,
                id,
                generation,
            } => (fetch, id, generation),
        };

        // Unregisters the fetch and its snapshot on every exit path
        let _guard = PendingGuard {
            state: &self.state,
            key,
            id,
        };

        let result = fetch.await;
        if let Ok(value) = &result {
            let ttl = ttl.unwrap_or(self.default_ttl);
            self.commit(key, id, generation, value.clone(), ttl);
        }
        result
    }

    fn begin<F, Fut>(&self, key: &str, fetcher: F) -> Begin<T, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
    {
        let mut state = self.state.lock();

        match state.entries.lookup(key) {
            Lookup::Hit(value) => {
                state.stats.record_hit();
                return Begin::Hit(value);
            }
            Lookup::Expired => {
                state.prefixes.remove(key);
                debug!(cache = %self.name, key, "entry expired");
            }
            Lookup::Absent => {}
        }

        if let Some(fetch) = state.pending.get(key) {
            state.stats.record_dedup();
            return Begin::Join(fetch);
        }

        state.stats.record_miss();
        let generation = state.generations.snapshot(key);
        let fetch = async move { fetcher().await.map_err(Arc::new) }
            .boxed()
            .shared();
        let id = state.pending.register(key, fetch.clone());
        debug!(cache = %self.name, key, generation, "cache miss, fetching");

        Begin::Fetch {
            fetch,
            id,
            generation,
        }
    }

    // == Commit ==
    /// Stores a successful fetch result unless the key was invalidated
    /// after the fetch started.
    fn commit(&self, key: &str, id: u64, generation: u64, value: T, ttl: Duration) {
        let mut state = self.state.lock();
        let state = &mut *state;
        state.pending.remove_if_owned(key, id);

        if state.generations.current(key) > generation {
            debug!(cache = %self.name, key, "discarding result of invalidated fetch");
            return;
        }

        state.prefixes.insert(key);
        if let Some(evicted) = state.entries.insert(key.to_string(), value, ttl) {
            state.prefixes.remove(&evicted);
            state.generations.forget(&evicted);
            state.stats.record_eviction();
            debug!(cache = %self.name, key = %evicted, "evicted least recently used entry");
        }
    }

    // == Invalidate ==
    /// Removes every stored or in-flight key matched by `pattern` and
    /// returns how many distinct keys were matched.
    ///
    /// In-flight fetches for those keys still complete for their callers,
    /// but their results are not stored.
    pub fn invalidate(&self, pattern: impl Into<InvalidationPattern>) -> usize {
        let pattern = pattern.into();
        let mut state = self.state.lock();
        let state = &mut *state;

        let mut matched: HashSet<String> = match pattern.indexed_prefix() {
            Some(prefix) => state
                .prefixes
                .keys_for(prefix)
                .filter(|key| pattern.matches(key))
                .cloned()
                .collect(),
            None => state
                .entries
                .keys()
                .filter(|key| pattern.matches(key))
                .cloned()
                .collect(),
        };
        matched.extend(
            state
                .pending
                .keys()
                .filter(|key| pattern.matches(key))
                .cloned(),
        );

        for key in &matched {
            state.entries.remove(key);
            state.pending.remove(key);
            state.prefixes.remove(key);
            state.generations.bump(key);
        }
        state.stats.record_invalidations(matched.len());

        debug!(cache = %self.name, %pattern, removed = matched.len(), "invalidated");
        matched.len()
    }

    /// Compiles `pattern` as a regex and invalidates every key it matches.
    pub fn invalidate_regex(&self, pattern: &str) -> Result<usize> {
        let pattern = InvalidationPattern::regex(pattern)?;
        Ok(self.invalidate(pattern))
    }

    // == Clear ==
    /// Drops all entries, in-flight registrations and generations.
    /// Hit and miss counters are kept. Running fetches are not cancelled.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        let removed = state.entries.len();
        state.entries.clear();
        state.pending.clear();
        state.prefixes.clear();
        state.generations.clear();

        info!(cache = %self.name, removed, "cache cleared");
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        let mut stats = state.stats.clone();
        stats.size = state.entries.len();
        stats.pending = state.pending.len();
        stats
    }

    /// True if a live entry is stored for `key`. Does not count as an
    /// access.
    pub fn contains(&self, key: &str) -> bool {
        self.state.lock().entries.contains_live(key)
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }
}

// == Pending Guard ==
/// Removes the owner's pending registration and releases its generation
/// snapshot on every exit path.
struct PendingGuard<'a, T, E> {
    state: &'a Mutex<CacheState<T, E>>,
    key: &'a str,
    id: u64,
}

impl<T, E> Drop for PendingGuard<'_, T, E> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.pending.remove_if_owned(self.key, self.id);
        state.generations.release(self.key);
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::anyhow;
    use futures::future::BoxFuture;
    use tokio::sync::oneshot;
    use tokio_test::{assert_pending, assert_ready, task};

    const TTL: Duration = Duration::from_secs(60);

    type Ready = futures::future::Ready<anyhow::Result<u32>>;

    type Gated = BoxFuture<'static, anyhow::Result<u32>>;

    /// Fetcher that resolves once the paired sender fires.
    fn gated(rx: oneshot::Receiver<u32>) -> impl FnOnce() -> Gated {
        move || async move { rx.await.map_err(anyhow::Error::from) }.boxed()
    }

    fn counting(counter: &Arc<AtomicUsize>, value: u32) -> impl FnOnce() -> Ready {
        let counter = Arc::clone(counter);
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            futures::future::ready(Ok(value))
        }
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let cache: CacheManager<u32> = CacheManager::new(10, TTL);
        let calls = Arc::new(AtomicUsize::new(0));

        assert_eq!(cache.get("workspace:1", counting(&calls, 1), None).await.unwrap(), 1);
        assert_eq!(cache.get("workspace:1", counting(&calls, 2), None).await.unwrap(), 1);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
        assert_eq!(stats.pending, 0);
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let cache: CacheManager<u32> = CacheManager::new(10, TTL);
        let calls = Arc::new(AtomicUsize::new(0));
        let ttl = Some(Duration::from_millis(50));

        assert_eq!(cache.get("x", counting(&calls, 1), ttl).await.unwrap(), 1);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(cache.get("x", counting(&calls, 2), ttl).await.unwrap(), 2);

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.stats().misses, 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache: CacheManager<u32> = CacheManager::new(10, TTL);

        let err = cache
            .get("user:1", || async { Err(anyhow!("503 from upstream")) }, None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "503 from upstream");
        assert_eq!(cache.stats().pending, 0);
        assert!(!cache.contains("user:1"));

        let value = cache.get("user:1", || async { Ok(9) }, None).await.unwrap();
        assert_eq!(value, 9);
        assert_eq!(cache.stats().misses, 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_fetch() {
        let cache: CacheManager<u32> = CacheManager::new(10, TTL);
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = oneshot::channel::<u32>();

        let first_calls = Arc::clone(&calls);
        let mut first = task::spawn(cache.get(
            "board:4",
            move || async move {
                first_calls.fetch_add(1, Ordering::SeqCst);
                rx.await.map_err(anyhow::Error::from)
            },
            None,
        ));
        assert_pending!(first.poll());

        let mut second = task::spawn(cache.get("board:4", counting(&calls, 0), None));
        assert_pending!(second.poll());
        assert_eq!(cache.stats().pending, 1);

        tx.send(5).unwrap();
        assert_eq!(assert_ready!(first.poll()).unwrap(), 5);
        assert!(second.is_woken());
        assert_eq!(assert_ready!(second.poll()).unwrap(), 5);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.deduped, 1);
        assert_eq!(stats.pending, 0);
        assert!(cache.contains("board:4"));
    }

    #[tokio::test]
    async fn test_invalidation_during_fetch_is_not_persisted() {
        let cache: CacheManager<u32> = CacheManager::new(10, TTL);
        let (tx, rx) = oneshot::channel::<u32>();

        let mut fetch = task::spawn(cache.get(
            "workspace:1",
            move || async move { rx.await.map_err(anyhow::Error::from) },
            None,
        ));
        assert_pending!(fetch.poll());

        assert_eq!(cache.invalidate_regex("^workspace:").unwrap(), 1);
        assert_eq!(cache.stats().pending, 0);

        tx.send(1).unwrap();
        // the original caller still receives its result
        assert_eq!(assert_ready!(fetch.poll()).unwrap(), 1);
        assert!(!cache.contains("workspace:1"));

        let value = cache.get("workspace:1", || async { Ok(2) }, None).await.unwrap();
        assert_eq!(value, 2);
    }

    #[tokio::test]
    async fn test_stale_fetch_cannot_outlive_eviction() {
        let cache: CacheManager<u32> = CacheManager::new(1, TTL);
        let (tx, rx) = oneshot::channel::<u32>();

        let mut stale = task::spawn(cache.get("a:1", gated(rx), None));
        assert_pending!(stale.poll());

        cache.invalidate("a:1");
        cache.get("a:1", || async { Ok(2) }, None).await.unwrap();
        // evicts a:1; its generation stays while the stale fetch holds it
        cache.get("b:1", || async { Ok(3) }, None).await.unwrap();
        assert!(!cache.contains("a:1"));

        tx.send(1).unwrap();
        assert_eq!(assert_ready!(stale.poll()).unwrap(), 1);
        assert!(!cache.contains("a:1"));
        assert!(cache.contains("b:1"));
    }

    #[tokio::test]
    async fn test_eviction_of_invalidated_key_spares_unrelated_fetch() {
        let cache: CacheManager<u32> = CacheManager::new(1, TTL);
        let (tx, rx) = oneshot::channel::<u32>();

        let mut unrelated = task::spawn(cache.get("z:1", gated(rx), None));
        assert_pending!(unrelated.poll());

        cache.get("a:1", || async { Ok(1) }, None).await.unwrap();
        cache.invalidate("a:1");
        cache.get("a:1", || async { Ok(2) }, None).await.unwrap();
        cache.get("b:1", || async { Ok(3) }, None).await.unwrap();
        assert!(!cache.contains("a:1"));

        tx.send(26).unwrap();
        assert_eq!(assert_ready!(unrelated.poll()).unwrap(), 26);
        drop(unrelated);
        assert!(cache.contains("z:1"), "z:1 was never invalidated");
        assert_eq!(cache.get("z:1", || async { Ok(0) }, None).await.unwrap(), 26);

        // nothing is holding a snapshot any more, so nothing is tracked
        assert!(cache.state.lock().generations.is_empty());
    }

    #[tokio::test]
    async fn test_zero_capacity_never_stores() {
        let cache: CacheManager<u32> = CacheManager::new(0, TTL);
        let calls = Arc::new(AtomicUsize::new(0));

        assert_eq!(cache.get("a:1", counting(&calls, 1), None).await.unwrap(), 1);
        assert_eq!(cache.get("a:1", counting(&calls, 2), None).await.unwrap(), 2);

        let stats = cache.stats();
        assert_eq!(stats.size, 0);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.evictions, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.invalidate(InvalidationPattern::prefix("a")), 0);
    }

    #[tokio::test]
    async fn test_dropped_owner_releases_pending_entry() {
        let cache: CacheManager<u32> = CacheManager::new(10, TTL);
        let (_tx, rx) = oneshot::channel::<u32>();

        let mut fetch = task::spawn(cache.get("card:1", gated(rx), None));
        assert_pending!(fetch.poll());
        assert_eq!(cache.stats().pending, 1);

        drop(fetch);
        assert_eq!(cache.stats().pending, 0);

        let value = cache.get("card:1", || async { Ok(8) }, None).await.unwrap();
        assert_eq!(value, 8);
    }

    #[tokio::test]
    async fn test_superseded_fetch_keeps_newer_registration() {
        let cache: CacheManager<u32> = CacheManager::new(10, TTL);
        let (old_tx, old_rx) = oneshot::channel::<u32>();
        let (new_tx, new_rx) = oneshot::channel::<u32>();

        let mut old = task::spawn(cache.get("user:1", gated(old_rx), None));
        assert_pending!(old.poll());
        cache.invalidate("user:1");

        let mut new = task::spawn(cache.get("user:1", gated(new_rx), None));
        assert_pending!(new.poll());

        old_tx.send(1).unwrap();
        assert_eq!(assert_ready!(old.poll()).unwrap(), 1);
        drop(old);
        assert_eq!(cache.stats().pending, 1, "newer fetch must stay registered");

        new_tx.send(2).unwrap();
        assert_eq!(assert_ready!(new.poll()).unwrap(), 2);
        drop(new);
        assert!(cache.contains("user:1"));
        assert_eq!(cache.get("user:1", || async { Ok(3) }, None).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_lru_eviction_scenario() {
        let cache: CacheManager<&'static str> = CacheManager::new(2, Duration::from_secs(1));

        cache.get("a", || async { Ok("fa") }, None).await.unwrap();
        cache.get("b", || async { Ok("fb") }, None).await.unwrap();
        cache.get("c", || async { Ok("fc") }, None).await.unwrap();

        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
        assert!(cache.contains("c"));
        let stats = cache.stats();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.evictions, 1);
    }

    #[tokio::test]
    async fn test_invalidate_prefix_leaves_other_namespaces() {
        let cache: CacheManager<u32> = CacheManager::new(10, TTL);
        for key in ["workspace:1", "workspace:2", "workspaces:all"] {
            cache.get(key, || async { Ok(1) }, None).await.unwrap();
        }

        let removed = cache.invalidate(regex::Regex::new("^workspace:").unwrap());

        assert_eq!(removed, 2);
        assert!(!cache.contains("workspace:1"));
        assert!(!cache.contains("workspace:2"));
        assert!(cache.contains("workspaces:all"));
        assert_eq!(cache.stats().invalidations, 2);
    }

    #[tokio::test]
    async fn test_invalidate_unanchored_regex_scans_everything() {
        let cache: CacheManager<u32> = CacheManager::new(10, TTL);
        for key in ["boards:all", "cards:all", "card:3"] {
            cache.get(key, || async { Ok(1) }, None).await.unwrap();
        }

        assert_eq!(cache.invalidate_regex(":all$").unwrap(), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("card:3"));
    }

    #[tokio::test]
    async fn test_invalidate_exact_key() {
        let cache: CacheManager<u32> = CacheManager::new(10, TTL);
        cache.get("card:1", || async { Ok(1) }, None).await.unwrap();
        cache.get("card:10", || async { Ok(10) }, None).await.unwrap();

        assert_eq!(cache.invalidate("card:1"), 1);
        assert_eq!(cache.invalidate("card:1"), 0);
        assert!(cache.contains("card:10"));
    }

    #[test]
    fn test_invalidate_malformed_regex_fails() {
        let cache: CacheManager<u32> = CacheManager::new(10, TTL);
        assert!(cache.invalidate_regex("^card:[").is_err());
    }

    #[tokio::test]
    async fn test_clear_keeps_counters() {
        let cache: CacheManager<u32> = CacheManager::new(10, TTL).with_name("boards");
        cache.get("board:1", || async { Ok(1) }, None).await.unwrap();
        cache.get("board:1", || async { Ok(1) }, None).await.unwrap();

        cache.clear();

        let stats = cache.stats();
        assert_eq!(stats.size, 0);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!(cache.is_empty());
        assert_eq!(cache.name(), "boards");
    }

    #[tokio::test]
    async fn test_fetch_outstanding_across_clear_still_stores() {
        let cache: CacheManager<u32> = CacheManager::new(10, TTL);
        let (tx, rx) = oneshot::channel::<u32>();

        let mut fetch = task::spawn(cache.get("user:2", gated(rx), None));
        assert_pending!(fetch.poll());

        cache.clear();
        tx.send(4).unwrap();
        assert_eq!(assert_ready!(fetch.poll()).unwrap(), 4);
        assert!(cache.contains("user:2"));
    }

    #[test]
    fn test_from_config_validates() {
        let config = CacheConfig {
            max_entries: 0,
            ..CacheConfig::default()
        };
        assert!(CacheManager::<u32>::from_config(&config).is_err());

        let cache = CacheManager::<u32>::from_config(&CacheConfig::default()).unwrap();
        assert_eq!(cache.default_ttl(), Duration::from_secs(300));
    }
}
