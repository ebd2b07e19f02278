//! Cache Registry
//!
//! Resource clients each own a `CacheManager` with their own value type.
//! The registry holds them behind one object-safe trait so diagnostics can
//! aggregate statistics and administration can clear or invalidate across
//! every cache at once.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{info, warn};

use crate::cache::{CacheManager, CacheStats, InvalidationPattern};
use crate::error::{CacheError, Result};

// == Managed Cache ==
/// Type-erased view of a cache used for administration.
pub trait ManagedCache: Send + Sync {
    fn name(&self) -> &str;
    fn stats(&self) -> CacheStats;
    fn clear(&self);
    fn invalidate(&self, pattern: &InvalidationPattern) -> usize;
}

impl<T, E> ManagedCache for CacheManager<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    fn name(&self) -> &str {
        CacheManager::name(self)
    }

    fn stats(&self) -> CacheStats {
        CacheManager::stats(self)
    }

    fn clear(&self) {
        CacheManager::clear(self)
    }

    fn invalidate(&self, pattern: &InvalidationPattern) -> usize {
        CacheManager::invalidate(self, pattern)
    }
}

// == Registry Stats ==
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegistryStats {
    /// Sum over every registered cache
    pub total: CacheStats,
    /// Per-cache snapshots, keyed by cache name
    pub caches: BTreeMap<String, CacheStats>,
}

// == Cache Registry ==
/// Named collection of caches. Cloning shares the same collection.
#[derive(Clone, Default)]
pub struct CacheRegistry {
    caches: Arc<RwLock<BTreeMap<String, Arc<dyn ManagedCache>>>>,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // == Register ==
    /// Adds `cache` under its own name, replacing any cache of that name.
    pub fn register<C>(&self, cache: C)
    where
        C: ManagedCache + 'static,
    {
        let name = cache.name().to_string();
        let previous = self.caches.write().insert(name.clone(), Arc::new(cache));
        if previous.is_some() {
            warn!(cache = %name, "replaced previously registered cache");
        }
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn ManagedCache>> {
        self.caches
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| CacheError::UnknownCache(name.to_string()))
    }

    pub fn names(&self) -> Vec<String> {
        self.caches.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.caches.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.caches.read().is_empty()
    }

    // == Stats ==
    pub fn stats(&self) -> RegistryStats {
        let mut report = RegistryStats::default();
        for (name, cache) in self.caches.read().iter() {
            let stats = cache.stats();
            report.total.merge(&stats);
            report.caches.insert(name.clone(), stats);
        }
        report
    }

    // == Clear All ==
    /// Clears every registered cache and returns how many were cleared.
    pub fn clear_all(&self) -> usize {
        let caches = self.caches.read();
        for cache in caches.values() {
            cache.clear();
        }
        info!(caches = caches.len(), "cleared all caches");
        caches.len()
    }

    // == Invalidate All ==
    /// Applies `pattern` to every registered cache; returns total removed.
    pub fn invalidate_all(&self, pattern: &InvalidationPattern) -> usize {
        let removed: usize = self
            .caches
            .read()
            .values()
            .map(|cache| cache.invalidate(pattern))
            .sum();
        info!(%pattern, removed, "invalidated across all caches");
        removed
    }
}
