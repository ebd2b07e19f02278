//! Cache Module
//!
//! In-process response cache with TTL expiration, LRU eviction, request
//! coalescing and prefix-indexed invalidation.

mod entry;
mod generation;
mod lru;
mod manager;
mod pattern;
mod pending;
mod prefix;
mod stats;
mod store;


// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use generation::GenerationTracker;
pub use lru::LruTracker;
pub use manager::CacheManager;
pub use pattern::InvalidationPattern;
pub use pending::{FetchResult, PendingRegistry, SharedFetch};
pub use prefix::{key_prefix, PrefixIndex};
pub use stats::CacheStats;
pub use store::{EntryStore, Lookup};

// == Public Constants ==
/// Separates a key's namespace prefix from the rest, as in `"board:45"`.
pub const KEY_DELIMITER: char = ':';
