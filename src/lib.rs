//! API Cache - client-side response cache for REST API clients
//!
//! Memoizes fetch results with TTL expiration, bounds memory with LRU
//! eviction, coalesces concurrent identical requests into one fetch, and
//! supports prefix-indexed pattern invalidation after writes.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod registry;
pub mod telemetry;

pub use api::{create_router, serve, AppState};
pub use cache::{CacheManager, CacheStats, InvalidationPattern};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use registry::{CacheRegistry, ManagedCache, RegistryStats};
pub use telemetry::init_tracing;
