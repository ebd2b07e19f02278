//! API Handlers
//!
//! HTTP request handlers for the cache diagnostics endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::CacheStats;
use crate::error::Result;
use crate::models::{ClearResponse, HealthResponse, InvalidateRequest, InvalidateResponse};
use crate::registry::{CacheRegistry, RegistryStats};

/// Application state shared across all handlers.
#[derive(Clone, Default)]
pub struct AppState {
    /// Every cache exposed for diagnostics
    pub registry: CacheRegistry,
}

impl AppState {
    pub fn new(registry: CacheRegistry) -> Self {
        Self { registry }
    }
}

/// Handler for GET /stats
///
/// Returns aggregate and per-cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<RegistryStats> {
    Json(state.registry.stats())
}

/// Handler for GET /stats/:name
pub async fn cache_stats_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<CacheStats>> {
    let cache = state.registry.get(&name)?;
    Ok(Json(cache.stats()))
}

/// Handler for POST /invalidate
///
/// Applies the pattern to one named cache, or to every cache.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidateRequest>,
) -> Result<Json<InvalidateResponse>> {
    let pattern = req.to_pattern()?;

    let removed = match &req.cache {
        Some(name) => state.registry.get(name)?.invalidate(&pattern),
        None => state.registry.invalidate_all(&pattern),
    };

    Ok(Json(InvalidateResponse::new(pattern.to_string(), removed)))
}

/// Handler for POST /clear
pub async fn clear_all_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    Json(ClearResponse::new(state.registry.clear_all()))
}

/// Handler for POST /clear/:name
pub async fn clear_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ClearResponse>> {
    let caches = [state.registry.get(&name)?];
    for cache in &caches {
        cache.clear();
    }
    Ok(Json(ClearResponse::new(caches.len())))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.registry.len()))
}
