//! API Routes
//!
//! Configures the Axum router for the diagnostics endpoints and serves it.

use std::future::Future;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use super::handlers::{
    cache_stats_handler, clear_all_handler, clear_handler, health_handler, invalidate_handler,
    stats_handler, AppState,
};
use crate::error::{CacheError, Result};
use crate::registry::CacheRegistry;

/// Creates the diagnostics router.
///
/// # Endpoints
/// - `GET /stats` - Aggregate and per-cache statistics
/// - `GET /stats/:name` - Statistics of one cache
/// - `POST /invalidate` - Invalidate by exact key or regex
/// - `POST /clear` - Clear every cache
/// - `POST /clear/:name` - Clear one cache
/// - `GET /health` - Health check endpoint
pub fn create_router(registry: CacheRegistry) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/stats", get(stats_handler))
        .route("/stats/:name", get(cache_stats_handler))
        .route("/invalidate", post(invalidate_handler))
        .route("/clear", post(clear_all_handler))
        .route("/clear/:name", post(clear_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(registry))
}

/// Serves the diagnostics router on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, registry: CacheRegistry, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener
        .local_addr()
        .map_err(|e| CacheError::Internal(e.to_string()))?;
    info!("Cache diagnostics listening on http://{}", addr);

    axum::serve(listener, create_router(registry))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| CacheError::Internal(e.to_string()))?;

    info!("Cache diagnostics shut down");
    Ok(())
}
