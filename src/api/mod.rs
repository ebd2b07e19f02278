//! API Module
//!
//! HTTP surface for process-level cache diagnostics and administration.
//!
//! # Endpoints
//! - `GET /stats` - Aggregate and per-cache statistics
//! - `GET /stats/:name` - Statistics of one cache
//! - `POST /invalidate` - Invalidate keys across caches
//! - `POST /clear`, `POST /clear/:name` - Clear caches
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::{create_router, serve};
