//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /`        - Random image (public)
//! - `GET  /health`  - Health check: store, pool mirror, task queue (public)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Panic recovery** - Panics become plain-text `500` responses
//! - **Rate limiting** - Per-IP token bucket on the image endpoint
//! - **Path normalization** - Trailing slash handling

use crate::api::handlers::{health_handler, random_image_handler};
use crate::api::middleware::{catch_panic, rate_limit, tracing};
use crate::state::AppState;
use axum::Router;
use axum::routing::get;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
///
/// # Arguments
///
/// - `state` - shared application state injected into all handlers
/// - `per_second` / `burst` - per-IP token bucket for `GET /`
pub fn app_router(state: AppState, per_second: u64, burst: u32) -> NormalizePath<Router> {
    let image_router = Router::new()
        .route("/", get(random_image_handler))
        .layer(rate_limit::layer(per_second, burst));

    let router = Router::new()
        .merge(image_router)
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(catch_panic::layer())
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
