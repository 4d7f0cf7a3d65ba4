//! # Random Image Proxy
//!
//! An HTTP service that answers every `GET /` with a randomly chosen image,
//! proxied from an upstream catalogue and cached in layers.
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture principles with clear layer separation:
//!
//! - **Domain Layer** ([`domain`]) - Pool and cached image entities
//! - **Application Layer** ([`application`]) - Pool services, image resolution, background jobs
//! - **Infrastructure Layer** ([`infrastructure`]) - Key-value store, edge cache, origin HTTP client
//! - **API Layer** ([`api`]) - Handlers, response building and middleware
//!
//! ## Features
//!
//! - URL pool persisted as one JSON document in Redis, mirrored in memory
//! - Background pool refresh, merged as a bounded set union
//! - Edge cache of image bytes (in-process LRU or Redis) with long TTL
//! - Short client cache window so repeated visits see new images
//! - Static fallback image when the pool is empty or an image cannot be fetched
//!
//! ## Quick Start
//!
//! ```bash
//! export REDIS_URL="redis://localhost:6379"
//! cargo run
//! curl -o random.jpg http://localhost:3000/
//! ```
//!
//! ## Configuration
//!
//! Service configuration is loaded from environment variables via [`config::Config`].
//! See [`config`] module for available options.

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod state;
pub mod utils;

pub mod config;
pub mod server;

pub mod routes;

pub use error::AppError;
pub use state::AppState;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::services::{ImageService, PoolRefresher, PoolStore, Selector};
    pub use crate::domain::entities::{CachedImage, Pool};
    pub use crate::error::AppError;
    pub use crate::state::AppState;
}
