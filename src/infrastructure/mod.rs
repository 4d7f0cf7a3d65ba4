//! Infrastructure layer for external collaborators.
//!
//! Each collaborator is defined by a trait with concrete implementations
//! selected at startup from configuration.
//!
//! # Modules
//!
//! - [`store`] - Key-value store holding the pool (Redis and in-process)
//! - [`edge`] - Edge cache for image bytes (LRU and Redis)
//! - [`origin`] - HTTP client for the listing endpoint and image origin

pub mod edge;
pub mod origin;
pub mod store;
