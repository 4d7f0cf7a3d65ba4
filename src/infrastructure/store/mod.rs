//! Durable key-value store holding the image pool document.
//!
//! Provides a [`KvStore`] trait with two implementations:
//! - [`RedisStore`] - Production Redis-backed store
//! - [`MemoryStore`] - Process-local store for development and tests

mod memory_store;
mod redis_store;
mod service;

pub use memory_store::MemoryStore;
pub(crate) use redis_store::connect_manager;
pub use redis_store::RedisStore;
pub use service::{KvStore, StoreError, StoreResult};

#[cfg(test)]
pub use service::MockKvStore;
