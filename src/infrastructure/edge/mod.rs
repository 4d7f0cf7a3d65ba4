//! Edge cache for fetched image bytes.
//!
//! Provides an [`EdgeCache`] trait with two implementations:
//! - [`MemoryEdgeCache`] - In-process LRU cache (default)
//! - [`RedisEdgeCache`] - Shared Redis-backed cache

mod memory_edge_cache;
mod redis_edge_cache;
mod service;

pub use memory_edge_cache::MemoryEdgeCache;
pub use redis_edge_cache::RedisEdgeCache;
pub use service::EdgeCache;

#[cfg(test)]
pub use service::MockEdgeCache;
