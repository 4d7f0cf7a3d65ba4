//! Key-value store trait and error types.

use async_trait::async_trait;
use serde_json::Value;

/// Errors that can occur while talking to the key-value store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store connection error: {0}")]
    ConnectionError(String),

    #[error("Store operation error: {0}")]
    OperationError(String),

    #[error("Store payload error: {0}")]
    Serialization(String),
}

/// Result type for key-value store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Durable key-value store holding JSON documents.
///
/// No transactional guarantees are assumed: `put_json` is an unconditional
/// last-write-wins overwrite.
///
/// # Implementations
///
/// - [`crate::infrastructure::store::RedisStore`] - Redis-backed store
/// - [`crate::infrastructure::store::MemoryStore`] - Process-local store for development and tests
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Reads the JSON document stored under `key`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))` when the key exists
    /// - `Ok(None)` when it does not
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend cannot be reached or the stored
    /// payload is not valid JSON. Callers decide whether to degrade.
    async fn get_json(&self, key: &str) -> StoreResult<Option<Value>>;

    /// Overwrites the document stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write does not reach the backend.
    async fn put_json(&self, key: &str, value: &Value) -> StoreResult<()>;

    /// Checks if the store backend is reachable.
    async fn health_check(&self) -> bool;
}
