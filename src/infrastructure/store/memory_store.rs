//! Process-local key-value store for development and testing.

use super::service::{KvStore, StoreResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// A [`KvStore`] that keeps documents in process memory.
///
/// Nothing survives a restart, so this is only suitable for local
/// development and tests. Selected with `KV_BACKEND=memory`.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    /// Creates an empty MemoryStore instance.
    pub fn new() -> Self {
        debug!("Using MemoryStore (pool is not durable)");
        Self::default()
    }

    /// Creates a store pre-populated with one document.
    pub fn with_entry(key: &str, value: Value) -> Self {
        let store = Self::new();
        store
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
        store
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get_json(&self, key: &str) -> StoreResult<Option<Value>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    async fn put_json(&self, key: &str, value: &Value) -> StoreResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}
