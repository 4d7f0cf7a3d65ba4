//! Pool persistence with a process-local memory mirror.

use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

use crate::domain::entities::Pool;
use crate::infrastructure::store::{KvStore, StoreError};

/// Reads and writes the [`Pool`] document.
///
/// # Read Order
///
/// 1. Memory mirror, when it holds a non-empty pool
/// 2. Key-value store (a hit refreshes the mirror)
/// 3. Empty pool
///
/// The mirror lives as long as this instance, which is created once per
/// process. It only saves store round-trips and is never required for
/// correctness: a recycled process starts with an empty mirror.
pub struct PoolStore {
    store: Arc<dyn KvStore>,
    key: String,
    mirror: RwLock<Option<Arc<Pool>>>,
}

impl PoolStore {
    /// Creates a pool store persisting under `key`.
    pub fn new(store: Arc<dyn KvStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            mirror: RwLock::new(None),
        }
    }

    /// Loads the pool for serving.
    ///
    /// Never fails: store errors and unreadable documents are logged and
    /// degrade to an empty pool.
    pub async fn load(&self) -> Arc<Pool> {
        match self.load_for_update().await {
            Ok(pool) => pool,
            Err(e) => {
                warn!("Failed to read pool from store, serving empty pool: {}", e);
                Arc::new(Pool::empty())
            }
        }
    }

    /// Loads the pool as the base of a merge.
    ///
    /// Unlike [`PoolStore::load`], store failures are returned so a refresh
    /// never overwrites a good stored pool with one built from nothing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store read fails or the document cannot
    /// be decoded.
    pub async fn load_for_update(&self) -> Result<Arc<Pool>, StoreError> {
        if let Some(pool) = self.mirrored()
            && !pool.is_empty()
        {
            debug!("Pool memory HIT ({} urls)", pool.len());
            return Ok(pool);
        }

        match self.store.get_json(&self.key).await? {
            Some(value) => {
                let pool: Pool = serde_json::from_value(value)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                debug!("Pool store HIT ({} urls)", pool.len());
                let pool = Arc::new(pool);
                self.set_mirror(pool.clone());
                Ok(pool)
            }
            None => {
                debug!("Pool store MISS, starting empty");
                Ok(Arc::new(Pool::empty()))
            }
        }
    }

    /// Persists `pool` to the store, then updates the memory mirror.
    ///
    /// The mirror is left untouched when the write fails.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if serialization or the store write fails.
    pub async fn save(&self, pool: Pool) -> Result<(), StoreError> {
        let value =
            serde_json::to_value(&pool).map_err(|e| StoreError::Serialization(e.to_string()))?;

        self.store.put_json(&self.key, &value).await?;
        self.set_mirror(Arc::new(pool));

        Ok(())
    }

    /// The pool currently held in memory, if any.
    pub fn mirrored(&self) -> Option<Arc<Pool>> {
        self.mirror
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Checks if the backing store is reachable.
    pub async fn health_check(&self) -> bool {
        self.store.health_check().await
    }

    fn set_mirror(&self, pool: Arc<Pool>) {
        *self.mirror.write().unwrap_or_else(PoisonError::into_inner) = Some(pool);
    }
}
