//! Redis-backed key-value store.

use super::service::{KvStore, StoreError, StoreResult};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use serde_json::Value;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Upper bound on a single connection attempt.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Pause between connection attempts after one has failed.
const RECONNECT_COOLDOWN: Duration = Duration::from_secs(5);

/// Redis implementation of [`KvStore`].
///
/// The connection is opened on first use, so a store built while Redis is
/// down starts working as soon as Redis comes back. Once established, the
/// `ConnectionManager` handles reconnects itself. Documents are stored as
/// JSON strings without expiry.
pub struct RedisStore {
    client: Client,
    manager: OnceCell<ConnectionManager>,
    retry_after: Mutex<Option<Instant>>,
    key_prefix: String,
}

impl RedisStore {
    /// Creates a store for `redis_url` without touching the network.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ConnectionError`] if the URL cannot be parsed.
    pub fn new(redis_url: &str) -> StoreResult<Self> {
        let client = Client::open(redis_url).map_err(|e| {
            StoreError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        Ok(Self {
            client,
            manager: OnceCell::new(),
            retry_after: Mutex::new(None),
            key_prefix: "pool:".to_string(),
        })
    }

    /// Constructs the full Redis key with namespace prefix.
    fn build_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    /// Returns the shared connection, opening it if needed.
    ///
    /// After a failed attempt, calls fail fast until the cooldown has passed.
    async fn connection(&self) -> StoreResult<ConnectionManager> {
        if let Some(manager) = self.manager.get() {
            return Ok(manager.clone());
        }

        let retry_after = *self.cooldown();
        if let Some(at) = retry_after
            && Instant::now() < at
        {
            return Err(StoreError::ConnectionError(
                "Redis unreachable, waiting before reconnecting".to_string(),
            ));
        }

        let attempt = self
            .manager
            .get_or_try_init(|| open_manager(self.client.clone()))
            .await;

        match attempt {
            Ok(manager) => {
                *self.cooldown() = None;
                Ok(manager.clone())
            }
            Err(e) => {
                warn!("{}", e);
                *self.cooldown() = Some(Instant::now() + RECONNECT_COOLDOWN);
                Err(e)
            }
        }
    }

    fn cooldown(&self) -> std::sync::MutexGuard<'_, Option<Instant>> {
        self.retry_after
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Opens a `ConnectionManager` for the store, bounded by [`CONNECT_TIMEOUT`].
async fn open_manager(client: Client) -> StoreResult<ConnectionManager> {
    info!("Connecting to Redis store");

    let manager = tokio::time::timeout(CONNECT_TIMEOUT, ConnectionManager::new(client))
        .await
        .map_err(|_| {
            StoreError::ConnectionError(format!(
                "Redis connect timed out after {}s",
                CONNECT_TIMEOUT.as_secs()
            ))
        })?
        .map_err(|e| StoreError::ConnectionError(format!("Failed to connect to Redis: {}", e)))?;

    info!("✓ Connected to Redis store");
    Ok(manager)
}

/// Opens a `ConnectionManager` and verifies it with a PING.
pub(crate) async fn connect_manager(redis_url: &str) -> StoreResult<ConnectionManager> {
    let client = Client::open(redis_url).map_err(|e| {
        StoreError::ConnectionError(format!("Failed to create Redis client: {}", e))
    })?;

    let manager = ConnectionManager::new(client).await.map_err(|e| {
        StoreError::ConnectionError(format!("Failed to connect to Redis: {}", e))
    })?;

    let mut test_conn = manager.clone();
    test_conn
        .ping::<()>()
        .await
        .map_err(|e| StoreError::ConnectionError(format!("Redis PING failed: {}", e)))?;

    Ok(manager)
}

#[async_trait]
impl KvStore for RedisStore {
    async fn get_json(&self, key: &str) -> StoreResult<Option<Value>> {
        let full_key = self.build_key(key);
        let mut conn = self.connection().await?;

        let raw = conn
            .get::<_, Option<String>>(&full_key)
            .await
            .map_err(|e| StoreError::OperationError(format!("GET {}: {}", full_key, e)))?;

        match raw {
            Some(raw) => {
                debug!("Store HIT: {}", full_key);
                serde_json::from_str(&raw)
                    .map(Some)
                    .map_err(|e| StoreError::Serialization(e.to_string()))
            }
            None => {
                debug!("Store MISS: {}", full_key);
                Ok(None)
            }
        }
    }

    async fn put_json(&self, key: &str, value: &Value) -> StoreResult<()> {
        let full_key = self.build_key(key);
        let mut conn = self.connection().await?;
        let payload = value.to_string();

        conn.set::<_, _, ()>(&full_key, payload)
            .await
            .map_err(|e| StoreError::OperationError(format!("SET {}: {}", full_key, e)))?;

        debug!("Store SET: {}", full_key);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        match self.connection().await {
            Ok(mut conn) => conn.ping::<()>().await.is_ok(),
            Err(_) => false,
        }
    }
}
