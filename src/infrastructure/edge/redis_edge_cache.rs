//! Redis-backed edge cache.

use super::service::EdgeCache;
use crate::domain::entities::CachedImage;
use crate::infrastructure::store::{StoreResult, connect_manager};
use async_trait::async_trait;
use chrono::Utc;
use redis::{AsyncCommands, aio::ConnectionManager};
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};

/// Redis implementation of [`EdgeCache`].
///
/// Entries are stored as JSON (body base64-encoded) under
/// `edge:<sha256(url) hex>` with a Redis expiry equal to the entry TTL, so
/// the cache is shared between proxy instances and survives restarts.
pub struct RedisEdgeCache {
    client: ConnectionManager,
    key_prefix: String,
}

impl RedisEdgeCache {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns a connection error if Redis cannot be reached.
    pub async fn connect(redis_url: &str) -> StoreResult<Self> {
        info!("Connecting to Redis edge cache");

        let manager = connect_manager(redis_url).await?;

        info!("✓ Connected to Redis edge cache");

        Ok(Self {
            client: manager,
            key_prefix: "edge:".to_string(),
        })
    }

    fn build_key(&self, url: &str) -> String {
        format!("{}{}", self.key_prefix, url_digest(url))
    }
}

/// Hex-encoded SHA-256 of an image URL, used as a fixed-length cache key.
fn url_digest(url: &str) -> String {
    hex::encode(Sha256::digest(url.as_bytes()))
}

#[async_trait]
impl EdgeCache for RedisEdgeCache {
    async fn lookup(&self, url: &str) -> Option<CachedImage> {
        let key = self.build_key(url);
        let mut conn = self.client.clone();

        let raw = match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("Edge cache MISS: {}", url);
                return None;
            }
            Err(e) => {
                error!("Redis GET error for {}: {}", url, e);
                return None;
            }
        };

        match serde_json::from_str::<CachedImage>(&raw) {
            Ok(entry) if !entry.is_expired(Utc::now()) => {
                debug!("Edge cache HIT: {}", url);
                Some(entry)
            }
            Ok(_) => {
                debug!("Edge cache EXPIRED: {}", url);
                None
            }
            Err(e) => {
                warn!("Discarding unreadable edge cache entry for {}: {}", url, e);
                None
            }
        }
    }

    async fn store(&self, url: &str, entry: CachedImage) {
        let key = self.build_key(url);
        let mut conn = self.client.clone();
        let ttl_seconds = entry.ttl_seconds;

        let payload = match serde_json::to_string(&entry) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to serialize edge cache entry for {}: {}", url, e);
                return;
            }
        };

        match conn.set_ex::<_, _, ()>(&key, payload, ttl_seconds).await {
            Ok(_) => debug!("Edge cache SET: {} (TTL: {}s)", url, ttl_seconds),
            Err(e) => warn!("Redis SET error for {}: {}", url, e),
        }
    }
}
