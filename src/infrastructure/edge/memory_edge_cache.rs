//! In-process LRU edge cache.

use super::service::EdgeCache;
use crate::domain::entities::CachedImage;
use async_trait::async_trait;
use chrono::Utc;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// An [`EdgeCache`] bounded by entry count.
///
/// Least-recently-used entries are evicted once `capacity` is reached;
/// expired entries are dropped when they are next looked up.
pub struct MemoryEdgeCache {
    entries: Mutex<LruCache<String, CachedImage>>,
}

impl MemoryEdgeCache {
    /// Creates a cache holding at most `capacity` images.
    pub fn new(capacity: NonZeroUsize) -> Self {
        debug!("Using MemoryEdgeCache (capacity: {})", capacity);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Number of entries currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EdgeCache for MemoryEdgeCache {
    async fn lookup(&self, url: &str) -> Option<CachedImage> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        let expired = match entries.get(url) {
            Some(entry) if !entry.is_expired(Utc::now()) => {
                debug!("Edge cache HIT: {}", url);
                return Some(entry.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            debug!("Edge cache EXPIRED: {}", url);
            entries.pop(url);
        } else {
            debug!("Edge cache MISS: {}", url);
        }

        None
    }

    async fn store(&self, url: &str, entry: CachedImage) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        debug!(
            "Edge cache SET: {} ({} bytes, TTL: {}s)",
            url,
            entry.body.len(),
            entry.ttl_seconds
        );
        entries.put(url.to_string(), entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::OriginImage;
    use bytes::Bytes;
    use chrono::Duration;

    fn entry(body: &'static [u8], ttl_seconds: u64) -> CachedImage {
        CachedImage::from_origin(
            OriginImage {
                status: 200,
                headers: vec![("content-type".to_string(), "image/jpeg".to_string())],
                body: Bytes::from_static(body),
            },
            ttl_seconds,
            Utc::now(),
        )
    }

    fn capacity(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[tokio::test]
    async fn test_store_then_lookup() {
        let cache = MemoryEdgeCache::new(capacity(4));

        cache.store("https://i.example.com/a.jpg", entry(b"a", 60)).await;

        let hit = cache.lookup("https://i.example.com/a.jpg").await.unwrap();
        assert_eq!(hit.body, Bytes::from_static(b"a"));
        assert!(cache.lookup("https://i.example.com/b.jpg").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_is_dropped() {
        let cache = MemoryEdgeCache::new(capacity(4));
        let mut stale = entry(b"a", 60);
        stale.stored_at = Utc::now() - Duration::seconds(120);

        cache.store("a", stale).await;

        assert!(cache.lookup("a").await.is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_least_recently_used_is_evicted() {
        let cache = MemoryEdgeCache::new(capacity(2));

        cache.store("a", entry(b"a", 60)).await;
        cache.store("b", entry(b"b", 60)).await;
        assert!(cache.lookup("a").await.is_some());
        cache.store("c", entry(b"c", 60)).await;

        assert_eq!(cache.len(), 2);
        assert!(cache.lookup("a").await.is_some());
        assert!(cache.lookup("b").await.is_none());
        assert!(cache.lookup("c").await.is_some());
    }
}
