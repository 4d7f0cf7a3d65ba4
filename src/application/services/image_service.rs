//! Edge-cached image resolution.

use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

use crate::application::background_job::{BackgroundJob, TaskQueue};
use crate::config::DEFAULT_EDGE_CACHE_MAX_ENTRY_BYTES;
use crate::domain::entities::CachedImage;
use crate::infrastructure::edge::EdgeCache;
use crate::infrastructure::origin::{ImageOrigin, OriginError};

/// Where a resolved image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
        }
    }
}

/// An image ready to be returned to the client.
#[derive(Debug, Clone)]
pub struct ResolvedImage {
    pub entry: CachedImage,
    pub cache_status: CacheStatus,
}

/// Resolves image URLs through the edge cache.
///
/// # Request Flow
///
/// 1. Look up the URL in the edge cache
/// 2. On miss, fetch from the origin (Referer and User-Agent set by the client)
/// 3. Build a long-lived entry with conflicting cache headers stripped
/// 4. Queue the cache write in the background and return immediately
///
/// Origin failures are returned to the caller and never cached. Bodies above
/// the entry bound are served but not cached either.
pub struct ImageService {
    origin: Arc<dyn ImageOrigin>,
    edge_cache: Arc<dyn EdgeCache>,
    tasks: TaskQueue,
    edge_ttl_seconds: u64,
    max_entry_bytes: usize,
}

impl ImageService {
    /// Creates the service.
    ///
    /// `edge_ttl_seconds` is the lifetime of cached image bytes and is
    /// independent of the pool refresh interval.
    pub fn new(
        origin: Arc<dyn ImageOrigin>,
        edge_cache: Arc<dyn EdgeCache>,
        tasks: TaskQueue,
        edge_ttl_seconds: u64,
    ) -> Self {
        Self {
            origin,
            edge_cache,
            tasks,
            edge_ttl_seconds,
            max_entry_bytes: DEFAULT_EDGE_CACHE_MAX_ENTRY_BYTES,
        }
    }

    /// Sets the largest body, in bytes, that is written to the edge cache.
    pub fn with_max_entry_bytes(mut self, max_entry_bytes: usize) -> Self {
        self.max_entry_bytes = max_entry_bytes;
        self
    }

    /// Returns the image stored at `url`, from cache when possible.
    ///
    /// # Errors
    ///
    /// Returns [`OriginError`] when the image is not cached and the origin
    /// fetch fails.
    pub async fn resolve(&self, url: &str) -> Result<ResolvedImage, OriginError> {
        let now = Utc::now();

        if let Some(entry) = self.edge_cache.lookup(url).await
            && !entry.is_expired(now)
        {
            metrics::counter!("edge_cache_requests_total", "result" => "hit").increment(1);
            return Ok(ResolvedImage {
                entry,
                cache_status: CacheStatus::Hit,
            });
        }

        metrics::counter!("edge_cache_requests_total", "result" => "miss").increment(1);

        let image = self.origin.fetch_image(url).await?;
        let entry = CachedImage::from_origin(image, self.edge_ttl_seconds, now);

        if entry.body.len() > self.max_entry_bytes {
            debug!(
                "Not caching {}: {} bytes exceeds the {} byte entry bound",
                url,
                entry.body.len(),
                self.max_entry_bytes
            );
            metrics::counter!("edge_cache_oversized_total").increment(1);
        } else {
            debug!("Queueing edge cache write for {}", url);
            self.tasks.submit(BackgroundJob::StoreImage {
                url: url.to_string(),
                entry: entry.clone(),
            });
        }

        Ok(ResolvedImage {
            entry,
            cache_status: CacheStatus::Miss,
        })
    }
}
