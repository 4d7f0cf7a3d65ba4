//! Edge cache trait.

use crate::domain::entities::CachedImage;
use async_trait::async_trait;

/// Cache of fetched image payloads, keyed by the image's origin URL.
///
/// Independent of the pool refresh cycle: image content at a stable URL does
/// not change, so entries live for the long edge TTL carried by each
/// [`CachedImage`]. Entries are never invalidated explicitly.
///
/// Implementations are fail-open: backend errors are logged and surface as
/// a miss (`lookup`) or a dropped write (`store`).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EdgeCache: Send + Sync {
    /// Returns the unexpired entry stored for `url`, if any.
    async fn lookup(&self, url: &str) -> Option<CachedImage>;

    /// Stores `entry` under `url`, replacing any previous entry.
    async fn store(&self, url: &str, entry: CachedImage);
}
