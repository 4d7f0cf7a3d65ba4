//! Origin client trait and error types.

use crate::domain::entities::OriginImage;
use async_trait::async_trait;

/// Errors returned by the upstream listing endpoint or the image origin.
#[derive(Debug, thiserror::Error)]
pub enum OriginError {
    #[error("Request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Invalid listing payload: {0}")]
    InvalidListing(String),
}

/// Upstream collaborator providing the image listing and the images themselves.
///
/// # Implementations
///
/// - [`crate::infrastructure::origin::HttpOrigin`] - reqwest-based client
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageOrigin: Send + Sync {
    /// Fetches the upstream listing and returns its candidate image URLs.
    ///
    /// Malformed entries are skipped; an empty vector means the listing had
    /// no usable entries.
    ///
    /// # Errors
    ///
    /// Returns [`OriginError`] on network failure, a non-success status, or a
    /// payload that is not a listing.
    async fn fetch_listing(&self) -> Result<Vec<String>, OriginError>;

    /// Fetches one image.
    ///
    /// # Errors
    ///
    /// Returns [`OriginError`] on network failure or any non-success status;
    /// failures are never turned into cacheable responses.
    async fn fetch_image(&self, url: &str) -> Result<OriginImage, OriginError>;
}
