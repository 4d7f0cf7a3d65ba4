//! reqwest-based origin client.

use super::service::{ImageOrigin, OriginError};
use crate::domain::entities::OriginImage;
use crate::utils::url_normalizer::normalize_image_url;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{REFERER, USER_AGENT};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Connection settings for [`HttpOrigin`].
#[derive(Debug, Clone)]
pub struct OriginSettings {
    /// JSON listing endpoint.
    pub listing_url: String,
    /// Browser-like User-Agent sent with every request.
    pub user_agent: String,
    /// Referer sent with image requests; the origin rejects bare requests.
    pub referer: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// Listing payload: `{ "data": [ { "urls": { "regular": "..." } } ] }`.
#[derive(Debug, Deserialize)]
struct ListingResponse {
    #[serde(default)]
    data: Vec<ListingItem>,
}

#[derive(Debug, Deserialize)]
struct ListingItem {
    #[serde(default)]
    urls: Option<ListingUrls>,
}

#[derive(Debug, Deserialize)]
struct ListingUrls {
    #[serde(default)]
    regular: Option<String>,
}

impl ListingResponse {
    /// Extracts valid `urls.regular` entries in listing order.
    fn into_urls(self) -> Vec<String> {
        self.data
            .into_iter()
            .filter_map(|item| item.urls.and_then(|urls| urls.regular))
            .filter_map(|raw| match normalize_image_url(&raw) {
                Ok(url) => Some(url),
                Err(e) => {
                    debug!("Skipping listing entry {:?}: {}", raw, e);
                    None
                }
            })
            .collect()
    }
}

/// HTTP client for the upstream listing and image origin.
pub struct HttpOrigin {
    client: Client,
    settings: OriginSettings,
}

impl HttpOrigin {
    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`OriginError::Request`] if the HTTP client cannot be created.
    pub fn new(settings: OriginSettings) -> Result<Self, OriginError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| OriginError::Request {
                url: settings.listing_url.clone(),
                reason: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, settings })
    }

    fn request_error(url: &str, e: reqwest::Error) -> OriginError {
        OriginError::Request {
            url: url.to_string(),
            reason: e.to_string(),
        }
    }
}

#[async_trait]
impl ImageOrigin for HttpOrigin {
    async fn fetch_listing(&self) -> Result<Vec<String>, OriginError> {
        let url = &self.settings.listing_url;
        debug!("Fetching listing from {}", url);

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, &self.settings.user_agent)
            .send()
            .await
            .map_err(|e| Self::request_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Listing request to {} returned {}", url, status);
            return Err(OriginError::Status {
                url: url.clone(),
                status: status.as_u16(),
            });
        }

        let listing: ListingResponse = response
            .json()
            .await
            .map_err(|e| OriginError::InvalidListing(e.to_string()))?;

        let urls = listing.into_urls();
        debug!("Listing returned {} usable entries", urls.len());
        Ok(urls)
    }

    async fn fetch_image(&self, url: &str) -> Result<OriginImage, OriginError> {
        debug!("Fetching image {}", url);

        let response = self
            .client
            .get(url)
            .header(REFERER, &self.settings.referer)
            .header(USER_AGENT, &self.settings.user_agent)
            .send()
            .await
            .map_err(|e| Self::request_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Image request to {} returned {}", url, status);
            return Err(OriginError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| Self::request_error(url, e))?;

        Ok(OriginImage {
            status: status.as_u16(),
            headers,
            body,
        })
    }
}
