//! Client-facing response assembly.
//!
//! The edge cache keeps image bytes for a long time so the origin is rarely
//! hit again, while the client cache directive decides how often one visitor
//! sees a new random pick. The two durations are configured separately.

use axum::{
    body::Body,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::application::services::ResolvedImage;

/// Reports whether the image came from the edge cache.
pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// Headers from the cached entry that are replaced by the client policy.
fn is_replaced(name: &HeaderName) -> bool {
    *name == header::CACHE_CONTROL || *name == header::PRAGMA || *name == header::EXPIRES
}

/// Cache directive sent to browsers and downstream caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCachePolicy {
    /// Every request yields a fresh pick.
    NoStore,
    /// Clients may reuse a pick for this many seconds.
    MaxAge(u64),
}

impl ClientCachePolicy {
    /// Maps a configured TTL to a policy; `0` disables client caching.
    pub fn from_ttl(seconds: u64) -> Self {
        if seconds == 0 {
            Self::NoStore
        } else {
            Self::MaxAge(seconds)
        }
    }

    pub fn header_value(&self) -> HeaderValue {
        match self {
            Self::NoStore => HeaderValue::from_static("no-store"),
            Self::MaxAge(seconds) => HeaderValue::from_str(&format!("public, max-age={}", seconds))
                .unwrap_or_else(|_| HeaderValue::from_static("no-store")),
        }
    }
}

/// Builds the image response: entry status, entry headers, open CORS and
/// the client cache directive.
pub fn image_response(resolved: ResolvedImage, policy: ClientCachePolicy) -> Response {
    let ResolvedImage {
        entry,
        cache_status,
    } = resolved;

    let status = StatusCode::from_u16(entry.status).unwrap_or(StatusCode::OK);
    let mut headers = HeaderMap::with_capacity(entry.headers.len() + 3);

    for (name, value) in &entry.headers {
        let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) else {
            debug!("Dropping unrepresentable header {:?}", name);
            continue;
        };
        if is_replaced(&name) {
            continue;
        }
        headers.append(name, value);
    }

    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(header::CACHE_CONTROL, policy.header_value());
    headers.insert(X_CACHE, HeaderValue::from_static(cache_status.as_str()));

    (status, headers, Body::from(entry.body)).into_response()
}

/// Degraded-mode response: `302 Found` pointing at the static fallback image.
///
/// Never cached by clients, so the next request gets another chance at a
/// real pick.
pub fn fallback_redirect(fallback_url: &str) -> Response {
    (
        StatusCode::FOUND,
        [
            (header::LOCATION, fallback_url),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::CACHE_CONTROL, "no-store"),
        ],
    )
        .into_response()
}
