//! Image payloads as fetched from the origin and as retained by the edge cache.

use base64::Engine as _;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Headers that would make a downstream cache refuse or shorten retention,
/// plus hop-by-hop headers that must not be replayed from a stored entry.
const STRIPPED_HEADERS: &[&str] = &[
    "cache-control",
    "pragma",
    "expires",
    "set-cookie",
    "connection",
    "keep-alive",
    "transfer-encoding",
    "content-length",
];

/// A successful image response from the origin, before caching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginImage {
    pub status: u16,
    /// Lowercase header names with their values, in response order.
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

/// An image held by the edge cache, keyed by its origin URL.
///
/// Entries expire `ttl_seconds` after `stored_at` and are never invalidated
/// explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedImage {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    #[serde(serialize_with = "encode_body", deserialize_with = "decode_body")]
    pub body: Bytes,
    pub stored_at: DateTime<Utc>,
    pub ttl_seconds: u64,
}

impl CachedImage {
    /// Builds a cacheable entry from an origin response.
    ///
    /// Conflicting cache-negotiation headers are dropped and replaced by
    /// `cache-control: public, max-age=<ttl_seconds>`.
    pub fn from_origin(image: OriginImage, ttl_seconds: u64, now: DateTime<Utc>) -> Self {
        let mut headers: Vec<(String, String)> = image
            .headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .filter(|(name, _)| !STRIPPED_HEADERS.contains(&name.as_str()))
            .collect();

        headers.push((
            "cache-control".to_string(),
            format!("public, max-age={}", ttl_seconds),
        ));

        Self {
            status: image.status,
            headers,
            body: image.body,
            stored_at: now,
            ttl_seconds,
        }
    }

    /// Returns `true` once the entry has outlived its TTL.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let age = (now - self.stored_at).num_seconds();
        age >= 0 && age as u64 >= self.ttl_seconds
    }

    /// Looks up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

fn encode_body<S: Serializer>(body: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(body))
}

fn decode_body<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
    let encoded = String::deserialize(deserializer)?;
    base64::engine::general_purpose::STANDARD
        .decode(encoded.as_bytes())
        .map(Bytes::from)
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn origin_image(headers: &[(&str, &str)]) -> OriginImage {
        OriginImage {
            status: 200,
            headers: headers
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
            body: Bytes::from_static(b"\x89PNG"),
        }
    }

    #[test]
    fn test_from_origin_strips_cache_negotiation_headers() {
        let image = origin_image(&[
            ("Content-Type", "image/jpeg"),
            ("Cache-Control", "no-cache"),
            ("Pragma", "no-cache"),
            ("Expires", "0"),
            ("Set-Cookie", "session=1"),
            ("ETag", "\"abc\""),
        ]);

        let entry = CachedImage::from_origin(image, 31_536_000, Utc::now());

        assert_eq!(entry.header("content-type"), Some("image/jpeg"));
        assert_eq!(entry.header("etag"), Some("\"abc\""));
        assert_eq!(entry.header("cache-control"), Some("public, max-age=31536000"));
        assert!(entry.header("pragma").is_none());
        assert!(entry.header("expires").is_none());
        assert!(entry.header("set-cookie").is_none());
        assert_eq!(
            entry
                .headers
                .iter()
                .filter(|(n, _)| n == "cache-control")
                .count(),
            1
        );
    }

    #[test]
    fn test_from_origin_drops_hop_by_hop_headers() {
        let image = origin_image(&[
            ("Connection", "keep-alive"),
            ("Transfer-Encoding", "chunked"),
            ("Content-Length", "4"),
        ]);

        let entry = CachedImage::from_origin(image, 60, Utc::now());

        assert!(entry.header("connection").is_none());
        assert!(entry.header("transfer-encoding").is_none());
        assert!(entry.header("content-length").is_none());
    }

    #[test]
    fn test_expiry() {
        let now = Utc::now();
        let mut entry = CachedImage::from_origin(origin_image(&[]), 60, now);

        assert!(!entry.is_expired(now + Duration::seconds(59)));
        assert!(entry.is_expired(now + Duration::seconds(60)));

        entry.ttl_seconds = u64::MAX;
        assert!(!entry.is_expired(now + Duration::days(3650)));
    }

    #[test]
    fn test_body_serialized_as_base64() {
        let entry = CachedImage::from_origin(origin_image(&[]), 60, Utc::now());

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["body"], "iVBORw==");

        let restored: CachedImage = serde_json::from_value(json).unwrap();
        assert_eq!(restored, entry);
    }
}
