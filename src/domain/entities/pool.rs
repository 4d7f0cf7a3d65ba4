//! Image URL pool entity.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A persisted list of candidate image URLs plus the time of the last
/// successful refresh.
///
/// Serialized as `{"lastUpdated": <unix millis>, "urls": [...]}` so the
/// document stored in the key-value store stays readable by other tooling.
///
/// # Invariants
///
/// - `urls` contains no duplicates
/// - after [`Pool::merged_with`], `urls.len()` never exceeds the bound passed in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub urls: Vec<String>,
}

impl Pool {
    /// Creates a pool from its parts.
    pub fn new(last_updated: DateTime<Utc>, urls: Vec<String>) -> Self {
        Self { last_updated, urls }
    }

    /// The pool used on first run: no URLs, never refreshed.
    pub fn empty() -> Self {
        Self {
            last_updated: DateTime::<Utc>::UNIX_EPOCH,
            urls: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Returns `true` when the pool should be repopulated.
    ///
    /// An empty pool is always stale. Otherwise the pool is stale once more
    /// than `interval` has elapsed since `last_updated`.
    pub fn is_stale(&self, now: DateTime<Utc>, interval: Duration) -> bool {
        self.urls.is_empty() || now - self.last_updated > interval
    }

    /// Merges `incoming` into this pool as a set union and trims it to `max_size`.
    ///
    /// Existing URLs keep their position; incoming URLs not yet present are
    /// appended in listing order. When the union exceeds `max_size`, the
    /// oldest entries (front of the list) are evicted and the last
    /// `max_size` entries are retained. This is plain insertion order, not
    /// a quality or popularity ranking.
    ///
    /// The returned pool is stamped with `now`.
    pub fn merged_with<I>(&self, incoming: I, max_size: usize, now: DateTime<Utc>) -> Pool
    where
        I: IntoIterator<Item = String>,
    {
        let mut seen: HashSet<String> = HashSet::with_capacity(self.urls.len());
        let mut urls: Vec<String> = Vec::with_capacity(self.urls.len());

        for url in self.urls.iter().cloned().chain(incoming) {
            if seen.insert(url.clone()) {
                urls.push(url);
            }
        }

        if urls.len() > max_size {
            urls.drain(..urls.len() - max_size);
        }

        Pool {
            last_updated: now,
            urls,
        }
    }
}

impl Default for Pool {
    fn default() -> Self {
        Self::empty()
    }
}
