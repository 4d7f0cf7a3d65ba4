//! Random image selection.

use rand::seq::IndexedRandom;

use crate::domain::entities::Pool;

/// The URL chosen for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Drawn from the pool.
    Pooled(String),
    /// The pool was empty; degraded mode serves the static fallback image.
    Fallback(String),
}

impl Selection {
    pub fn url(&self) -> &str {
        match self {
            Self::Pooled(url) | Self::Fallback(url) => url,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Picks one URL per request, uniformly at random.
///
/// # Degraded Mode
///
/// An empty pool (first start before the initial refresh lands, or the
/// listing has never been reachable) yields the static fallback image
/// instead of an error. No synchronous listing fetch is made on the
/// request path.
pub struct Selector {
    fallback_url: String,
}

impl Selector {
    /// Creates a selector using `fallback_url` in degraded mode.
    pub fn new(fallback_url: impl Into<String>) -> Self {
        Self {
            fallback_url: fallback_url.into(),
        }
    }

    pub fn pick(&self, pool: &Pool) -> Selection {
        match pool.urls.choose(&mut rand::rng()) {
            Some(url) => Selection::Pooled(url.clone()),
            None => {
                metrics::counter!("selector_fallback_total").increment(1);
                Selection::Fallback(self.fallback_url.clone())
            }
        }
    }

    pub fn fallback_url(&self) -> &str {
        &self.fallback_url
    }
}
