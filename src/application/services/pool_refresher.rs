//! Background pool repopulation.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};

use crate::application::services::PoolStore;
use crate::domain::entities::Pool;
use crate::infrastructure::origin::{ImageOrigin, OriginError};
use crate::infrastructure::store::StoreError;

/// Result of one refresh attempt.
#[derive(Debug)]
pub enum RefreshOutcome {
    /// The merged pool was persisted.
    Updated { size: usize },
    /// The listing had no usable entries; nothing was written.
    EmptyListing,
    /// The listing could not be fetched; the existing pool is untouched.
    OriginFailed(OriginError),
    /// The pool could not be read or written; the stored pool is untouched.
    StoreFailed(StoreError),
}

impl RefreshOutcome {
    fn label(&self) -> &'static str {
        match self {
            Self::Updated { .. } => "updated",
            Self::EmptyListing => "empty_listing",
            Self::OriginFailed(_) => "origin_failed",
            Self::StoreFailed(_) => "store_failed",
        }
    }
}

/// Exclusive right to run the next refresh in this process.
///
/// Released on drop, so a refresh job that is discarded or panics never
/// blocks later refreshes.
#[derive(Debug)]
pub struct RefreshClaim {
    in_flight: Arc<AtomicBool>,
}

impl Drop for RefreshClaim {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::Release);
    }
}

/// Decides when the pool is stale and repopulates it from the listing.
///
/// # Algorithm
///
/// 1. Fetch the upstream listing
/// 2. Merge it into the current pool as a set union
/// 3. Trim to `max_size`, evicting the oldest entries
/// 4. Persist to the store and update the memory mirror
///
/// Any failure aborts the refresh and leaves the existing pool serving.
/// There is no retry before the next stale request.
///
/// # Concurrency
///
/// Within one process at most one refresh is claimed at a time. Separate
/// processes sharing a store can still race; the store is last-write-wins,
/// so one interval's merge may be lost and the next refresh heals it.
pub struct PoolRefresher {
    origin: Arc<dyn ImageOrigin>,
    interval: Duration,
    max_size: usize,
    in_flight: Arc<AtomicBool>,
}

impl PoolRefresher {
    /// Creates a refresher.
    ///
    /// # Arguments
    ///
    /// - `origin` - listing source
    /// - `interval` - minimum age of a non-empty pool before it is refreshed
    /// - `max_size` - pool bound applied after each merge
    pub fn new(origin: Arc<dyn ImageOrigin>, interval: Duration, max_size: usize) -> Self {
        Self {
            origin,
            interval,
            max_size,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns `true` when `pool` is empty or older than the refresh interval.
    pub fn is_due(&self, pool: &Pool, now: DateTime<Utc>) -> bool {
        pool.is_stale(now, self.interval)
    }

    /// Claims the next refresh, or returns `None` if one is already queued or running.
    pub fn try_claim(&self) -> Option<RefreshClaim> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RefreshClaim {
                in_flight: self.in_flight.clone(),
            })
    }

    /// Runs one refresh against `store`.
    pub async fn refresh(&self, store: &PoolStore) -> RefreshOutcome {
        let outcome = self.try_refresh(store).await;
        metrics::counter!("pool_refresh_total", "outcome" => outcome.label()).increment(1);
        outcome
    }

    async fn try_refresh(&self, store: &PoolStore) -> RefreshOutcome {
        let listing = match self.origin.fetch_listing().await {
            Ok(listing) => listing,
            Err(e) => {
                warn!("Background pool update failed: {}", e);
                return RefreshOutcome::OriginFailed(e);
            }
        };

        if listing.is_empty() {
            warn!("Listing returned no usable images, keeping current pool");
            return RefreshOutcome::EmptyListing;
        }

        let current = match store.load_for_update().await {
            Ok(pool) => pool,
            Err(e) => {
                error!("Cannot read pool for merge, skipping update: {}", e);
                return RefreshOutcome::StoreFailed(e);
            }
        };

        let merged = current.merged_with(listing, self.max_size, Utc::now());
        let size = merged.len();

        match store.save(merged).await {
            Ok(()) => {
                info!("Updated pool. Size: {}", size);
                RefreshOutcome::Updated { size }
            }
            Err(e) => {
                error!("Failed to persist refreshed pool: {}", e);
                RefreshOutcome::StoreFailed(e)
            }
        }
    }
}
