//! Handler for the random image endpoint.

use axum::{extract::State, response::Response};
use chrono::Utc;
use tracing::{debug, warn};

use crate::api::response::{fallback_redirect, image_response};
use crate::application::background_job::BackgroundJob;
use crate::error::AppError;
use crate::state::AppState;

/// Serves a random image from the pool.
///
/// # Endpoint
///
/// `GET /`
///
/// # Request Flow
///
/// 1. Load the pool (memory mirror, then key-value store)
/// 2. If the pool is empty or older than the refresh interval, queue a
///    background refresh (at most one per process)
/// 3. Pick a URL uniformly at random, or the fallback image if the pool is empty
/// 4. Resolve the image through the edge cache
/// 5. Return the bytes with open CORS and the client cache directive
///
/// # Degraded Mode
///
/// If the image cannot be fetched (deleted upstream, origin unreachable),
/// responds with `302 Found` to the static fallback image.
///
/// # Errors
///
/// Returns 500 if no key-value store is bound.
pub async fn random_image_handler(State(state): State<AppState>) -> Result<Response, AppError> {
    let pool_store = state
        .pool_store
        .clone()
        .ok_or(AppError::StoreUnavailable)?;

    let pool = pool_store.load().await;

    if state.refresher.is_due(&pool, Utc::now()) {
        match state.refresher.try_claim() {
            Some(claim) => {
                debug!("Pool stale ({} urls), queueing refresh", pool.len());
                state.tasks.submit(BackgroundJob::RefreshPool {
                    store: pool_store,
                    claim,
                });
            }
            None => debug!("Pool refresh already in flight"),
        }
    }

    let selection = state.selector.pick(&pool);
    if selection.is_fallback() {
        debug!("Pool empty, serving fallback image");
    }

    match state.images.resolve(selection.url()).await {
        Ok(resolved) => {
            debug!(
                "Serving {} ({})",
                selection.url(),
                resolved.cache_status.as_str()
            );
            Ok(image_response(resolved, state.client_cache))
        }
        Err(e) => {
            warn!("Image fetch failed, redirecting to fallback: {}", e);
            metrics::counter!("fallback_redirects_total").increment(1);
            Ok(fallback_redirect(state.selector.fallback_url()))
        }
    }
}
