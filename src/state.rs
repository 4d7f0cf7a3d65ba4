//! Shared application state injected into handlers.

use std::sync::Arc;

use crate::api::response::ClientCachePolicy;
use crate::application::services::{ImageService, PoolRefresher, PoolStore, Selector};
use crate::application::background_job::TaskQueue;

/// Services shared by all requests.
///
/// Created once per process; cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// `None` when no key-value store is bound; requests then fail with 500.
    pub pool_store: Option<Arc<PoolStore>>,
    pub refresher: Arc<PoolRefresher>,
    pub selector: Arc<Selector>,
    pub images: Arc<ImageService>,
    pub tasks: TaskQueue,
    pub client_cache: ClientCachePolicy,
}
