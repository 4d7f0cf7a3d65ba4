//! Services implementing the pool and image pipeline.

pub mod image_service;
pub mod pool_refresher;
pub mod pool_store;
pub mod selector;

pub use image_service::{CacheStatus, ImageService, ResolvedImage};
pub use pool_refresher::{PoolRefresher, RefreshClaim, RefreshOutcome};
pub use pool_store::PoolStore;
pub use selector::{Selection, Selector};
