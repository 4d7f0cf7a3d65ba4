//! Application layer services and background processing.
//!
//! This layer orchestrates the request pipeline by coordinating the
//! collaborator traits from [`crate::infrastructure`].
//!
//! # Available Services
//!
//! - [`services::pool_store::PoolStore`] - Pool persistence with a memory mirror
//! - [`services::pool_refresher::PoolRefresher`] - Staleness check and background repopulation
//! - [`services::selector::Selector`] - Uniform random pick with degraded fallback
//! - [`services::image_service::ImageService`] - Edge cache lookup and fill
//!
//! # Background Processing Flow
//!
//! 1. The image handler notices a stale pool or fetches an uncached image
//! 2. A [`background_job::BackgroundJob`] is submitted to the bounded queue (non-blocking)
//! 3. [`background_worker::BackgroundWorker`] refreshes the pool or fills the edge cache
//! 4. On shutdown the worker drains the queue before the process exits

pub mod background_job;
pub mod background_worker;
pub mod services;
