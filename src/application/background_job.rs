//! Background job model and the queue used to submit jobs.

use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::warn;

use crate::application::services::{PoolStore, RefreshClaim};
use crate::domain::entities::CachedImage;

/// Work deferred until after the response has been sent.
///
/// Jobs are processed by [`crate::application::background_worker::BackgroundWorker`].
pub enum BackgroundJob {
    /// Fetch the listing, merge it into the pool and persist the result.
    ///
    /// The claim keeps other requests from queueing a second refresh and is
    /// released when the job is dropped, whether it ran or not.
    RefreshPool {
        store: Arc<PoolStore>,
        claim: RefreshClaim,
    },

    /// Write a freshly fetched image into the edge cache.
    StoreImage { url: String, entry: CachedImage },
}

impl BackgroundJob {
    /// Short job name for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RefreshPool { .. } => "refresh_pool",
            Self::StoreImage { .. } => "store_image",
        }
    }
}

/// Sending half of the bounded background job queue.
///
/// Submission never blocks the request: when the queue is full the job is
/// dropped with a warning.
#[derive(Clone)]
pub struct TaskQueue {
    sender: mpsc::Sender<BackgroundJob>,
}

impl TaskQueue {
    /// Creates a queue holding at most `capacity` pending jobs.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<BackgroundJob>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }

    /// Submits a job without waiting.
    ///
    /// Returns `false` if the job was dropped because the queue is full or
    /// the worker has stopped.
    pub fn submit(&self, job: BackgroundJob) -> bool {
        match self.sender.try_send(job) {
            Ok(()) => true,
            Err(TrySendError::Full(job)) => {
                warn!("Background queue full, dropping {} job", job.kind());
                metrics::counter!("background_jobs_dropped_total", "job" => job.kind())
                    .increment(1);
                false
            }
            Err(TrySendError::Closed(job)) => {
                warn!("Background worker stopped, dropping {} job", job.kind());
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Free slots in the queue.
    pub fn capacity(&self) -> usize {
        self.sender.capacity()
    }
}
