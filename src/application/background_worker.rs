//! Worker draining the background job queue.

use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::application::background_job::BackgroundJob;
use crate::application::services::PoolRefresher;
use crate::infrastructure::edge::EdgeCache;

/// Executes [`BackgroundJob`]s decoupled from the request that produced them.
///
/// # Completion Contract
///
/// Jobs run after (or while) the triggering response is sent. When every
/// [`crate::application::background_job::TaskQueue`] handle has been dropped, as
/// happens on graceful shutdown, [`BackgroundWorker::run`] still executes all
/// queued jobs and waits for in-flight ones before returning.
pub struct BackgroundWorker {
    refresher: Arc<PoolRefresher>,
    edge_cache: Arc<dyn EdgeCache>,
    concurrency: usize,
}

impl BackgroundWorker {
    /// Creates a worker running at most `concurrency` jobs at once.
    pub fn new(
        refresher: Arc<PoolRefresher>,
        edge_cache: Arc<dyn EdgeCache>,
        concurrency: usize,
    ) -> Self {
        Self {
            refresher,
            edge_cache,
            concurrency: concurrency.max(1),
        }
    }

    /// Processes jobs until the queue is closed and drained.
    pub async fn run(self, mut rx: mpsc::Receiver<BackgroundJob>) {
        let limiter = Arc::new(Semaphore::new(self.concurrency));
        let worker = Arc::new(self);
        let mut running = JoinSet::new();

        while let Some(job) = rx.recv().await {
            let Ok(permit) = limiter.clone().acquire_owned().await else {
                break;
            };

            let worker = worker.clone();
            running.spawn(async move {
                worker.execute(job).await;
                drop(permit);
            });

            while let Some(result) = running.try_join_next() {
                log_join_result(result);
            }
        }

        debug!("Background queue closed, waiting for {} jobs", running.len());
        while let Some(result) = running.join_next().await {
            log_join_result(result);
        }

        info!("Background worker stopped");
    }

    /// Executes a single job to completion.
    pub async fn execute(&self, job: BackgroundJob) {
        let kind = job.kind();
        debug!("Running background job: {}", kind);

        match job {
            BackgroundJob::RefreshPool { store, claim } => {
                let outcome = self.refresher.refresh(&store).await;
                debug!("Pool refresh finished: {:?}", outcome);
                drop(claim);
            }
            BackgroundJob::StoreImage { url, entry } => {
                self.edge_cache.store(&url, entry).await;
            }
        }

        metrics::counter!("background_jobs_completed_total", "job" => kind).increment(1);
    }
}

fn log_join_result(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        error!("Background job panicked: {}", e);
    }
}
