//! HTTP server initialization and runtime setup.
//!
//! Handles store connections, edge cache setup, worker spawning, and Axum server lifecycle.

use crate::api::response::ClientCachePolicy;
use crate::application::background_job::TaskQueue;
use crate::application::background_worker::BackgroundWorker;
use crate::application::services::{ImageService, PoolRefresher, PoolStore, Selector};
use crate::config::{Config, EdgeCacheBackend, KvBackend};
use crate::infrastructure::edge::{EdgeCache, MemoryEdgeCache, RedisEdgeCache};
use crate::infrastructure::origin::{HttpOrigin, ImageOrigin, OriginSettings};
use crate::infrastructure::store::{KvStore, MemoryStore, RedisStore};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on how long shutdown waits for queued background jobs.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Key-value store for the pool (Redis, memory, or unbound)
/// - Edge cache (memory LRU or Redis)
/// - Origin HTTP client
/// - Background worker
/// - Axum HTTP server
///
/// On Ctrl+C or SIGTERM the server stops accepting connections, then waits
/// for queued refreshes and cache writes to finish.
///
/// # Errors
///
/// Returns an error if:
/// - The HTTP client cannot be built
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let store = connect_store(&config).await;
    let edge_cache = connect_edge_cache(&config).await;
    let origin = build_origin(&config)?;

    let refresher = Arc::new(build_refresher(&config, origin.clone()));

    let (tasks, task_rx) = TaskQueue::new(config.task_queue_capacity);

    let worker = BackgroundWorker::new(
        refresher.clone(),
        edge_cache.clone(),
        config.background_concurrency,
    );
    let worker_handle = tokio::spawn(worker.run(task_rx));
    tracing::info!(
        "Background worker started (concurrency: {})",
        config.background_concurrency
    );

    let state = AppState {
        pool_store: store.map(|store| Arc::new(PoolStore::new(store, config.pool_key.clone()))),
        refresher,
        selector: Arc::new(Selector::new(config.fallback_image_url.clone())),
        images: Arc::new(ImageService::new(
            origin,
            edge_cache,
            tasks.clone(),
            config.edge_cache_ttl_seconds,
        )
        .with_max_entry_bytes(config.edge_cache_max_entry_bytes)),
        tasks,
        client_cache: ClientCachePolicy::from_ttl(config.browser_cache_ttl_seconds),
    };

    let app = app_router(
        state,
        config.rate_limit_per_second,
        config.rate_limit_burst,
    );

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    // The router owns every queue sender; once serve returns they are
    // dropped and the worker exits after draining.
    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped, draining background jobs");

    match tokio::time::timeout(DRAIN_TIMEOUT, worker_handle).await {
        Ok(Ok(())) => tracing::info!("Background jobs drained"),
        Ok(Err(e)) => tracing::error!("Background worker crashed: {}", e),
        Err(_) => tracing::warn!(
            "Background jobs still running after {}s, exiting",
            DRAIN_TIMEOUT.as_secs()
        ),
    }

    Ok(())
}

/// Binds the key-value store holding the pool.
///
/// Returns `None` only when `KV_BACKEND=redis` has no Redis URL (or an
/// unparseable one); the service then answers image requests with 500.
/// A configured Redis that is down at boot is still bound and connected
/// on demand, so requests degrade to the fallback image until it returns.
pub async fn connect_store(config: &Config) -> Option<Arc<dyn KvStore>> {
    match (config.kv_backend, &config.redis_url) {
        (KvBackend::Memory, _) => {
            tracing::warn!("Pool store: memory (pool is lost on restart)");
            Some(Arc::new(MemoryStore::new()))
        }
        (KvBackend::Redis, Some(redis_url)) => match RedisStore::new(redis_url) {
            Ok(redis) => {
                if redis.health_check().await {
                    tracing::info!("Pool store enabled (Redis)");
                } else {
                    tracing::warn!("Pool store (Redis) not reachable yet, connecting on demand");
                }
                Some(Arc::new(redis))
            }
            Err(e) => {
                tracing::error!("Invalid Redis configuration: {}. Pool store unavailable.", e);
                None
            }
        },
        (KvBackend::Redis, None) => {
            tracing::error!("KV_BACKEND=redis but no Redis configured. Pool store unavailable.");
            None
        }
    }
}

/// Builds the edge cache, falling back to memory if Redis cannot be reached.
pub async fn connect_edge_cache(config: &Config) -> Arc<dyn EdgeCache> {
    let capacity = NonZeroUsize::new(config.edge_cache_capacity).unwrap_or(NonZeroUsize::MIN);

    match (config.edge_cache_backend, &config.redis_url) {
        (EdgeCacheBackend::Redis, Some(redis_url)) => {
            match RedisEdgeCache::connect(redis_url).await {
                Ok(redis) => {
                    tracing::info!("Edge cache enabled (Redis)");
                    return Arc::new(redis);
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to connect Redis edge cache: {}. Using memory cache.",
                        e
                    );
                }
            }
        }
        (EdgeCacheBackend::Redis, None) => {
            tracing::warn!("Redis edge cache requested without Redis. Using memory cache.");
        }
        (EdgeCacheBackend::Memory, _) => {}
    }

    tracing::info!("Edge cache enabled (memory, {} entries)", capacity);
    Arc::new(MemoryEdgeCache::new(capacity))
}

/// Builds the origin HTTP client.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized.
pub fn build_origin(config: &Config) -> Result<Arc<dyn ImageOrigin>> {
    let origin = HttpOrigin::new(OriginSettings {
        listing_url: config.source_url.clone(),
        user_agent: config.user_agent.clone(),
        referer: config.origin_referer.clone(),
        timeout: Duration::from_secs(config.http_timeout_seconds),
    })
    .context("Failed to build origin HTTP client")?;

    Ok(Arc::new(origin))
}

/// Builds the pool refresher from the configured interval and bound.
pub fn build_refresher(config: &Config, origin: Arc<dyn ImageOrigin>) -> PoolRefresher {
    PoolRefresher::new(origin, config.refresh_interval(), config.max_pool_size)
}

/// Resolves once Ctrl+C or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
