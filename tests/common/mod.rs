#![allow(dead_code)]

use chrono::{DateTime, Utc};
use random_image_proxy::api::response::ClientCachePolicy;
use random_image_proxy::application::background_job::TaskQueue;
use random_image_proxy::application::background_worker::BackgroundWorker;
use random_image_proxy::application::services::{
    ImageService, PoolRefresher, PoolStore, Selector,
};
use random_image_proxy::domain::entities::Pool;
use random_image_proxy::infrastructure::edge::MemoryEdgeCache;
use random_image_proxy::infrastructure::origin::{HttpOrigin, OriginSettings};
use random_image_proxy::infrastructure::store::{KvStore, MemoryStore};
use random_image_proxy::state::AppState;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const POOL_KEY: &str = "pixiv_archive_db";
pub const EDGE_TTL: u64 = 31_536_000;
pub const BROWSER_TTL: u64 = 3600;

/// Handles onto the collaborators behind a test [`AppState`].
pub struct TestContext {
    pub state: AppState,
    pub kv: Arc<MemoryStore>,
    pub edge: Arc<MemoryEdgeCache>,
}

pub fn listing_url(origin: &MockServer) -> String {
    format!("{}/pe_pixiv.json", origin.uri())
}

pub fn fallback_url(origin: &MockServer) -> String {
    format!("{}/fallback.jpg", origin.uri())
}

pub fn image_url(origin: &MockServer, name: &str) -> String {
    format!("{}/img/{}", origin.uri(), name)
}

/// Millisecond-precision timestamp `hours` in the past, as stored.
pub fn hours_ago(hours: i64) -> DateTime<Utc> {
    let at = Utc::now() - chrono::Duration::hours(hours);
    DateTime::from_timestamp_millis(at.timestamp_millis()).unwrap()
}

pub async fn seed_pool(kv: &MemoryStore, pool: &Pool) {
    kv.put_json(POOL_KEY, &serde_json::to_value(pool).unwrap())
        .await
        .unwrap();
}

pub async fn stored_pool(kv: &MemoryStore) -> Option<Pool> {
    kv.get_json(POOL_KEY)
        .await
        .unwrap()
        .map(|value| serde_json::from_value(value).unwrap())
}

/// Serves `body` as a JPEG at `/img/<name>`.
pub async fn mount_image(origin: &MockServer, name: &str, body: &'static [u8]) {
    Mock::given(method("GET"))
        .and(path(format!("/img/{}", name)))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .insert_header("cache-control", "no-cache")
                .set_body_bytes(body),
        )
        .mount(origin)
        .await;
}

/// Serves a listing whose `urls.regular` entries are `urls`.
pub async fn mount_listing(origin: &MockServer, urls: &[String]) {
    let data: Vec<serde_json::Value> = urls
        .iter()
        .map(|url| serde_json::json!({ "urls": { "regular": url } }))
        .collect();

    Mock::given(method("GET"))
        .and(path("/pe_pixiv.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": data })))
        .mount(origin)
        .await;
}

/// Builds application state against a wiremock origin with memory-backed
/// store and edge cache, and spawns the background worker.
///
/// With `store_bound = false` the state has no key-value store.
pub fn create_test_state(origin: &MockServer, store_bound: bool) -> TestContext {
    let kv = Arc::new(MemoryStore::new());
    let pool_store = store_bound.then(|| Arc::new(PoolStore::new(kv.clone(), POOL_KEY)));

    create_test_state_with_store(origin, pool_store, kv)
}

/// Like [`create_test_state`], but serves the pool from `pool_store`.
///
/// `kv` is only kept as a handle in the returned context.
pub fn create_test_state_with_store(
    origin: &MockServer,
    pool_store: Option<Arc<PoolStore>>,
    kv: Arc<MemoryStore>,
) -> TestContext {
    let edge = Arc::new(MemoryEdgeCache::new(NonZeroUsize::new(64).unwrap()));

    let http_origin = Arc::new(
        HttpOrigin::new(OriginSettings {
            listing_url: listing_url(origin),
            user_agent: "test-agent".to_string(),
            referer: "https://www.pixiv.net/".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap(),
    );

    let refresher = Arc::new(PoolRefresher::new(
        http_origin.clone(),
        chrono::Duration::hours(1),
        1000,
    ));

    let (tasks, rx) = TaskQueue::new(32);
    let worker = BackgroundWorker::new(refresher.clone(), edge.clone(), 2);
    tokio::spawn(worker.run(rx));

    let state = AppState {
        pool_store,
        refresher,
        selector: Arc::new(Selector::new(fallback_url(origin))),
        images: Arc::new(ImageService::new(
            http_origin,
            edge.clone(),
            tasks.clone(),
            EDGE_TTL,
        )),
        tasks,
        client_cache: ClientCachePolicy::from_ttl(BROWSER_TTL),
    };

    TestContext { state, kv, edge }
}

/// Serves `body` as a JPEG at the fallback image path.
pub async fn mount_fallback(origin: &MockServer, body: &'static [u8]) {
    Mock::given(method("GET"))
        .and(path("/fallback.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(body),
        )
        .mount(origin)
        .await;
}

/// Polls `check` until it returns `true`, panicking after two seconds.
pub async fn wait_until<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met within 2s");
}
