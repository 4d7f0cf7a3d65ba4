mod common;

use axum::{Router, routing::get};
use axum_test::TestServer;
use random_image_proxy::api::handlers::random_image_handler;
use random_image_proxy::domain::entities::Pool;
use random_image_proxy::state::AppState;
use std::collections::HashSet;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_server(state: AppState) -> TestServer {
    let app = Router::new()
        .route("/", get(random_image_handler))
        .with_state(state);

    TestServer::new(app).unwrap()
}

#[tokio::test]
async fn test_serves_pooled_image() {
    let origin = MockServer::start().await;
    common::mount_image(&origin, "1.jpg", b"jpeg-one").await;

    let ctx = common::create_test_state(&origin, true);
    common::seed_pool(
        &ctx.kv,
        &Pool::new(common::hours_ago(0), vec![common::image_url(&origin, "1.jpg")]),
    )
    .await;

    let server = test_server(ctx.state.clone());

    let response = server.get("/").await;

    response.assert_status_ok();
    assert_eq!(response.as_bytes().as_ref(), b"jpeg-one");
    assert_eq!(response.header("content-type"), "image/jpeg");
    assert_eq!(response.header("access-control-allow-origin"), "*");
    assert_eq!(response.header("cache-control"), "public, max-age=3600");
    assert_eq!(response.header("x-cache"), "MISS");
}

#[tokio::test]
async fn test_second_request_is_served_from_edge_cache() {
    let origin = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img/1.jpg"))
        .and(header("referer", "https://www.pixiv.net/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(b"jpeg-one".as_slice()),
        )
        .expect(1)
        .mount(&origin)
        .await;

    let ctx = common::create_test_state(&origin, true);
    common::seed_pool(
        &ctx.kv,
        &Pool::new(common::hours_ago(0), vec![common::image_url(&origin, "1.jpg")]),
    )
    .await;

    let server = test_server(ctx.state.clone());

    server.get("/").await.assert_status_ok();

    let edge = ctx.edge.clone();
    common::wait_until(|| {
        let edge = edge.clone();
        async move { edge.len() == 1 }
    })
    .await;

    let response = server.get("/").await;

    response.assert_status_ok();
    assert_eq!(response.as_bytes().as_ref(), b"jpeg-one");
    assert_eq!(response.header("x-cache"), "HIT");
    assert_eq!(response.header("cache-control"), "public, max-age=3600");
}

#[tokio::test]
async fn test_fresh_pool_does_not_refresh() {
    let origin = MockServer::start().await;
    common::mount_image(&origin, "1.jpg", b"jpeg-one").await;
    Mock::given(method("GET"))
        .and(path("/pe_pixiv.json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&origin)
        .await;

    let ctx = common::create_test_state(&origin, true);
    common::seed_pool(
        &ctx.kv,
        &Pool::new(common::hours_ago(0), vec![common::image_url(&origin, "1.jpg")]),
    )
    .await;

    let server = test_server(ctx.state.clone());

    server.get("/").await.assert_status_ok();
    assert!(ctx.state.refresher.try_claim().is_some());
}

#[tokio::test]
async fn test_stale_pool_is_refreshed_in_background() {
    let origin = MockServer::start().await;
    let a = common::image_url(&origin, "a.jpg");
    let b = common::image_url(&origin, "b.jpg");
    let c = common::image_url(&origin, "c.jpg");

    common::mount_image(&origin, "a.jpg", b"a").await;
    common::mount_image(&origin, "b.jpg", b"b").await;
    common::mount_listing(&origin, &[b.clone(), c.clone()]).await;

    let ctx = common::create_test_state(&origin, true);
    let stale_since = common::hours_ago(2);
    common::seed_pool(&ctx.kv, &Pool::new(stale_since, vec![a.clone(), b.clone()])).await;

    let server = test_server(ctx.state.clone());

    // The stale pool is still served while the refresh runs.
    server.get("/").await.assert_status_ok();

    let kv = ctx.kv.clone();
    common::wait_until(|| {
        let kv = kv.clone();
        async move {
            common::stored_pool(&kv)
                .await
                .is_some_and(|pool| pool.len() == 3)
        }
    })
    .await;

    let pool = common::stored_pool(&ctx.kv).await.unwrap();
    let urls: HashSet<&str> = pool.urls.iter().map(String::as_str).collect();
    assert_eq!(urls, HashSet::from([a.as_str(), b.as_str(), c.as_str()]));
    assert!(pool.last_updated > stale_since);
}

#[tokio::test]
async fn test_empty_pool_serves_fallback_image() {
    let origin = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fallback.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(b"fallback".as_slice()),
        )
        .mount(&origin)
        .await;

    let ctx = common::create_test_state(&origin, true);
    let server = test_server(ctx.state.clone());

    let response = server.get("/").await;

    response.assert_status_ok();
    assert_eq!(response.as_bytes().as_ref(), b"fallback");
    assert_eq!(response.header("access-control-allow-origin"), "*");
}

#[tokio::test]
async fn test_empty_pool_with_unreachable_origin_redirects_to_fallback() {
    // Nothing mounted: listing and fallback image both return 404.
    let origin = MockServer::start().await;

    let ctx = common::create_test_state(&origin, true);
    let server = test_server(ctx.state.clone());

    let response = server.get("/").await;

    assert_eq!(response.status_code(), 302);
    assert_eq!(response.header("location"), common::fallback_url(&origin));
    assert_eq!(response.header("cache-control"), "no-store");

    // A failed refresh leaves no pool behind.
    let refresher = ctx.state.refresher.clone();
    common::wait_until(|| {
        let refresher = refresher.clone();
        async move { refresher.try_claim().is_some() }
    })
    .await;
    assert!(common::stored_pool(&ctx.kv).await.is_none());
}

#[tokio::test]
async fn test_deleted_image_redirects_to_fallback() {
    let origin = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img/gone.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&origin)
        .await;

    let ctx = common::create_test_state(&origin, true);
    common::seed_pool(
        &ctx.kv,
        &Pool::new(common::hours_ago(0), vec![common::image_url(&origin, "gone.jpg")]),
    )
    .await;

    let server = test_server(ctx.state.clone());

    let response = server.get("/").await;

    assert_eq!(response.status_code(), 302);
    assert_eq!(response.header("location"), common::fallback_url(&origin));
    assert!(ctx.edge.is_empty());
}

#[tokio::test]
async fn test_missing_store_returns_500() {
    let origin = MockServer::start().await;

    let ctx = common::create_test_state(&origin, false);
    let server = test_server(ctx.state.clone());

    let response = server.get("/").await;

    assert_eq!(response.status_code(), 500);
    assert_eq!(response.text(), "Error: KV store binding not found.");
    assert_eq!(response.header("content-type"), "text/plain; charset=utf-8");
}
