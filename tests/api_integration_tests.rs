//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint, including rate
//! limit headers and worker pool offloading.

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use reservoir::{
    api::create_router,
    cache::BoundedCache,
    limiter::{RateLimiterConfig, SlidingWindowRateLimiter},
    pool::{PoolConfig, WorkerTaskPool},
    AppState, Config,
};
use serde_json::Value;
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_app() -> Router {
    let config = Config {
        pool_workers: 2,
        ..Default::default()
    };
    let state = AppState::from_config(&config).unwrap();
    create_router(state)
}

/// App with a tiny rate limit budget, for 429 tests.
fn create_limited_app(max_requests: u32) -> Router {
    let cache = BoundedCache::new(100, Duration::from_secs(300));
    let limiter = SlidingWindowRateLimiter::new(RateLimiterConfig {
        max_requests,
        window: Duration::from_secs(60),
        ..Default::default()
    })
    .unwrap();
    let pool = WorkerTaskPool::new(PoolConfig {
        workers: 1,
        ..Default::default()
    })
    .unwrap();
    create_router(AppState::new(cache, limiter, pool))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn set_request(key: &str, value: &str) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri("/cache/set")
        .header("content-type", "application/json")
        .body(Body::from(format!(
            r#"{{"key":"{}","value":"{}"}}"#,
            key, value
        )))
        .unwrap()
}

fn get_request(key: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(format!("/cache/get/{}", key))
        .body(Body::empty())
        .unwrap()
}

// == Cache Endpoint Tests ==

#[tokio::test]
async fn test_set_endpoint_success() {
    let app = create_test_app();

    let response = app.oneshot(set_request("test_key", "test_value")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert!(json["message"].as_str().unwrap().contains("test_key"));
}

#[tokio::test]
async fn test_set_endpoint_with_ttl() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/cache/set")
                .header("content-type", "application/json")
                .body(Body::from(
                    r#"{"key":"ttl_key","value":"ttl_value","ttl_secs":60}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_set_endpoint_rejects_empty_key() {
    let app = create_test_app();

    let response = app.oneshot(set_request("", "value")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_endpoint_success() {
    let app = create_test_app();

    let set_response = app.clone().oneshot(set_request("get_key", "get_value")).await.unwrap();
    assert_eq!(set_response.status(), StatusCode::OK);

    let get_response = app.oneshot(get_request("get_key")).await.unwrap();

    assert_eq!(get_response.status(), StatusCode::OK);
    let json = body_to_json(get_response.into_body()).await;
    assert_eq!(json["key"].as_str().unwrap(), "get_key");
    assert_eq!(json["value"].as_str().unwrap(), "get_value");
}

#[tokio::test]
async fn test_get_endpoint_not_found() {
    let app = create_test_app();

    let response = app.oneshot(get_request("missing_key")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn test_get_endpoint_expired_key() {
    let app = create_test_app();

    let set_response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/cache/set")
                .header("content-type", "application/json")
                .body(Body::from(
                    r#"{"key":"expiring","value":"gone","ttl_secs":0}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(set_response.status(), StatusCode::OK);

    // ttl_secs=0 means the entry expires as soon as any time passes
    tokio::time::sleep(Duration::from_millis(20)).await;

    let get_response = app.oneshot(get_request("expiring")).await.unwrap();
    assert_eq!(get_response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_endpoint_success() {
    let app = create_test_app();

    app.clone().oneshot(set_request("del_key", "del_value")).await.unwrap();

    let del_response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/cache/del/del_key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(del_response.status(), StatusCode::OK);

    let get_response = app.oneshot(get_request("del_key")).await.unwrap();
    assert_eq!(get_response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_endpoint_not_found() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/cache/del/never_set")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cache_stats_endpoint() {
    let app = create_test_app();

    app.clone().oneshot(set_request("stats_key", "v")).await.unwrap();
    // One hit, one miss
    app.clone().oneshot(get_request("stats_key")).await.unwrap();
    app.clone().oneshot(get_request("absent")).await.unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/cache/stats")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["hits"].as_u64().unwrap(), 1);
    assert_eq!(json["misses"].as_u64().unwrap(), 1);
    assert_eq!(json["total_entries"].as_u64().unwrap(), 1);
    assert!(json.get("hit_rate").is_some());
    assert!(json.get("evictions").is_some());
    assert!(json.get("expirations").is_some());
}

// == JSON Pool Endpoint Tests ==

#[tokio::test]
async fn test_parse_endpoint_success() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/json/parse")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"payload":"{\"a\":1,\"b\":[2,3]}"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["value"]["a"].as_u64().unwrap(), 1);
    assert_eq!(json["value"]["b"][1].as_u64().unwrap(), 3);
}

#[tokio::test]
async fn test_parse_endpoint_invalid_payload() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/json/parse")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"payload":"not json at all"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_parse_endpoint_with_priority() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/json/parse")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"payload":"[1,2]","priority":"high"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_stringify_endpoint_success() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/json/stringify")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"value":{"x":true}}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["text"].as_str().unwrap(), r#"{"x":true}"#);
}

#[tokio::test]
async fn test_pool_stats_endpoint() {
    let app = create_test_app();

    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/json/parse")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"payload":"42"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/pool/stats")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["total_processed"].as_u64().unwrap(), 1);
    assert_eq!(json["error_count"].as_u64().unwrap(), 0);
    assert_eq!(json["active_workers"].as_u64().unwrap(), 2);
    assert_eq!(json["queue_size"].as_u64().unwrap(), 0);
}

// == Rate Limiting Tests ==

#[tokio::test]
async fn test_rate_limit_headers_present() {
    let app = create_limited_app(10);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/cache/stats")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers["x-ratelimit-limit"], "10");
    assert_eq!(headers["x-ratelimit-remaining"], "9");
    assert!(headers.contains_key("x-ratelimit-reset"));
}

#[tokio::test]
async fn test_rate_limit_exceeded_returns_429() {
    let app = create_limited_app(2);

    for _ in 0..2 {
        let response = app.clone().oneshot(get_request("any")).await.unwrap();
        assert_ne!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    let response = app.clone().oneshot(get_request("any")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let headers = response.headers().clone();
    assert_eq!(headers["x-ratelimit-remaining"], "0");
    assert!(headers.contains_key("retry-after"));

    // Still blocked on the next request, from the blocked-keys fast path
    let response = app.oneshot(get_request("any")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_rate_limit_keys_by_forwarded_header() {
    let app = create_limited_app(1);

    // Exhaust the budget for one client
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/cache/stats")
                .header("x-forwarded-for", "10.0.0.1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/cache/stats")
                .header("x-forwarded-for", "10.0.0.1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // A different client still has budget
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/cache/stats")
                .header("x-forwarded-for", "10.0.0.2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_endpoint_not_rate_limited() {
    let app = create_limited_app(1);

    // Exhaust the budget, then confirm health still answers
    app.clone().oneshot(get_request("x")).await.unwrap();
    let limited = app.clone().oneshot(get_request("x")).await.unwrap();
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"].as_str().unwrap(), "healthy");
}

// == Error Handling Tests ==

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/nonexistent")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_json_body_rejected() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/cache/set")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    // Axum's Json extractor rejects malformed bodies before the handler
    assert!(response.status().is_client_error());
}
