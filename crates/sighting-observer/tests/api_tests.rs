//! Integration tests for the HTTP endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. Streaming tests read the SSE response body
//! frame by frame.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, BodyDataStream};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use futures::StreamExt;
use serde_json::{json, Value};
use sighting_hub::StreamConfig;
use sighting_observer::router::build_router;
use sighting_observer::state::AppState;
use tower::ServiceExt;

fn example_sighting() -> Value {
    json!({
        "ip": "1.2.3.4",
        "latitude": 10.0,
        "longitude": 20.0,
        "timestamp": 1_700_000_000,
        "suspicious": 0
    })
}

fn post_json(body: &Value) -> Request<Body> {
    Request::post("/receive")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> axum::response::Response {
    router.clone().oneshot(request).await.unwrap()
}

async fn get(router: &Router, path: &str) -> axum::response::Response {
    send(router, Request::get(path).body(Body::empty()).unwrap()).await
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Read one complete SSE event (terminated by a blank line).
async fn next_event(body: &mut BodyDataStream) -> String {
    let mut text = String::new();
    while !text.ends_with("\n\n") {
        let chunk = tokio::time::timeout(Duration::from_secs(5), body.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        text.push_str(std::str::from_utf8(&chunk).unwrap());
    }
    text
}

/// Value of an SSE field line such as `id: 1`.
fn field<'a>(event: &'a str, name: &str) -> Option<&'a str> {
    event
        .lines()
        .find_map(|line| line.strip_prefix(name)?.strip_prefix(':'))
        .map(str::trim)
}

// =========================================================================
// Status
// =========================================================================

#[tokio::test]
async fn test_index_returns_html() {
    let router = build_router(Arc::new(AppState::new()));
    let response = get(&router, "/").await;

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.contains("text/html"));
}

#[tokio::test]
async fn test_health_reports_counts() {
    let state = Arc::new(AppState::new());
    let router = build_router(Arc::clone(&state));
    send(&router, post_json(&example_sighting())).await;

    let json = body_to_json(get(&router, "/health").await.into_body()).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["sightings"], 1);
    assert_eq!(json["sessions"], 0);
}

// =========================================================================
// Ingest + history
// =========================================================================

#[tokio::test]
async fn test_receive_then_history() {
    let state = Arc::new(AppState::new());
    let router = build_router(Arc::clone(&state));

    let response = send(&router, post_json(&example_sighting())).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["message"], "Sighting received");
    assert_eq!(state.gateway.history().len(), 1);

    let response = get(&router, "/history").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(
        json,
        json!([{
            "ip": "1.2.3.4",
            "latitude": 10.0,
            "longitude": 20.0,
            "timestamp": "2023-11-14T22:13:20",
            "suspicious": 0
        }])
    );
}

#[tokio::test]
async fn test_history_keeps_arrival_order() {
    let router = build_router(Arc::new(AppState::new()));

    for i in 0..20 {
        let mut body = example_sighting();
        body["ip"] = json!(format!("10.0.0.{i}"));
        body["timestamp"] = json!("2023-11-14 22:13:20");
        let response = send(&router, post_json(&body)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let json = body_to_json(get(&router, "/history").await.into_body()).await;
    let ips: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["ip"].as_str().unwrap())
        .collect();
    let expected: Vec<String> = (0..20).map(|i| format!("10.0.0.{i}")).collect();
    assert_eq!(ips, expected);
}

#[tokio::test]
async fn test_history_empty() {
    let router = build_router(Arc::new(AppState::new()));
    let json = body_to_json(get(&router, "/history").await.into_body()).await;
    assert_eq!(json, json!([]));
}

#[tokio::test]
async fn test_receive_missing_field_is_rejected() {
    let state = Arc::new(AppState::new());
    let router = build_router(Arc::clone(&state));

    let mut body = example_sighting();
    body.as_object_mut().unwrap().remove("timestamp");
    let response = send(&router, post_json(&body)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 400);
    assert!(json["error"].as_str().unwrap().contains("timestamp"));
    assert!(state.gateway.history().is_empty());
}

#[tokio::test]
async fn test_receive_bad_timestamp_is_rejected() {
    let state = Arc::new(AppState::new());
    let router = build_router(Arc::clone(&state));

    let mut body = example_sighting();
    body["timestamp"] = json!("next tuesday");
    let response = send(&router, post_json(&body)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(state.gateway.history().is_empty());
}

#[tokio::test]
async fn test_receive_without_json_content_type_is_rejected() {
    let state = Arc::new(AppState::new());
    let router = build_router(Arc::clone(&state));

    let request = Request::post("/receive")
        .body(Body::from(example_sighting().to_string()))
        .unwrap();
    let response = send(&router, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(state.gateway.history().is_empty());
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let router = build_router(Arc::new(AppState::new()));
    let request = Request::get("/history")
        .header(header::ORIGIN, "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let response = send(&router, request).await;

    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

// =========================================================================
// Stream
// =========================================================================

#[tokio::test]
async fn test_stream_headers() {
    let router = build_router(Arc::new(AppState::new()));
    let response = get(&router, "/stream").await;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert!(headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));
    assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
    assert_eq!(headers["x-accel-buffering"], "no");
}

#[tokio::test]
async fn test_stream_delivers_new_sighting() {
    let state = Arc::new(AppState::new());
    let router = build_router(Arc::clone(&state));

    let response = get(&router, "/stream").await;
    assert_eq!(state.gateway.hub().session_count(), 1);
    let mut body = response.into_body().into_data_stream();

    send(&router, post_json(&example_sighting())).await;

    let event = next_event(&mut body).await;
    assert_eq!(field(&event, "id"), Some("1"));
    assert_eq!(field(&event, "event"), Some("package"));
    assert_eq!(field(&event, "retry"), Some("3000"));

    let data: Value = serde_json::from_str(field(&event, "data").unwrap()).unwrap();
    assert_eq!(
        data,
        json!({
            "ip": "1.2.3.4",
            "latitude": 10.0,
            "longitude": 20.0,
            "timestamp": "2023-11-14T22:13:20",
            "suspicious": 0,
            "package_id": 1
        })
    );

    let mut second = example_sighting();
    second["ip"] = json!("5.6.7.8");
    send(&router, post_json(&second)).await;

    let event = next_event(&mut body).await;
    assert_eq!(field(&event, "id"), Some("2"));
    assert!(field(&event, "data").unwrap().contains("5.6.7.8"));
}

#[tokio::test]
async fn test_stream_fans_out_to_every_client() {
    let state = Arc::new(AppState::new());
    let router = build_router(Arc::clone(&state));

    let mut first = get(&router, "/stream").await.into_body().into_data_stream();
    let mut second = get(&router, "/stream").await.into_body().into_data_stream();
    assert_eq!(state.gateway.hub().session_count(), 2);

    send(&router, post_json(&example_sighting())).await;

    for body in [&mut first, &mut second] {
        let event = next_event(body).await;
        assert_eq!(field(&event, "id"), Some("1"));
    }
}

#[tokio::test]
async fn test_stream_does_not_backfill() {
    let state = Arc::new(AppState::with_stream_config(StreamConfig {
        heartbeat: Duration::from_millis(50),
        ..StreamConfig::default()
    }));
    let router = build_router(Arc::clone(&state));

    send(&router, post_json(&example_sighting())).await;
    let mut body = get(&router, "/stream").await.into_body().into_data_stream();

    let event = next_event(&mut body).await;
    assert!(event.starts_with(':'));
    assert!(event.contains("heartbeat"));
}

#[tokio::test]
async fn test_stream_idle_heartbeat() {
    let state = Arc::new(AppState::with_stream_config(StreamConfig {
        heartbeat: Duration::from_millis(20),
        ..StreamConfig::default()
    }));
    let router = build_router(Arc::clone(&state));
    let mut body = get(&router, "/stream").await.into_body().into_data_stream();

    for _ in 0..2 {
        let event = next_event(&mut body).await;
        assert_eq!(event.trim_end(), ": heartbeat");
    }
}

#[tokio::test]
async fn test_stream_disconnect_deregisters_session() {
    let state = Arc::new(AppState::new());
    let router = build_router(Arc::clone(&state));

    let response = get(&router, "/stream").await;
    assert_eq!(state.gateway.hub().session_count(), 1);

    drop(response);
    assert_eq!(state.gateway.hub().session_count(), 0);

    let response = send(&router, post_json(&example_sighting())).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_stream_ends_when_hub_closes() {
    let state = Arc::new(AppState::new());
    let router = build_router(Arc::clone(&state));
    let mut body = get(&router, "/stream").await.into_body().into_data_stream();

    state.gateway.hub().close();

    let next = tokio::time::timeout(Duration::from_secs(5), body.next())
        .await
        .unwrap();
    assert!(next.is_none());
}
