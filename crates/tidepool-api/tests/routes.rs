//! Router tests driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tidepool_api::build_router;
use tidepool_control::{ControlLoop, LoopSettings};
use tidepool_core::{Gains, TunableValues};
use tidepool_metrics::Tunables;
use tidepool_pool::PoolHandles;
use tower::ServiceExt;

fn test_loop() -> (ControlLoop, PoolHandles) {
    let handles = PoolHandles::new();
    let tunables = Arc::new(Tunables::new(TunableValues {
        setpoint: 20.0,
        gains: Gains::new(0.5, 1.0, 0.0),
    }));
    let cl = ControlLoop::new(handles.clone(), tunables, LoopSettings::default());
    (cl, handles)
}

async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn put_text(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header("content-type", "text/plain")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn put_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn snapshot_reports_backlog_and_tunables() {
    let (cl, handles) = test_loop();
    handles.queue.push(3u64);
    let router = build_router(cl.surface());

    let (status, body) = send(&router, get("/api/v1/snapshot")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["backlog"], 1);
    assert_eq!(body["data"]["active"], 0);
    assert_eq!(body["data"]["setpoint"], 20.0);
    assert_eq!(body["data"]["gains"]["kp"], 0.5);
}

#[tokio::test]
async fn text_update_applies_all_fields() {
    let (cl, _) = test_loop();
    let router = build_router(cl.surface());

    let (status, body) = send(&router, put_text("/api/v1/tunables", "kp=2; setp=12")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["gains"]["kp"], 2.0);
    assert_eq!(body["data"]["setpoint"], 12.0);

    let (_, body) = send(&router, get("/api/v1/tunables")).await;
    assert_eq!(body["data"]["setpoint"], 12.0);
}

#[tokio::test]
async fn malformed_text_update_changes_nothing() {
    let (cl, _) = test_loop();
    let router = build_router(cl.surface());

    let (status, body) = send(&router, put_text("/api/v1/tunables", "kp=2; ki=lots")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("ki"));

    let (_, body) = send(&router, get("/api/v1/tunables")).await;
    assert_eq!(body["data"]["gains"]["kp"], 0.5);
    assert_eq!(body["data"]["gains"]["ki"], 1.0);
}

#[tokio::test]
async fn unknown_name_in_text_update_is_bad_request() {
    let (cl, _) = test_loop();
    let router = build_router(cl.surface());

    let (status, body) = send(&router, put_text("/api/v1/tunables", "kp=2; boost=9")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("boost"));

    let (_, body) = send(&router, get("/api/v1/tunables")).await;
    assert_eq!(body["data"]["gains"]["kp"], 0.5);
}

#[tokio::test]
async fn single_tunable_update_by_name() {
    let (cl, _) = test_loop();
    let router = build_router(cl.surface());

    let (status, body) = send(&router, put_json("/api/v1/tunables/kd", serde_json::json!({ "value": 0.75 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["gains"]["kd"], 0.75);

    let (status, body) = send(&router, put_json("/api/v1/tunables/boost", serde_json::json!({ "value": 1.0 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn samples_drain_on_read() {
    let (mut cl, _) = test_loop();
    cl.tick();
    cl.tick();
    let router = build_router(cl.surface());

    let (_, body) = send(&router, get("/api/v1/samples")).await;
    let samples = body["data"].as_array().unwrap();
    assert_eq!(samples.len(), 2);
    assert_eq!(samples[0]["tick"], 1);
    assert_eq!(samples[1]["tick"], 2);

    let (_, body) = send(&router, get("/api/v1/samples")).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn prometheus_endpoint_serves_text() {
    let (cl, handles) = test_loop();
    handles.queue.push(1u64);
    handles.queue.push(2u64);
    let router = build_router(cl.surface());

    let resp = router.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        resp.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("tidepool_backlog 2\n"));
}
