//! Shared test fixtures
//!
//! Fast simulation settings, hub/router construction and small helpers for
//! driving the axum router in-process.

#![allow(dead_code)]

pub mod aggregator_mock;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use climate_hub::{
    config::SimulationConfig, http_transport::create_router, ClimateHub, ServerConfig,
};
use rstest::*;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tower::ServiceExt;

/// Simulation running at a thousandth of real time
#[fixture]
pub fn fast_simulation() -> SimulationConfig {
    SimulationConfig {
        time_scale: 0.001,
        autostart: true,
    }
}

/// Server configuration with fast simulation and a short stream interval
#[fixture]
pub fn test_config(fast_simulation: SimulationConfig) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.simulation = fast_simulation;
    config.stream.poll_interval = Duration::from_millis(20);
    config
}

/// Hub built from [`test_config`]
#[fixture]
pub fn hub(test_config: ServerConfig) -> ClimateHub {
    ClimateHub::new(test_config)
}

pub fn router(hub: &ClimateHub) -> Router {
    create_router(hub.clone())
}

/// Send one request through the router and decode the JSON body
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// Send one request and return the content type and the raw body text
pub async fn send_text(router: &Router, request: Request<Body>) -> (StatusCode, String, String) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Poll `condition` until it holds or `timeout` elapses
pub async fn eventually<F, Fut>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    tokio::time::timeout(timeout, async {
        loop {
            if condition().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .is_ok()
}
