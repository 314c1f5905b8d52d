//! HTTP transport for the climate aggregator
//!
//! Exposes the room registry and the sensor fleet over a JSON API, the
//! ingestion endpoints used by standalone sensor emitters, a server-sent
//! events stream of room snapshots and the browser dashboard at `/`.

pub mod dashboard;
pub mod fleet_api;
pub mod ingestion_api;
pub mod rooms_api;
pub mod stream;

use crate::error::{ClimateError, Result};
use crate::logging::log_if_slow;
use crate::server::ClimateHub;
use axum::{
    extract::{rejection::JsonRejection, Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

const SLOW_REQUEST_THRESHOLD_MS: u64 = 500;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
    pub rooms: usize,
    pub sensors_running: usize,
}

/// HTTP server wrapping a [`ClimateHub`]
pub struct HttpServer {
    hub: ClimateHub,
}

impl HttpServer {
    pub fn new(hub: ClimateHub) -> Self {
        Self { hub }
    }

    /// Router with every endpoint mounted
    pub fn router(&self) -> Router {
        create_router(self.hub.clone())
    }

    /// Bind and serve until `shutdown` resolves
    pub async fn serve<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let address = self.hub.config().bind_address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            ClimateError::connection(format!("Failed to bind to {address}: {e}"))
        })?;

        let port = self.hub.config().http.port;
        info!("🌡️ Climate aggregator listening on {}", address);
        info!("📊 Dashboard: http://localhost:{}/", port);
        info!("🏠 Rooms API: http://localhost:{}/api/rooms", port);
        info!("📡 Snapshot stream: http://localhost:{}/api/stream", port);
        info!("📬 Ingestion endpoint: http://localhost:{}/rpc/readings", port);
        info!("🏥 Health check: http://localhost:{}/health", port);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ClimateError::connection(format!("HTTP server error: {e}")))
    }
}

/// Build the application router
pub fn create_router(hub: ClimateHub) -> Router {
    let enable_cors = hub.config().http.enable_cors;

    let api_routes = Router::new()
        .route("/api/rooms", get(rooms_api::list_rooms))
        .route("/api/rooms/:room_id", get(rooms_api::get_room))
        .route(
            "/api/rooms/:room_id/target-temperature",
            post(rooms_api::set_target_temperature),
        )
        .route("/api/rooms/:room_id/cooling", post(rooms_api::set_cooling))
        .route(
            "/api/rooms/:room_id/automatic-mode",
            post(rooms_api::set_automatic_mode),
        )
        .route(
            "/api/fleet/rooms",
            get(fleet_api::list_rooms).post(fleet_api::add_room),
        )
        .route(
            "/api/fleet/rooms/:room_id",
            axum::routing::delete(fleet_api::remove_room),
        )
        .route("/api/fleet/rooms/:room_id/start", post(fleet_api::start_room))
        .route("/api/fleet/rooms/:room_id/stop", post(fleet_api::stop_room))
        .route(
            "/api/fleet/rooms/:room_id/:kind/start",
            post(fleet_api::start_sensor),
        )
        .route(
            "/api/fleet/rooms/:room_id/:kind/stop",
            post(fleet_api::stop_sensor),
        )
        .route("/api/stream", get(stream::snapshot_stream));

    let rpc_routes = Router::new()
        .route("/rpc/readings", post(ingestion_api::record_reading))
        .route("/rpc/rooms", get(ingestion_api::room_states));

    let mut app = Router::new()
        .route("/", get(dashboard::dashboard_index))
        .route("/api", get(api_index))
        .route("/health", get(health_check))
        .merge(api_routes)
        .merge(rpc_routes)
        .layer(middleware::from_fn(log_requests))
        .with_state(hub);

    if enable_cors {
        app = app.layer(CorsLayer::permissive());
    }

    app
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let elapsed_ms = started.elapsed().as_millis() as u64;
    debug!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms,
        "Handled request"
    );
    if !path.starts_with("/api/stream") {
        log_if_slow(&format!("{method} {path}"), elapsed_ms, SLOW_REQUEST_THRESHOLD_MS);
    }

    response
}

/// JSON index of the API endpoints
async fn api_index() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "Climate Hub",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "dashboard": "/",
            "health": "/health",
            "rooms": "/api/rooms",
            "fleet": "/api/fleet/rooms",
            "stream": "/api/stream",
            "ingestion": "/rpc/readings",
            "room_states": "/rpc/rooms"
        }
    }))
}

/// Health check endpoint
async fn health_check(State(hub): State<ClimateHub>) -> impl IntoResponse {
    debug!("Health check requested");

    let sensors_running = hub
        .fleet()
        .fleet_status()
        .await
        .values()
        .flat_map(|sensors| sensors.values())
        .filter(|status| status.running)
        .count();

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        rooms: hub.registry().len().await,
        sensors_running,
    })
}

/// Unwrap a JSON body, turning extractor rejections into `400` errors
pub(crate) fn json_body(payload: std::result::Result<Json<Value>, JsonRejection>) -> Result<Value> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ClimateError::invalid_input(rejection.body_text()))
}

/// Numeric field; numeric strings are accepted
pub(crate) fn number_field(body: &Value, field: &str) -> Result<f64> {
    let value = match body.get(field) {
        None | Some(Value::Null) => {
            return Err(ClimateError::invalid_input(format!(
                "Missing field '{field}'"
            )))
        }
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    value
        .filter(|v| v.is_finite())
        .ok_or_else(|| ClimateError::invalid_input(format!("Field '{field}' must be a number")))
}

/// Boolean field; no coercion from other types
pub(crate) fn bool_field(body: &Value, field: &str) -> Result<bool> {
    match body.get(field) {
        None | Some(Value::Null) => Err(ClimateError::invalid_input(format!(
            "Missing field '{field}'"
        ))),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(ClimateError::invalid_input(format!(
            "Field '{field}' must be a boolean"
        ))),
    }
}

/// Non-empty string field, trimmed
pub(crate) fn string_field<'a>(body: &'a Value, field: &str) -> Result<&'a str> {
    match body.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim()),
        Some(Value::String(_)) => Err(ClimateError::invalid_input(format!(
            "Field '{field}' must not be empty"
        ))),
        None | Some(Value::Null) => Err(ClimateError::invalid_input(format!(
            "Missing field '{field}'"
        ))),
        Some(_) => Err(ClimateError::invalid_input(format!(
            "Field '{field}' must be a string"
        ))),
    }
}
