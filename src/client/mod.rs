//! HTTP client used by standalone sensor emitters
//!
//! Talks to the aggregator's ingestion endpoints:
//! - `POST /rpc/readings` to deliver a reading
//! - `GET /rpc/rooms` to fetch room control state

use crate::error::{ClimateError, Result};
use crate::services::models::{RoomControlState, SensorKind};
use crate::services::telemetry::TelemetrySink;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

#[derive(Debug, Deserialize)]
struct IngestionAck {
    success: bool,
}

/// [`TelemetrySink`] backed by a remote aggregator
#[derive(Debug, Clone)]
pub struct HttpTelemetryClient {
    client: reqwest::Client,
    readings_url: Url,
    rooms_url: Url,
}

impl HttpTelemetryClient {
    /// Create a client for the aggregator at `base_url`
    pub fn new(base_url: &Url) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ClimateError::connection(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            readings_url: join(base_url, "rpc/readings")?,
            rooms_url: join(base_url, "rpc/rooms")?,
        })
    }
}

fn join(base_url: &Url, path: &str) -> Result<Url> {
    let mut base = base_url.clone();
    if !base.path().ends_with('/') {
        base.set_path(&format!("{}/", base.path()));
    }
    base.join(path)
        .map_err(|e| ClimateError::config(format!("Invalid aggregator URL {base_url}: {e}")))
}

#[async_trait]
impl TelemetrySink for HttpTelemetryClient {
    async fn record_reading(
        &self,
        room_id: &str,
        kind: SensorKind,
        value: f64,
        unit: &str,
    ) -> Result<()> {
        let response = self
            .client
            .post(self.readings_url.clone())
            .json(&serde_json::json!({
                "room_id": room_id,
                "kind": kind,
                "value": value,
                "unit": unit,
            }))
            .send()
            .await
            .map_err(|e| ClimateError::ingestion(format!("Aggregator unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(ClimateError::ingestion(format!(
                "Aggregator answered {}",
                response.status()
            )));
        }

        let ack: IngestionAck = response.json().await?;
        if ack.success {
            Ok(())
        } else {
            Err(ClimateError::ingestion(format!(
                "Aggregator rejected {kind} reading for room {room_id}"
            )))
        }
    }

    async fn query_room_states(&self) -> Result<HashMap<String, RoomControlState>> {
        let response = self
            .client
            .get(self.rooms_url.clone())
            .send()
            .await
            .map_err(|e| ClimateError::connection(format!("Aggregator unreachable: {e}")))?
            .error_for_status()?;

        Ok(response.json().await?)
    }
}
