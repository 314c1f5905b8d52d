//! Ingestion and state-query endpoints used by sensor emitters
//!
//! Ingestion never answers with an error status: a malformed report yields
//! `{"success": false}` and leaves the registry untouched, so the emitter can
//! simply try again on its next tick.

use super::{number_field, string_field};
use crate::error::{ClimateError, Result};
use crate::server::ClimateHub;
use crate::services::{RoomControlState, SensorKind};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::warn;

/// A reading report after validation
#[derive(Debug, Clone, PartialEq)]
struct ReadingReport {
    room_id: String,
    kind: SensorKind,
    value: f64,
    unit: String,
}

fn parse_report(body: &Value) -> Result<ReadingReport> {
    let room_id = string_field(body, "room_id")?.to_string();
    let kind: SensorKind = string_field(body, "kind")?.parse()?;
    let value = number_field(body, "value")?;
    let unit = match body.get("unit") {
        Some(Value::String(unit)) => unit.clone(),
        None | Some(Value::Null) => kind.unit().to_string(),
        Some(_) => return Err(ClimateError::invalid_input("Field 'unit' must be a string")),
    };

    Ok(ReadingReport {
        room_id,
        kind,
        value,
        unit,
    })
}

/// Record one reading reported by an emitter
pub async fn record_reading(
    State(hub): State<ClimateHub>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Json<Value> {
    let report = match payload {
        Ok(Json(body)) => parse_report(&body),
        Err(rejection) => Err(ClimateError::invalid_input(rejection.body_text())),
    };

    let outcome = match report {
        Ok(report) => {
            hub.registry()
                .record_reading(&report.room_id, report.kind, report.value, &report.unit)
                .await
        }
        Err(e) => Err(e),
    };

    if let Err(e) = &outcome {
        warn!("Rejected reading report: {}", e);
    }

    Json(json!({ "success": outcome.is_ok() }))
}

/// Control state of every room, consumed by temperature emitters
pub async fn room_states(State(hub): State<ClimateHub>) -> Json<HashMap<String, RoomControlState>> {
    Json(hub.registry().control_states().await)
}
