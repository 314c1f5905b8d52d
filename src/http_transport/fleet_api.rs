//! Sensor fleet lifecycle endpoints

use super::{json_body, string_field};
use crate::error::{ClimateError, ErrorReporter, Result};
use crate::server::ClimateHub;
use crate::services::SensorKind;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::Json,
};
use serde_json::{json, Value};
use tracing::info;

/// Fleet rooms and the running state of their sensors
pub async fn list_rooms(State(hub): State<ClimateHub>) -> Json<Value> {
    let rooms = hub.fleet().room_ids().await;
    let sensors = hub.fleet().fleet_status().await;
    Json(json!({
        "rooms": rooms,
        "sensors": sensors,
    }))
}

/// Register a room with the fleet and the registry, starting its sensors
/// when autostart is enabled
pub async fn add_room(
    State(hub): State<ClimateHub>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>> {
    let body = json_body(payload)?;
    let room_id = string_field(&body, "room_id")?.to_string();

    let created = hub.fleet().add_room(&room_id).await?;
    hub.registry().get_or_create(&room_id).await;

    let sensors_started = if hub.config().simulation.autostart {
        match hub.fleet().start_all(&room_id).await {
            Ok(()) => true,
            Err(e) => {
                ErrorReporter::log_error(&e, "fleet_api", "add_room");
                false
            }
        }
    } else {
        false
    };

    info!(
        "Room {} {} via HTTP (sensors started: {})",
        room_id,
        if created { "added" } else { "already present" },
        sensors_started
    );

    Ok(Json(json!({
        "success": true,
        "message": format!("Room '{room_id}' added"),
        "room_id": room_id,
        "created": created,
        "sensors_started": sensors_started,
    })))
}

pub async fn remove_room(
    State(hub): State<ClimateHub>,
    Path(room_id): Path<String>,
) -> Result<Json<Value>> {
    if !hub.fleet().remove_room(&room_id).await {
        return Err(ClimateError::not_found(format!("Room '{room_id}' not found")));
    }

    Ok(Json(json!({
        "success": true,
        "message": format!("Room '{room_id}' removed"),
    })))
}

pub async fn start_room(
    State(hub): State<ClimateHub>,
    Path(room_id): Path<String>,
) -> Result<Json<Value>> {
    hub.fleet().start_all(&room_id).await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Sensors started for room '{room_id}'"),
    })))
}

pub async fn stop_room(
    State(hub): State<ClimateHub>,
    Path(room_id): Path<String>,
) -> Result<Json<Value>> {
    hub.fleet().stop_all(&room_id).await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Sensors stopped for room '{room_id}'"),
    })))
}

pub async fn start_sensor(
    State(hub): State<ClimateHub>,
    Path((room_id, kind)): Path<(String, String)>,
) -> Result<Json<Value>> {
    let kind: SensorKind = kind.parse()?;
    hub.fleet().start(&room_id, kind).await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("{kind} sensor started for room '{room_id}'"),
    })))
}

pub async fn stop_sensor(
    State(hub): State<ClimateHub>,
    Path((room_id, kind)): Path<(String, String)>,
) -> Result<Json<Value>> {
    let kind: SensorKind = kind.parse()?;
    hub.fleet().stop(&room_id, kind).await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("{kind} sensor stopped for room '{room_id}'"),
    })))
}
