//! Room state and control endpoints
//!
//! Control commands create the room on first reference, the same way a first
//! reading does.

use super::{bool_field, json_body, number_field};
use crate::error::Result;
use crate::server::ClimateHub;
use crate::services::{RoomView, Snapshot};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::Json,
};
use serde_json::{json, Value};

/// Every room, keyed by id
pub async fn list_rooms(State(hub): State<ClimateHub>) -> Json<Snapshot> {
    Json(hub.registry().snapshot().await)
}

/// One room; 404 if it was never referenced
pub async fn get_room(
    State(hub): State<ClimateHub>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomView>> {
    Ok(Json(hub.registry().get(&room_id).await?))
}

pub async fn set_target_temperature(
    State(hub): State<ClimateHub>,
    Path(room_id): Path<String>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>> {
    let body = json_body(payload)?;
    let temperature = number_field(&body, "temperature")?;

    hub.registry()
        .set_target_temperature(&room_id, temperature)
        .await?;
    let room = hub.registry().get_or_create(&room_id).await;

    Ok(Json(json!({
        "success": true,
        "room_id": room_id,
        "target_temperature": temperature,
        "cooling_active": room.cooling_active,
    })))
}

pub async fn set_cooling(
    State(hub): State<ClimateHub>,
    Path(room_id): Path<String>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>> {
    let body = json_body(payload)?;
    let active = bool_field(&body, "active")?;

    hub.registry().set_cooling_active(&room_id, active).await?;

    Ok(Json(json!({
        "success": true,
        "room_id": room_id,
        "cooling_active": active,
    })))
}

pub async fn set_automatic_mode(
    State(hub): State<ClimateHub>,
    Path(room_id): Path<String>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>> {
    let body = json_body(payload)?;
    let auto = bool_field(&body, "auto")?;

    hub.registry().set_automatic_mode(&room_id, auto).await?;
    let room = hub.registry().get_or_create(&room_id).await;

    Ok(Json(json!({
        "success": true,
        "room_id": room_id,
        "automatic_mode": auto,
        "cooling_active": room.cooling_active,
    })))
}
