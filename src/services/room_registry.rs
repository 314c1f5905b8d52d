//! In-memory room registry
//!
//! The registry is the only owner of mutable room state. Rooms live in an
//! arena keyed by id, each behind its own lock, so a record-then-evaluate
//! sequence is atomic for one room without serializing unrelated rooms.
//! The outer map lock is only held long enough to find or insert an entry,
//! and never while waiting for a room lock.

use crate::error::{ClimateError, Result};
use crate::services::control_engine;
use crate::services::models::{Reading, Room, RoomControlState, RoomView, SensorKind, Snapshot};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info};

type RoomCell = Arc<Mutex<Room>>;

/// Registry of every room known to the aggregator
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: RwLock<HashMap<String, RoomCell>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a room's cell, creating the room with defaults when absent
    async fn cell(&self, room_id: &str) -> RoomCell {
        if let Some(cell) = self.rooms.read().await.get(room_id) {
            return cell.clone();
        }

        let mut rooms = self.rooms.write().await;
        rooms
            .entry(room_id.to_string())
            .or_insert_with(|| {
                info!("Room {} registered", room_id);
                Arc::new(Mutex::new(Room::new(room_id)))
            })
            .clone()
    }

    /// Lock a room for writing, creating it when absent.
    ///
    /// The guard always belongs to the room registered under `room_id` at the
    /// time the lock was acquired: a cell removed while this call waited for
    /// its lock is skipped and the lookup starts over.
    async fn lock_live(&self, room_id: &str) -> OwnedMutexGuard<Room> {
        loop {
            let cell = self.cell(room_id).await;
            let room = cell.clone().lock_owned().await;
            let live = self
                .rooms
                .read()
                .await
                .get(room_id)
                .is_some_and(|current| Arc::ptr_eq(current, &cell));
            if live {
                return room;
            }
            debug!("Room {} was removed while waiting for its lock", room_id);
        }
    }

    /// Re-run the cooling rule when the room is automatic and has a temperature
    fn apply_control(room: &mut Room) {
        if !room.automatic_mode {
            return;
        }
        if let Some(reading) = &room.temperature {
            let cooling =
                control_engine::evaluate(reading.value, room.target_temperature, room.cooling_active);
            if cooling != room.cooling_active {
                info!(
                    "Cooling {} for room {} ({:.1}°C, target {:.1}°C)",
                    if cooling { "activated" } else { "deactivated" },
                    room.id(),
                    reading.value,
                    room.target_temperature
                );
            }
            room.cooling_active = cooling;
        }
    }

    /// Return the room, creating it with defaults if it does not exist yet
    pub async fn get_or_create(&self, room_id: &str) -> RoomView {
        self.lock_live(room_id).await.view()
    }

    /// Store a new reading; temperature readings re-evaluate cooling
    pub async fn record_reading(
        &self,
        room_id: &str,
        kind: SensorKind,
        value: f64,
        unit: &str,
    ) -> Result<()> {
        validate_room_id(room_id)?;
        if !value.is_finite() {
            return Err(ClimateError::invalid_input(format!(
                "{kind} value for room {room_id} is not a finite number"
            )));
        }

        let mut room = self.lock_live(room_id).await;
        room.store(kind, Reading::now(value, unit));
        debug!("Reading stored - room: {}, {}: {} {}", room_id, kind, value, unit);

        if kind == SensorKind::Temperature {
            Self::apply_control(&mut room);
        }
        Ok(())
    }

    /// Change the target temperature and re-evaluate cooling
    pub async fn set_target_temperature(&self, room_id: &str, value: f64) -> Result<()> {
        validate_room_id(room_id)?;
        if !value.is_finite() {
            return Err(ClimateError::invalid_input(
                "Target temperature must be a finite number",
            ));
        }

        let mut room = self.lock_live(room_id).await;
        room.target_temperature = value;
        Self::apply_control(&mut room);
        info!("Target temperature for room {} set to {:.1}°C", room_id, value);
        Ok(())
    }

    /// Manual override of the cooling state, applied in any mode
    pub async fn set_cooling_active(&self, room_id: &str, active: bool) -> Result<()> {
        validate_room_id(room_id)?;
        self.lock_live(room_id).await.cooling_active = active;
        info!("Cooling for room {} manually set to {}", room_id, active);
        Ok(())
    }

    /// Switch automatic control; enabling it re-evaluates immediately
    pub async fn set_automatic_mode(&self, room_id: &str, auto: bool) -> Result<()> {
        validate_room_id(room_id)?;
        let mut room = self.lock_live(room_id).await;
        room.automatic_mode = auto;
        if auto {
            Self::apply_control(&mut room);
        }
        info!("Automatic mode for room {} set to {}", room_id, auto);
        Ok(())
    }

    /// Read a room without creating it
    pub async fn get(&self, room_id: &str) -> Result<RoomView> {
        let cell = self
            .rooms
            .read()
            .await
            .get(room_id)
            .cloned()
            .ok_or_else(|| ClimateError::not_found(format!("Room '{room_id}' not found")))?;
        let room = cell.lock().await;
        Ok(room.view())
    }

    /// Discard a room. Returns its last state when it existed.
    pub async fn remove(&self, room_id: &str) -> Option<RoomView> {
        let cell = self.rooms.write().await.remove(room_id)?;
        let room = cell.lock().await;
        info!("Room {} removed from registry", room_id);
        Some(room.view())
    }

    /// Fully materialized copy of every room
    pub async fn snapshot(&self) -> Snapshot {
        let cells: Vec<RoomCell> = self.rooms.read().await.values().cloned().collect();

        let mut snapshot = Snapshot::new();
        for cell in cells {
            let view = cell.lock().await.view();
            snapshot.insert(view.id.clone(), view);
        }
        snapshot
    }

    /// Control state of every room, as consumed by temperature emitters
    pub async fn control_states(&self) -> HashMap<String, RoomControlState> {
        self.snapshot()
            .await
            .into_iter()
            .map(|(id, view)| {
                let state = view.control_state();
                (id, state)
            })
            .collect()
    }

    /// Sorted ids of every room
    pub async fn room_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.rooms.read().await.keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }
}

fn validate_room_id(room_id: &str) -> Result<()> {
    if room_id.trim().is_empty() {
        return Err(ClimateError::invalid_input("Room id cannot be empty"));
    }
    Ok(())
}
