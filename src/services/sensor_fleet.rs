//! Simulated sensor fleet
//!
//! Owns one handle per (room, kind). A started handle runs its emitter as an
//! independent tokio task with its own cancellation token; stopping cancels
//! the token and waits for the task so the walk state can be parked in the
//! handle and resumed by the next start.
//!
//! ```text
//! add_room(id)     → three dormant handles
//! start(id, kind)  → Dormant(walk) → spawn Emitter::run → Running
//! stop(id, kind)   → cancel → Vacant → unlock → join → relock → Dormant(walk)
//! remove_room(id)  → drop handles → cancel → join → registry.remove(id)
//! ```
//!
//! The fleet mutex is never held across a join, so a slow emitter only
//! delays the caller that stops it.

use crate::config::SimulationConfig;
use crate::error::{ClimateError, Result};
use crate::services::models::SensorKind;
use crate::services::room_registry::RoomRegistry;
use crate::services::telemetry::{Emitter, TelemetrySink};
use crate::services::value_generator::RandomWalk;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Running emitter task
struct RunningSensor {
    cancel: CancellationToken,
    join: JoinHandle<RandomWalk>,
}

impl RunningSensor {
    /// Wait for the cancelled task and take its walk back
    async fn finish(self, room_id: &str, kind: SensorKind) -> RandomWalk {
        self.cancel.cancel();
        match self.join.await {
            Ok(walk) => walk,
            Err(e) => {
                error!("Sensor {} for room {} terminated abnormally: {}", kind, room_id, e);
                RandomWalk::new(kind, &mut rand::thread_rng())
            }
        }
    }
}

/// Tasks detached from their handles, waiting to be joined
type Detached = Vec<(SensorKind, RunningSensor)>;

enum SensorSlot {
    Dormant(RandomWalk),
    Running(RunningSensor),
    /// A start is being applied, or a stop is joining the task
    Vacant,
}

/// One simulated sensor of a room
pub struct SensorHandle {
    kind: SensorKind,
    slot: SensorSlot,
}

impl SensorHandle {
    fn new(kind: SensorKind) -> Self {
        Self {
            kind,
            slot: SensorSlot::Dormant(RandomWalk::new(kind, &mut rand::thread_rng())),
        }
    }

    /// Whether the emitter task is alive
    pub fn is_running(&self) -> bool {
        match &self.slot {
            SensorSlot::Running(running) => !running.join.is_finished(),
            _ => false,
        }
    }

    fn start(
        &mut self,
        room_id: &str,
        sink: Arc<dyn TelemetrySink>,
        parent: &CancellationToken,
        time_scale: f64,
    ) {
        if self.is_running() {
            return;
        }

        let walk = match std::mem::replace(&mut self.slot, SensorSlot::Vacant) {
            SensorSlot::Dormant(walk) => walk,
            // The previous task died without being stopped
            _ => RandomWalk::new(self.kind, &mut rand::thread_rng()),
        };

        let cancel = parent.child_token();
        let emitter = Emitter::new(room_id, walk, sink, time_scale);
        let join = tokio::spawn(emitter.run(cancel.clone()));
        self.slot = SensorSlot::Running(RunningSensor { cancel, join });
    }

    /// Take the running task out and cancel it. The slot stays vacant until
    /// [`SensorHandle::park`] puts the walk back.
    fn detach(&mut self) -> Option<RunningSensor> {
        match std::mem::replace(&mut self.slot, SensorSlot::Vacant) {
            SensorSlot::Running(running) => {
                running.cancel.cancel();
                Some(running)
            }
            other => {
                self.slot = other;
                None
            }
        }
    }

    /// Resume point for a joined task. A start that slipped in while the
    /// task was being joined keeps its own walk.
    fn park(&mut self, walk: RandomWalk) {
        if matches!(self.slot, SensorSlot::Vacant) {
            self.slot = SensorSlot::Dormant(walk);
        }
    }
}

/// Status of one sensor as reported by [`SensorFleetManager::fleet_status`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SensorStatus {
    pub running: bool,
}

/// room id → kind → status
pub type FleetStatus = BTreeMap<String, BTreeMap<SensorKind, SensorStatus>>;

/// Lifecycle controller for every simulated sensor
pub struct SensorFleetManager {
    registry: Arc<RoomRegistry>,
    sink: Arc<dyn TelemetrySink>,
    config: SimulationConfig,
    rooms: Mutex<HashMap<String, HashMap<SensorKind, SensorHandle>>>,
    shutdown: CancellationToken,
}

impl SensorFleetManager {
    /// Fleet whose emitters report straight into `registry`
    pub fn new(registry: Arc<RoomRegistry>, config: SimulationConfig) -> Self {
        let sink: Arc<dyn TelemetrySink> = registry.clone();
        Self::with_sink(registry, sink, config)
    }

    /// Fleet whose emitters report through an arbitrary sink
    pub fn with_sink(
        registry: Arc<RoomRegistry>,
        sink: Arc<dyn TelemetrySink>,
        config: SimulationConfig,
    ) -> Self {
        Self {
            registry,
            sink,
            config,
            rooms: Mutex::new(HashMap::new()),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Register a room with three dormant sensors. Returns false if it was
    /// already registered.
    pub async fn add_room(&self, room_id: &str) -> Result<bool> {
        if room_id.trim().is_empty() {
            return Err(ClimateError::invalid_input("Room id cannot be empty"));
        }

        let mut rooms = self.rooms.lock().await;
        if rooms.contains_key(room_id) {
            return Ok(false);
        }

        let handles = SensorKind::ALL
            .into_iter()
            .map(|kind| (kind, SensorHandle::new(kind)))
            .collect();
        rooms.insert(room_id.to_string(), handles);
        info!("Room {} added to the sensor fleet", room_id);
        Ok(true)
    }

    /// Stop and discard the room's sensors, then drop the room from the
    /// registry. Returns false if neither knew the room.
    pub async fn remove_room(&self, room_id: &str) -> bool {
        let removed = self.rooms.lock().await.remove(room_id);
        let had_sensors = removed.is_some();
        if let Some(mut handles) = removed {
            let detached = detach_all(&mut handles);
            for (kind, running) in detached {
                running.finish(room_id, kind).await;
            }
            info!("Room {} removed from the sensor fleet", room_id);
        }

        // Every emitter of the room has exited, so nothing can re-create it
        let in_registry = self.registry.remove(room_id).await.is_some();
        had_sensors || in_registry
    }

    /// Start every sensor of a room
    pub async fn start_all(&self, room_id: &str) -> Result<()> {
        let mut rooms = self.rooms.lock().await;
        let handles = rooms.get_mut(room_id).ok_or_else(|| unknown_room(room_id))?;
        for handle in handles.values_mut() {
            handle.start(room_id, self.sink.clone(), &self.shutdown, self.config.time_scale);
        }
        info!("Sensors started for room {}", room_id);
        Ok(())
    }

    /// Stop every sensor of a room
    pub async fn stop_all(&self, room_id: &str) -> Result<()> {
        let detached = {
            let mut rooms = self.rooms.lock().await;
            let handles = rooms.get_mut(room_id).ok_or_else(|| unknown_room(room_id))?;
            detach_all(handles)
        };
        self.join_and_park(room_id, detached).await;
        info!("Sensors stopped for room {}", room_id);
        Ok(())
    }

    /// Start one sensor; no-op if it already runs
    pub async fn start(&self, room_id: &str, kind: SensorKind) -> Result<()> {
        let mut rooms = self.rooms.lock().await;
        let handle = rooms
            .get_mut(room_id)
            .and_then(|handles| handles.get_mut(&kind))
            .ok_or_else(|| unknown_room(room_id))?;
        handle.start(room_id, self.sink.clone(), &self.shutdown, self.config.time_scale);
        Ok(())
    }

    /// Stop one sensor; no-op if it is not running
    pub async fn stop(&self, room_id: &str, kind: SensorKind) -> Result<()> {
        let detached = {
            let mut rooms = self.rooms.lock().await;
            let handle = rooms
                .get_mut(room_id)
                .and_then(|handles| handles.get_mut(&kind))
                .ok_or_else(|| unknown_room(room_id))?;
            handle.detach()
        };
        if let Some(running) = detached {
            self.join_and_park(room_id, vec![(kind, running)]).await;
        }
        Ok(())
    }

    /// Join detached tasks with the fleet unlocked, then park their walks
    /// in whatever handles still exist.
    async fn join_and_park(&self, room_id: &str, detached: Detached) {
        if detached.is_empty() {
            return;
        }

        let mut walks = Vec::with_capacity(detached.len());
        for (kind, running) in detached {
            walks.push((kind, running.finish(room_id, kind).await));
        }

        let mut rooms = self.rooms.lock().await;
        if let Some(handles) = rooms.get_mut(room_id) {
            for (kind, walk) in walks {
                if let Some(handle) = handles.get_mut(&kind) {
                    handle.park(walk);
                }
            }
        }
    }

    /// Running state of every sensor of every room
    pub async fn fleet_status(&self) -> FleetStatus {
        let rooms = self.rooms.lock().await;
        rooms
            .iter()
            .map(|(room_id, handles)| {
                let kinds = handles
                    .iter()
                    .map(|(kind, handle)| {
                        (
                            *kind,
                            SensorStatus {
                                running: handle.is_running(),
                            },
                        )
                    })
                    .collect();
                (room_id.clone(), kinds)
            })
            .collect()
    }

    /// Sorted ids of the rooms managed by the fleet
    pub async fn room_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.rooms.lock().await.keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    /// Stop every sensor of every room, keeping the handles
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let detached: Vec<(String, Detached)> = {
            let mut rooms = self.rooms.lock().await;
            rooms
                .iter_mut()
                .map(|(room_id, handles)| (room_id.clone(), detach_all(handles)))
                .collect()
        };
        for (room_id, sensors) in detached {
            self.join_and_park(&room_id, sensors).await;
        }
        info!("Sensor fleet shut down");
    }
}

/// Detach and cancel every running task of a room
fn detach_all(handles: &mut HashMap<SensorKind, SensorHandle>) -> Detached {
    handles
        .iter_mut()
        .filter_map(|(kind, handle)| handle.detach().map(|running| (*kind, running)))
        .collect()
}

fn unknown_room(room_id: &str) -> ClimateError {
    ClimateError::not_found(format!("Room '{room_id}' has no sensors"))
}
