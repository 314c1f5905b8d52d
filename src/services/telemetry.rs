//! Telemetry transport seam and the sensor emitter loop
//!
//! Emitters only talk to the aggregator through [`TelemetrySink`]. The room
//! registry implements it in-process; the HTTP client in `crate::client`
//! implements it for standalone emitters.

use crate::error::Result;
use crate::services::models::{RoomControlState, SensorKind};
use crate::services::room_registry::RoomRegistry;
use crate::services::value_generator::{next_interval, RandomWalk};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Where emitters send readings and fetch room control state from
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    /// Deliver one reading. An error means "retry on the next tick".
    async fn record_reading(
        &self,
        room_id: &str,
        kind: SensorKind,
        value: f64,
        unit: &str,
    ) -> Result<()>;

    /// Control state of every known room; unknown rooms are simply absent
    async fn query_room_states(&self) -> Result<HashMap<String, RoomControlState>>;
}

#[async_trait]
impl TelemetrySink for RoomRegistry {
    async fn record_reading(
        &self,
        room_id: &str,
        kind: SensorKind,
        value: f64,
        unit: &str,
    ) -> Result<()> {
        RoomRegistry::record_reading(self, room_id, kind, value, unit).await
    }

    async fn query_room_states(&self) -> Result<HashMap<String, RoomControlState>> {
        Ok(self.control_states().await)
    }
}

/// One simulated sensor bound to a room
pub struct Emitter {
    room_id: String,
    walk: RandomWalk,
    sink: Arc<dyn TelemetrySink>,
    time_scale: f64,
    rng: StdRng,
}

impl Emitter {
    pub fn new(
        room_id: impl Into<String>,
        walk: RandomWalk,
        sink: Arc<dyn TelemetrySink>,
        time_scale: f64,
    ) -> Self {
        Self {
            room_id: room_id.into(),
            walk,
            sink,
            time_scale,
            rng: StdRng::from_entropy(),
        }
    }

    /// Tick until `cancel` fires, then hand the simulation state back.
    ///
    /// A cancellation wakes the emitter out of its sleep; the token is also
    /// re-checked before every report, so no report is sent once the stop
    /// has been observed.
    pub async fn run(mut self, cancel: CancellationToken) -> RandomWalk {
        let kind = self.walk.kind();
        info!("Sensor {} started for room {}", kind, self.room_id);

        while !cancel.is_cancelled() {
            self.tick(&cancel).await;

            let interval = next_interval(kind, &mut self.rng, self.time_scale);
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }

        info!("Sensor {} stopped for room {}", kind, self.room_id);
        self.walk
    }

    /// Produce and deliver one value. Failures are logged, never raised.
    async fn tick(&mut self, cancel: &CancellationToken) {
        let kind = self.walk.kind();

        let control = if kind == SensorKind::Temperature {
            match self.sink.query_room_states().await {
                Ok(states) => states.get(&self.room_id).copied(),
                Err(e) => {
                    warn!("Could not fetch state for room {}: {}", self.room_id, e);
                    None
                }
            }
        } else {
            None
        };

        let value = self.walk.step(&mut self.rng, control);
        if cancel.is_cancelled() {
            return;
        }

        match self
            .sink
            .record_reading(&self.room_id, kind, value, kind.unit())
            .await
        {
            Ok(()) => {
                let mode = if self.walk.is_cooling() {
                    "cooling"
                } else {
                    "random walk"
                };
                debug!(
                    "Sent {} for {}: {}{} ({})",
                    kind,
                    self.room_id,
                    value,
                    kind.unit(),
                    mode
                );
            }
            Err(e) => warn!("Failed to send {} for {}: {}", kind, self.room_id, e),
        }
    }
}
