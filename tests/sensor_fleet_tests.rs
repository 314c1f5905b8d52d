//! Sensor fleet lifecycle against a live registry

mod common;

use async_trait::async_trait;
use climate_hub::config::SimulationConfig;
use climate_hub::error::{ClimateError, Result};
use climate_hub::services::{
    RoomControlState, RoomRegistry, SensorFleetManager, SensorKind, TelemetrySink,
};
use common::{eventually, fast_simulation};
use pretty_assertions::assert_eq;
use rstest::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const WAIT: Duration = Duration::from_secs(5);

fn fleet(config: SimulationConfig) -> (Arc<RoomRegistry>, SensorFleetManager) {
    let registry = Arc::new(RoomRegistry::new());
    let fleet = SensorFleetManager::new(registry.clone(), config);
    (registry, fleet)
}

async fn running_kinds(fleet: &SensorFleetManager, room_id: &str) -> Vec<SensorKind> {
    fleet
        .fleet_status()
        .await
        .get(room_id)
        .map(|sensors| {
            sensors
                .iter()
                .filter(|(_, status)| status.running)
                .map(|(kind, _)| *kind)
                .collect()
        })
        .unwrap_or_default()
}

#[rstest]
#[tokio::test]
async fn test_add_room_creates_dormant_sensors(fast_simulation: SimulationConfig) {
    let (_, fleet) = fleet(fast_simulation);

    assert!(fleet.add_room("kitchen").await.unwrap());
    assert!(!fleet.add_room("kitchen").await.unwrap());

    let status = fleet.fleet_status().await;
    assert_eq!(status.len(), 1);
    assert_eq!(status["kitchen"].len(), 3);
    assert!(status["kitchen"].values().all(|s| !s.running));

    assert!(fleet.add_room("  ").await.is_err());
}

#[rstest]
#[tokio::test]
async fn test_started_sensors_report_values_within_bounds(fast_simulation: SimulationConfig) {
    let (registry, fleet) = fleet(fast_simulation);
    fleet.add_room("lab").await.unwrap();
    fleet.start_all("lab").await.unwrap();

    assert_eq!(running_kinds(&fleet, "lab").await, SensorKind::ALL.to_vec());

    let all_reported = eventually(WAIT, || {
        let registry = registry.clone();
        async move {
            match registry.get("lab").await {
                Ok(room) => {
                    room.temperature.is_some() && room.humidity.is_some() && room.pressure.is_some()
                }
                Err(_) => false,
            }
        }
    })
    .await;
    assert!(all_reported, "not every sensor reported");

    for _ in 0..20 {
        let room = registry.get("lab").await.unwrap();
        for kind in SensorKind::ALL {
            let reading = match kind {
                SensorKind::Temperature => room.temperature.as_ref(),
                SensorKind::Humidity => room.humidity.as_ref(),
                SensorKind::Pressure => room.pressure.as_ref(),
            }
            .unwrap();
            assert!(
                kind.bounds().contains(&reading.value),
                "{kind} out of bounds: {}",
                reading.value
            );
            assert_eq!(reading.unit, kind.unit());
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    fleet.shutdown().await;
}

#[rstest]
#[tokio::test]
async fn test_single_sensor_start_stop_is_idempotent(fast_simulation: SimulationConfig) {
    let (_, fleet) = fleet(fast_simulation);
    fleet.add_room("office").await.unwrap();

    fleet.start("office", SensorKind::Humidity).await.unwrap();
    fleet.start("office", SensorKind::Humidity).await.unwrap();
    assert_eq!(running_kinds(&fleet, "office").await, vec![SensorKind::Humidity]);

    fleet.stop("office", SensorKind::Humidity).await.unwrap();
    fleet.stop("office", SensorKind::Humidity).await.unwrap();
    assert!(running_kinds(&fleet, "office").await.is_empty());

    // Restart after a stop
    fleet.start("office", SensorKind::Humidity).await.unwrap();
    assert_eq!(running_kinds(&fleet, "office").await, vec![SensorKind::Humidity]);

    fleet.stop_all("office").await.unwrap();
    assert!(running_kinds(&fleet, "office").await.is_empty());
}

#[rstest]
#[tokio::test]
async fn test_unknown_room_is_not_found(fast_simulation: SimulationConfig) {
    let (_, fleet) = fleet(fast_simulation);

    for result in [
        fleet.start_all("nowhere").await,
        fleet.stop_all("nowhere").await,
        fleet.start("nowhere", SensorKind::Pressure).await,
        fleet.stop("nowhere", SensorKind::Pressure).await,
    ] {
        assert!(matches!(result, Err(ClimateError::NotFound(_))));
    }
    assert!(!fleet.remove_room("nowhere").await);
}

#[rstest]
#[tokio::test]
async fn test_remove_room_stops_sensors_and_forgets_room(fast_simulation: SimulationConfig) {
    let (registry, fleet) = fleet(fast_simulation);
    fleet.add_room("garage").await.unwrap();
    fleet.start_all("garage").await.unwrap();

    let reported = eventually(WAIT, || {
        let registry = registry.clone();
        async move { registry.get("garage").await.is_ok() }
    })
    .await;
    assert!(reported);

    assert!(fleet.remove_room("garage").await);
    assert!(fleet.fleet_status().await.is_empty());
    assert!(registry.get("garage").await.is_err());

    // No emitter is left to bring the room back
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(registry.get("garage").await.is_err());
}

#[rstest]
#[tokio::test]
async fn test_add_then_remove_immediately(fast_simulation: SimulationConfig) {
    let (registry, fleet) = fleet(fast_simulation);
    fleet.add_room("porch").await.unwrap();
    fleet.start_all("porch").await.unwrap();
    assert!(fleet.remove_room("porch").await);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(registry.is_empty().await);
    assert!(fleet.room_ids().await.is_empty());
}

#[rstest]
#[tokio::test]
async fn test_shutdown_stops_every_sensor(fast_simulation: SimulationConfig) {
    let (_, fleet) = fleet(fast_simulation);
    for room in ["a", "b"] {
        fleet.add_room(room).await.unwrap();
        fleet.start_all(room).await.unwrap();
    }

    fleet.shutdown().await;

    let status = fleet.fleet_status().await;
    assert_eq!(status.len(), 2);
    assert!(status.values().flat_map(|s| s.values()).all(|s| !s.running));
}

/// Sink that counts deliveries and never succeeds
struct CountingSink {
    deliveries: AtomicUsize,
}

#[async_trait]
impl TelemetrySink for CountingSink {
    async fn record_reading(&self, _: &str, _: SensorKind, _: f64, _: &str) -> Result<()> {
        self.deliveries.fetch_add(1, Ordering::SeqCst);
        Err(ClimateError::ingestion("rejected"))
    }

    async fn query_room_states(&self) -> Result<HashMap<String, RoomControlState>> {
        Ok(HashMap::new())
    }
}

#[rstest]
#[tokio::test]
async fn test_stopped_sensor_stops_reporting(fast_simulation: SimulationConfig) {
    let registry = Arc::new(RoomRegistry::new());
    let sink = Arc::new(CountingSink {
        deliveries: AtomicUsize::new(0),
    });
    let fleet = SensorFleetManager::with_sink(registry, sink.clone(), fast_simulation);
    fleet.add_room("den").await.unwrap();
    fleet.start("den", SensorKind::Temperature).await.unwrap();

    let ticking = eventually(WAIT, || {
        let sink = sink.clone();
        async move { sink.deliveries.load(Ordering::SeqCst) >= 3 }
    })
    .await;
    assert!(ticking, "sink failures stopped the emitter");

    fleet.stop("den", SensorKind::Temperature).await.unwrap();
    let after_stop = sink.deliveries.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(sink.deliveries.load(Ordering::SeqCst), after_stop);
}

/// Sink that holds every delivery for `held_room` until `release` fires
struct GatedSink {
    held_room: &'static str,
    held: AtomicUsize,
    release: CancellationToken,
}

#[async_trait]
impl TelemetrySink for GatedSink {
    async fn record_reading(&self, room_id: &str, _: SensorKind, _: f64, _: &str) -> Result<()> {
        if room_id == self.held_room {
            self.held.fetch_add(1, Ordering::SeqCst);
            self.release.cancelled().await;
        }
        Ok(())
    }

    async fn query_room_states(&self) -> Result<HashMap<String, RoomControlState>> {
        Ok(HashMap::new())
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_slow_stop_does_not_block_other_rooms(fast_simulation: SimulationConfig) {
    let registry = Arc::new(RoomRegistry::new());
    let sink = Arc::new(GatedSink {
        held_room: "cellar",
        held: AtomicUsize::new(0),
        release: CancellationToken::new(),
    });
    let fleet = Arc::new(SensorFleetManager::with_sink(
        registry,
        sink.clone(),
        fast_simulation,
    ));
    fleet.add_room("cellar").await.unwrap();
    fleet.add_room("attic").await.unwrap();
    fleet.start("cellar", SensorKind::Pressure).await.unwrap();

    let blocked = eventually(WAIT, || {
        let sink = sink.clone();
        async move { sink.held.load(Ordering::SeqCst) >= 1 }
    })
    .await;
    assert!(blocked);

    // The cellar emitter is stuck in a delivery, so its stop cannot finish
    let stopping = tokio::spawn({
        let fleet = fleet.clone();
        async move { fleet.stop("cellar", SensorKind::Pressure).await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!stopping.is_finished());

    let other_rooms = tokio::time::timeout(Duration::from_secs(1), async {
        assert!(running_kinds(&fleet, "cellar").await.is_empty());
        fleet.start_all("attic").await.unwrap();
        assert_eq!(running_kinds(&fleet, "attic").await, SensorKind::ALL.to_vec());
        fleet.stop_all("attic").await.unwrap();
    })
    .await;
    assert!(other_rooms.is_ok(), "fleet stayed locked during a slow stop");

    sink.release.cancel();
    stopping.await.unwrap().unwrap();
    assert!(running_kinds(&fleet, "cellar").await.is_empty());

    // The parked walk resumes on the next start
    fleet.start("cellar", SensorKind::Pressure).await.unwrap();
    assert_eq!(running_kinds(&fleet, "cellar").await, vec![SensorKind::Pressure]);
    fleet.shutdown().await;
    assert!(running_kinds(&fleet, "cellar").await.is_empty());
}
