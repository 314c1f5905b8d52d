//! Core climate services
//!
//! The room registry is the single source of truth for room state; the
//! sensor fleet drives simulated emitters that report into it.

pub mod control_engine;
pub mod models;
pub mod room_registry;
pub mod sensor_fleet;
pub mod telemetry;
pub mod value_generator;

pub use models::{Reading, Room, RoomControlState, RoomView, SensorKind, Snapshot};
pub use room_registry::RoomRegistry;
pub use sensor_fleet::{FleetStatus, SensorFleetManager, SensorHandle, SensorStatus};
pub use telemetry::{Emitter, TelemetrySink};
pub use value_generator::RandomWalk;
