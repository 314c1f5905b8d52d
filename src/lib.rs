//! Climate telemetry aggregator
//!
//! Sensor emitters report temperature, humidity and pressure readings for
//! named rooms. The aggregator keeps the latest reading of each kind per room
//! and derives a cooling decision from a hysteresis rule.
//!
//! # Features
//!
//! - In-memory room registry with per-room atomic updates
//! - Automatic cooling control with a ±0.5 °C dead band
//! - Simulated sensor fleet with independently startable/stoppable emitters
//! - JSON API, ingestion endpoints and a server-sent events snapshot stream
//! - Standalone emitter binary talking to a remote aggregator over HTTP

pub mod client;
pub mod config;
pub mod error;
pub mod http_transport;
pub mod logging;
pub mod server;
pub mod services;

// Re-export main types for convenience
pub use config::ServerConfig;
pub use error::{ClimateError, Result};
pub use server::ClimateHub;
