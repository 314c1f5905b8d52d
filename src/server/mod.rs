//! Aggregator context
//!
//! [`ClimateHub`] is built once at process start and handed to every
//! component that needs the registry or the fleet. Nothing is reachable
//! through globals.

use crate::config::ServerConfig;
use crate::services::{RoomRegistry, SensorFleetManager};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Shared aggregator state
#[derive(Clone)]
pub struct ClimateHub {
    registry: Arc<RoomRegistry>,
    fleet: Arc<SensorFleetManager>,
    config: Arc<ServerConfig>,
    shutdown: CancellationToken,
}

impl ClimateHub {
    /// Build the registry and a fleet reporting into it
    pub fn new(config: ServerConfig) -> Self {
        let registry = Arc::new(RoomRegistry::new());
        let fleet = Arc::new(SensorFleetManager::new(
            registry.clone(),
            config.simulation.clone(),
        ));
        Self {
            registry,
            fleet,
            config: Arc::new(config),
            shutdown: CancellationToken::new(),
        }
    }

    /// Context with default configuration
    pub fn with_defaults() -> Self {
        Self::new(ServerConfig::default())
    }

    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    pub fn fleet(&self) -> &Arc<SensorFleetManager> {
        &self.fleet
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Cancelled once the hub starts shutting down; long-lived streams end
    /// on it
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// End open streams and stop every simulated sensor
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.fleet.shutdown().await;
    }
}
