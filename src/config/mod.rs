//! Configuration management for the climate aggregator
//!
//! Defaults, then an optional TOML file, then environment variables, then
//! command line flags (applied by the binaries).

use crate::error::{ClimateError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, time::Duration};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP surface
    pub http: HttpConfig,

    /// Snapshot push stream
    pub stream: StreamConfig,

    /// Simulated sensor fleet
    pub simulation: SimulationConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
    /// Address to bind
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Enable permissive CORS
    pub enable_cors: bool,
}

/// Server-sent events configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamConfig {
    /// How often the snapshot is compared with the last pushed one
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
}

/// Largest accepted time scale: one simulated unit lasts at most an hour
pub const MAX_TIME_SCALE: f64 = 3600.0;

/// Check a simulation time scale lies in `(0, MAX_TIME_SCALE]`
pub fn validate_time_scale(time_scale: f64) -> Result<()> {
    if !time_scale.is_finite() || time_scale <= 0.0 || time_scale > MAX_TIME_SCALE {
        return Err(ClimateError::config(format!(
            "Simulation time scale must be a positive number no greater than {MAX_TIME_SCALE}, got {time_scale}"
        )));
    }
    Ok(())
}

/// Sensor simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seconds per simulated time unit; scales every tick interval
    pub time_scale: f64,

    /// Start all sensors of a room when it is added over HTTP
    pub autostart: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or filter directive
    pub level: String,

    /// Emit JSON lines
    pub json: bool,

    /// Optional log file (rotated daily)
    pub file: Option<PathBuf>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            enable_cors: false,
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            autostart: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClimateError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        toml::from_str(&content)
            .map_err(|e| ClimateError::config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Load defaults overridden by environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Override fields from environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(host) = env::var("CLIMATE_HOST") {
            self.http.host = host;
        }

        if let Ok(port) = env::var("CLIMATE_PORT") {
            self.http.port = port
                .parse()
                .map_err(|e| ClimateError::config(format!("Invalid CLIMATE_PORT: {}", e)))?;
        }

        if let Ok(interval) = env::var("CLIMATE_STREAM_INTERVAL") {
            let seconds: f64 = interval.parse().map_err(|e| {
                ClimateError::config(format!("Invalid CLIMATE_STREAM_INTERVAL: {}", e))
            })?;
            self.stream.poll_interval = Duration::try_from_secs_f64(seconds).map_err(|e| {
                ClimateError::config(format!("Invalid CLIMATE_STREAM_INTERVAL: {}", e))
            })?;
        }

        if let Ok(scale) = env::var("CLIMATE_TIME_SCALE") {
            self.simulation.time_scale = scale
                .parse()
                .map_err(|e| ClimateError::config(format!("Invalid CLIMATE_TIME_SCALE: {}", e)))?;
        }

        if let Ok(autostart) = env::var("CLIMATE_AUTOSTART") {
            self.simulation.autostart = match autostart.to_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                _ => {
                    return Err(ClimateError::config(format!(
                        "Invalid CLIMATE_AUTOSTART: {}. Use 'true' or 'false'",
                        autostart
                    )));
                }
            };
        }

        if let Ok(level) = env::var("RUST_LOG") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.http.port == 0 {
            return Err(ClimateError::config("Port must be greater than zero"));
        }

        if self.stream.poll_interval.is_zero() {
            return Err(ClimateError::config(
                "Stream poll interval must be greater than zero",
            ));
        }

        validate_time_scale(self.simulation.time_scale)
    }

    /// Socket address string for the HTTP listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.http.host, self.http.port)
    }
}
