//! Climate Hub - aggregator entry point
//!
//! Serves the room registry and the simulated sensor fleet over HTTP until
//! Ctrl-C, then stops every sensor.

use climate_hub::{
    http_transport::HttpServer,
    logging::{init_logging, LogConfig},
    ClimateHub, Result, ServerConfig,
};

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Climate Hub configuration
#[derive(Parser, Debug)]
#[command(name = "climate-hub")]
#[command(about = "Climate telemetry aggregator with simulated room sensors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Config {
    /// TOML configuration file
    #[arg(short, long, env = "CLIMATE_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable CORS (permissive mode)
    #[arg(long)]
    enable_cors: bool,

    /// Seconds per simulated time unit
    #[arg(long)]
    time_scale: Option<f64>,

    /// Snapshot stream poll interval in seconds
    #[arg(long)]
    stream_interval: Option<f64>,

    /// Do not start sensors when a room is added over HTTP
    #[arg(long)]
    no_autostart: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

impl Config {
    /// File, then environment, then command line
    fn load_server_config(&self) -> Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_file(path)?,
            None => ServerConfig::default(),
        };
        config.apply_env()?;

        if let Some(host) = &self.host {
            config.http.host = host.clone();
        }
        if let Some(port) = self.port {
            config.http.port = port;
        }
        if self.enable_cors {
            config.http.enable_cors = true;
        }
        if let Some(time_scale) = self.time_scale {
            config.simulation.time_scale = time_scale;
        }
        if let Some(seconds) = self.stream_interval {
            config.stream.poll_interval = Duration::try_from_secs_f64(seconds).map_err(|e| {
                climate_hub::ClimateError::config(format!("Invalid --stream-interval: {e}"))
            })?;
        }
        if self.no_autostart {
            config.simulation.autostart = false;
        }

        config.validate()?;
        Ok(config)
    }
}

async fn shutdown_signal(hub: ClimateHub) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        return;
    }
    info!("🛑 Shutdown requested");
    hub.shutdown_token().cancel();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Config::parse();
    let config = cli.load_server_config()?;

    let mut log_config = LogConfig::from_settings(&config.logging).with_debug(cli.debug);
    let env_log = LogConfig::from_env();
    log_config.stderr = env_log.stderr;
    if env_log.file_path.is_some() {
        log_config.file_path = env_log.file_path;
    }
    log_config.json |= env_log.json;
    init_logging(log_config)?;

    info!(
        "🚀 Starting Climate Hub v{} (time scale {}, autostart {})",
        env!("CARGO_PKG_VERSION"),
        config.simulation.time_scale,
        config.simulation.autostart
    );

    let hub = ClimateHub::new(config);
    let result = HttpServer::new(hub.clone())
        .serve(shutdown_signal(hub.clone()))
        .await;

    hub.shutdown().await;
    info!("👋 Climate Hub stopped");
    result
}
