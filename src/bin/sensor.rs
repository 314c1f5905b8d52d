//! Standalone sensor emitter
//!
//! Runs one or all sensor kinds for a room against a remote aggregator.
//!
//! Usage:
//!   climate-sensor --server http://localhost:5000 living_room
//!   climate-sensor --kind temperature --time-scale 0.1 office

use climate_hub::{
    client::HttpTelemetryClient,
    config::validate_time_scale,
    logging::{init_logging, LogConfig},
    services::{Emitter, RandomWalk, SensorKind, TelemetrySink},
    ClimateError, Result,
};

use clap::{Parser, ValueEnum};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KindArg {
    Temperature,
    Humidity,
    Pressure,
    All,
}

impl KindArg {
    fn kinds(self) -> Vec<SensorKind> {
        match self {
            KindArg::Temperature => vec![SensorKind::Temperature],
            KindArg::Humidity => vec![SensorKind::Humidity],
            KindArg::Pressure => vec![SensorKind::Pressure],
            KindArg::All => SensorKind::ALL.to_vec(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "climate-sensor")]
#[command(about = "Simulated climate sensor reporting to a Climate Hub aggregator")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Room the sensors belong to
    room: String,

    /// Aggregator base URL
    #[arg(long, env = "CLIMATE_SERVER", default_value = "http://localhost:5000")]
    server: Url,

    /// Sensor kind to run
    #[arg(long, value_enum, default_value_t = KindArg::All)]
    kind: KindArg,

    /// Seconds per simulated time unit
    #[arg(long, default_value_t = 1.0)]
    time_scale: f64,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(LogConfig::from_env().with_debug(args.debug))?;

    let room = args.room.trim().to_string();
    if room.is_empty() {
        return Err(ClimateError::invalid_input("Room id cannot be empty"));
    }
    validate_time_scale(args.time_scale)?;

    let sink: Arc<dyn TelemetrySink> = Arc::new(HttpTelemetryClient::new(&args.server)?);
    let cancel = CancellationToken::new();

    info!(
        "📡 Starting {:?} sensor(s) for room {} against {}",
        args.kind, room, args.server
    );

    let tasks: Vec<_> = {
        let mut rng = rand::thread_rng();
        args.kind
            .kinds()
            .into_iter()
            .map(|kind| {
                let walk = RandomWalk::new(kind, &mut rng);
                let emitter = Emitter::new(room.clone(), walk, sink.clone(), args.time_scale);
                tokio::spawn(emitter.run(cancel.child_token()))
            })
            .collect()
    };

    tokio::signal::ctrl_c().await?;
    info!("🛑 Stopping sensors for room {}", room);
    cancel.cancel();

    for task in tasks {
        if let Err(e) = task.await {
            error!("Sensor task failed: {}", e);
        }
    }

    Ok(())
}
