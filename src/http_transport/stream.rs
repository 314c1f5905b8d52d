//! Server-sent events stream of room snapshots
//!
//! The current snapshot is pushed as soon as a client connects. After that the
//! registry is sampled every `stream.poll_interval` and a new event is pushed
//! only when the snapshot differs from the last one sent.

use crate::server::ClimateHub;
use crate::services::{RoomRegistry, Snapshot};
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::stream::{self, Stream, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Snapshots of the registry, deduplicated against the previous one
pub fn snapshot_changes(
    registry: Arc<RoomRegistry>,
    poll_interval: Duration,
) -> impl Stream<Item = Snapshot> + Send + 'static {
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    stream::unfold(
        (registry, ticker, None::<Snapshot>),
        |(registry, mut ticker, last)| async move {
            loop {
                ticker.tick().await;
                let current = registry.snapshot().await;
                if last.as_ref() != Some(&current) {
                    return Some((current.clone(), (registry, ticker, Some(current))));
                }
            }
        },
    )
}

fn snapshot_event(snapshot: &Snapshot) -> Event {
    Event::default()
        .event("snapshot")
        .json_data(snapshot)
        .unwrap_or_else(|e| {
            warn!("Failed to serialize snapshot: {}", e);
            Event::default().event("error").data(e.to_string())
        })
}

/// `GET /api/stream`
pub async fn snapshot_stream(
    State(hub): State<ClimateHub>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let connection_id = uuid::Uuid::new_v4();
    info!("Snapshot stream opened: {}", connection_id);

    let shutdown = hub.shutdown_token().clone();
    let events = snapshot_changes(hub.registry().clone(), hub.config().stream.poll_interval)
        .map(move |snapshot| {
            debug!(
                "Pushing snapshot of {} rooms to {}",
                snapshot.len(),
                connection_id
            );
            Ok(snapshot_event(&snapshot))
        })
        .take_until(async move { shutdown.cancelled().await });

    Sse::new(events).keep_alive(KeepAlive::default())
}
