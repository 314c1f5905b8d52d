//! Bounded random-walk value generation for simulated sensors
//!
//! One strategy type covers every sensor kind. Humidity and pressure walk
//! freely inside their bounds; temperature couples to the room's control
//! state and drifts toward the target while a cooling phase is running.

use crate::services::models::{RoomControlState, SensorKind};
use rand::Rng;
use std::time::Duration;

/// Simulated time after which a cooling phase ends on its own
pub const COOLING_DURATION_CAP: f64 = 60.0;
/// Distance to target under which a cooling phase ends
const COOLING_SETTLED: f64 = 0.3;
const MAX_COOLING_STEP: f64 = 0.5;
const COOLING_RATE: f64 = 0.1;
/// How far below target the room must be before it is warmed back up
const WARMING_THRESHOLD: f64 = 0.2;
/// Longest sleep between two ticks, whatever the time scale
pub const MAX_TICK_INTERVAL: Duration = Duration::from_secs(7 * 24 * 3600);

/// Round to one decimal place, as transmitted to the aggregator
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Maximum free step per tick for a kind
fn free_step(kind: SensorKind) -> f64 {
    match kind {
        SensorKind::Temperature => 0.2,
        SensorKind::Humidity => 1.0,
        SensorKind::Pressure => 0.5,
    }
}

/// Draw the sleep before the next tick, scaled by `time_scale`
///
/// Never panics: scales that overflow a `Duration` or exceed
/// [`MAX_TICK_INTERVAL`] are capped, and non-positive ones give zero.
pub fn next_interval<R: Rng + ?Sized>(kind: SensorKind, rng: &mut R, time_scale: f64) -> Duration {
    let units = rng.gen_range(kind.tick_interval());
    let seconds = units * time_scale;
    if seconds.is_nan() || seconds <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(seconds)
        .unwrap_or(MAX_TICK_INTERVAL)
        .min(MAX_TICK_INTERVAL)
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CoolingPhase {
    elapsed: f64,
}

/// Private simulation state of one sensor
#[derive(Debug, Clone, PartialEq)]
pub struct RandomWalk {
    kind: SensorKind,
    value: f64,
    cooling: Option<CoolingPhase>,
}

impl RandomWalk {
    /// Start a walk from a random value in the kind's initial range
    pub fn new<R: Rng + ?Sized>(kind: SensorKind, rng: &mut R) -> Self {
        Self::starting_at(kind, rng.gen_range(kind.initial_range()))
    }

    /// Start a walk from a given value, clamped into bounds
    pub fn starting_at(kind: SensorKind, value: f64) -> Self {
        let bounds = kind.bounds();
        Self {
            kind,
            value: value.clamp(*bounds.start(), *bounds.end()),
            cooling: None,
        }
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    /// Current unrounded value
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Whether the temperature walk is currently in a cooling phase
    pub fn is_cooling(&self) -> bool {
        self.cooling.is_some()
    }

    /// Advance one tick and return the value to report, rounded.
    ///
    /// `control` is the room's control state when known; only temperature
    /// walks look at it. `None` means no coupling data is available.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R, control: Option<RoomControlState>) -> f64 {
        match (self.kind, control) {
            (SensorKind::Temperature, Some(state)) => self.step_coupled(rng, state),
            _ => self.step_free(rng),
        }

        let bounds = self.kind.bounds();
        self.value = self.value.clamp(*bounds.start(), *bounds.end());
        round_one_decimal(self.value)
    }

    fn step_free<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let step = free_step(self.kind);
        self.value += rng.gen_range(-step..=step);
    }

    fn step_coupled<R: Rng + ?Sized>(&mut self, rng: &mut R, state: RoomControlState) {
        if state.cooling_active {
            self.cooling = Some(CoolingPhase { elapsed: 0.0 });
        }

        let Some(phase) = self.cooling.as_mut() else {
            self.step_free(rng);
            return;
        };

        let target = state.target_temperature;
        let difference = self.value - target;
        let speed = (difference.abs() * COOLING_RATE).min(MAX_COOLING_STEP);
        if difference > 0.0 {
            self.value -= speed;
        } else if difference < -WARMING_THRESHOLD {
            self.value += speed * 0.5;
        }

        phase.elapsed += rng.gen_range(2.0..=4.0);
        if phase.elapsed >= COOLING_DURATION_CAP || (self.value - target).abs() < COOLING_SETTLED {
            self.cooling = None;
        }
    }
}
