//! Room, reading and sensor-kind models shared by the registry, the fleet and
//! the HTTP surface.

use crate::error::{ClimateError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Default target temperature for a freshly created room (°C)
pub const DEFAULT_TARGET_TEMPERATURE: f64 = 21.0;

/// Kind of climate sensor attached to a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Temperature,
    Humidity,
    Pressure,
}

impl SensorKind {
    /// Every kind, in the order sensors are created for a room
    pub const ALL: [SensorKind; 3] = [
        SensorKind::Temperature,
        SensorKind::Humidity,
        SensorKind::Pressure,
    ];

    /// Wire name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::Temperature => "temperature",
            SensorKind::Humidity => "humidity",
            SensorKind::Pressure => "pressure",
        }
    }

    /// Unit reported alongside values of this kind
    pub fn unit(&self) -> &'static str {
        match self {
            SensorKind::Temperature => "°C",
            SensorKind::Humidity => "%",
            SensorKind::Pressure => "hPa",
        }
    }

    /// Closed range every simulated value is clamped to
    pub fn bounds(&self) -> RangeInclusive<f64> {
        match self {
            SensorKind::Temperature => 15.0..=30.0,
            SensorKind::Humidity => 20.0..=80.0,
            SensorKind::Pressure => 975.0..=1040.0,
        }
    }

    /// Range the simulated walk starts from
    pub fn initial_range(&self) -> RangeInclusive<f64> {
        match self {
            SensorKind::Temperature => 18.0..=25.0,
            SensorKind::Humidity => 40.0..=60.0,
            SensorKind::Pressure => 1000.0..=1025.0,
        }
    }

    /// Tick interval range, in time units
    pub fn tick_interval(&self) -> RangeInclusive<f64> {
        match self {
            SensorKind::Temperature => 2.0..=4.0,
            SensorKind::Humidity => 20.0..=30.0,
            SensorKind::Pressure => 5.0..=6.0,
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorKind {
    type Err = ClimateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "temperature" => Ok(SensorKind::Temperature),
            "humidity" => Ok(SensorKind::Humidity),
            "pressure" => Ok(SensorKind::Pressure),
            other => Err(ClimateError::invalid_input(format!(
                "Unknown sensor kind '{other}'. Use temperature, humidity or pressure"
            ))),
        }
    }
}

/// A timestamped sensor value with its unit. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub value: f64,
    pub unit: String,
    pub captured_at: DateTime<Utc>,
}

impl Reading {
    /// Build a reading captured now
    pub fn now(value: f64, unit: impl Into<String>) -> Self {
        Self {
            value,
            unit: unit.into(),
            captured_at: Utc::now(),
        }
    }
}

/// A room and its derived climate state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    id: String,
    pub temperature: Option<Reading>,
    pub humidity: Option<Reading>,
    pub pressure: Option<Reading>,
    pub target_temperature: f64,
    pub cooling_active: bool,
    pub automatic_mode: bool,
}

impl Room {
    /// Create a room with default control settings
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            temperature: None,
            humidity: None,
            pressure: None,
            target_temperature: DEFAULT_TARGET_TEMPERATURE,
            cooling_active: false,
            automatic_mode: true,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Latest reading of the given kind
    pub fn reading(&self, kind: SensorKind) -> Option<&Reading> {
        match kind {
            SensorKind::Temperature => self.temperature.as_ref(),
            SensorKind::Humidity => self.humidity.as_ref(),
            SensorKind::Pressure => self.pressure.as_ref(),
        }
    }

    /// Replace the slot for `kind` with a new reading
    pub(crate) fn store(&mut self, kind: SensorKind, reading: Reading) {
        let slot = match kind {
            SensorKind::Temperature => &mut self.temperature,
            SensorKind::Humidity => &mut self.humidity,
            SensorKind::Pressure => &mut self.pressure,
        };
        *slot = Some(reading);
    }

    /// Detached, serializable copy of the room
    pub fn view(&self) -> RoomView {
        RoomView {
            id: self.id.clone(),
            temperature: self.temperature.clone(),
            humidity: self.humidity.clone(),
            pressure: self.pressure.clone(),
            target_temperature: self.target_temperature,
            cooling_active: self.cooling_active,
            automatic_mode: self.automatic_mode,
        }
    }
}

/// Read-only copy of a room's state, safe to serialize and compare
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomView {
    pub id: String,
    pub temperature: Option<Reading>,
    pub humidity: Option<Reading>,
    pub pressure: Option<Reading>,
    pub target_temperature: f64,
    pub cooling_active: bool,
    pub automatic_mode: bool,
}

impl RoomView {
    pub fn control_state(&self) -> RoomControlState {
        RoomControlState {
            cooling_active: self.cooling_active,
            target_temperature: self.target_temperature,
        }
    }
}

/// The part of a room the temperature emitter couples to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoomControlState {
    pub cooling_active: bool,
    pub target_temperature: f64,
}

/// Every room keyed by id; ordered so equal states serialize identically
pub type Snapshot = BTreeMap<String, RoomView>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_defaults() {
        let room = Room::new("kitchen");
        assert_eq!(room.id(), "kitchen");
        assert_eq!(room.target_temperature, 21.0);
        assert!(!room.cooling_active);
        assert!(room.automatic_mode);
        assert!(SensorKind::ALL.iter().all(|k| room.reading(*k).is_none()));
    }

    #[test]
    fn test_store_overwrites_slot() {
        let mut room = Room::new("office");
        room.store(SensorKind::Humidity, Reading::now(41.0, "%"));
        room.store(SensorKind::Humidity, Reading::now(42.5, "%"));

        assert_eq!(room.reading(SensorKind::Humidity).unwrap().value, 42.5);
        assert!(room.temperature.is_none());
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("Temperature".parse::<SensorKind>().unwrap(), SensorKind::Temperature);
        assert_eq!(" pressure ".parse::<SensorKind>().unwrap(), SensorKind::Pressure);
        assert!("co2".parse::<SensorKind>().is_err());
    }

    #[test]
    fn test_view_serializes_snake_case() {
        let view = Room::new("hall").view();
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["target_temperature"], 21.0);
        assert_eq!(json["cooling_active"], false);
        assert_eq!(json["automatic_mode"], true);
        assert!(json["temperature"].is_null());
    }
}
