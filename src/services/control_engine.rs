//! Hysteresis cooling rule
//!
//! Cooling switches on above `target + HYSTERESIS_BAND` and off below
//! `target - HYSTERESIS_BAND`. Inside the band the previous state is kept.

/// Half-width of the dead band around the target (°C)
pub const HYSTERESIS_BAND: f64 = 0.5;

/// Decide whether cooling should be active for the current temperature.
pub fn evaluate(current_temp: f64, target: f64, previous_cooling_active: bool) -> bool {
    if current_temp > target + HYSTERESIS_BAND {
        true
    } else if current_temp < target - HYSTERESIS_BAND {
        false
    } else {
        previous_cooling_active
    }
}
