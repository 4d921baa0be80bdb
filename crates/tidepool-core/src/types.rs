//! Domain types shared across the Tidepool crates.
//!
//! Everything that crosses a crate boundary or the HTTP control surface
//! lives here. Types that leave the process are serializable to JSON.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ── Work ───────────────────────────────────────────────────────────

/// One unit of queued work.
///
/// The magnitude is an opaque processing cost. Workers turn it into a
/// simulated duration by multiplying with their configured work unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkItem {
    magnitude: u64,
}

impl WorkItem {
    pub fn new(magnitude: u64) -> Self {
        Self { magnitude }
    }

    pub fn magnitude(&self) -> u64 {
        self.magnitude
    }

    /// Simulated processing time for this item.
    pub fn cost(&self, unit: Duration) -> Duration {
        let nanos = unit.as_nanos().saturating_mul(self.magnitude as u128);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

impl From<u64> for WorkItem {
    fn from(magnitude: u64) -> Self {
        Self::new(magnitude)
    }
}

// ── Control ────────────────────────────────────────────────────────

/// Proportional, integral and derivative gains.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Gains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl Gains {
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }
}

/// A value that can be changed at runtime through the control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tunable {
    Setpoint,
    Kp,
    Ki,
    Kd,
}

impl Tunable {
    pub const ALL: [Tunable; 4] = [Tunable::Setpoint, Tunable::Kp, Tunable::Ki, Tunable::Kd];

    /// Look up a tunable by its wire name. `setp` is accepted for `setpoint`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "setpoint" | "setp" => Some(Self::Setpoint),
            "kp" => Some(Self::Kp),
            "ki" => Some(Self::Ki),
            "kd" => Some(Self::Kd),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Setpoint => "setpoint",
            Self::Kp => "kp",
            Self::Ki => "ki",
            Self::Kd => "kd",
        }
    }
}

impl fmt::Display for Tunable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Current value of every tunable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TunableValues {
    pub setpoint: f64,
    pub gains: Gains,
}

impl TunableValues {
    pub fn get(&self, tunable: Tunable) -> f64 {
        match tunable {
            Tunable::Setpoint => self.setpoint,
            Tunable::Kp => self.gains.kp,
            Tunable::Ki => self.gains.ki,
            Tunable::Kd => self.gains.kd,
        }
    }

    pub fn set(&mut self, tunable: Tunable, value: f64) {
        match tunable {
            Tunable::Setpoint => self.setpoint = value,
            Tunable::Kp => self.gains.kp = value,
            Tunable::Ki => self.gains.ki = value,
            Tunable::Kd => self.gains.kd = value,
        }
    }
}

// ── Telemetry ──────────────────────────────────────────────────────

/// Point-in-time view of the pool, served to the control surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    /// Current queue length.
    pub backlog: usize,
    /// Workers currently registered.
    pub active: usize,
    /// Termination grants deposited but not yet claimed.
    pub pending_terminations: usize,
    pub setpoint: f64,
    pub gains: Gains,
    /// Control ticks executed so far.
    pub ticks: u64,
    /// Workers started since boot.
    pub workers_started: u64,
    /// Workers exited since boot.
    pub workers_exited: u64,
    /// Controller integral after the last tick.
    pub integral: f64,
    /// Controller error seen by the last tick.
    pub previous_error: f64,
    /// History samples discarded because nobody drained in time.
    pub samples_dropped: u64,
}

/// One row of the per-tick telemetry history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub tick: u64,
    pub backlog: usize,
    pub setpoint: f64,
    pub active: usize,
    pub desired: f64,
    /// Unix time in seconds (fractional).
    pub timestamp: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn work_item_cost_scales_with_unit() {
        let item = WorkItem::new(250);
        assert_eq!(item.cost(Duration::from_millis(1)), Duration::from_millis(250));
        assert_eq!(item.cost(Duration::from_micros(10)), Duration::from_micros(2500));
        assert_eq!(WorkItem::new(0).cost(Duration::from_secs(1)), Duration::ZERO);
    }

    #[test]
    fn work_item_cost_saturates() {
        let item = WorkItem::new(u64::MAX);
        assert_eq!(item.cost(Duration::from_secs(10)), Duration::from_nanos(u64::MAX));
    }

    #[test]
    fn tunable_names_round_trip() {
        for t in Tunable::ALL {
            assert_eq!(Tunable::from_name(t.name()), Some(t));
        }
        assert_eq!(Tunable::from_name("setp"), Some(Tunable::Setpoint));
        assert_eq!(Tunable::from_name("KP"), None);
        assert_eq!(Tunable::from_name(""), None);
    }

    #[test]
    fn tunable_values_get_set() {
        let mut values = TunableValues {
            setpoint: 20.0,
            gains: Gains::new(1.0, 1.0, 0.0),
        };
        values.set(Tunable::Kd, 0.25);
        values.set(Tunable::Setpoint, 5.0);
        assert_eq!(values.get(Tunable::Kd), 0.25);
        assert_eq!(values.get(Tunable::Setpoint), 5.0);
        assert_eq!(values.get(Tunable::Kp), 1.0);
    }

    #[test]
    fn tunable_serializes_snake_case() {
        let json = serde_json::to_string(&Tunable::Setpoint).unwrap();
        assert_eq!(json, "\"setpoint\"");
    }
}
