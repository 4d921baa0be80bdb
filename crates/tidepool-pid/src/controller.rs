//! PID controller state machine.

use serde::{Deserialize, Serialize};
use tidepool_core::Gains;

/// Accumulated controller state, exposed for telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PidState {
    pub integral: f64,
    pub previous_error: f64,
}

/// Backlog → desired pool size.
///
/// The integral is unbounded on purpose: a long sustained error keeps
/// growing the output. Callers that need a ceiling apply it to the output,
/// not to the controller state.
#[derive(Debug, Clone)]
pub struct PidController {
    gains: Gains,
    state: PidState,
}

impl PidController {
    pub fn new(gains: Gains) -> Self {
        Self {
            gains,
            state: PidState::default(),
        }
    }

    pub fn gains(&self) -> Gains {
        self.gains
    }

    /// Replace the gains. Takes effect on the next `calc_desired`; the
    /// accumulated integral and previous error are kept.
    pub fn set_gains(&mut self, gains: Gains) {
        self.gains = gains;
    }

    pub fn state(&self) -> PidState {
        self.state
    }

    /// Advance the controller one tick and return the desired pool size.
    ///
    /// Never negative and never NaN or infinite: such outputs become `0.0`.
    pub fn calc_desired(&mut self, backlog: f64, setpoint: f64) -> f64 {
        let error = backlog - setpoint;
        self.state.integral += error;
        let derivative = error - self.state.previous_error;

        let Gains { kp, ki, kd } = self.gains;
        let output = kp * error + ki * self.state.integral + kd * derivative;

        self.state.previous_error = error;

        if output.is_finite() && output > 0.0 {
            output
        } else {
            0.0
        }
    }
}
