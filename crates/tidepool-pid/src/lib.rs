//! tidepool-pid — discrete PID controller for pool sizing.
//!
//! Converts the observed backlog into a desired worker count once per
//! control tick.
//!
//! # Algorithm
//!
//! ```text
//! error      = backlog - setpoint
//! integral  += error                      (no anti-windup)
//! derivative = error - previous_error
//! output     = kp*error + ki*integral + kd*derivative
//! output     = 0 if output < 0 or not finite
//! previous_error = error
//! ```
//!
//! The controller counts ticks, not seconds: the same gains and the same
//! ordered inputs always produce the same outputs, bit for bit, however
//! much wall-clock time passes between calls.

pub mod controller;

pub use controller::{PidController, PidState};
