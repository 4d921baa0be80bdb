//! tidepool-control — the periodic decision loop of the pool.
//!
//! Once per tick the [`ControlLoop`] reads the backlog and the live
//! worker count, asks the PID controller for a desired size and
//! reconciles: spawn the shortfall, or deposit termination grants for the
//! surplus. There is no barrier between ticks; workers register and
//! deregister on their own schedule and the next tick sees the result.
//!
//! # Reconciliation
//!
//! ```text
//! desired = pid.calc_desired(queue.len(), setpoint)
//! target  = round(desired)            (capped by max_workers if set)
//! diff    = target - pool.value()
//!
//! diff > 0  → spawn diff workers
//! diff < 0  → tokens.set_pending(-diff)
//! diff == 0 → nothing
//! ```
//!
//! [`ControlSurface`] is the read/write view handed to the telemetry
//! transport: snapshots, drained sample history and tunable updates.

pub mod control_loop;
pub mod surface;

pub use control_loop::{ControlLoop, LoopSettings, ScaleAction, TickOutcome};
pub use surface::ControlSurface;
