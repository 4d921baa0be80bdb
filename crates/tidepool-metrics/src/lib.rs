//! tidepool-metrics — the telemetry/control side of the pool.
//!
//! # Architecture
//!
//! ```text
//! Tunables
//!   ├── values()        ← read once per tick by the control loop
//!   ├── set(name, v)    ← single named update from the control surface
//!   └── apply("kp=1; setpoint=20")  ← all-or-nothing multi-field update
//!
//! Recorder
//!   ├── record(Sample)  ← one row per control tick
//!   └── drain()         → rows since the last drain
//!
//! Prometheus exposition
//!   └── render_prometheus(&PoolSnapshot) → text/plain for /metrics
//! ```

pub mod error;
pub mod prometheus;
pub mod recorder;
pub mod tunables;

pub use error::{TunableError, TunableResult};
pub use prometheus::render_prometheus;
pub use recorder::Recorder;
pub use tunables::Tunables;
