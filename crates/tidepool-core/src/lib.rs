//! tidepool-core — shared vocabulary for the Tidepool worker pool.
//!
//! Holds the domain types every other crate speaks (work items, gains,
//! tunables, snapshots), the `tidepool.toml` configuration parser and the
//! configuration error type.

pub mod config;
pub mod error;
pub mod types;

pub use config::TidepoolConfig;
pub use error::{ConfigError, ConfigResult};
pub use types::*;
