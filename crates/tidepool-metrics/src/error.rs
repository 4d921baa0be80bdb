//! Tunable update errors.

use thiserror::Error;

/// Result type alias for tunable updates.
pub type TunableResult<T> = Result<T, TunableError>;

/// Why a tunable update was rejected. A rejected update changes nothing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TunableError {
    #[error("unknown tunable: {0}")]
    Unknown(String),

    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: String, value: String },

    #[error("malformed field (expected name=value): {0:?}")]
    Malformed(String),

    #[error("empty update")]
    Empty,
}
