//! Runtime tunables — setpoint and PID gains, changeable while running.
//!
//! Updates arrive either one at a time (`set`) or as a text form in the
//! `name=value; name=value` format (`apply`). A multi-field update is
//! parsed and validated in full before the single write that applies it,
//! so readers never observe half of an update and a bad field rejects
//! the whole thing.

use std::sync::{PoisonError, RwLock};

use tidepool_core::{Tunable, TunableValues};
use tracing::info;

use crate::error::{TunableError, TunableResult};

/// Thread-safe store of the current tunable values.
#[derive(Debug)]
pub struct Tunables {
    values: RwLock<TunableValues>,
}

impl Tunables {
    pub fn new(initial: TunableValues) -> Self {
        Self {
            values: RwLock::new(initial),
        }
    }

    /// Read every tunable in one consistent snapshot.
    pub fn values(&self) -> TunableValues {
        *self.values.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, tunable: Tunable) -> f64 {
        self.values().get(tunable)
    }

    /// Set one tunable by wire name.
    pub fn set(&self, name: &str, value: f64) -> TunableResult<Tunable> {
        let tunable = Tunable::from_name(name).ok_or_else(|| TunableError::Unknown(name.to_string()))?;
        if !value.is_finite() {
            return Err(TunableError::InvalidValue {
                name: name.to_string(),
                value: value.to_string(),
            });
        }
        self.write(&[(tunable, value)]);
        Ok(tunable)
    }

    /// Apply a `name=value; name=value` update atomically.
    ///
    /// Whitespace is ignored and a trailing `;` is allowed. Returns the
    /// fields that were applied, in the order given.
    pub fn apply(&self, update: &str) -> TunableResult<Vec<(Tunable, f64)>> {
        let fields = parse_update(update)?;
        self.write(&fields);
        Ok(fields)
    }

    /// Render in the same text form `apply` accepts, names sorted. Values
    /// use the shortest form that parses back to the same `f64`.
    pub fn render(&self) -> String {
        let values = self.values();
        let mut names: Vec<Tunable> = Tunable::ALL.to_vec();
        names.sort_by_key(|t| t.name());
        names
            .iter()
            .map(|t| format!("{}={}", t.name(), values.get(*t)))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn write(&self, fields: &[(Tunable, f64)]) {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        for &(tunable, value) in fields {
            values.set(tunable, value);
        }
        drop(values);

        for (tunable, value) in fields {
            info!(tunable = %tunable, value, "tunable updated");
        }
    }
}

fn parse_update(update: &str) -> TunableResult<Vec<(Tunable, f64)>> {
    let compact: String = update.chars().filter(|c| !c.is_whitespace()).collect();

    let mut fields = Vec::new();
    for field in compact.split(';').filter(|f| !f.is_empty()) {
        let (name, raw) = field
            .split_once('=')
            .ok_or_else(|| TunableError::Malformed(field.to_string()))?;
        let tunable = Tunable::from_name(name).ok_or_else(|| TunableError::Unknown(name.to_string()))?;
        let value = raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| TunableError::InvalidValue {
                name: name.to_string(),
                value: raw.to_string(),
            })?;
        fields.push((tunable, value));
    }

    if fields.is_empty() {
        return Err(TunableError::Empty);
    }
    Ok(fields)
}
