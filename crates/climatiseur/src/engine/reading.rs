use std::fmt;

use chrono::DateTime;
use chrono::Utc;

use super::error::CycleError;

/// Value carried by a telemetry reading.
///
/// Thermostat modes arrive as text, temperatures and portal states as numbers.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

/// The last value reported for one named series or tag, with the time it was
/// recorded.
///
/// Readings live for a single evaluation cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// Series or tag name used in diagnostics (e.g. "Front Door")
    pub label: String,
    pub value: Value,
    pub timestamp: DateTime<Utc>,
}

impl Reading {
    pub fn new(label: impl Into<String>, value: impl Into<Value>, timestamp: DateTime<Utc>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            timestamp,
        }
    }

    /// Build a reading from the raw JSON value and RFC 3339 timestamp the
    /// telemetry source reports.
    pub fn from_raw(
        label: impl Into<String>,
        value: &serde_json::Value,
        time: &str,
    ) -> Result<Self, CycleError> {
        let label = label.into();

        let timestamp = DateTime::parse_from_rfc3339(time)
            .map_err(|e| CycleError::MalformedReading {
                label: label.clone(),
                reason: format!("invalid timestamp '{}': {}", time, e),
            })?
            .with_timezone(&Utc);

        let value = match value {
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(n) => Value::Number(n),
                None => {
                    return Err(CycleError::MalformedReading {
                        label,
                        reason: format!("number {} is not representable", n),
                    });
                }
            },
            serde_json::Value::String(s) => Value::Text(s.clone()),
            other => {
                return Err(CycleError::MalformedReading {
                    label,
                    reason: format!("expected a number or string, found {}", other),
                });
            }
        };

        Ok(Self {
            label,
            value,
            timestamp,
        })
    }

    /// Numeric value of this reading, or `MalformedReading` if it is text.
    pub fn as_number(&self) -> Result<f64, CycleError> {
        match &self.value {
            Value::Number(n) => Ok(*n),
            Value::Text(s) => Err(CycleError::MalformedReading {
                label: self.label.clone(),
                reason: format!("expected a number, found '{}'", s),
            }),
        }
    }
}
