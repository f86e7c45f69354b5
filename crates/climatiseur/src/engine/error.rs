use super::thermostat::ThermostatMode;
use crate::telemetry::TelemetryError;

/// A reading whose timestamp is older than the freshness threshold.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{label}' measurement is stale ({age_secs}s old)")]
pub struct StaleReading {
    /// Series or tag name of the failed reading
    pub label: String,
    pub age_secs: i64,
}

/// Reasons an evaluation cycle ends without reaching the rule table.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error(transparent)]
    Stale(#[from] StaleReading),

    /// The two thermostats report different modes and neither is in eco.
    #[error(
        "thermostats disagree: family room is '{family_room}', living room is '{living_room}'"
    )]
    ThermostatDisagreement {
        family_room: ThermostatMode,
        living_room: ThermostatMode,
    },

    #[error("no data returned for '{series}'")]
    MissingSeries { series: String },

    #[error("malformed reading for '{label}': {reason}")]
    MalformedReading { label: String, reason: String },

    #[error("telemetry query failed: {0}")]
    Telemetry(#[from] TelemetryError),
}

impl CycleError {
    /// True for the staleness and consensus conditions the decision engine
    /// itself detects, as opposed to failures talking to the data source.
    pub fn is_measurement_problem(&self) -> bool {
        matches!(
            self,
            CycleError::Stale(_) | CycleError::ThermostatDisagreement { .. }
        )
    }
}
