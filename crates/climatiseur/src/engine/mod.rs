//! The decision engine: staleness gating, thermostat consensus, snapshot
//! assembly and the imbalance rule table.
//!
//! Nothing here performs I/O. The `scan` pipeline feeds readings in and
//! dispatches whatever alert comes out.

mod error;
mod reading;
mod rules;
mod snapshot;
mod staleness;
mod thermostat;

pub use error::CycleError;
pub use error::StaleReading;
pub use reading::Reading;
pub use reading::Value;
pub use rules::evaluate;
pub use rules::Alert;
pub use rules::Imbalance;
pub use rules::DEFAULT_THRESHOLD;
pub use snapshot::ClimateSnapshot;
pub use snapshot::PortalSets;
pub use snapshot::PortalState;
pub use snapshot::SnapshotBuilder;
pub use staleness::StalenessGate;
pub use thermostat::resolve;
pub use thermostat::resolve_readings;
pub use thermostat::ThermostatMode;
