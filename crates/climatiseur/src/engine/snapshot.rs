use std::collections::BTreeSet;

use tracing::debug;
use tracing::warn;

use super::error::CycleError;
use super::reading::Reading;
use super::reading::Value;
use super::staleness::StalenessGate;
use super::thermostat::ThermostatMode;

/// Open/closed state of one tracked door or window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalState {
    pub name: String,
    pub is_open: bool,
}

impl PortalState {
    /// Classify a portal sensor reading: `0` is closed, `1` is open.
    ///
    /// Any other value (including text) is unrecognized and yields `None`.
    pub fn from_reading(reading: &Reading) -> Option<Self> {
        let is_open = match reading.value {
            Value::Number(n) if n == 0.0 => false,
            Value::Number(n) if n == 1.0 => true,
            _ => return None,
        };

        Some(Self {
            name: reading.label.clone(),
            is_open,
        })
    }
}

/// Everything the rule table needs for one cycle.
///
/// Every name in `open_portals` and `closed_portals` is on the portal
/// allow-list, and the two sets are disjoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ClimateSnapshot {
    pub thermostat: ThermostatMode,
    pub indoor_temp: f64,
    pub outdoor_temp: f64,
    pub open_portals: BTreeSet<String>,
    pub closed_portals: BTreeSet<String>,
    /// Tracked portals skipped this cycle because their reading was stale
    pub stale_portals: Vec<String>,
}

/// Assembles a [`ClimateSnapshot`] from gated readings.
pub struct SnapshotBuilder<'a> {
    gate: &'a StalenessGate,
    portal_allow_list: &'a BTreeSet<String>,
}

impl<'a> SnapshotBuilder<'a> {
    pub fn new(gate: &'a StalenessGate, portal_allow_list: &'a BTreeSet<String>) -> Self {
        Self {
            gate,
            portal_allow_list,
        }
    }

    /// Gate a temperature reading and extract its value.
    ///
    /// Staleness here is fatal to the cycle.
    pub fn temperature(&self, reading: Reading) -> Result<f64, CycleError> {
        let reading = self.gate.check(reading)?;
        reading.as_number()
    }

    /// Classify portal sensor readings into open and closed sets.
    ///
    /// Sensors not on the allow-list are ignored. A stale sensor is skipped
    /// and recorded; it does not abort the cycle.
    pub fn portals<I>(&self, readings: I) -> PortalSets
    where
        I: IntoIterator<Item = Reading>,
    {
        let mut sets = PortalSets::default();

        for reading in readings {
            if !self.portal_allow_list.contains(&reading.label) {
                debug!("Ignoring untracked sensor '{}'", reading.label);
                continue;
            }

            if sets.contains(&reading.label) {
                debug!("Ignoring repeated reading for '{}'", reading.label);
                continue;
            }

            let reading = match self.gate.check(reading) {
                Ok(r) => r,
                Err(stale) => {
                    warn!("Skipping portal: {}", stale);
                    sets.stale.push(stale.label);
                    continue;
                }
            };

            match PortalState::from_reading(&reading) {
                Some(PortalState {
                    name,
                    is_open: true,
                }) => {
                    sets.open.insert(name);
                }
                Some(PortalState {
                    name,
                    is_open: false,
                }) => {
                    sets.closed.insert(name);
                }
                None => {
                    debug!(
                        "Ignoring unrecognized value {} for '{}'",
                        reading.value, reading.label
                    );
                }
            }
        }

        sets
    }

    /// Assemble the snapshot from temperatures already passed through
    /// [`Self::temperature`] and the classified portal sets.
    pub fn build(
        &self,
        thermostat: ThermostatMode,
        indoor_temp: f64,
        outdoor_temp: f64,
        sets: PortalSets,
    ) -> ClimateSnapshot {
        ClimateSnapshot {
            thermostat,
            indoor_temp,
            outdoor_temp,
            open_portals: sets.open,
            closed_portals: sets.closed,
            stale_portals: sets.stale,
        }
    }
}

/// Portal classification result for one cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PortalSets {
    pub open: BTreeSet<String>,
    pub closed: BTreeSet<String>,
    pub stale: Vec<String>,
}

impl PortalSets {
    fn contains(&self, name: &str) -> bool {
        self.open.contains(name) || self.closed.contains(name) || self.stale.iter().any(|s| s == name)
    }
}
