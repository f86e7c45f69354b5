//! Imbalance rule table.
//!
//! An imbalance is a combination of thermostat mode, indoor/outdoor
//! temperature difference and portal state that wastes conditioning effort:
//!
//! | mode | outside vs. inside       | portals    | alert               |
//! |------|--------------------------|------------|---------------------|
//! | heat | warmer by > threshold    | none open  | open something      |
//! | heat | colder by > threshold    | some open  | close the doors     |
//! | cool | warmer by > threshold    | some open  | close the doors     |
//! | cool | colder by > threshold    | none open  | open something      |
//!
//! Any other mode, or a difference within `[-threshold, threshold]`, never
//! produces an alert.

use std::collections::BTreeSet;

use super::snapshot::ClimateSnapshot;
use super::thermostat::ThermostatMode;

/// Default temperature difference that must be exceeded before alerting.
pub const DEFAULT_THRESHOLD: f64 = 2.0;

/// Notification produced by one evaluation cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub subject: String,
    pub body: String,
}

/// Which row of the rule table matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Imbalance {
    /// Heating while it is warmer outside and everything is shut
    WarmerOutside,
    /// Heating while it is colder outside and something is open
    ColdOutside,
    /// Cooling while it is hotter outside and something is open
    HotOutside,
    /// Cooling while it is cooler outside and everything is shut
    CoolerOutside,
}

impl Imbalance {
    /// Match the rule table, first row wins.
    pub fn detect(
        mode: &ThermostatMode,
        indoor_temp: f64,
        outdoor_temp: f64,
        any_open: bool,
        threshold: f64,
    ) -> Option<Self> {
        let delta = outdoor_temp - indoor_temp;
        let warmer = delta > threshold;
        let colder = delta < -threshold;

        match mode {
            ThermostatMode::Heat if warmer && !any_open => Some(Imbalance::WarmerOutside),
            ThermostatMode::Heat if colder && any_open => Some(Imbalance::ColdOutside),
            ThermostatMode::Cool if warmer && any_open => Some(Imbalance::HotOutside),
            ThermostatMode::Cool if colder && !any_open => Some(Imbalance::CoolerOutside),
            _ => None,
        }
    }

    pub fn subject(self) -> &'static str {
        match self {
            Imbalance::WarmerOutside => {
                "It's warmer outside, please open some more doors and windows"
            }
            Imbalance::ColdOutside => "Close the doors!  It's cold outside!",
            Imbalance::HotOutside => "Close the doors!  It's hot outside!",
            Imbalance::CoolerOutside => {
                "It's cooler outside, please open some more doors and windows"
            }
        }
    }

    /// Compose the alert. Rows asking to open something list the closed
    /// portals as candidates; rows asking to close name the open ones.
    pub fn alert(self, open: &BTreeSet<String>, closed: &BTreeSet<String>) -> Alert {
        let body = match self {
            Imbalance::WarmerOutside | Imbalance::CoolerOutside => {
                std::iter::once("You might open one of these:")
                    .chain(closed.iter().map(String::as_str))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            Imbalance::ColdOutside | Imbalance::HotOutside => format!(
                "Why would you have the {} open?",
                open.iter().map(String::as_str).collect::<Vec<_>>().join(" & ")
            ),
        };

        Alert {
            subject: self.subject().to_string(),
            body,
        }
    }
}

/// Evaluate the rule table. Pure: identical inputs give identical output.
pub fn evaluate(
    mode: &ThermostatMode,
    indoor_temp: f64,
    outdoor_temp: f64,
    open: &BTreeSet<String>,
    closed: &BTreeSet<String>,
    threshold: f64,
) -> Option<Alert> {
    Imbalance::detect(mode, indoor_temp, outdoor_temp, !open.is_empty(), threshold)
        .map(|imbalance| imbalance.alert(open, closed))
}

impl ClimateSnapshot {
    pub fn evaluate(&self, threshold: f64) -> Option<Alert> {
        evaluate(
            &self.thermostat,
            self.indoor_temp,
            self.outdoor_temp,
            &self.open_portals,
            &self.closed_portals,
            threshold,
        )
    }
}
