use std::fmt;
use std::str::FromStr;

use strum::EnumString;

use super::error::CycleError;
use super::reading::Reading;
use super::reading::Value;
use super::staleness::StalenessGate;

/// HVAC operating mode as reported by a thermostat.
///
/// The set of modes is open-ended; anything not listed here is kept verbatim
/// in `Other` and never matches a rule.
#[derive(Debug, Clone, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ThermostatMode {
    Heat,
    Cool,
    #[strum(serialize = "heat-cool")]
    HeatCool,
    Eco,
    Off,
    #[strum(default)]
    Other(String),
}

impl ThermostatMode {
    pub fn as_str(&self) -> &str {
        match self {
            ThermostatMode::Heat => "heat",
            ThermostatMode::Cool => "cool",
            ThermostatMode::HeatCool => "heat-cool",
            ThermostatMode::Eco => "eco",
            ThermostatMode::Off => "off",
            ThermostatMode::Other(s) => s,
        }
    }

    /// Parse a mode from a staleness-checked reading.
    pub fn from_reading(reading: &Reading) -> Result<Self, CycleError> {
        match &reading.value {
            Value::Text(s) => Ok(Self::parse(s)),
            Value::Number(n) => Err(CycleError::MalformedReading {
                label: reading.label.clone(),
                reason: format!("expected a thermostat mode, found {}", n),
            }),
        }
    }

    fn parse(s: &str) -> Self {
        // The `default` variant makes parsing infallible.
        Self::from_str(s).unwrap_or_else(|_| ThermostatMode::Other(s.to_string()))
    }
}

impl fmt::Display for ThermostatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Merge the two thermostat modes into one authoritative mode.
///
/// The family room wins. The living room may differ only when one of the two
/// is in eco; any other difference is a disagreement and aborts the cycle.
pub fn resolve(
    family_room: &ThermostatMode,
    living_room: &ThermostatMode,
) -> Result<ThermostatMode, CycleError> {
    let eco = *family_room == ThermostatMode::Eco || *living_room == ThermostatMode::Eco;
    if family_room != living_room && !eco {
        return Err(CycleError::ThermostatDisagreement {
            family_room: family_room.clone(),
            living_room: living_room.clone(),
        });
    }

    Ok(family_room.clone())
}

/// Gate both thermostat readings and resolve them.
///
/// A stale reading from either thermostat aborts the cycle; the family room
/// is checked first.
pub fn resolve_readings(
    gate: &StalenessGate,
    family_room: Reading,
    living_room: Reading,
) -> Result<ThermostatMode, CycleError> {
    let family_room = ThermostatMode::from_reading(&gate.check(family_room)?)?;
    let living_room = ThermostatMode::from_reading(&gate.check(living_room)?)?;
    resolve(&family_room, &living_room)
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use chrono::TimeZone;
    use chrono::Utc;

    use super::*;

    #[test]
    fn test_parse_known_modes() {
        assert_eq!(ThermostatMode::parse("heat"), ThermostatMode::Heat);
        assert_eq!(ThermostatMode::parse("cool"), ThermostatMode::Cool);
        assert_eq!(ThermostatMode::parse("heat-cool"), ThermostatMode::HeatCool);
        assert_eq!(ThermostatMode::parse("eco"), ThermostatMode::Eco);
        assert_eq!(ThermostatMode::parse("off"), ThermostatMode::Off);
    }

    #[test]
    fn test_parse_unknown_mode_is_kept() {
        let mode = ThermostatMode::parse("emergency");
        assert_eq!(mode, ThermostatMode::Other("emergency".to_string()));
        assert_eq!(mode.to_string(), "emergency");
    }

    #[test]
    fn test_display_round_trips_known_modes() {
        for mode in [
            ThermostatMode::Heat,
            ThermostatMode::Cool,
            ThermostatMode::HeatCool,
            ThermostatMode::Eco,
            ThermostatMode::Off,
        ] {
            assert_eq!(ThermostatMode::parse(&mode.to_string()), mode);
        }
    }

    #[test]
    fn test_resolve_agreeing_modes() {
        let mode = resolve(&ThermostatMode::Heat, &ThermostatMode::Heat).unwrap();
        assert_eq!(mode, ThermostatMode::Heat);
    }

    #[test]
    fn test_resolve_living_room_eco_keeps_family_room() {
        let mode = resolve(&ThermostatMode::Heat, &ThermostatMode::Eco).unwrap();
        assert_eq!(mode, ThermostatMode::Heat);
    }

    #[test]
    fn test_resolve_family_room_eco_wins() {
        let mode = resolve(&ThermostatMode::Eco, &ThermostatMode::Cool).unwrap();
        assert_eq!(mode, ThermostatMode::Eco);
    }

    #[test]
    fn test_resolve_disagreement() {
        let err = resolve(&ThermostatMode::Heat, &ThermostatMode::Cool).unwrap_err();
        match err {
            CycleError::ThermostatDisagreement {
                family_room,
                living_room,
            } => {
                assert_eq!(family_room, ThermostatMode::Heat);
                assert_eq!(living_room, ThermostatMode::Cool);
            }
            other => panic!("Expected ThermostatDisagreement, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_readings_stale_family_room_aborts_first() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let gate = StalenessGate::new(now, TimeDelta::seconds(5000));
        let family = Reading::new("Family Room Thermostat", "heat", now - TimeDelta::hours(2));
        let living = Reading::new("Living Room Thermostat", "heat", now - TimeDelta::hours(3));

        match resolve_readings(&gate, family, living).unwrap_err() {
            CycleError::Stale(stale) => assert_eq!(stale.label, "Family Room Thermostat"),
            other => panic!("Expected Stale, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_readings_stale_living_room_aborts() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let gate = StalenessGate::new(now, TimeDelta::seconds(5000));
        let family = Reading::new("Family Room Thermostat", "heat", now);
        let living = Reading::new("Living Room Thermostat", "heat", now - TimeDelta::hours(3));

        match resolve_readings(&gate, family, living).unwrap_err() {
            CycleError::Stale(stale) => assert_eq!(stale.label, "Living Room Thermostat"),
            other => panic!("Expected Stale, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_readings_numeric_mode_is_malformed() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let gate = StalenessGate::new(now, TimeDelta::seconds(5000));
        let family = Reading::new("Family Room Thermostat", 1.0, now);
        let living = Reading::new("Living Room Thermostat", "heat", now);

        assert!(matches!(
            resolve_readings(&gate, family, living),
            Err(CycleError::MalformedReading { .. })
        ));
    }
}
