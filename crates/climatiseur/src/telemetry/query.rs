//! InfluxQL statements for the readings a cycle needs.

/// Tag the thermostat series are filtered on.
pub const THERMOSTAT_NAME_TAG: &str = "name_long";

/// Tag portal sensors are grouped by; its value is the portal name.
pub const PORTAL_DESCRIPTION_TAG: &str = "description";

pub const HVAC_MODE: &str = "hvac_mode";
pub const TEMPERATURE_INDOOR: &str = "temperature_indoor";
pub const TEMPERATURE_OUTDOOR: &str = "temperature_outdoor";
pub const PORTAL_STATE: &str = "state";

/// `SELECT last("value") FROM "<measurement>"`
pub fn last_value(measurement: &str) -> String {
    format!(
        "SELECT last(\"value\") FROM {}",
        quote_identifier(measurement)
    )
}

/// Last HVAC mode of one thermostat, selected by its long name.
pub fn thermostat_mode(name: &str) -> String {
    format!(
        "{} WHERE {} = {}",
        last_value(HVAC_MODE),
        quote_identifier(THERMOSTAT_NAME_TAG),
        quote_string(name)
    )
}

/// Last state of every portal sensor, one series per description.
pub fn portal_states() -> String {
    format!(
        "{} GROUP BY {}",
        last_value(PORTAL_STATE),
        quote_identifier(PORTAL_DESCRIPTION_TAG)
    )
}

fn quote_identifier(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

fn quote_string(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thermostat_mode_query() {
        insta::assert_snapshot!(
            thermostat_mode("Family Room Thermostat"),
            @r#"SELECT last("value") FROM "hvac_mode" WHERE "name_long" = 'Family Room Thermostat'"#
        );
    }

    #[test]
    fn test_temperature_query() {
        assert_eq!(
            last_value(TEMPERATURE_OUTDOOR),
            r#"SELECT last("value") FROM "temperature_outdoor""#
        );
    }

    #[test]
    fn test_portal_states_query() {
        assert_eq!(
            portal_states(),
            r#"SELECT last("value") FROM "state" GROUP BY "description""#
        );
    }

    #[test]
    fn test_string_literal_is_escaped() {
        assert_eq!(
            thermostat_mode("Kid's Room"),
            r#"SELECT last("value") FROM "hvac_mode" WHERE "name_long" = 'Kid\'s Room'"#
        );
    }
}
