use chrono::DateTime;
use chrono::TimeDelta;
use chrono::Utc;

use super::error::StaleReading;
use super::reading::Reading;

/// Freshness check applied to every reading before it is used.
///
/// `now` is captured once per cycle so that every check in the cycle compares
/// against the same instant.
#[derive(Debug, Clone, Copy)]
pub struct StalenessGate {
    now: DateTime<Utc>,
    max_age: TimeDelta,
}

impl StalenessGate {
    pub fn new(now: DateTime<Utc>, max_age: TimeDelta) -> Self {
        Self { now, max_age }
    }

    /// Pass the reading through unchanged if `now - timestamp <= max_age`.
    pub fn check(&self, reading: Reading) -> Result<Reading, StaleReading> {
        let age = self.now - reading.timestamp;
        if age <= self.max_age {
            Ok(reading)
        } else {
            Err(StaleReading {
                label: reading.label,
                age_secs: age.num_seconds(),
            })
        }
    }
}
