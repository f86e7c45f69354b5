//! Telemetry data source.
//!
//! The engine only needs "last value + timestamp" per series or tag. The
//! [`TelemetrySource`] trait exposes exactly that shape so the real InfluxDB
//! client can be swapped for an in-memory fake in tests.

mod influx;
pub mod query;

use std::collections::BTreeMap;

use async_trait::async_trait;

pub use influx::InfluxClient;

/// One point of a series: the time it was recorded and the `last()` value.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    /// RFC 3339 timestamp as reported by the source
    pub time: String,
    pub last: serde_json::Value,
}

/// A series returned by a query, with its grouping tags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    pub name: String,
    pub tags: BTreeMap<String, String>,
    pub values: Vec<Point>,
}

impl Series {
    /// First point of the series, if any.
    pub fn first(&self) -> Option<&Point> {
        self.values.first()
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("InfluxDB returned HTTP {status}")]
    Status { status: u16 },

    #[error("InfluxDB query error: {0}")]
    Query(String),

    #[error("unexpected response shape: {0}")]
    Shape(String),
}

/// Trait for time-series queries
///
/// This trait allows for mocking the data source for testing purposes
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Run `query` against `database` and return every series in the result
    async fn query(&self, database: &str, query: &str) -> Result<Vec<Series>, TelemetryError>;
}

/// In-memory telemetry source for tests
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockTelemetrySource {
    pub responses: std::collections::HashMap<(String, String), Vec<Series>>,
    pub queries: std::sync::Mutex<Vec<(String, String)>>,
}

#[cfg(test)]
#[async_trait]
impl TelemetrySource for MockTelemetrySource {
    async fn query(&self, database: &str, query: &str) -> Result<Vec<Series>, TelemetryError> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push((database.to_string(), query.to_string()));
        }
        Ok(self
            .responses
            .get(&(database.to_string(), query.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
impl MockTelemetrySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the series returned for one (database, query) pair
    pub fn add_response(&mut self, database: &str, query: &str, series: Vec<Series>) {
        self.responses
            .insert((database.to_string(), query.to_string()), series);
    }
}
