use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::Point;
use super::Series;
use super::TelemetryError;
use super::TelemetrySource;
use crate::config::TelemetryConfig;

/// Raw `/query` response body
#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    #[serde(default)]
    series: Vec<RawSeries>,
    #[serde(default)]
    error: Option<String>,
}

/// Columnar series as InfluxDB 1.x returns it
#[derive(Debug, Deserialize)]
struct RawSeries {
    name: String,
    #[serde(default)]
    tags: BTreeMap<String, String>,
    columns: Vec<String>,
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

impl RawSeries {
    fn into_series(self) -> Result<Series, TelemetryError> {
        let column = |name: &str| {
            self.columns.iter().position(|c| c == name).ok_or_else(|| {
                TelemetryError::Shape(format!(
                    "series '{}' has no '{}' column (columns: {:?})",
                    self.name, name, self.columns
                ))
            })
        };
        let time_idx = column("time")?;
        let last_idx = column("last")?;

        let mut points = Vec::with_capacity(self.values.len());
        for row in &self.values {
            let time = row
                .get(time_idx)
                .and_then(|v| v.as_str())
                .ok_or_else(|| {
                    TelemetryError::Shape(format!(
                        "series '{}' has a row without a string time",
                        self.name
                    ))
                })?
                .to_string();
            let last = row.get(last_idx).cloned().unwrap_or(serde_json::Value::Null);
            points.push(Point { time, last });
        }

        Ok(Series {
            name: self.name,
            tags: self.tags,
            values: points,
        })
    }
}

/// Convert a decoded response into series, surfacing query errors.
fn collect_series(response: QueryResponse) -> Result<Vec<Series>, TelemetryError> {
    if let Some(error) = response.error {
        return Err(TelemetryError::Query(error));
    }

    let mut series = Vec::new();
    for result in response.results {
        if let Some(error) = result.error {
            return Err(TelemetryError::Query(error));
        }
        for raw in result.series {
            series.push(raw.into_series()?);
        }
    }

    Ok(series)
}

/// InfluxDB 1.x HTTP client
pub struct InfluxClient {
    http: reqwest::Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
}

impl InfluxClient {
    /// Create a new client from configuration
    pub fn new(config: &TelemetryConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }
}

#[async_trait]
impl TelemetrySource for InfluxClient {
    async fn query(&self, database: &str, query: &str) -> Result<Vec<Series>, TelemetryError> {
        let url = format!("{}/query", self.base_url);
        debug!("Querying {} on {}: {}", database, url, query);

        let mut params = vec![("db", database), ("q", query)];
        if let (Some(u), Some(p)) = (&self.username, &self.password) {
            params.push(("u", u.as_str()));
            params.push(("p", p.as_str()));
        }

        let http_err = |source: reqwest::Error| TelemetryError::Http {
            url: url.clone(),
            source,
        };

        let response = self
            .http
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(http_err)?;

        let status = response.status();
        // InfluxDB reports bad queries as a JSON body with an `error` field,
        // so try the body before falling back to the status code.
        match response.json::<QueryResponse>().await {
            Ok(body) => collect_series(body),
            Err(_) if !status.is_success() => Err(TelemetryError::Status {
                status: status.as_u16(),
            }),
            Err(e) => Err(http_err(e)),
        }
    }
}
