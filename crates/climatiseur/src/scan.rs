//! One evaluation cycle: fetch readings, decide, dispatch.
//!
//! Readings flow through the staleness gate into thermostat consensus and the
//! snapshot builder, the rule table turns the snapshot into an optional alert,
//! and the dispatcher logs or mails it. Every check in a cycle uses the same
//! `now`.

use std::collections::BTreeSet;

use chrono::DateTime;
use chrono::Utc;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::config::Config;
use crate::engine::resolve_readings;
use crate::engine::Alert;
use crate::engine::ClimateSnapshot;
use crate::engine::CycleError;
use crate::engine::Reading;
use crate::engine::SnapshotBuilder;
use crate::engine::StalenessGate;
use crate::notify::dispatch;
use crate::notify::DispatchReport;
use crate::notify::Mailer;
use crate::telemetry::query;
use crate::telemetry::Series;
use crate::telemetry::TelemetrySource;

pub const INDOOR_LABEL: &str = "indoor temperature";
pub const OUTDOOR_LABEL: &str = "outdoor temperature";

/// How a completed cycle ended
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    AllWell,
    Alerted {
        alert: Alert,
        report: DispatchReport,
    },
}

/// Fetch the last reading of a single-series query
async fn last_reading(
    telemetry: &dyn TelemetrySource,
    database: &str,
    statement: &str,
    label: &str,
) -> Result<Reading, CycleError> {
    let series = telemetry.query(database, statement).await?;
    let point = series
        .first()
        .and_then(Series::first)
        .ok_or_else(|| CycleError::MissingSeries {
            series: label.to_string(),
        })?;

    Reading::from_raw(label, &point.last, &point.time)
}

/// Fetch the last state of every tracked portal sensor, labelled by
/// description.
///
/// Untracked sensors are dropped before their points are parsed. Series
/// without a description or with an unusable point are skipped.
async fn portal_readings(
    telemetry: &dyn TelemetrySource,
    database: &str,
    tracked: &BTreeSet<String>,
) -> Result<Vec<Reading>, CycleError> {
    let series = telemetry.query(database, &query::portal_states()).await?;

    let mut readings = Vec::with_capacity(series.len());
    for s in &series {
        let Some(description) = s.tag(query::PORTAL_DESCRIPTION_TAG) else {
            debug!("Ignoring portal series without a description: {:?}", s.tags);
            continue;
        };
        if !tracked.contains(description) {
            debug!("Ignoring untracked sensor '{}'", description);
            continue;
        }
        let Some(point) = s.first() else {
            debug!("Ignoring empty series for '{}'", description);
            continue;
        };

        match Reading::from_raw(description, &point.last, &point.time) {
            Ok(reading) => readings.push(reading),
            Err(e) => warn!("Skipping portal: {}", e),
        }
    }

    Ok(readings)
}

fn list(names: &BTreeSet<String>) -> String {
    format!("{:?}", names.iter().collect::<Vec<_>>())
}

/// Fetch every reading and evaluate the rule table.
///
/// Returns the snapshot the decision was made on alongside the alert, if any.
pub async fn evaluate_cycle(
    config: &Config,
    telemetry: &dyn TelemetrySource,
    now: DateTime<Utc>,
) -> Result<(ClimateSnapshot, Option<Alert>), CycleError> {
    let gate = StalenessGate::new(now, config.check.max_age());
    let telemetry_config = &config.telemetry;

    // Thermostat consensus
    let family_room = last_reading(
        telemetry,
        &telemetry_config.thermostat_database,
        &query::thermostat_mode(&config.thermostats.family_room),
        &config.thermostats.family_room,
    )
    .await?;
    let living_room = last_reading(
        telemetry,
        &telemetry_config.thermostat_database,
        &query::thermostat_mode(&config.thermostats.living_room),
        &config.thermostats.living_room,
    )
    .await?;
    let thermostat = resolve_readings(&gate, family_room, living_room)?;
    info!("thermostat set to '{}'", thermostat);

    let builder = SnapshotBuilder::new(&gate, &config.portals);

    // Indoor/outdoor temperatures, each gated before the next query
    let indoor = last_reading(
        telemetry,
        &telemetry_config.weather_database,
        &query::last_value(query::TEMPERATURE_INDOOR),
        INDOOR_LABEL,
    )
    .await?;
    let indoor_temp = builder.temperature(indoor)?;
    let outdoor = last_reading(
        telemetry,
        &telemetry_config.weather_database,
        &query::last_value(query::TEMPERATURE_OUTDOOR),
        OUTDOOR_LABEL,
    )
    .await?;
    let outdoor_temp = builder.temperature(outdoor)?;

    // Portals
    let portals = portal_readings(
        telemetry,
        &telemetry_config.portal_database,
        &config.portals,
    )
    .await?;
    let sets = builder.portals(portals);

    let snapshot = builder.build(thermostat, indoor_temp, outdoor_temp, sets);

    info!("indoor temperature is {}", snapshot.indoor_temp);
    info!("outdoor temperature is {}", snapshot.outdoor_temp);
    info!(
        "closed ({}) {}",
        snapshot.closed_portals.len(),
        list(&snapshot.closed_portals)
    );
    info!(
        "open ({}) {}",
        snapshot.open_portals.len(),
        list(&snapshot.open_portals)
    );
    if !snapshot.stale_portals.is_empty() {
        warn!(
            "stale ({}) {:?}",
            snapshot.stale_portals.len(),
            snapshot.stale_portals
        );
    }

    let alert = snapshot.evaluate(config.check.threshold);
    Ok((snapshot, alert))
}

/// Run one full cycle at `now`: evaluate, then dispatch the result.
pub async fn run_cycle(
    config: &Config,
    telemetry: &dyn TelemetrySource,
    mailer: &dyn Mailer,
    now: DateTime<Utc>,
    dry_run: bool,
) -> Result<CycleOutcome, CycleError> {
    let (_, alert) = evaluate_cycle(config, telemetry, now).await?;

    let report = dispatch(
        alert.as_ref(),
        dry_run,
        &config.sender,
        &config.notify,
        mailer,
    )
    .await;

    Ok(match alert {
        Some(alert) => CycleOutcome::Alerted { alert, report },
        None => CycleOutcome::AllWell,
    })
}

/// Run one cycle now, logging an aborted cycle instead of returning it.
pub async fn run(
    config: &Config,
    telemetry: &dyn TelemetrySource,
    mailer: &dyn Mailer,
    dry_run: bool,
) -> Option<CycleOutcome> {
    let now = Utc::now();
    match run_cycle(config, telemetry, mailer, now, dry_run).await {
        Ok(outcome) => Some(outcome),
        Err(e) if e.is_measurement_problem() => {
            error!("{}", e);
            None
        }
        Err(e) => {
            error!("Cycle aborted: {}", e);
            None
        }
    }
}
