//! Tracing setup for one invocation.
//!
//! Output goes either to stderr or, appended, to a log file. The subscriber is
//! installed with [`tracing::subscriber::set_default`] so it lives exactly as
//! long as the returned guard.

use std::fs::DirBuilder;
use std::fs::File;
use std::fs::OpenOptions;
use std::os::unix::fs::DirBuilderExt;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Layer;

use crate::config::LoggingConfig;

/// Where log lines are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Append to this file, creating it and its directory if needed
    File(PathBuf),
    Stderr,
}

/// Build the level filter: the configured level (at least debug when
/// `verbose`), plus per-target overrides.
pub fn filter(config: &LoggingConfig, verbose: bool) -> Targets {
    let mut level: LevelFilter = config.level.into();
    if verbose {
        level = level.max(LevelFilter::DEBUG);
    }

    config
        .overrides
        .iter()
        .fold(Targets::new().with_default(level), |targets, (target, level)| {
            targets.with_target(target.clone(), LevelFilter::from(*level))
        })
}

/// Open `path` for appending. Missing parent directories are created with
/// mode 0755 and a new file with mode 0644.
pub fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        DirBuilder::new().recursive(true).mode(0o755).create(parent)?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .mode(0o644)
        .open(path)
}

/// Install the subscriber for the current thread until the guard is dropped
pub fn init(
    config: &LoggingConfig,
    verbose: bool,
    destination: &Destination,
) -> anyhow::Result<DefaultGuard> {
    let layer = match destination {
        Destination::File(path) => {
            let file = open_log_file(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .boxed()
        }
        Destination::Stderr => fmt::layer().with_writer(std::io::stderr).boxed(),
    };

    let subscriber = tracing_subscriber::registry()
        .with(layer)
        .with(filter(config, verbose));

    Ok(tracing::subscriber::set_default(subscriber))
}
