use std::collections::BTreeSet;
use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use chrono::TimeDelta;
use serde::Deserialize;
use toml::Spanned;
use tracing_subscriber::filter::LevelFilter;

use super::diagnostics::Diagnostic;
use super::diagnostics::Diagnostics;
use super::diagnostics::Error;
use super::diagnostics::SourceInfo;
use super::diagnostics::ValidationError;
use super::partial::PartialConfig;
use crate::engine::DEFAULT_THRESHOLD;

/// Default staleness threshold in seconds
pub const DEFAULT_MAX_AGE_SECS: i64 = 5000;

#[derive(Debug, Clone)]
pub struct Config {
    /// Address alerts are sent from
    pub sender: String,

    /// Addresses alerts are sent to
    pub notify: Vec<String>,

    /// Portal names to track; sensors with any other description are ignored
    pub portals: BTreeSet<String>,

    pub check: CheckConfig,
    pub thermostats: ThermostatsConfig,
    pub telemetry: TelemetryConfig,
    pub mail: MailConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: LogLevel,

    /// Log file used when logging to a file is enabled
    pub file: Option<PathBuf>,

    /// Per-target level overrides, e.g. `"climatiseur::telemetry" = "debug"`
    pub overrides: HashMap<String, LogLevel>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckConfig {
    /// Readings older than this many seconds are stale
    pub max_age_secs: i64,

    /// Outdoor/indoor difference that must be exceeded before alerting
    pub threshold: f64,
}

impl CheckConfig {
    /// Saturates at [`TimeDelta::MAX`]; validated configs never reach it.
    pub fn max_age(&self) -> TimeDelta {
        TimeDelta::try_seconds(self.max_age_secs).unwrap_or(TimeDelta::MAX)
    }
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            max_age_secs: DEFAULT_MAX_AGE_SECS,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Long names of the two thermostats whose modes are reconciled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThermostatsConfig {
    pub family_room: String,
    pub living_room: String,
}

impl Default for ThermostatsConfig {
    fn default() -> Self {
        Self {
            family_room: "Family Room Thermostat".to_string(),
            living_room: "Living Room Thermostat".to_string(),
        }
    }
}

/// InfluxDB connection and database names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub url: String,
    pub thermostat_database: String,
    pub weather_database: String,
    pub portal_database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            url: "http://cube.local:8086".to_string(),
            thermostat_database: "nest".to_string(),
            weather_database: "wxdata".to_string(),
            portal_database: "frontpoint".to_string(),
            username: None,
            password: None,
            timeout_secs: 10,
        }
    }
}

/// How the SMTP connection is secured
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailSecurity {
    #[default]
    StartTls,
    /// Implicit TLS (SMTPS)
    Tls,
    /// Plain text; only for local relays
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub security: MailSecurity,
}

impl Config {
    /// Default config location, `~/.credentials/climatiseur.toml`
    pub fn default_path() -> PathBuf {
        home_dir().join(".credentials").join("climatiseur.toml")
    }

    /// Load and validate a config file
    ///
    /// Returns Ok((Config, diagnostics)) where diagnostics contains warnings.
    /// Returns Err with every problem found if there are any errors.
    pub fn from_file(path: impl AsRef<Path>) -> Result<(Self, Diagnostics), Diagnostics> {
        let partial = PartialConfig::from_file(path.as_ref())
            .map_err(|e| Diagnostics(vec![Diagnostic::Error(Error::Load(e))]))?;
        Self::from_partial(partial)
    }

    /// Parse and validate config text, attributing it to `path`
    pub fn from_str_at(
        path: impl AsRef<Path>,
        content: &str,
    ) -> Result<(Self, Diagnostics), Diagnostics> {
        let partial = PartialConfig::parse(path.as_ref(), content.to_string())
            .map_err(|e| Diagnostics(vec![Diagnostic::Error(Error::Load(e))]))?;
        Self::from_partial(partial)
    }

    /// Convert a PartialConfig to a Config, applying defaults and validating
    /// every field. All problems are collected before returning.
    pub fn from_partial(partial: PartialConfig) -> Result<(Self, Diagnostics), Diagnostics> {
        let mut v = Validator {
            source: partial.source.clone(),
            diagnostics: Vec::new(),
        };

        let sender = match partial.sender {
            Some(s) if s.get_ref().trim().is_empty() => {
                v.error("sender", "sender must not be empty", Some(s.span()));
                String::new()
            }
            Some(s) => s.into_inner(),
            None => {
                v.error("sender", "sender is required", None);
                String::new()
            }
        };

        let notify = match partial.notify {
            Some(n) => n,
            None => {
                v.error("notify", "notify is required (use [] to only log alerts)", None);
                Vec::new()
            }
        };

        let portals = match partial.portals {
            Some(list) => {
                let mut portals = BTreeSet::new();
                for name in list {
                    let span = name.span();
                    let name = name.into_inner();
                    if !portals.insert(name.clone()) {
                        v.warning(
                            "portals",
                            &format!("'{}' is listed more than once", name),
                            Some(span),
                        );
                    }
                }
                portals
            }
            None => {
                v.error("portals", "portals is required", None);
                BTreeSet::new()
            }
        };

        let check = v.check(partial.check.unwrap_or_default());

        let thermostats = {
            let partial = partial.thermostats.unwrap_or_default();
            let default = ThermostatsConfig::default();
            ThermostatsConfig {
                family_room: partial.family_room.unwrap_or(default.family_room),
                living_room: partial.living_room.unwrap_or(default.living_room),
            }
        };

        let telemetry = {
            let partial = partial.telemetry.unwrap_or_default();
            let default = TelemetryConfig::default();
            TelemetryConfig {
                url: partial.url.unwrap_or(default.url),
                thermostat_database: partial
                    .thermostat_database
                    .unwrap_or(default.thermostat_database),
                weather_database: partial.weather_database.unwrap_or(default.weather_database),
                portal_database: partial.portal_database.unwrap_or(default.portal_database),
                username: partial.username,
                password: partial.password,
                timeout_secs: partial.timeout_secs.unwrap_or(default.timeout_secs),
            }
        };

        let mail = v.mail(partial.mail);

        let logging = partial
            .logging
            .map(|l| LoggingConfig {
                level: l.level.unwrap_or_default(),
                file: l.file,
                overrides: l.overrides.unwrap_or_default(),
            })
            .unwrap_or_default();

        let config = Config {
            sender,
            notify,
            portals,
            check,
            thermostats,
            telemetry,
            mail,
            logging,
        };

        let diagnostics = Diagnostics(v.diagnostics);
        if diagnostics.has_errors() {
            Err(diagnostics)
        } else {
            Ok((config, diagnostics))
        }
    }

    /// Log file path: `logging.file` if set, else `~/.log/climatiseur.log`
    pub fn log_file(&self) -> PathBuf {
        self.logging
            .file
            .clone()
            .unwrap_or_else(|| home_dir().join(".log").join("climatiseur.log"))
    }
}

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Collects diagnostics while converting a partial config
struct Validator {
    source: Option<SourceInfo>,
    diagnostics: Vec<Diagnostic>,
}

impl Validator {
    fn field(&self, field_path: &str, message: &str, span: Option<std::ops::Range<usize>>) -> ValidationError {
        ValidationError {
            field_path: field_path.to_string(),
            message: message.to_string(),
            span,
            source: self.source.clone(),
        }
    }

    fn error(&mut self, field_path: &str, message: &str, span: Option<std::ops::Range<usize>>) {
        let e = self.field(field_path, message, span);
        self.diagnostics.push(Diagnostic::Error(Error::Validation(e)));
    }

    fn warning(&mut self, field_path: &str, message: &str, span: Option<std::ops::Range<usize>>) {
        let w = self.field(field_path, message, span);
        self.diagnostics.push(Diagnostic::Warning(w));
    }

    fn check(&mut self, partial: super::partial::PartialCheckConfig) -> CheckConfig {
        let default = CheckConfig::default();

        let max_age_secs = match partial.max_age_secs {
            Some(m) if *m.get_ref() <= 0 => {
                self.error(
                    "check.max_age_secs",
                    "max_age_secs must be a positive number of seconds",
                    Some(m.span()),
                );
                default.max_age_secs
            }
            Some(m) if TimeDelta::try_seconds(*m.get_ref()).is_none() => {
                self.error(
                    "check.max_age_secs",
                    "max_age_secs is too large",
                    Some(m.span()),
                );
                default.max_age_secs
            }
            Some(m) => m.into_inner(),
            None => default.max_age_secs,
        };

        let threshold = match partial.threshold {
            Some(t) if !t.get_ref().is_finite() || *t.get_ref() < 0.0 => {
                self.error(
                    "check.threshold",
                    "threshold must be a non-negative number",
                    Some(t.span()),
                );
                default.threshold
            }
            Some(t) => t.into_inner(),
            None => default.threshold,
        };

        CheckConfig {
            max_age_secs,
            threshold,
        }
    }

    fn mail(&mut self, partial: Option<Spanned<super::partial::PartialMailConfig>>) -> MailConfig {
        let (span, partial) = match partial {
            Some(p) => (Some(p.span()), p.into_inner()),
            None => {
                self.error("mail", "mail settings are required", None);
                (None, Default::default())
            }
        };

        let host = match partial.host {
            Some(h) if h.get_ref().trim().is_empty() => {
                self.error("mail.host", "mail.host must not be empty", Some(h.span()));
                String::new()
            }
            Some(h) => h.into_inner(),
            None => {
                if span.is_some() {
                    self.error("mail.host", "mail.host is required", span.clone());
                }
                String::new()
            }
        };

        let security = partial.security.unwrap_or_default();
        let port = partial.port.unwrap_or(match security {
            MailSecurity::Tls => 465,
            MailSecurity::StartTls => 587,
            MailSecurity::None => 25,
        });

        let (username, password) = match (partial.username, partial.password) {
            (Some(u), Some(p)) => (Some(u.into_inner()), Some(p.into_inner())),
            (None, None) => (None, None),
            (Some(u), None) => {
                self.error(
                    "mail.password",
                    "mail.username is set but mail.password is missing",
                    Some(u.span()),
                );
                (None, None)
            }
            (None, Some(p)) => {
                self.error(
                    "mail.username",
                    "mail.password is set but mail.username is missing",
                    Some(p.span()),
                );
                (None, None)
            }
        };

        MailConfig {
            host,
            port,
            username,
            password,
            security,
        }
    }
}
