use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use toml::Spanned;

use super::diagnostics::LoadError;
use super::diagnostics::SourceInfo;
use super::LogLevel;
use super::MailSecurity;

/// Config file as written, before defaults and validation.
///
/// Fields carry their byte spans so validation errors can point at the line
/// that caused them.
#[derive(Debug, Default, Deserialize)]
pub struct PartialConfig {
    pub sender: Option<Spanned<String>>,
    pub notify: Option<Vec<String>>,
    pub portals: Option<Vec<Spanned<String>>>,

    pub check: Option<PartialCheckConfig>,
    pub thermostats: Option<PartialThermostatsConfig>,
    pub telemetry: Option<PartialTelemetryConfig>,
    pub mail: Option<Spanned<PartialMailConfig>>,
    pub logging: Option<PartialLoggingConfig>,

    /// Source information for error reporting (not serialized)
    #[serde(skip)]
    pub source: Option<SourceInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartialCheckConfig {
    pub max_age_secs: Option<Spanned<i64>>,
    pub threshold: Option<Spanned<f64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartialThermostatsConfig {
    pub family_room: Option<String>,
    pub living_room: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartialTelemetryConfig {
    pub url: Option<String>,
    pub thermostat_database: Option<String>,
    pub weather_database: Option<String>,
    pub portal_database: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartialMailConfig {
    pub host: Option<Spanned<String>>,
    pub port: Option<u16>,
    pub username: Option<Spanned<String>>,
    pub password: Option<Spanned<String>>,
    pub security: Option<MailSecurity>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartialLoggingConfig {
    pub level: Option<LogLevel>,
    pub file: Option<PathBuf>,
    pub overrides: Option<HashMap<String, LogLevel>>,
}

impl PartialConfig {
    /// Load a single config file
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(path, content)
    }

    /// Parse config text, attributing it to `path` for diagnostics
    pub fn parse(path: &Path, content: String) -> Result<Self, LoadError> {
        let mut config: PartialConfig = toml::from_str(&content).map_err(|e| LoadError::Parse {
            path: path.to_path_buf(),
            message: e.message().to_string(),
            span: e.span(),
            content: content.clone(),
        })?;

        config.source = Some(SourceInfo {
            file_path: path.to_path_buf(),
            content,
        });

        Ok(config)
    }
}
