pub mod config;
pub mod engine;
pub mod logging;
pub mod notify;
pub mod scan;
pub mod telemetry;

pub use config::format_diagnostics;
pub use config::Config;
pub use config::Diagnostic;
pub use config::Diagnostics;
pub use config::LogLevel;
pub use engine::Alert;
pub use engine::ClimateSnapshot;
pub use engine::CycleError;
pub use engine::ThermostatMode;
pub use notify::Mailer;
pub use scan::CycleOutcome;
pub use telemetry::TelemetrySource;
