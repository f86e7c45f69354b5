//! Configuration file parsing and structures.
//!
//! climatiseur reads a single TOML file holding the portal allow-list,
//! notification addresses, mail delivery parameters and data source
//! settings. Problems are reported as ariadne diagnostics pointing at the
//! offending line.

#[allow(clippy::module_inception)]
mod config;
mod diagnostics;
mod partial;

pub use config::*;
pub use diagnostics::format_diagnostics;
pub use diagnostics::Diagnostic;
pub use diagnostics::Diagnostics;
pub use diagnostics::Error;
pub use diagnostics::LoadError;
pub use diagnostics::SourceInfo;
pub use diagnostics::ValidationError;
