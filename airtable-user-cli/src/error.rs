//! Error types for the CLI.

use crate::settings::ConfigError;
use airtable_user_core::LookupError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Lookup failed: {0}")]
    Lookup(#[from] LookupError),
    #[error("Failed to initialize logging: {0}")]
    Telemetry(String),
}
