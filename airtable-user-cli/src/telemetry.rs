//! Tracing subscriber setup.
//!
//! Logs go to stderr so that stdout only carries resolved values.

use crate::error::CliError;
use tracing_subscriber::EnvFilter;

/// Filter directives are read from this variable, falling back to `warn`.
pub const LOG_ENV: &str = "AIRTABLE_USER_INFO_LOG";

pub fn init_tracing(json: bool) -> Result<(), CliError> {
    let env_filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| CliError::Telemetry(e.to_string()))
}
