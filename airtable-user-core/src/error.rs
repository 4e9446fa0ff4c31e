//! Error types for Airtable user lookups

use thiserror::Error;

/// Failure causes for a single record lookup.
///
/// The fail-soft path collapses every variant to the caller's default value;
/// the strict path hands them back unchanged.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("Transport failure: {reason}")]
    Transport { reason: String },

    #[error("Failed to decode response: {reason}")]
    Decode { reason: String },

    #[error("No record matched the identity")]
    NotFound,

    #[error("Record has no value for field {field_id:?}")]
    MissingField { field_id: String },

    #[error("Airtable rejected the request with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid endpoint: {reason}")]
    InvalidEndpoint { reason: String },
}

/// Errors raised by a [`crate::ConfigProvider`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Configuration unavailable: {reason}")]
    Unavailable { reason: String },
}

pub type LookupResult<T> = Result<T, LookupError>;
