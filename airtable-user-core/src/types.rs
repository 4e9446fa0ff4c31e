//! Data model shared by the resolver, the stores and the CLI.

use crate::LookupError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A single field lookup, built per shortcode invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupRequest {
    pub field_id: String,
    pub default_value: String,
}

impl LookupRequest {
    pub fn new(field_id: impl Into<String>, default_value: impl Into<String>) -> Self {
        Self {
            field_id: field_id.into(),
            default_value: default_value.into(),
        }
    }
}

/// Airtable options persisted by the settings form.
///
/// None of the values are validated; an empty option simply produces a
/// request that matches nothing.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub base_id: String,
    pub table_id: String,
    pub email_field_id: String,
    pub bearer_token: String,
}

impl ResolverConfig {
    /// Bearer token with every character replaced by `*`, or `(not set)`.
    pub fn masked_token(&self) -> String {
        if self.bearer_token.is_empty() {
            "(not set)".to_string()
        } else {
            "*".repeat(self.bearer_token.chars().count())
        }
    }
}

impl fmt::Debug for ResolverConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverConfig")
            .field("base_id", &self.base_id)
            .field("table_id", &self.table_id)
            .field("email_field_id", &self.email_field_id)
            .field("bearer_token", &"[REDACTED]")
            .finish()
    }
}

/// One record of an Airtable list response, keyed by field identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl RemoteRecord {
    pub fn field(&self, field_id: &str) -> Option<&Value> {
        self.fields.get(field_id)
    }
}

/// Why a lookup fell back to the default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FallbackReason {
    Transport,
    Decode,
    NotFound,
    MissingField,
    Rejected { status: u16 },
    InvalidEndpoint,
    ConfigUnavailable,
}

impl From<&LookupError> for FallbackReason {
    fn from(err: &LookupError) -> Self {
        match err {
            LookupError::Transport { .. } => Self::Transport,
            LookupError::Decode { .. } => Self::Decode,
            LookupError::NotFound => Self::NotFound,
            LookupError::MissingField { .. } => Self::MissingField,
            LookupError::Rejected { status, .. } => Self::Rejected { status: *status },
            LookupError::InvalidEndpoint { .. } => Self::InvalidEndpoint,
        }
    }
}

/// Outcome of a fail-soft lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The record carried the field; its JSON type is preserved.
    Found(Value),
    Fallback { value: String, reason: FallbackReason },
}

impl Resolution {
    pub fn fallback(value: impl Into<String>, reason: FallbackReason) -> Self {
        Self::Fallback {
            value: value.into(),
            reason,
        }
    }

    pub fn fallback_reason(&self) -> Option<FallbackReason> {
        match self {
            Self::Found(_) => None,
            Self::Fallback { reason, .. } => Some(*reason),
        }
    }

    /// The returned value; a fallback is always a JSON string.
    pub fn into_value(self) -> Value {
        match self {
            Self::Found(value) => value,
            Self::Fallback { value, .. } => Value::String(value),
        }
    }

    /// Text substituted into a rendered template.
    pub fn render(&self) -> String {
        match self {
            Self::Found(value) => render_value(value),
            Self::Fallback { value, .. } => value.clone(),
        }
    }
}

/// Strings render raw, `null` renders empty, everything else as compact JSON.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
