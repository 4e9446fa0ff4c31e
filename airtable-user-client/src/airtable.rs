//! Airtable HTTP store

use crate::store::RecordStore;
use airtable_user_core::{LookupError, LookupResult, RemoteRecord, ResolverConfig};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://api.airtable.com";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// HTTP settings for the Airtable endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    pub api_base_url: String,
    /// Upper bound for the whole request, connect included.
    pub request_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

/// `GET /v0/{base}/{table}` list body. Only `records` is read.
#[derive(Debug, Deserialize)]
struct ListRecordsResponse {
    records: Option<Vec<RemoteRecord>>,
}

/// [`RecordStore`] backed by the Airtable REST API.
#[derive(Clone)]
pub struct AirtableStore {
    client: Client,
    base_url: String,
}

impl AirtableStore {
    pub fn new(config: &ClientConfig) -> LookupResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| LookupError::Transport {
                reason: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
        })
    }

    pub fn query_url(&self, config: &ResolverConfig, email: &str) -> LookupResult<Url> {
        build_query_url(&self.base_url, config, email)
    }
}

#[async_trait]
impl RecordStore for AirtableStore {
    async fn find_by_email(
        &self,
        config: &ResolverConfig,
        email: &str,
    ) -> LookupResult<Option<RemoteRecord>> {
        let url = self.query_url(config, email)?;

        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", config.bearer_token))
            .send()
            .await
            .map_err(|e| LookupError::Transport {
                reason: format!("HTTP request failed: {}", e.without_url()),
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| LookupError::Transport {
            reason: format!("Failed to read response body: {}", e.without_url()),
        })?;

        interpret_response(status, &body)
    }
}

impl std::fmt::Debug for AirtableStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AirtableStore")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Build the list-records URL filtered on the configured email field.
///
/// The formula is `{email_field_id}="{email}"`, limited to one record and
/// returning fields keyed by identifier.
pub fn build_query_url(
    base_url: &str,
    config: &ResolverConfig,
    email: &str,
) -> LookupResult<Url> {
    let mut url = Url::parse(base_url).map_err(|e| LookupError::InvalidEndpoint {
        reason: format!("{}: {}", base_url, e),
    })?;

    url.path_segments_mut()
        .map_err(|_| LookupError::InvalidEndpoint {
            reason: format!("{}: cannot be a base URL", base_url),
        })?
        .pop_if_empty()
        .push("v0")
        .push(&config.base_id)
        .push(&config.table_id);

    url.query_pairs_mut()
        .append_pair(
            "filterByFormula",
            &filter_formula(&config.email_field_id, email),
        )
        .append_pair("maxRecords", "1")
        .append_pair("returnFieldsByFieldId", "true");

    Ok(url)
}

/// Exact, case-sensitive equality on the email field.
pub fn filter_formula(email_field_id: &str, email: &str) -> String {
    format!("{}=\"{}\"", email_field_id, escape_formula_string(email))
}

fn escape_formula_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch == '"' || ch == '\\' {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Decode a list-records body into its first record.
///
/// An empty `records` list is `Ok(None)`; a body without `records` or one
/// that is not JSON is a decode error.
pub fn decode_first_record(body: &[u8]) -> LookupResult<Option<RemoteRecord>> {
    let parsed: ListRecordsResponse =
        serde_json::from_slice(body).map_err(|e| LookupError::Decode {
            reason: e.to_string(),
        })?;

    let records = parsed.records.ok_or_else(|| LookupError::Decode {
        reason: "response has no records list".to_string(),
    })?;

    Ok(records.into_iter().next())
}

/// Decode the body regardless of status. A non-success status is only
/// reported when the body yields no record.
fn interpret_response(status: StatusCode, body: &[u8]) -> LookupResult<Option<RemoteRecord>> {
    let decoded = decode_first_record(body);
    if status.is_success() {
        return decoded;
    }

    match decoded {
        Ok(Some(record)) => Ok(Some(record)),
        _ => Err(LookupError::Rejected {
            status: status.as_u16(),
            message: error_message(body),
        }),
    }
}

/// Extract the message from an Airtable error body.
///
/// Handles both `{"error":"NOT_FOUND"}` and
/// `{"error":{"type":..,"message":..}}`.
fn error_message(body: &[u8]) -> String {
    let value: serde_json::Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(_) => return String::from_utf8_lossy(body).chars().take(200).collect(),
    };

    match value.get("error") {
        Some(serde_json::Value::String(code)) => code.clone(),
        Some(serde_json::Value::Object(detail)) => {
            let kind = detail.get("type").and_then(|v| v.as_str());
            let message = detail.get("message").and_then(|v| v.as_str());
            match (kind, message) {
                (Some(kind), Some(message)) => format!("{}: {}", kind, message),
                (Some(kind), None) => kind.to_string(),
                (None, Some(message)) => message.to_string(),
                (None, None) => "Unknown error".to_string(),
            }
        }
        _ => "Unknown error".to_string(),
    }
}
