//! Airtable User Info Test Utilities
//!
//! Shared test infrastructure for the workspace:
//! - Mock record store with call recording
//! - A canned HTTP server standing in for the Airtable endpoint
//! - Fixtures for configs and response bodies
//! - Proptest generators for lookup inputs

pub use airtable_user_client::RecordStore;
pub use airtable_user_core::{
    FallbackReason, LookupError, LookupRequest, LookupResult, RemoteRecord, Resolution,
    ResolverConfig,
};

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

// ============================================================================
// MOCK STORE
// ============================================================================

/// In-memory [`RecordStore`] keyed by email.
#[derive(Debug, Default)]
pub struct MockRecordStore {
    records: HashMap<String, RemoteRecord>,
    failure: Option<LookupError>,
    calls: Mutex<Vec<String>>,
}

impl MockRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record for `email`; `fields` must be a JSON object.
    pub fn with_record(mut self, email: impl Into<String>, fields: Value) -> Self {
        self.records.insert(email.into(), sample_record(fields));
        self
    }

    /// Fail every lookup with `error`.
    pub fn failing(error: LookupError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }
}

#[async_trait]
impl RecordStore for MockRecordStore {
    async fn find_by_email(
        &self,
        _config: &ResolverConfig,
        email: &str,
    ) -> LookupResult<Option<RemoteRecord>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(email.to_string());
        }
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        Ok(self.records.get(email).cloned())
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub fn sample_config() -> ResolverConfig {
    ResolverConfig {
        base_id: "appTestBase0001".to_string(),
        table_id: "tblTestUsers001".to_string(),
        email_field_id: "fldEmail0000001".to_string(),
        bearer_token: "patTestToken.secret".to_string(),
    }
}

pub fn sample_record(fields: Value) -> RemoteRecord {
    RemoteRecord {
        id: Some("recTest00000001".to_string()),
        fields: fields.as_object().cloned().unwrap_or_default(),
    }
}

/// A list-records body containing one record per `fields` entry.
pub fn records_body(fields: &[Value]) -> String {
    let records: Vec<Value> = fields
        .iter()
        .enumerate()
        .map(|(i, f)| json!({ "id": format!("rec{:012}", i), "fields": f }))
        .collect();
    json!({ "records": records }).to_string()
}

pub fn error_body(kind: &str, message: &str) -> String {
    json!({ "error": { "type": kind, "message": message } }).to_string()
}

// ============================================================================
// CANNED HTTP SERVER
// ============================================================================

/// Head of one request received by [`CannedHttpServer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedRequest {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
}

impl CapturedRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn path(&self) -> &str {
        self.target.split('?').next().unwrap_or_default()
    }

    pub fn query(&self) -> Option<&str> {
        self.target.split_once('?').map(|(_, q)| q)
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Canned { status: u16, body: String },
    Silent,
}

/// Local HTTP/1.1 server that answers every request with the same reply.
pub struct CannedHttpServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    handle: JoinHandle<()>,
}

impl CannedHttpServer {
    /// Answer every request with `status` and a JSON `body`.
    pub async fn start(status: u16, body: impl Into<String>) -> std::io::Result<Self> {
        Self::spawn(Reply::Canned {
            status,
            body: body.into(),
        })
        .await
    }

    /// Accept connections and read requests but never answer.
    pub async fn start_silent() -> std::io::Result<Self> {
        Self::spawn(Reply::Silent).await
    }

    async fn spawn(reply: Reply) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let requests = Arc::new(Mutex::new(Vec::new()));

        let captured = Arc::clone(&requests);
        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let captured = Arc::clone(&captured);
                let reply = reply.clone();
                tokio::spawn(async move {
                    let _ = serve_connection(stream, reply, captured).await;
                });
            }
        });

        Ok(Self {
            addr,
            requests,
            handle,
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Drop for CannedHttpServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve_connection(
    mut stream: TcpStream,
    reply: Reply,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    if let Some(request) = parse_request_head(&String::from_utf8_lossy(&buf)) {
        if let Ok(mut requests) = captured.lock() {
            requests.push(request);
        }
    }

    match reply {
        Reply::Canned { status, body } => {
            let response = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                reason_phrase(status),
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await?;
            stream.shutdown().await
        }
        Reply::Silent => {
            // Hold the connection open until the client gives up.
            let _ = stream.read(&mut chunk).await;
            Ok(())
        }
    }
}

fn parse_request_head(head: &str) -> Option<CapturedRequest> {
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();
    let headers = lines
        .take_while(|line| !line.is_empty())
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();
    Some(CapturedRequest {
        method,
        target,
        headers,
    })
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    }
}

/// Base URL of a local port with nothing listening on it.
pub async fn closed_port_url() -> std::io::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{}", addr))
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    use proptest::prelude::*;
    use serde_json::{json, Value};

    pub fn arb_email() -> impl Strategy<Value = String> {
        ("[a-z][a-z0-9._+-]{0,15}", "[a-z]{1,10}", "(com|org|fr|io)")
            .prop_map(|(local, domain, tld)| format!("{}@{}.{}", local, domain, tld))
    }

    pub fn arb_field_id() -> impl Strategy<Value = String> {
        "fld[A-Za-z0-9]{14}"
    }

    pub fn arb_default_value() -> impl Strategy<Value = String> {
        "[A-Za-z0-9 _.-]{0,24}"
    }

    /// Non-null JSON values Airtable can return for a cell.
    pub fn arb_field_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            "[A-Za-z0-9 ]{1,20}".prop_map(Value::String),
            any::<i64>().prop_map(|n| json!(n)),
            any::<bool>().prop_map(Value::Bool),
            prop::collection::vec("[a-z]{1,8}", 0..4).prop_map(|v| json!(v)),
        ]
    }
}
