//! JSON-RPC 2.0 over HTTP.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::RpcError;

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shortest interval between two polls of the endpoint.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// HTTP client for an Ethereum-style JSON-RPC endpoint.
///
/// Cheap to clone: clones share the connection pool and the request id counter.
#[derive(Clone)]
pub struct RpcTransport {
    http: reqwest::Client,
    url: String,
    next_id: Arc<AtomicU64>,
}

/// Envelope of a JSON-RPC response. `result` may legitimately be `null`.
#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: serde_json::Value,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

impl RpcTransport {
    /// Create a transport targeting the given endpoint URL (e.g. `http://127.0.0.1:8545`).
    ///
    /// `timeout` bounds each individual HTTP request.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| RpcError::Http(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            url: url.into(),
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    /// Send one request and deserialize its `result`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!(id, method, "json-rpc request");

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RpcError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RpcError::Http(format!(
                "endpoint returned HTTP {}",
                response.status()
            )));
        }

        let envelope: RpcResponse = response
            .json()
            .await
            .map_err(|e| RpcError::InvalidResponse(e.to_string()))?;

        if let Some(err) = envelope.error {
            debug!(id, method, code = err.code, "json-rpc error");
            return Err(RpcError::Remote {
                code: err.code,
                message: err.message,
            });
        }

        serde_json::from_value(envelope.result)
            .map_err(|e| RpcError::InvalidResponse(format!("{method}: {e}")))
    }
}

/// Encode bytes as a `0x`-prefixed hex string.
pub(crate) fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode a `0x`-prefixed (or bare) hex string.
pub(crate) fn from_hex(s: &str) -> Result<Vec<u8>, String> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(digits).map_err(|e| format!("invalid hex '{s}': {e}"))
}

/// Parse a hex quantity such as `0x1b4`.
pub(crate) fn parse_quantity(s: &str) -> Result<u64, String> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    if digits.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(digits, 16).map_err(|e| format!("invalid quantity '{s}': {e}"))
}
