use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy_primitives::hex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ClientError, ClientResult};

/// JSON-RPC protocol version sent with every request
pub const JSONRPC_VERSION: &str = "2.0";

static LAST_REQUEST_ID: AtomicU64 = AtomicU64::new(0);

/// Allocate the id for a new JSON-RPC request.
///
/// Ids track wall-clock milliseconds but never repeat within the process:
/// each id is `max(now_ms, previous + 1)`.
pub fn next_request_id() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default();

    let mut prev = LAST_REQUEST_ID.load(Ordering::Relaxed);
    loop {
        let next = now.max(prev + 1);
        match LAST_REQUEST_ID.compare_exchange_weak(prev, next, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => prev = actual,
        }
    }
}

/// JSON-RPC 2.0 request structure
///
/// This structure represents a standard JSON-RPC request with generic parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest<T = Vec<Value>> {
    /// JSON-RPC protocol version (should be "2.0")
    pub jsonrpc: String,

    /// Method name to call
    pub method: String,

    /// Method parameters, empty when omitted
    #[serde(default, bound(deserialize = "T: serde::Deserialize<'de> + Default"))]
    pub params: T,

    /// Request identifier
    pub id: Value,
}

impl<T> JsonRpcRequest<T> {
    /// Create a request for `method` with a freshly allocated id
    pub fn new(method: impl Into<String>, params: T) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id: Value::from(next_request_id()),
        }
    }
}

/// JSON-RPC 2.0 response as seen by a client
///
/// Either field may be missing; callers decide what an absent `result` means.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcErrorDetail>,
}

impl JsonRpcResponse {
    /// Successful response carrying `result`
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: Some(JSONRPC_VERSION.to_string()),
            id: Some(id),
            result: Some(result),
            error: None,
        }
    }

    /// Error response carrying `error`
    pub fn failure(id: Value, error: JsonRpcErrorDetail) -> Self {
        Self {
            jsonrpc: Some(JSONRPC_VERSION.to_string()),
            id: Some(id),
            result: None,
            error: Some(error),
        }
    }

    /// The `result` field if it holds a JavaScript-truthy value
    ///
    /// `null`, `false`, `0` and `""` count as no result.
    pub fn truthy_result(&self) -> Option<&Value> {
        self.result.as_ref().filter(|value| is_truthy(value))
    }
}

/// JSON-RPC 2.0 error response
///
/// This structure represents a standard JSON-RPC error response.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    /// JSON-RPC protocol version (always "2.0")
    pub jsonrpc: String,

    /// Request identifier (matching the request)
    pub id: Value,

    /// Error details
    pub error: JsonRpcErrorDetail,
}

/// JSON-RPC 2.0 error detail
///
/// This structure contains the detailed error information in a JSON-RPC error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorDetail {
    /// Error code
    pub code: i64,

    /// Error message
    pub message: String,

    /// Additional error data (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// Create a new JSON-RPC invalid request error
    pub fn invalid_request(id: Value, message: String) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            error: JsonRpcErrorDetail {
                code: -32600,
                message,
                data: None,
            },
        }
    }

    /// Create a new JSON-RPC parse error
    pub fn parse_error(message: String) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Value::Null,
            error: JsonRpcErrorDetail {
                code: -32700,
                message,
                data: None,
            },
        }
    }

    /// Create a new JSON-RPC internal error
    pub fn internal_error(id: Value, message: String) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            error: JsonRpcErrorDetail {
                code: -32603,
                message,
                data: None,
            },
        }
    }
}

/// JavaScript truthiness of a JSON value
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Render a JSON value the way a string coercion would: strings verbatim,
/// everything else as JSON text.
pub fn stringify_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// Hex parsing helpers built on alloy primitives.

/// Parse a hexadecimal address string into an `Address`.
///
/// Expects a string starting with "0x" and 40 hex digits (20 bytes).
pub fn parse_hex_address(hex: &str) -> ClientResult<Address> {
    if !hex.starts_with("0x") {
        return Err(ClientError::InvalidAddress(format!("{hex}: address must start with 0x")));
    }
    Address::from_str(hex).map_err(|e| ClientError::InvalidAddress(format!("{hex}: {e}")))
}

/// Parse a 32-byte hash such as a transaction or block hash.
pub fn parse_hex_b256(hex: &str) -> ClientResult<B256> {
    if !hex.starts_with("0x") {
        return Err(ClientError::InvalidHex(format!("{hex}: hash must start with 0x")));
    }
    B256::from_str(hex).map_err(|e| ClientError::InvalidHex(format!("{hex}: {e}")))
}

/// Parse a hexadecimal string into a `U256` value.
///
/// Expects a string starting with "0x".
pub fn parse_hex_u256(hex: &str) -> ClientResult<U256> {
    let digits = hex
        .strip_prefix("0x")
        .ok_or_else(|| ClientError::InvalidHex(format!("{hex}: value must start with 0x")))?;
    U256::from_str_radix(digits, 16).map_err(|e| ClientError::InvalidHex(format!("{hex}: {e}")))
}

/// Parse a hexadecimal string into a `u64` value.
///
/// Expects a string starting with "0x".
pub fn parse_hex_u64(hex: &str) -> ClientResult<u64> {
    let digits = hex
        .strip_prefix("0x")
        .ok_or_else(|| ClientError::InvalidHex(format!("{hex}: value must start with 0x")))?;
    u64::from_str_radix(digits, 16).map_err(|e| ClientError::InvalidHex(format!("{hex}: {e}")))
}

/// Parse a hexadecimal string into a `u128` value.
pub fn parse_hex_u128(hex: &str) -> ClientResult<u128> {
    let digits = hex
        .strip_prefix("0x")
        .ok_or_else(|| ClientError::InvalidHex(format!("{hex}: value must start with 0x")))?;
    u128::from_str_radix(digits, 16).map_err(|e| ClientError::InvalidHex(format!("{hex}: {e}")))
}

/// Parse a hexadecimal string into a `Bytes` value.
///
/// Expects a string starting with "0x". If the hex string contains no data (i.e. "0x"),
/// an empty `Bytes` value is returned.
pub fn parse_hex_bytes(hex: &str) -> ClientResult<Bytes> {
    let digits = hex
        .strip_prefix("0x")
        .ok_or_else(|| ClientError::InvalidHex(format!("{hex}: data must start with 0x")))?;
    if digits.is_empty() {
        return Ok(Bytes::new());
    }
    let data = hex::decode(digits).map_err(|e| ClientError::InvalidHex(format!("{hex}: {e}")))?;
    Ok(Bytes::from(data))
}

/// Format a `U256` value into a hexadecimal string prefixed with "0x".
pub fn format_hex_u256(value: U256) -> String {
    format!("0x{:x}", value)
}
