use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use alloy::rpc::json_rpc::RpcError;
use alloy::transports::TransportError;
use serde::Serialize;
use thiserror::Error;

/// Errors raised by chain client operations
///
/// Every operation of [`crate::client::ChainClient`] reports failures with this type.
/// Only the root-hash helper intercepts errors; everything else reaches the caller as-is.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The transport failed to deliver the request or read the response
    #[error("RPC transport error: {0}")]
    Transport(String),

    /// The node answered with a JSON-RPC error object
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The node answered without a usable `result`
    #[error("No result found for {method}")]
    EmptyResult { method: String },

    /// Neither root hash method produced a result
    #[error("No result found for bor_getRootHash and eth_getRootHash")]
    RootHashUnavailable,

    /// Unknown transaction, receipt or block
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid hex value: {0}")]
    InvalidHex(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid ABI: {0}")]
    InvalidAbi(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The signer is neither the local key nor accepted by the node
    #[error("Unknown signer: {0}")]
    UnknownSigner(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    /// Receipt polling gave up before the transaction was mined
    #[error("Receipt for {hash} not available after {attempts} attempts")]
    ReceiptTimeout { hash: String, attempts: u32 },
}

impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> Self {
        match err {
            RpcError::ErrorResp(payload) => ClientError::Rpc {
                code: payload.code,
                message: payload.message.to_string(),
            },
            other => ClientError::Transport(other.to_string()),
        }
    }
}

/// Convenience alias for chain client results
pub type ClientResult<T> = Result<T, ClientError>;

/// Gateway error types
///
/// This enum defines all possible errors returned by the HTTP gateway.
/// Each variant carries the details reported back to the caller.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Error talking to the Ethereum RPC node
    #[error("RPC connection error: {0}")]
    RPCConnectionError(String),

    /// The request was malformed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The requested chain object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The client failed for any other reason
    #[error("Client operation failed: {0}")]
    ClientFailure(String),
}

impl From<ClientError> for ServiceError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Transport(_) | ClientError::Rpc { .. } => {
                ServiceError::RPCConnectionError(err.to_string())
            }
            ClientError::EmptyResult { .. }
            | ClientError::RootHashUnavailable
            | ClientError::NotFound(_) => ServiceError::NotFound(err.to_string()),
            ClientError::InvalidHex(_)
            | ClientError::InvalidAddress(_)
            | ClientError::InvalidAbi(_)
            | ClientError::InvalidInput(_)
            | ClientError::UnknownSigner(_) => ServiceError::InvalidRequest(err.to_string()),
            ClientError::Signing(_) | ClientError::ReceiptTimeout { .. } => {
                ServiceError::ClientFailure(err.to_string())
            }
        }
    }
}

/// Structured error response for the API
///
/// This structure defines the JSON format of error responses returned by the gateway.
#[derive(Serialize)]
struct ErrorResponse {
    /// Human-readable error message
    error: String,

    /// Machine-readable error code
    error_code: String,

    /// Optional detailed error information
    details: Option<String>,
}

impl ResponseError for ServiceError {
    /// Convert the error to an HTTP response with a JSON error body
    fn error_response(&self) -> HttpResponse {
        let (error_code, details) = match self {
            ServiceError::RPCConnectionError(details) => ("RPC_CONNECTION_ERROR", details),
            ServiceError::InvalidRequest(details) => ("INVALID_REQUEST", details),
            ServiceError::NotFound(details) => ("NOT_FOUND", details),
            ServiceError::ClientFailure(details) => ("CLIENT_FAILURE", details),
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
            details: Some(details.clone()),
        })
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            ServiceError::RPCConnectionError(_) => StatusCode::BAD_GATEWAY,
            ServiceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::ClientFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
