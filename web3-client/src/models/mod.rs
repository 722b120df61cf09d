//! Data models used throughout the crate
//!
//! This module contains the JSON-RPC wire structures and the transaction,
//! block and receipt shapes exchanged with chain clients.

// JSON-RPC protocol data structures
pub mod jsonrpc;

// Transaction, block and write-result shapes
pub mod transaction;
