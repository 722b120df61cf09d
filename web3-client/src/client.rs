//! Core chain client interface.
//!
//! This module defines the contract every chain adapter implements, so callers
//! get the same behaviour regardless of the library an adapter wraps.

use alloy::dyn_abi::{DynSolValue, TypedData};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::{
    abi::{self, Contract},
    error::{ClientError, ClientResult},
    models::{
        jsonrpc::{parse_hex_u256, parse_hex_u64, stringify_value, JsonRpcRequest, JsonRpcResponse},
        transaction::{
            Block, BlockIdentifier, BlockWithTransaction, TransactionData, TransactionReceipt,
            TransactionRequestConfig, TransactionWriteResult,
        },
    },
};

/// Primary method for fetching a root hash over a block range
pub const BOR_GET_ROOT_HASH: &str = "bor_getRootHash";

/// Fallback method for fetching a root hash over a block range
pub const ETH_GET_ROOT_HASH: &str = "eth_getRootHash";

pub const ETH_ACCOUNTS: &str = "eth_accounts";

/// Defines the uniform interface for chain clients
///
/// Network operations must be implemented by every adapter. Pure helpers
/// (hex conversion, ABI coding, hashing, contract handles) come with
/// implementations built on the shared utilities in [`crate::abi`] and
/// [`crate::models::jsonrpc`]; adapters may override them.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Adapter name, attached to diagnostics
    fn name(&self) -> &str;

    /// Performs a non-state-changing call and returns the raw return data as `0x` hex
    async fn read(&self, config: &TransactionRequestConfig) -> ClientResult<String>;

    /// Submits a state-changing transaction
    ///
    /// Returns as soon as the node accepted the transaction; the handle can be
    /// used to wait for the receipt.
    async fn write(&self, config: &TransactionRequestConfig) -> ClientResult<TransactionWriteResult>;

    /// Current gas price in wei, as a decimal string
    async fn get_gas_price(&self) -> ClientResult<String>;

    async fn estimate_gas(&self, config: &TransactionRequestConfig) -> ClientResult<u64>;

    async fn get_chain_id(&self) -> ClientResult<u64>;

    /// Number of transactions sent by `address` as of `block`
    async fn get_transaction_count(&self, address: &str, block: BlockIdentifier) -> ClientResult<u64>;

    /// Looks up a transaction; unknown hashes fail with `NotFound`
    async fn get_transaction(&self, transaction_hash: &str) -> ClientResult<TransactionData>;

    /// Looks up a receipt; unknown or pending hashes fail with `NotFound`
    async fn get_transaction_receipt(&self, transaction_hash: &str) -> ClientResult<TransactionReceipt>;

    /// Block with transaction hashes only
    async fn get_block(&self, block: BlockIdentifier) -> ClientResult<Block>;

    /// Block with full transaction bodies
    async fn get_block_with_transaction(&self, block: BlockIdentifier) -> ClientResult<BlockWithTransaction>;

    /// Balance of `address` in wei, as a decimal string
    async fn get_balance(&self, address: &str) -> ClientResult<String>;

    /// Addresses known to or unlocked by the provider
    async fn get_accounts(&self) -> ClientResult<Vec<String>>;

    /// EIP-712 signature of `typed_data` by `signer`, as `0x` hex
    async fn sign_typed_data(&self, signer: &str, typed_data: &TypedData) -> ClientResult<String>;

    /// Sends a raw JSON-RPC request
    ///
    /// JSON-RPC error objects come back in the response's `error` field;
    /// only transport failures are returned as `Err`.
    async fn send_rpc_request(&self, request: JsonRpcRequest) -> ClientResult<JsonRpcResponse>;

    /// Callable handle bound to `address` and the JSON `abi`
    fn get_contract(&self, address: &str, abi: &str) -> ClientResult<Contract> {
        Contract::new(address, abi)
    }

    fn hex_to_number(&self, value: &str) -> ClientResult<u64> {
        parse_hex_u64(value)
    }

    /// Decimal rendering of a hex value up to 256 bits
    fn hex_to_number_string(&self, value: &str) -> ClientResult<String> {
        parse_hex_u256(value).map(|n| n.to_string())
    }

    fn encode_parameters(&self, params: &[Value], types: &[&str]) -> ClientResult<String> {
        abi::encode_parameters(params, types)
    }

    fn decode_parameters(&self, hex_string: &str, types: &[&str]) -> ClientResult<Vec<DynSolValue>> {
        abi::decode_parameters(hex_string, types)
    }

    /// Keccak-256 of the Solidity-packed `values`
    fn ethereum_sha3(&self, values: &[Value]) -> ClientResult<String> {
        abi::ethereum_sha3(values)
    }

    /// Fetches the root hash covering `start_block..=end_block`.
    ///
    /// Tries `bor_getRootHash` first. A transport error or a response without
    /// a truthy `result` falls back to `eth_getRootHash` with the same params.
    /// When that fails too the error names both methods.
    async fn get_root_hash(&self, start_block: u64, end_block: u64) -> ClientResult<String> {
        match request_root_hash(self, BOR_GET_ROOT_HASH, start_block, end_block).await {
            Ok(root_hash) => Ok(root_hash),
            Err(e) => {
                warn!(
                    client = self.name(),
                    "{} failed ({}), falling back to {}", BOR_GET_ROOT_HASH, e, ETH_GET_ROOT_HASH
                );
                request_root_hash(self, ETH_GET_ROOT_HASH, start_block, end_block)
                    .await
                    .map_err(|e| {
                        debug!(client = self.name(), "{} failed: {}", ETH_GET_ROOT_HASH, e);
                        ClientError::RootHashUnavailable
                    })
            }
        }
    }

    /// Lists accounts through a raw `eth_accounts` request.
    ///
    /// The `result` field is returned untouched (`Null` when absent).
    async fn get_accounts_using_rpc(&self) -> ClientResult<Value> {
        let response = self
            .send_rpc_request(JsonRpcRequest::new(ETH_ACCOUNTS, Vec::new()))
            .await?;
        Ok(response.result.unwrap_or(Value::Null))
    }
}

async fn request_root_hash<C>(client: &C, method: &str, start_block: u64, end_block: u64) -> ClientResult<String>
where
    C: ChainClient + ?Sized,
{
    debug!(client = client.name(), "Requesting {} for blocks {}..={}", method, start_block, end_block);
    let request = JsonRpcRequest::new(method, vec![json!(start_block), json!(end_block)]);
    let response = client.send_rpc_request(request).await?;

    response
        .truthy_result()
        .map(stringify_value)
        .ok_or_else(|| ClientError::EmptyResult {
            method: method.to_string(),
        })
}
