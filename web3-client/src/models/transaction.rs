use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::B256;
use alloy::rpc::types::{BlockId, BlockNumberOrTag, TransactionInput, TransactionRequest};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    client::ChainClient,
    error::{ClientError, ClientResult},
    models::jsonrpc::{
        parse_hex_address, parse_hex_b256, parse_hex_bytes, parse_hex_u128, parse_hex_u256,
        parse_hex_u64,
    },
};

/// Transaction as returned by `eth_getTransactionByHash`
pub type TransactionData = alloy::rpc::types::Transaction;

/// Receipt as returned by `eth_getTransactionReceipt`
pub type TransactionReceipt = alloy::rpc::types::TransactionReceipt;

/// Block whose `transactions` field only carries hashes
pub type Block = alloy::rpc::types::Block;

/// Block whose `transactions` field carries full transaction bodies
pub type BlockWithTransaction = alloy::rpc::types::Block;

/// Parameters describing a call or a transaction
///
/// Field names and hex encoding follow the Ethereum JSON-RPC transaction object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequestConfig {
    /// Sender address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    /// Recipient address (absent for contract creation)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,

    /// Call data, accepted as either "data" or "input"
    #[serde(default, alias = "input", skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,

    /// Value in wei
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Gas limit, accepted as either "gasLimit" or "gas"
    #[serde(default, alias = "gas", skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<String>,

    /// Legacy gas price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,

    /// EIP-1559 max fee per gas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<String>,

    /// EIP-1559 max priority fee per gas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
}

impl TransactionRequestConfig {
    /// Build an alloy `TransactionRequest`, validating and parsing each field.
    ///
    /// Either `to` or `data` must be present. Fields left out stay unset so the
    /// provider can fill them.
    pub fn to_transaction_request(&self) -> ClientResult<TransactionRequest> {
        let mut tx_request = TransactionRequest::default();

        if let Some(from) = &self.from {
            tx_request.from = Some(parse_hex_address(from)?);
        }

        if let Some(to) = &self.to {
            tx_request.to = Some(parse_hex_address(to)?.into());
        } else if self.data.is_none() {
            return Err(ClientError::InvalidInput(
                "Either 'to' or 'data' must be provided".to_string(),
            ));
        }

        if let Some(data) = &self.data {
            tx_request.input = TransactionInput::new(parse_hex_bytes(data)?);
        }

        if let Some(value) = &self.value {
            tx_request.value = Some(parse_hex_u256(value)?);
        }

        if let Some(gas) = &self.gas_limit {
            tx_request.gas = Some(parse_hex_u64(gas)?);
        }

        if self.gas_price.is_some()
            && (self.max_fee_per_gas.is_some() || self.max_priority_fee_per_gas.is_some())
        {
            return Err(ClientError::InvalidInput(
                "Both 'gasPrice' and EIP-1559 fee fields were provided".to_string(),
            ));
        }

        if let Some(gas_price) = &self.gas_price {
            tx_request.gas_price = Some(parse_hex_u128(gas_price)?);
        }
        if let Some(max_fee) = &self.max_fee_per_gas {
            tx_request.max_fee_per_gas = Some(parse_hex_u128(max_fee)?);
        }
        if let Some(priority_fee) = &self.max_priority_fee_per_gas {
            tx_request.max_priority_fee_per_gas = Some(parse_hex_u128(priority_fee)?);
        }

        if let Some(nonce) = &self.nonce {
            tx_request.nonce = Some(parse_hex_u64(nonce)?);
        }

        if let Some(chain_id) = &self.chain_id {
            tx_request.chain_id = Some(parse_hex_u64(chain_id)?);
        }

        debug!("Transaction request built: {:?}", tx_request);
        Ok(tx_request)
    }
}

/// A block referenced either by hash or by number/tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockIdentifier {
    Hash(B256),
    Number(BlockNumberOrTag),
}

impl BlockIdentifier {
    pub const LATEST: Self = BlockIdentifier::Number(BlockNumberOrTag::Latest);

    /// The equivalent alloy `BlockId`
    pub fn to_block_id(&self) -> BlockId {
        match *self {
            BlockIdentifier::Hash(hash) => BlockId::hash(hash),
            BlockIdentifier::Number(number) => BlockId::Number(number),
        }
    }
}

impl Default for BlockIdentifier {
    fn default() -> Self {
        Self::LATEST
    }
}

impl From<u64> for BlockIdentifier {
    fn from(number: u64) -> Self {
        BlockIdentifier::Number(BlockNumberOrTag::Number(number))
    }
}

impl From<B256> for BlockIdentifier {
    fn from(hash: B256) -> Self {
        BlockIdentifier::Hash(hash)
    }
}

impl FromStr for BlockIdentifier {
    type Err = ClientError;

    /// Accepts a 32-byte `0x` hash, a `0x` hex number, a decimal number, or a
    /// block tag.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let tag = match s {
            "latest" => Some(BlockNumberOrTag::Latest),
            "earliest" => Some(BlockNumberOrTag::Earliest),
            "pending" => Some(BlockNumberOrTag::Pending),
            "safe" => Some(BlockNumberOrTag::Safe),
            "finalized" => Some(BlockNumberOrTag::Finalized),
            _ => None,
        };
        if let Some(tag) = tag {
            return Ok(BlockIdentifier::Number(tag));
        }

        if s.starts_with("0x") {
            if s.len() == 66 {
                return parse_hex_b256(s).map(BlockIdentifier::Hash);
            }
            return parse_hex_u64(s).map(BlockIdentifier::from);
        }

        s.parse::<u64>()
            .map(BlockIdentifier::from)
            .map_err(|_| ClientError::InvalidInput(format!("Invalid block identifier: {s}")))
    }
}

impl fmt::Display for BlockIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockIdentifier::Hash(hash) => write!(f, "{hash}"),
            BlockIdentifier::Number(number) => write!(f, "{number}"),
        }
    }
}

/// Handle for a submitted transaction
///
/// Submission does not imply inclusion; use [`TransactionWriteResult::wait_for_receipt`]
/// to wait for the transaction to be mined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionWriteResult {
    tx_hash: B256,
}

impl TransactionWriteResult {
    pub fn new(tx_hash: B256) -> Self {
        Self { tx_hash }
    }

    pub fn tx_hash(&self) -> B256 {
        self.tx_hash
    }

    /// Transaction hash as a `0x` hex string
    pub fn transaction_hash(&self) -> String {
        self.tx_hash.to_string()
    }

    /// Poll the client until the receipt shows up.
    ///
    /// `NotFound` keeps polling; any other error is returned immediately.
    pub async fn wait_for_receipt<C>(
        &self,
        client: &C,
        poll_interval: Duration,
        max_attempts: u32,
    ) -> ClientResult<TransactionReceipt>
    where
        C: ChainClient + ?Sized,
    {
        let hash = self.transaction_hash();
        for attempt in 1..=max_attempts {
            match client.get_transaction_receipt(&hash).await {
                Ok(receipt) => return Ok(receipt),
                Err(ClientError::NotFound(_)) => {
                    debug!("Receipt for {} not available yet (attempt {})", hash, attempt);
                    if attempt < max_attempts {
                        tokio::time::sleep(poll_interval).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Err(ClientError::ReceiptTimeout {
            hash,
            attempts: max_attempts,
        })
    }
}
