use std::{borrow::Cow, sync::Arc};

use alloy::{
    dyn_abi::TypedData,
    network::{Ethereum, EthereumWallet},
    primitives::{Bytes, U64},
    providers::{Provider, ProviderBuilder},
    rpc::json_rpc::RpcError,
    rpc::types::BlockNumberOrTag,
    signers::{local::PrivateKeySigner, Signer},
    transports::http::reqwest::Url,
};
use alloy_primitives::hex;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{value::RawValue, Value};
use tracing::{debug, info, instrument};

use crate::{
    client::ChainClient,
    error::{ClientError, ClientResult},
    models::{
        jsonrpc::{parse_hex_address, parse_hex_b256, JsonRpcErrorDetail, JsonRpcRequest, JsonRpcResponse},
        transaction::{
            Block, BlockIdentifier, BlockWithTransaction, TransactionData, TransactionReceipt,
            TransactionRequestConfig, TransactionWriteResult,
        },
    },
};

/// Chain client backed by an alloy HTTP provider
///
/// Typed provider calls are used where alloy offers them; `eth_call`,
/// `eth_estimateGas` and block lookups go through the raw request path.
/// With a private key configured, transactions and typed data for that
/// address are signed locally.
#[derive(Clone)]
pub struct AlloyClient {
    name: String,
    /// Typed provider for Ethereum network
    provider: Arc<dyn Provider<Ethereum>>,
    signer: Option<PrivateKeySigner>,
}

impl AlloyClient {
    /// Create a client for `rpc_url` without checking the node is reachable
    ///
    /// # Arguments
    ///
    /// * `name` - Adapter name attached to diagnostics
    /// * `rpc_url` - URL of the Ethereum RPC endpoint
    /// * `private_key` - Optional hex private key used for local signing
    pub fn new(name: &str, rpc_url: &str, private_key: Option<&str>) -> ClientResult<Self> {
        let url: Url = rpc_url
            .parse()
            .map_err(|e| ClientError::InvalidInput(format!("Bad RPC URL {rpc_url}: {e}")))?;

        let signer = private_key
            .map(|key| {
                key.parse::<PrivateKeySigner>()
                    .map_err(|e| ClientError::Signing(format!("Invalid private key: {e}")))
            })
            .transpose()?;

        let provider: Arc<dyn Provider<Ethereum>> = match &signer {
            Some(signer) => Arc::new(
                ProviderBuilder::new()
                    .network::<Ethereum>()
                    .wallet(EthereumWallet::from(signer.clone()))
                    .on_http(url),
            ),
            None => Arc::new(ProviderBuilder::new().network::<Ethereum>().on_http(url)),
        };

        Ok(Self {
            name: name.to_string(),
            provider,
            signer,
        })
    }

    /// Create a client and verify the connection by fetching the latest block number
    pub async fn connect(name: &str, rpc_url: &str, private_key: Option<&str>) -> ClientResult<Self> {
        let client = Self::new(name, rpc_url, private_key)?;

        let block_number = client.provider.get_block_number().await?;
        info!(client = %client.name, "Connected! Latest block number: {block_number}");

        Ok(client)
    }

    /// Address of the local signer, if any
    pub fn signer_address(&self) -> Option<String> {
        self.signer.as_ref().map(|s| s.address().to_string())
    }

    /// Typed request through the dyn-compatible raw path
    async fn request<P, R>(&self, method: &'static str, params: P) -> ClientResult<R>
    where
        P: Serialize + Send + Sync,
        R: DeserializeOwned,
    {
        let params = serde_json::value::to_raw_value(&params)
            .map_err(|e| ClientError::InvalidInput(format!("Cannot serialize {method} params: {e}")))?;
        let raw = self.provider.raw_request_dyn(Cow::Borrowed(method), &params).await?;
        serde_json::from_str(raw.get())
            .map_err(|e| ClientError::Transport(format!("Malformed {method} response: {e}")))
    }

    async fn fetch_block(&self, block: BlockIdentifier, full: bool) -> ClientResult<Block> {
        let maybe_block: Option<Block> = match block {
            BlockIdentifier::Hash(hash) => self.request("eth_getBlockByHash", (hash, full)).await?,
            BlockIdentifier::Number(number) => {
                self.request("eth_getBlockByNumber", (number, full)).await?
            }
        };
        maybe_block.ok_or_else(|| ClientError::NotFound(format!("block {block}")))
    }
}

#[async_trait]
impl ChainClient for AlloyClient {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self, config), fields(client = %self.name), err)]
    async fn read(&self, config: &TransactionRequestConfig) -> ClientResult<String> {
        let tx_request = config.to_transaction_request()?;
        let output: Bytes = self
            .request("eth_call", (tx_request, BlockNumberOrTag::Latest))
            .await?;
        Ok(output.to_string())
    }

    #[instrument(skip(self, config), fields(client = %self.name), err)]
    async fn write(&self, config: &TransactionRequestConfig) -> ClientResult<TransactionWriteResult> {
        let tx_request = config.to_transaction_request()?;
        let pending = self.provider.send_transaction(tx_request).await?;
        let tx_hash = *pending.tx_hash();
        info!("Transaction submitted: {}", tx_hash);
        Ok(TransactionWriteResult::new(tx_hash))
    }

    #[instrument(skip(self), fields(client = %self.name), err)]
    async fn get_gas_price(&self) -> ClientResult<String> {
        let gas_price = self.provider.get_gas_price().await?;
        Ok(gas_price.to_string())
    }

    #[instrument(skip(self, config), fields(client = %self.name), err)]
    async fn estimate_gas(&self, config: &TransactionRequestConfig) -> ClientResult<u64> {
        let tx_request = config.to_transaction_request()?;
        let gas: U64 = self.request("eth_estimateGas", (tx_request,)).await?;
        debug!("Estimated gas: {}", gas);
        Ok(gas.to::<u64>())
    }

    #[instrument(skip(self), fields(client = %self.name), err)]
    async fn get_chain_id(&self) -> ClientResult<u64> {
        Ok(self.provider.get_chain_id().await?)
    }

    #[instrument(skip(self), fields(client = %self.name), err)]
    async fn get_transaction_count(&self, address: &str, block: BlockIdentifier) -> ClientResult<u64> {
        let address = parse_hex_address(address)?;
        let count = self
            .provider
            .get_transaction_count(address)
            .block_id(block.to_block_id())
            .await?;
        Ok(count)
    }

    #[instrument(skip(self), fields(client = %self.name), err)]
    async fn get_transaction(&self, transaction_hash: &str) -> ClientResult<TransactionData> {
        let hash = parse_hex_b256(transaction_hash)?;
        self.provider
            .get_transaction_by_hash(hash)
            .await?
            .ok_or_else(|| ClientError::NotFound(format!("transaction {transaction_hash}")))
    }

    #[instrument(skip(self), fields(client = %self.name), err)]
    async fn get_transaction_receipt(&self, transaction_hash: &str) -> ClientResult<TransactionReceipt> {
        let hash = parse_hex_b256(transaction_hash)?;
        self.provider
            .get_transaction_receipt(hash)
            .await?
            .ok_or_else(|| ClientError::NotFound(format!("receipt {transaction_hash}")))
    }

    #[instrument(skip(self), fields(client = %self.name), err)]
    async fn get_block(&self, block: BlockIdentifier) -> ClientResult<Block> {
        self.fetch_block(block, false).await
    }

    #[instrument(skip(self), fields(client = %self.name), err)]
    async fn get_block_with_transaction(&self, block: BlockIdentifier) -> ClientResult<BlockWithTransaction> {
        self.fetch_block(block, true).await
    }

    #[instrument(skip(self), fields(client = %self.name), err)]
    async fn get_balance(&self, address: &str) -> ClientResult<String> {
        let address = parse_hex_address(address)?;
        let balance = self.provider.get_balance(address).await?;
        Ok(balance.to_string())
    }

    #[instrument(skip(self), fields(client = %self.name), err)]
    async fn get_accounts(&self) -> ClientResult<Vec<String>> {
        let accounts = self.provider.get_accounts().await?;
        Ok(accounts.iter().map(ToString::to_string).collect())
    }

    #[instrument(skip(self, typed_data), fields(client = %self.name), err)]
    async fn sign_typed_data(&self, signer: &str, typed_data: &TypedData) -> ClientResult<String> {
        let signer_address = parse_hex_address(signer)?;

        if let Some(local) = self.signer.as_ref().filter(|s| s.address() == signer_address) {
            debug!("Signing typed data with local key {}", signer_address);
            let hash = typed_data
                .eip712_signing_hash()
                .map_err(|e| ClientError::InvalidInput(format!("Invalid typed data: {e}")))?;
            let signature = local
                .sign_hash(&hash)
                .await
                .map_err(|e| ClientError::Signing(e.to_string()))?;
            return Ok(hex::encode_prefixed(signature.as_bytes()));
        }

        debug!("Delegating typed data signature for {} to the node", signer_address);
        let signature: String = self
            .request("eth_signTypedData_v4", (signer_address, typed_data))
            .await
            .map_err(|e| match e {
                ClientError::Rpc { message, .. } => {
                    ClientError::UnknownSigner(format!("{signer}: {message}"))
                }
                other => other,
            })?;
        Ok(signature)
    }

    #[instrument(skip(self, request), fields(client = %self.name, method = %request.method), err)]
    async fn send_rpc_request(&self, request: JsonRpcRequest) -> ClientResult<JsonRpcResponse> {
        let JsonRpcRequest { method, params, id, .. } = request;
        let params = serde_json::value::to_raw_value(&params)
            .map_err(|e| ClientError::InvalidInput(format!("Cannot serialize {method} params: {e}")))?;

        match self.provider.raw_request_dyn(Cow::Owned(method), &params).await {
            Ok(raw) => {
                let result: Value = serde_json::from_str(raw.get())
                    .map_err(|e| ClientError::Transport(format!("Malformed response: {e}")))?;
                Ok(JsonRpcResponse::success(id, result))
            }
            Err(RpcError::ErrorResp(payload)) => {
                let data = payload
                    .data
                    .as_deref()
                    .and_then(|raw: &RawValue| serde_json::from_str(raw.get()).ok());
                Ok(JsonRpcResponse::failure(
                    id,
                    JsonRpcErrorDetail {
                        code: payload.code,
                        message: payload.message.to_string(),
                        data,
                    },
                ))
            }
            Err(e) => Err(e.into()),
        }
    }
}
