use std::sync::Arc;

use actix_web::{get, post, web, HttpResponse};
use alloy::dyn_abi::TypedData;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, info};

use crate::{
    client::ChainClient,
    error::ServiceError,
    models::{
        jsonrpc::{JsonRpcError, JsonRpcRequest, JSONRPC_VERSION},
        transaction::{BlockIdentifier, TransactionRequestConfig},
    },
};

/// Shared handle to the chain client served by the gateway
pub type SharedClient = web::Data<Arc<dyn ChainClient>>;

#[derive(Debug, Deserialize)]
pub struct BlockQuery {
    /// Include full transaction bodies
    #[serde(default)]
    pub full: bool,
}

#[derive(Debug, Deserialize)]
pub struct NonceQuery {
    pub block: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RootHashQuery {
    pub start: u64,
    pub end: u64,
}

#[derive(Debug, Deserialize)]
pub struct SignTypedDataRequest {
    pub signer: String,
    #[serde(rename = "typedData")]
    pub typed_data: TypedData,
}

/// Service health check endpoint that verifies the RPC connection is working
#[post("/api/v1/health")]
async fn health_check(client: SharedClient) -> Result<HttpResponse, ServiceError> {
    info!("Health check requested");

    match client.get_block(BlockIdentifier::LATEST).await {
        Ok(block) => Ok(HttpResponse::Ok().json(json!({
            "status": "ok",
            "client": client.name(),
            "latest_block": block.header.number,
            "timestamp": block.header.timestamp,
        }))),
        Err(e) => {
            error!("Health check failed: {:?}", e);
            Err(ServiceError::RPCConnectionError(format!("RPC connection error: {}", e)))
        }
    }
}

#[get("/api/v1/chain-id")]
async fn chain_id(client: SharedClient) -> Result<HttpResponse, ServiceError> {
    let chain_id = client.get_chain_id().await?;
    Ok(HttpResponse::Ok().json(json!({ "chain_id": chain_id })))
}

#[get("/api/v1/gas-price")]
async fn gas_price(client: SharedClient) -> Result<HttpResponse, ServiceError> {
    let gas_price = client.get_gas_price().await?;
    Ok(HttpResponse::Ok().json(json!({ "gas_price": gas_price })))
}

#[get("/api/v1/accounts")]
async fn accounts(client: SharedClient) -> Result<HttpResponse, ServiceError> {
    let accounts = client.get_accounts().await?;
    Ok(HttpResponse::Ok().json(json!({ "accounts": accounts })))
}

#[get("/api/v1/balance/{address}")]
async fn balance(client: SharedClient, path: web::Path<String>) -> Result<HttpResponse, ServiceError> {
    let address = path.into_inner();
    let balance = client.get_balance(&address).await?;
    Ok(HttpResponse::Ok().json(json!({ "address": address, "balance": balance })))
}

#[get("/api/v1/nonce/{address}")]
async fn nonce(
    client: SharedClient,
    path: web::Path<String>,
    query: web::Query<NonceQuery>,
) -> Result<HttpResponse, ServiceError> {
    let address = path.into_inner();
    let block = match query.block.as_deref() {
        Some(block) => block.parse::<BlockIdentifier>()?,
        None => BlockIdentifier::LATEST,
    };
    let nonce = client.get_transaction_count(&address, block).await?;
    Ok(HttpResponse::Ok().json(json!({ "address": address, "nonce": nonce })))
}

#[get("/api/v1/blocks/{id}")]
async fn block(
    client: SharedClient,
    path: web::Path<String>,
    query: web::Query<BlockQuery>,
) -> Result<HttpResponse, ServiceError> {
    let id = path.into_inner().parse::<BlockIdentifier>()?;
    let block = if query.full {
        client.get_block_with_transaction(id).await?
    } else {
        client.get_block(id).await?
    };
    Ok(HttpResponse::Ok().json(block))
}

#[get("/api/v1/transactions/{hash}")]
async fn transaction(client: SharedClient, path: web::Path<String>) -> Result<HttpResponse, ServiceError> {
    let tx = client.get_transaction(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(tx))
}

#[get("/api/v1/transactions/{hash}/receipt")]
async fn transaction_receipt(
    client: SharedClient,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let receipt = client.get_transaction_receipt(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(receipt))
}

#[get("/api/v1/root-hash")]
async fn root_hash(client: SharedClient, query: web::Query<RootHashQuery>) -> Result<HttpResponse, ServiceError> {
    let root_hash = client.get_root_hash(query.start, query.end).await?;
    Ok(HttpResponse::Ok().json(json!({
        "start": query.start,
        "end": query.end,
        "root_hash": root_hash,
    })))
}

#[post("/api/v1/call")]
async fn call(
    client: SharedClient,
    config: web::Json<TransactionRequestConfig>,
) -> Result<HttpResponse, ServiceError> {
    debug!("Call requested: {:?}", config);
    let output = client.read(&config).await?;
    Ok(HttpResponse::Ok().json(json!({ "result": output })))
}

#[post("/api/v1/estimate-gas")]
async fn estimate_gas(
    client: SharedClient,
    config: web::Json<TransactionRequestConfig>,
) -> Result<HttpResponse, ServiceError> {
    debug!("Gas estimation requested: {:?}", config);
    let gas = client.estimate_gas(&config).await?;
    info!("Gas estimation successful: {}", gas);
    Ok(HttpResponse::Ok().json(json!({ "gas": gas })))
}

#[post("/api/v1/transactions")]
async fn send_transaction(
    client: SharedClient,
    config: web::Json<TransactionRequestConfig>,
) -> Result<HttpResponse, ServiceError> {
    let submitted = client.write(&config).await?;
    info!("Transaction submitted: {}", submitted.transaction_hash());
    Ok(HttpResponse::Accepted().json(json!({ "transaction_hash": submitted.transaction_hash() })))
}

#[post("/api/v1/sign-typed-data")]
async fn sign_typed_data(
    client: SharedClient,
    request: web::Json<SignTypedDataRequest>,
) -> Result<HttpResponse, ServiceError> {
    let signature = client.sign_typed_data(&request.signer, &request.typed_data).await?;
    Ok(HttpResponse::Ok().json(json!({ "signature": signature })))
}

/// Raw JSON-RPC passthrough to the node
///
/// Malformed bodies are answered with JSON-RPC error objects rather than
/// plain-text rejections.
#[post("/api/v1/rpc")]
async fn rpc_passthrough(client: SharedClient, body: web::Bytes) -> HttpResponse {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            return HttpResponse::BadRequest().json(JsonRpcError::parse_error(format!("Parse error: {e}")));
        }
    };

    let id = value.get("id").cloned().unwrap_or(Value::Null);
    let request: JsonRpcRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(e) => {
            return HttpResponse::BadRequest()
                .json(JsonRpcError::invalid_request(id, format!("Invalid request: {e}")));
        }
    };

    // Validate JSON-RPC version
    if request.jsonrpc != JSONRPC_VERSION {
        return HttpResponse::BadRequest().json(JsonRpcError::invalid_request(
            request.id,
            "Invalid JSON-RPC version. Expected 2.0".to_string(),
        ));
    }

    debug!("Forwarding {} to the node", request.method);
    match client.send_rpc_request(request).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            error!("RPC passthrough failed: {:?}", e);
            HttpResponse::BadGateway().json(JsonRpcError::internal_error(id, e.to_string()))
        }
    }
}

/// Configure the API routes for the service
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check)
        .service(chain_id)
        .service(gas_price)
        .service(accounts)
        .service(balance)
        .service(nonce)
        .service(block)
        .service(transaction_receipt)
        .service(transaction)
        .service(root_hash)
        .service(call)
        .service(estimate_gas)
        .service(send_transaction)
        .service(sign_typed_data)
        .service(rpc_passthrough);
}
