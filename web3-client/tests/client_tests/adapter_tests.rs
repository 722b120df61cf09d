//! Integration tests for the alloy-backed adapter against a fake JSON-RPC node

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use alloy::{
    dyn_abi::TypedData,
    network::{ReceiptResponse, TransactionResponse},
    rpc::types::BlockTransactions,
};
use serde_json::{json, Value};
use web3_client::{
    client::{ChainClient, BOR_GET_ROOT_HASH, ETH_GET_ROOT_HASH},
    error::ClientError,
    models::{
        jsonrpc::JsonRpcRequest,
        transaction::{BlockIdentifier, TransactionRequestConfig, TransactionWriteResult},
    },
    AlloyClient,
};

use crate::helpers::spawn_fake_node;
use crate::init_logger;

const ALICE: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
const BOB: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
// Well-known development key for ALICE
const ALICE_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const TX_HASH: &str = "0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060";

/// Answers like a development node
fn dev_node(method: &str, params: &Value) -> Value {
    match method {
        "eth_blockNumber" => json!({ "result": "0x10" }),
        "eth_chainId" => json!({ "result": "0x7a69" }),
        "eth_gasPrice" => json!({ "result": "0x3b9aca00" }),
        "eth_getBalance" => json!({ "result": "0xde0b6b3a7640000" }),
        "eth_accounts" => json!({ "result": [ALICE.to_lowercase(), BOB.to_lowercase()] }),
        "eth_getTransactionCount" => json!({ "result": "0x7" }),
        "eth_estimateGas" => json!({ "result": "0x5208" }),
        "eth_call" => json!({ "result": format!("0x{:064x}", 42) }),
        "eth_sendTransaction" => json!({ "result": TX_HASH }),
        "eth_getBlockByHash" | "eth_getBlockByNumber" => json!({ "result": null }),
        "eth_getTransactionByHash" | "eth_getTransactionReceipt" => json!({ "result": null }),
        "eth_signTypedData_v4" => {
            if params[0].as_str().map(str::to_lowercase) == Some(BOB.to_lowercase()) {
                json!({ "result": "0x1234" })
            } else {
                json!({ "error": { "code": -32000, "message": "unknown account" } })
            }
        }
        "eth_getRootHash" => json!({ "result": "0xdef" }),
        _ => json!({ "error": { "code": -32601, "message": format!("the method {method} does not exist") } }),
    }
}

const BLOCK_HASH: &str = "0x8e38b4dbf6b11fcc3b9dee84fb7986e29ca0a02cecd8977c161ff7333329681e";

fn transaction_json() -> Value {
    json!({
        "hash": TX_HASH,
        "type": "0x2",
        "chainId": "0x7a69",
        "nonce": "0x0",
        "gas": "0x5208",
        "maxFeePerGas": "0x77359400",
        "maxPriorityFeePerGas": "0x3b9aca00",
        "to": BOB,
        "value": "0xde0b6b3a7640000",
        "input": "0x",
        "accessList": [],
        "v": "0x0",
        "yParity": "0x0",
        "r": "0x1b5e176d927f8e9ab405058b2d2457392da3e20f328b16ddabcebc33eaac5fea",
        "s": "0x4ba69724e8f69de52f0125ad8b3c5c2cef33019bac3249e2c0a2192766d1721c",
        "from": ALICE,
        "blockHash": BLOCK_HASH,
        "blockNumber": "0x10",
        "transactionIndex": "0x0",
        "gasPrice": "0x3b9aca00"
    })
}

fn block_json(full: bool) -> Value {
    let transactions = if full {
        json!([transaction_json()])
    } else {
        json!([TX_HASH])
    };
    json!({
        "hash": BLOCK_HASH,
        "parentHash": format!("0x{}", "11".repeat(32)),
        "sha3Uncles": "0x1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347",
        "miner": "0x0000000000000000000000000000000000000000",
        "stateRoot": format!("0x{}", "22".repeat(32)),
        "transactionsRoot": format!("0x{}", "33".repeat(32)),
        "receiptsRoot": format!("0x{}", "44".repeat(32)),
        "logsBloom": format!("0x{}", "00".repeat(256)),
        "difficulty": "0x0",
        "number": "0x10",
        "gasLimit": "0x1c9c380",
        "gasUsed": "0x5208",
        "timestamp": "0x6553f100",
        "extraData": "0x",
        "mixHash": format!("0x{}", "00".repeat(32)),
        "nonce": "0x0000000000000000",
        "baseFeePerGas": "0x3b9aca00",
        "size": "0x27f",
        "uncles": [],
        "transactions": transactions
    })
}

fn receipt_json() -> Value {
    json!({
        "type": "0x2",
        "status": "0x1",
        "cumulativeGasUsed": "0x5208",
        "logs": [],
        "logsBloom": format!("0x{}", "00".repeat(256)),
        "transactionHash": TX_HASH,
        "transactionIndex": "0x0",
        "blockHash": BLOCK_HASH,
        "blockNumber": "0x10",
        "gasUsed": "0x5208",
        "effectiveGasPrice": "0x3b9aca00",
        "from": ALICE,
        "to": BOB,
        "contractAddress": null
    })
}

/// Serves block 16 holding a single mined transfer
fn mined_node(method: &str, params: &Value) -> Value {
    match method {
        "eth_getBlockByHash" if params[0] == BLOCK_HASH => {
            json!({ "result": block_json(params[1] == true) })
        }
        "eth_getBlockByNumber" if params[0] == "0x10" => {
            json!({ "result": block_json(params[1] == true) })
        }
        "eth_getTransactionByHash" if params[0] == TX_HASH => json!({ "result": transaction_json() }),
        "eth_getTransactionReceipt" if params[0] == TX_HASH => json!({ "result": receipt_json() }),
        _ => json!({ "result": null }),
    }
}

static RECEIPT_POLLS: AtomicUsize = AtomicUsize::new(0);

/// Reports the receipt as pending on the first poll only
fn mining_node(method: &str, _params: &Value) -> Value {
    match method {
        "eth_getTransactionReceipt" if RECEIPT_POLLS.fetch_add(1, Ordering::SeqCst) == 0 => {
            json!({ "result": null })
        }
        "eth_getTransactionReceipt" => json!({ "result": receipt_json() }),
        _ => json!({ "result": null }),
    }
}

/// Neither root hash method is available
fn node_without_root_hash(method: &str, _params: &Value) -> Value {
    match method {
        "bor_getRootHash" => json!({ "result": null }),
        _ => json!({ "error": { "code": -32601, "message": "method not found" } }),
    }
}

fn typed_data() -> TypedData {
    serde_json::from_value(json!({
        "types": {
            "EIP712Domain": [
                { "name": "name", "type": "string" },
                { "name": "chainId", "type": "uint256" }
            ],
            "Mail": [
                { "name": "to", "type": "address" },
                { "name": "contents", "type": "string" }
            ]
        },
        "primaryType": "Mail",
        "domain": { "name": "Ether Mail", "chainId": 31337 },
        "message": { "to": BOB, "contents": "Hello, Bob!" }
    }))
    .expect("valid typed data")
}

#[actix_web::test]
async fn test_connect_and_read_chain_state() {
    init_logger();
    let node = spawn_fake_node(dev_node);

    let client = AlloyClient::connect("dev", &node.url, None).await.unwrap();

    assert_eq!(client.name(), "dev");
    assert_eq!(client.get_chain_id().await.unwrap(), 31337);
    assert_eq!(client.get_gas_price().await.unwrap(), "1000000000");
    assert_eq!(client.get_balance(ALICE).await.unwrap(), "1000000000000000000");
    assert_eq!(client.get_accounts().await.unwrap(), vec![ALICE.to_string(), BOB.to_string()]);
    assert_eq!(node.methods()[0], "eth_blockNumber");

    node.stop().await;
}

#[actix_web::test]
async fn test_transaction_count_uses_requested_block() {
    let node = spawn_fake_node(dev_node);
    let client = AlloyClient::new("dev", &node.url, None).unwrap();

    let count = client
        .get_transaction_count(ALICE, BlockIdentifier::from(16))
        .await
        .unwrap();

    assert_eq!(count, 7);
    let params = node.params_of("eth_getTransactionCount").unwrap();
    assert_eq!(params[1], "0x10");

    node.stop().await;
}

#[actix_web::test]
async fn test_read_and_estimate_gas() {
    let node = spawn_fake_node(dev_node);
    let client = AlloyClient::new("dev", &node.url, None).unwrap();
    let config = TransactionRequestConfig {
        from: Some(ALICE.to_string()),
        to: Some(BOB.to_string()),
        data: Some("0x70a08231".to_string()),
        ..Default::default()
    };

    assert_eq!(client.read(&config).await.unwrap(), format!("0x{:064x}", 42));
    assert_eq!(client.estimate_gas(&config).await.unwrap(), 21_000);

    let call_params = node.params_of("eth_call").unwrap();
    assert_eq!(call_params[1], "latest");
    assert_eq!(call_params[0]["to"].as_str().map(str::to_lowercase), Some(BOB.to_lowercase()));

    node.stop().await;
}

#[actix_web::test]
async fn test_invalid_config_fails_before_any_request() {
    let node = spawn_fake_node(dev_node);
    let client = AlloyClient::new("dev", &node.url, None).unwrap();
    let config = TransactionRequestConfig {
        to: Some("0x1234".to_string()),
        ..Default::default()
    };

    assert!(matches!(client.read(&config).await, Err(ClientError::InvalidAddress(_))));
    assert!(node.requests().is_empty());

    node.stop().await;
}

#[actix_web::test]
async fn test_write_returns_submitted_hash() {
    let node = spawn_fake_node(dev_node);
    let client = AlloyClient::new("dev", &node.url, None).unwrap();
    let config = TransactionRequestConfig {
        from: Some(ALICE.to_string()),
        to: Some(BOB.to_string()),
        value: Some("0x1".to_string()),
        gas_limit: Some("0x5208".to_string()),
        gas_price: Some("0x3b9aca00".to_string()),
        nonce: Some("0x0".to_string()),
        chain_id: Some("0x7a69".to_string()),
        ..Default::default()
    };

    let submitted = client.write(&config).await.unwrap();

    assert_eq!(submitted.transaction_hash(), TX_HASH);
    assert!(node.methods().contains(&"eth_sendTransaction".to_string()));

    node.stop().await;
}

#[actix_web::test]
async fn test_missing_objects_are_not_found() {
    let node = spawn_fake_node(dev_node);
    let client = AlloyClient::new("dev", &node.url, None).unwrap();
    let hash_id: BlockIdentifier = TX_HASH.parse().unwrap();

    assert!(matches!(client.get_block(hash_id).await, Err(ClientError::NotFound(_))));
    assert!(matches!(
        client.get_block_with_transaction(BlockIdentifier::from(200)).await,
        Err(ClientError::NotFound(_))
    ));
    assert!(matches!(client.get_transaction(TX_HASH).await, Err(ClientError::NotFound(_))));
    assert!(matches!(client.get_transaction_receipt(TX_HASH).await, Err(ClientError::NotFound(_))));

    assert_eq!(node.params_of("eth_getBlockByHash").unwrap(), json!([TX_HASH, false]));
    assert_eq!(node.params_of("eth_getBlockByNumber").unwrap(), json!(["0xc8", true]));

    node.stop().await;
}

#[actix_web::test]
async fn test_blocks_by_hash_and_number() {
    let node = spawn_fake_node(mined_node);
    let client = AlloyClient::new("dev", &node.url, None).unwrap();

    let block = client.get_block(BLOCK_HASH.parse().unwrap()).await.unwrap();
    assert_eq!(block.header.number, 16);
    assert_eq!(block.header.hash.to_string(), BLOCK_HASH);
    assert_eq!(block.transactions.len(), 1);
    match &block.transactions {
        BlockTransactions::Hashes(hashes) => assert_eq!(hashes[0].to_string(), TX_HASH),
        other => panic!("expected transaction hashes, got {other:?}"),
    }

    let block = client
        .get_block_with_transaction(BlockIdentifier::from(16))
        .await
        .unwrap();
    assert_eq!(block.header.number, 16);
    match &block.transactions {
        BlockTransactions::Full(transactions) => {
            assert_eq!(transactions.len(), 1);
            assert_eq!(transactions[0].tx_hash().to_string(), TX_HASH);
            assert_eq!(transactions[0].from().to_string(), ALICE);
        }
        other => panic!("expected full transactions, got {other:?}"),
    }

    node.stop().await;
}

#[actix_web::test]
async fn test_transaction_and_receipt_lookups() {
    let node = spawn_fake_node(mined_node);
    let client = AlloyClient::new("dev", &node.url, None).unwrap();

    let tx = client.get_transaction(TX_HASH).await.unwrap();
    assert_eq!(tx.tx_hash().to_string(), TX_HASH);
    assert_eq!(tx.from().to_string(), ALICE);
    assert_eq!(tx.block_number(), Some(16));

    let receipt = client.get_transaction_receipt(TX_HASH).await.unwrap();
    assert!(receipt.status());
    assert_eq!(receipt.transaction_hash.to_string(), TX_HASH);
    assert_eq!(receipt.block_number, Some(16));
    assert_eq!(receipt.gas_used, 21_000);

    node.stop().await;
}

#[actix_web::test]
async fn test_wait_for_receipt_after_pending_poll() {
    let node = spawn_fake_node(mining_node);
    let client = AlloyClient::new("dev", &node.url, None).unwrap();
    let submitted = TransactionWriteResult::new(TX_HASH.parse().unwrap());

    let receipt = submitted
        .wait_for_receipt(&client, Duration::from_millis(10), 5)
        .await
        .unwrap();

    assert!(receipt.status());
    assert_eq!(node.methods(), vec!["eth_getTransactionReceipt"; 2]);

    node.stop().await;
}

#[actix_web::test]
async fn test_send_rpc_request_surfaces_error_objects() {
    let node = spawn_fake_node(dev_node);
    let client = AlloyClient::new("dev", &node.url, None).unwrap();

    let response = client
        .send_rpc_request(JsonRpcRequest::new("debug_unknown", vec![json!(1)]))
        .await
        .unwrap();

    assert!(response.result.is_none());
    let error = response.error.expect("error object");
    assert_eq!(error.code, -32601);
    assert!(error.message.contains("debug_unknown"));

    node.stop().await;
}

#[actix_web::test]
async fn test_send_rpc_request_transport_failure() {
    let node = spawn_fake_node(dev_node);
    let url = node.url.clone();
    node.stop().await;

    let client = AlloyClient::new("dev", &url, None).unwrap();
    let err = client
        .send_rpc_request(JsonRpcRequest::new("eth_chainId", vec![]))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Transport(_)));
}

#[actix_web::test]
async fn test_root_hash_falls_back_over_the_wire() {
    let node = spawn_fake_node(dev_node);
    let client = AlloyClient::new("dev", &node.url, None).unwrap();

    assert_eq!(client.get_root_hash(100, 200).await.unwrap(), "0xdef");
    assert_eq!(node.methods(), vec![BOR_GET_ROOT_HASH, ETH_GET_ROOT_HASH]);
    assert_eq!(node.params_of(BOR_GET_ROOT_HASH).unwrap(), json!([100, 200]));
    assert_eq!(node.params_of(ETH_GET_ROOT_HASH).unwrap(), json!([100, 200]));

    node.stop().await;
}

#[actix_web::test]
async fn test_root_hash_unavailable_over_the_wire() {
    let node = spawn_fake_node(node_without_root_hash);
    let client = AlloyClient::new("dev", &node.url, None).unwrap();

    let err = client.get_root_hash(1, 2).await.unwrap_err();
    assert!(err.to_string().contains(BOR_GET_ROOT_HASH));
    assert!(err.to_string().contains(ETH_GET_ROOT_HASH));

    node.stop().await;
}

#[actix_web::test]
async fn test_accounts_using_rpc_over_the_wire() {
    let node = spawn_fake_node(dev_node);
    let client = AlloyClient::new("dev", &node.url, None).unwrap();

    let accounts = client.get_accounts_using_rpc().await.unwrap();

    assert_eq!(accounts, json!([ALICE.to_lowercase(), BOB.to_lowercase()]));
    assert_eq!(node.params_of("eth_accounts").unwrap(), json!([]));

    node.stop().await;
}

#[actix_web::test]
async fn test_sign_typed_data_with_local_key() {
    let node = spawn_fake_node(dev_node);
    let client = AlloyClient::new("dev", &node.url, Some(ALICE_KEY)).unwrap();
    assert_eq!(client.signer_address().as_deref(), Some(ALICE));

    let signature = client.sign_typed_data(ALICE, &typed_data()).await.unwrap();

    // 65 bytes of r, s, v
    assert!(signature.starts_with("0x"));
    assert_eq!(signature.len(), 2 + 130);
    assert!(node.requests().is_empty());

    // Deterministic signing
    assert_eq!(client.sign_typed_data(ALICE, &typed_data()).await.unwrap(), signature);

    node.stop().await;
}

#[actix_web::test]
async fn test_sign_typed_data_delegates_to_node() {
    let node = spawn_fake_node(dev_node);
    let client = AlloyClient::new("dev", &node.url, Some(ALICE_KEY)).unwrap();

    assert_eq!(client.sign_typed_data(BOB, &typed_data()).await.unwrap(), "0x1234");

    let stranger = "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC";
    let err = client.sign_typed_data(stranger, &typed_data()).await.unwrap_err();
    assert!(matches!(err, ClientError::UnknownSigner(_)));

    node.stop().await;
}

#[test]
fn test_rejects_bad_construction_arguments() {
    assert!(matches!(
        AlloyClient::new("dev", "not a url", None),
        Err(ClientError::InvalidInput(_))
    ));
    assert!(matches!(
        AlloyClient::new("dev", "http://127.0.0.1:8545", Some("0x1234")),
        Err(ClientError::Signing(_))
    ));
}
