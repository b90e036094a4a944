use std::future::Future;

use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider, ProviderError, RpcError};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, BlockNumber, Filter, Log, TransactionRequest, U64};
use tracing::{debug, info, warn};

use spicesniff_types::{AnchorReceipt, BatchId};

use crate::config::RpcConfig;
use crate::error::{RegistryError, RegistryResult};
use crate::schema::RegistrySchema;
use crate::traits::{BatchEvent, Registry, RegistryEntry, StoredBatch};

/// Registry backend speaking Ethereum JSON-RPC over HTTP through an ethers
/// [`Provider`].
///
/// Transactions are sent with `eth_sendTransaction` from a node-managed
/// account; key custody stays with the node. Confirmation is awaited on the
/// pending transaction under a hard timeout.
pub struct JsonRpcRegistry {
    provider: Provider<Http>,
    contract: Address,
    from: Address,
    config: RpcConfig,
    schema: RegistrySchema,
}

fn parse_address(field: &str, raw: &str) -> RegistryResult<Address> {
    if raw.trim().is_empty() {
        return Err(RegistryError::Config(format!("{field} is required")));
    }
    raw.trim()
        .parse::<Address>()
        .map_err(|e| RegistryError::Config(format!("invalid {field} {raw}: {e}")))
}

fn provider_error(op: &str, err: ProviderError) -> RegistryError {
    if let Some(response) = err.as_error_response() {
        return RegistryError::Rpc {
            code: response.code,
            message: response.message.clone(),
        };
    }
    if err.is_serde_error() {
        return RegistryError::Malformed(format!("{op}: {err}"));
    }
    RegistryError::Transport(format!("{op}: {err}"))
}

impl JsonRpcRegistry {
    pub fn new(config: RpcConfig) -> RegistryResult<Self> {
        let contract = parse_address("contract_address", &config.contract_address)?;
        let from = parse_address("from_address", &config.from_address)?;
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .map_err(|e| RegistryError::Config(format!("invalid rpc_url {}: {e}", config.rpc_url)))?
            .interval(config.poll_interval());
        let schema = RegistrySchema::for_version(config.schema_version);
        info!(
            rpc_url = %config.rpc_url,
            contract = %config.contract_address,
            schema = %schema.version,
            "json-rpc registry configured"
        );
        Ok(Self {
            provider,
            contract,
            from,
            config,
            schema,
        })
    }

    pub fn schema(&self) -> &RegistrySchema {
        &self.schema
    }

    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    /// Run one provider request under the configured request timeout.
    async fn bounded<T, F>(&self, op: &str, request: F) -> RegistryResult<T>
    where
        F: Future<Output = Result<T, ProviderError>> + Send,
        T: Send,
    {
        match tokio::time::timeout(self.config.request_timeout(), request).await {
            Ok(result) => result.map_err(|e| provider_error(op, e)),
            Err(_) => Err(RegistryError::Transport(format!(
                "{op}: no answer within {}ms",
                self.config.request_timeout_ms
            ))),
        }
    }

    fn decode_log(&self, log: &Log) -> RegistryResult<BatchEvent> {
        let (batch_id, spice_kind, content_id) = self.schema.decode_event(&log.data)?;
        let transaction_ref = log.transaction_hash.map(|h| format!("{h:?}")).unwrap_or_default();
        let block = log.block_number.map(|b| b.as_u64()).unwrap_or_default();
        Ok(BatchEvent {
            batch_id,
            spice_kind,
            content_id,
            receipt: AnchorReceipt::new(transaction_ref, block),
            log_index: log.log_index.map(|i| i.low_u64()).unwrap_or_default(),
        })
    }
}

#[async_trait]
impl Registry for JsonRpcRegistry {
    async fn submit(&self, entry: &RegistryEntry) -> RegistryResult<AnchorReceipt> {
        let tx = TransactionRequest::new()
            .from(self.from)
            .to(self.contract)
            .data(self.schema.encode_write(entry));
        let pending = self
            .bounded("eth_sendTransaction", self.provider.send_transaction(tx, None))
            .await?;
        let transaction_ref = format!("{:?}", pending.tx_hash());
        info!(batch_id = %entry.batch_id, tx = %transaction_ref, "anchoring transaction submitted");

        let confirmations = usize::try_from(self.config.confirmations.max(1)).unwrap_or(usize::MAX);
        let confirming = pending
            .confirmations(confirmations)
            .interval(self.config.poll_interval());

        let receipt = match tokio::time::timeout(self.config.confirmation_timeout(), confirming).await {
            Ok(Ok(Some(receipt))) => receipt,
            Ok(Ok(None)) => return Err(RegistryError::Dropped { transaction_ref }),
            Ok(Err(e)) => return Err(provider_error("eth_getTransactionReceipt", e)),
            Err(_) => {
                return Err(RegistryError::ConfirmationTimeout {
                    transaction_ref,
                    waited_ms: self.config.confirmation_timeout_ms,
                })
            }
        };

        if receipt.status == Some(U64::zero()) {
            return Err(RegistryError::Reverted { transaction_ref });
        }
        let block = receipt.block_number.map(|b| b.as_u64()).unwrap_or_default();
        debug!(tx = %transaction_ref, block, "anchoring transaction confirmed");
        Ok(AnchorReceipt::new(format!("{:?}", receipt.transaction_hash), block))
    }

    async fn read(&self, batch_id: &BatchId) -> RegistryResult<StoredBatch> {
        let call: TypedTransaction = TransactionRequest::new()
            .to(self.contract)
            .data(self.schema.encode_read(batch_id))
            .into();
        let raw = self.bounded("eth_call", self.provider.call(&call, None)).await?;
        self.schema.decode_read(&raw)
    }

    async fn events(&self) -> RegistryResult<Vec<BatchEvent>> {
        let filter = Filter::new()
            .address(self.contract)
            .event(self.schema.event)
            .from_block(self.config.from_block)
            .to_block(BlockNumber::Latest);
        let logs = self.bounded("eth_getLogs", self.provider.get_logs(&filter)).await?;

        let mut events = Vec::with_capacity(logs.len());
        for log in logs.iter().filter(|l| l.removed != Some(true)) {
            match self.decode_log(log) {
                Ok(event) => events.push(event),
                Err(e) => warn!(
                    tx = ?log.transaction_hash,
                    error = %e,
                    "skipping undecodable registry event"
                ),
            }
        }
        events.sort_by_key(|e| (e.receipt.block_ref, e.log_index));
        debug!(count = events.len(), "fetched registry events");
        Ok(events)
    }

    async fn head_block(&self) -> RegistryResult<u64> {
        let block = self
            .bounded("eth_blockNumber", self.provider.get_block_number())
            .await?;
        Ok(block.as_u64())
    }
}

impl std::fmt::Debug for JsonRpcRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonRpcRegistry")
            .field("rpc_url", &self.config.rpc_url)
            .field("contract", &self.contract)
            .field("schema", &self.schema.version)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::routing::post;
    use axum::{Json, Router};
    use ethers::abi::{self, Token};
    use ethers::types::{Bytes, H256};
    use ethers::utils::id;
    use serde_json::{json, Value};
    use spicesniff_types::{ContentId, SchemaVersion};
    use tokio::net::TcpListener;

    const CONTRACT: &str = "0x81a0cb195844c92a47cc5a784f05749074b0417a";
    const SENDER: &str = "0x00000000000000000000000000000000000000aa";

    async fn spawn_node<F>(responder: F) -> String
    where
        F: Fn(&str, &Value) -> Value + Send + Sync + 'static,
    {
        let responder = Arc::new(responder);
        let app = Router::new().route(
            "/",
            post(move |Json(req): Json<Value>| {
                let responder = responder.clone();
                async move {
                    let method = req["method"].as_str().unwrap_or_default().to_string();
                    let mut reply = responder(&method, &req["params"]);
                    reply["jsonrpc"] = json!("2.0");
                    reply["id"] = req["id"].clone();
                    Json(reply)
                }
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn hash(n: u64) -> String {
        format!("0x{n:064x}")
    }

    fn quantity(n: u64) -> String {
        format!("0x{n:x}")
    }

    fn selector_hex(signature: &str) -> String {
        Bytes::from(id(signature).to_vec()).to_string()
    }

    fn transaction(tx_hash: &str, block: Option<u64>) -> Value {
        json!({
            "hash": tx_hash,
            "nonce": "0x0",
            "blockHash": block.map(hash),
            "blockNumber": block.map(quantity),
            "transactionIndex": block.map(|_| "0x0"),
            "from": SENDER,
            "to": CONTRACT,
            "value": "0x0",
            "gasPrice": "0x1",
            "gas": "0x5208",
            "input": "0x",
            "v": "0x1b",
            "r": "0x1",
            "s": "0x1",
            "type": "0x0",
            "chainId": "0x539",
        })
    }

    fn receipt(tx_hash: &str, block: u64, status: u64) -> Value {
        json!({
            "transactionHash": tx_hash,
            "transactionIndex": "0x0",
            "blockHash": hash(block),
            "blockNumber": quantity(block),
            "from": SENDER,
            "to": CONTRACT,
            "cumulativeGasUsed": "0x5208",
            "gasUsed": "0x5208",
            "contractAddress": null,
            "logs": [],
            "status": quantity(status),
            "logsBloom": format!("0x{}", "0".repeat(512)),
            "type": "0x0",
            "effectiveGasPrice": "0x1",
        })
    }

    /// Answers for the calls ethers makes around the ones a test cares about.
    fn node_default(method: &str, params: &Value) -> Value {
        match method {
            "eth_gasPrice" => json!({"result": "0x1"}),
            "eth_estimateGas" => json!({"result": "0x5208"}),
            "eth_chainId" => json!({"result": "0x539"}),
            "eth_blockNumber" => json!({"result": "0x10"}),
            "eth_getTransactionByHash" => {
                json!({"result": transaction(params[0].as_str().unwrap_or_default(), Some(0x10))})
            }
            _ => json!({"error": {"code": -32601, "message": format!("method {method} not found")}}),
        }
    }

    fn registry(rpc_url: String) -> JsonRpcRegistry {
        JsonRpcRegistry::new(RpcConfig {
            rpc_url,
            contract_address: CONTRACT.into(),
            from_address: SENDER.into(),
            confirmation_timeout_ms: 500,
            poll_interval_ms: 20,
            request_timeout_ms: 2_000,
            ..RpcConfig::default()
        })
        .unwrap()
    }

    fn entry() -> RegistryEntry {
        RegistryEntry {
            batch_id: BatchId::new("TURM2025-01").unwrap(),
            spice_kind: "Turmeric".into(),
            content_id: ContentId::new("QmC1").unwrap(),
        }
    }

    fn strings(values: &[&str]) -> Vec<Token> {
        values.iter().map(|v| Token::String((*v).to_string())).collect()
    }

    fn log(batch: &str, cid: &str, block: u64, index: u64) -> Value {
        let topic = format!("{:?}", RegistrySchema::for_version(SchemaVersion::V1).event_topic());
        json!({
            "address": CONTRACT,
            "topics": [topic],
            "data": Bytes::from(abi::encode(&strings(&[batch, "Turmeric", cid]))).to_string(),
            "blockHash": hash(block),
            "blockNumber": quantity(block),
            "transactionHash": hash(block * 100 + index),
            "transactionIndex": "0x0",
            "logIndex": quantity(index),
            "removed": false,
        })
    }

    #[test]
    fn requires_contract_and_sender() {
        let err = JsonRpcRegistry::new(RpcConfig::default()).unwrap_err();
        assert!(matches!(err, RegistryError::Config(_)));

        let err = JsonRpcRegistry::new(RpcConfig {
            contract_address: CONTRACT.into(),
            ..RpcConfig::default()
        })
        .unwrap_err();
        assert_eq!(err, RegistryError::Config("from_address is required".into()));
    }

    #[test]
    fn rejects_malformed_addresses() {
        let err = JsonRpcRegistry::new(RpcConfig {
            contract_address: "0xabc".into(),
            from_address: SENDER.into(),
            ..RpcConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, RegistryError::Config(ref msg) if msg.starts_with("invalid contract_address")));
    }

    #[tokio::test]
    async fn submit_waits_for_receipt() {
        let polls = Arc::new(AtomicUsize::new(0));
        let seen = polls.clone();
        let url = spawn_node(move |method, params| match method {
            "eth_sendTransaction" => {
                let tx = &params[0];
                assert_eq!(tx["from"], json!(SENDER));
                assert_eq!(tx["to"], json!(CONTRACT));
                let data = tx["data"].as_str().unwrap();
                assert!(data.starts_with(&selector_hex("addBatch(string,string,string)")));
                json!({"result": hash(1)})
            }
            "eth_getTransactionReceipt" => {
                if seen.fetch_add(1, Ordering::SeqCst) < 2 {
                    json!({"result": null})
                } else {
                    json!({"result": receipt(&hash(1), 0x10, 1)})
                }
            }
            other => node_default(other, params),
        })
        .await;

        let anchored = registry(url).submit(&entry()).await.unwrap();
        assert_eq!(anchored, AnchorReceipt::new(hash(1), 16));
        assert!(polls.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test]
    async fn reverted_receipt() {
        let url = spawn_node(|method, params| match method {
            "eth_sendTransaction" => json!({"result": hash(0xdead)}),
            "eth_getTransactionReceipt" => json!({"result": receipt(&hash(0xdead), 5, 0)}),
            other => node_default(other, params),
        })
        .await;

        let err = registry(url).submit(&entry()).await.unwrap_err();
        assert_eq!(err, RegistryError::Reverted { transaction_ref: hash(0xdead) });
    }

    #[tokio::test]
    async fn confirmation_times_out() {
        let url = spawn_node(|method, params| match method {
            "eth_sendTransaction" => json!({"result": hash(0x51)}),
            "eth_getTransactionByHash" => json!({"result": transaction(&hash(0x51), None)}),
            "eth_getTransactionReceipt" => json!({"result": null}),
            other => node_default(other, params),
        })
        .await;

        let err = registry(url).submit(&entry()).await.unwrap_err();
        assert_eq!(
            err,
            RegistryError::ConfirmationTimeout {
                transaction_ref: hash(0x51),
                waited_ms: 500,
            }
        );
    }

    #[tokio::test]
    async fn forgotten_transaction_is_dropped() {
        let url = spawn_node(|method, params| match method {
            "eth_sendTransaction" => json!({"result": hash(0x77)}),
            "eth_getTransactionByHash" => json!({"result": null}),
            other => node_default(other, params),
        })
        .await;

        let err = registry(url).submit(&entry()).await.unwrap_err();
        assert_eq!(err, RegistryError::Dropped { transaction_ref: hash(0x77) });
    }

    #[tokio::test]
    async fn rpc_error_surfaces() {
        let url = spawn_node(|_, _| {
            json!({"error": {"code": -32000, "message": "insufficient funds for gas * price + value"}})
        })
        .await;

        let err = registry(url).submit(&entry()).await.unwrap_err();
        assert!(matches!(err, RegistryError::Rpc { code: -32000, .. }));
    }

    #[tokio::test]
    async fn waits_for_extra_confirmations() {
        let head = Arc::new(AtomicU64::new(0x10));
        let chain = head.clone();
        let url = spawn_node(move |method, params| match method {
            "eth_sendTransaction" => json!({"result": hash(2)}),
            "eth_getTransactionReceipt" => json!({"result": receipt(&hash(2), 0x10, 1)}),
            "eth_blockNumber" => {
                let block = chain.fetch_add(1, Ordering::SeqCst);
                json!({"result": quantity(block)})
            }
            other => node_default(other, params),
        })
        .await;

        let mut config = registry(url).config().clone();
        config.confirmations = 3;
        let anchored = JsonRpcRegistry::new(config).unwrap().submit(&entry()).await.unwrap();
        assert_eq!(anchored.block_ref, 16);
        assert!(head.load(Ordering::SeqCst) >= 0x13);
    }

    #[tokio::test]
    async fn read_decodes_current_state() {
        let url = spawn_node(|method, params| {
            assert_eq!(method, "eth_call");
            assert_eq!(params[1], json!("latest"));
            let mut tokens = strings(&["TURM2025-01", "Turmeric", "QmC1"]);
            tokens.push(Token::Uint(1_735_689_600u64.into()));
            json!({"result": Bytes::from(abi::encode(&tokens)).to_string()})
        })
        .await;

        let stored = registry(url).read(&BatchId::new("TURM2025-01").unwrap()).await.unwrap();
        assert_eq!(stored.content_id, "QmC1");
        assert_eq!(stored.timestamp, 1_735_689_600);
    }

    #[tokio::test]
    async fn read_v2_layout() {
        let url = spawn_node(|_, params| {
            let data = params[0]["data"].as_str().unwrap();
            assert!(data.starts_with(&selector_hex("batches(string)")));
            let mut tokens = strings(&["", ""]);
            tokens.push(Token::Uint(0u64.into()));
            json!({"result": Bytes::from(abi::encode(&tokens)).to_string()})
        })
        .await;

        let mut config = registry(url).config().clone();
        config.schema_version = SchemaVersion::V2;
        let stored = JsonRpcRegistry::new(config)
            .unwrap()
            .read(&BatchId::new("missing").unwrap())
            .await
            .unwrap();
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn events_sorted_and_filtered() {
        let url = spawn_node(|method, params| {
            assert_eq!(method, "eth_getLogs");
            let topic = format!("{:?}", H256::from(ethers::utils::keccak256("BatchAdded(string,string,string)")));
            assert_eq!(params[0]["topics"][0], json!(topic));
            assert_eq!(params[0]["address"], json!(CONTRACT));
            assert_eq!(params[0]["fromBlock"], json!("0x0"));
            let mut removed = log("GONE", "QmR", 3, 0);
            removed["removed"] = json!(true);
            let mut garbled = log("BAD", "QmX", 8, 0);
            garbled["data"] = json!("0x1234");
            json!({"result": [
                log("B2", "QmB", 7, 1),
                log("B1", "QmA", 7, 0),
                garbled,
                removed,
                log("B0", "QmZ", 2, 4),
            ]})
        })
        .await;

        let events = registry(url).events().await.unwrap();
        let ids: Vec<&str> = events.iter().map(|e| e.batch_id.as_str()).collect();
        assert_eq!(ids, vec!["B0", "B1", "B2"]);
        assert_eq!(events[1].receipt, AnchorReceipt::new(hash(700), 7));
        assert_eq!(events[2].log_index, 1);
    }

    #[tokio::test]
    async fn head_block_parses_quantity() {
        let url = spawn_node(|_, _| json!({"result": "0x2a"})).await;
        assert_eq!(registry(url).head_block().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn unreachable_node_is_transport_error() {
        let err = registry("http://127.0.0.1:1".into()).head_block().await.unwrap_err();
        assert!(matches!(err, RegistryError::Transport(_)));
    }
}
