use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use chain_eth::Amount;
use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::config::NodeConfig;
use crate::error::ProviderError;
use crate::provider::RpcProvider;
use crate::types::{
    parse_quantity_u256, parse_quantity_u64, to_quantity, Block, Log, LogFilter, TransactionInfo,
    TransactionReceipt,
};

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default, deserialize_with = "present")]
    result: Option<Value>,
    error: Option<RpcErrorObject>,
}

/// `Some(Value::Null)` for `"result": null`, `None` only when the key is absent.
fn present<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(d).map(Some)
}

/// JSON-RPC 2.0 over HTTP POST.
///
/// Cloning is cheap; clones share the connection pool and request counter.
#[derive(Debug, Clone)]
pub struct HttpProvider {
    client: reqwest::Client,
    url: Url,
    next_id: Arc<AtomicU64>,
}

impl HttpProvider {
    pub fn new(config: &NodeConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            url: config.endpoint.clone(),
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Sends one request. `Ok(None)` means the node returned `"result": null`.
    async fn request<R: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Option<R>, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        tracing::debug!(method, id, "sending JSON-RPC request");

        let response = self.client.post(self.url.clone()).json(&body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        let parsed: RpcResponse = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                tracing::warn!(method, %status, "request failed: {}", text);
                return Err(ProviderError::Transport(format!("HTTP {status}: {text}")));
            }
            Err(e) => {
                return Err(ProviderError::InvalidResponse(format!(
                    "{method}: {e}"
                )))
            }
        };

        if let Some(error) = parsed.error {
            tracing::debug!(method, code = error.code, "node returned error: {}", error.message);
            return Err(ProviderError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        if !status.is_success() {
            tracing::warn!(method, %status, "request failed: {}", text);
            return Err(ProviderError::Transport(format!("HTTP {status}: {text}")));
        }

        match parsed.result {
            None => Err(ProviderError::InvalidResponse(format!(
                "{method}: response has no result"
            ))),
            Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| ProviderError::InvalidResponse(format!("{method}: {e}"))),
        }
    }

    async fn request_required<R: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<R, ProviderError> {
        self.request(method, params)
            .await?
            .ok_or_else(|| ProviderError::InvalidResponse(format!("{method} returned null")))
    }

    async fn request_quantity(&self, method: &str, params: Value) -> Result<u64, ProviderError> {
        let raw: String = self.request_required(method, params).await?;
        parse_quantity_u64(&raw)
    }

    async fn request_amount(&self, method: &str, params: Value) -> Result<Amount, ProviderError> {
        let raw: String = self.request_required(method, params).await?;
        parse_quantity_u256(&raw).map(Amount::from_wei)
    }
}

#[async_trait]
impl RpcProvider for HttpProvider {
    async fn chain_id(&self) -> Result<u64, ProviderError> {
        self.request_quantity("eth_chainId", json!([])).await
    }

    async fn block_number(&self) -> Result<u64, ProviderError> {
        self.request_quantity("eth_blockNumber", json!([])).await
    }

    async fn balance(&self, address: Address) -> Result<Amount, ProviderError> {
        self.request_amount("eth_getBalance", json!([address, "latest"]))
            .await
    }

    async fn pending_nonce(&self, address: Address) -> Result<u64, ProviderError> {
        self.request_quantity("eth_getTransactionCount", json!([address, "pending"]))
            .await
    }

    async fn suggest_gas_price(&self) -> Result<Amount, ProviderError> {
        self.request_amount("eth_gasPrice", json!([])).await
    }

    async fn send_raw_transaction(&self, raw_tx: Vec<u8>) -> Result<B256, ProviderError> {
        let raw_hex = format!("0x{}", hex::encode(&raw_tx));
        self.request_required("eth_sendRawTransaction", json!([raw_hex]))
            .await
    }

    async fn block_by_number(&self, number: u64) -> Result<Option<Block>, ProviderError> {
        self.request("eth_getBlockByNumber", json!([to_quantity(number), true]))
            .await
    }

    async fn transaction_by_hash(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionInfo>, ProviderError> {
        self.request("eth_getTransactionByHash", json!([hash])).await
    }

    async fn transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceipt>, ProviderError> {
        self.request("eth_getTransactionReceipt", json!([hash])).await
    }

    async fn logs(&self, filter: LogFilter) -> Result<Vec<Log>, ProviderError> {
        self.request_required("eth_getLogs", json!([filter.to_params()]))
            .await
    }

    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Bytes, ProviderError> {
        let call = json!({
            "to": to,
            "data": format!("0x{}", hex::encode(&data)),
        });
        self.request_required("eth_call", json!([call, "latest"])).await
    }
}
