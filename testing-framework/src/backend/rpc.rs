//! JSON-RPC backend for Ethereum-compatible nodes
//!
//! Uses `eth_call`, `eth_sendRawTransaction`, `eth_getTransactionReceipt` and
//! `eth_getTransactionCount`.
//! Every request is bounded by the request timeout, receipt polling by the
//! receipt timeout.

use super::{Backend, CallOutcome, CallRequest, TxOutcome};
use crate::config::TransportConfig;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use log::{debug, trace};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use zion_common::{
    crypto::{Address, TxHash},
    transaction::SignedTransaction,
};

// Geth reports reverted calls with this error code
const EXECUTION_REVERTED_CODE: i64 = 3;

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl RpcError {
    fn is_revert(&self) -> bool {
        self.code == EXECUTION_REVERTED_CODE || self.message.contains("revert")
    }

    fn describe(&self) -> String {
        match &self.data {
            Some(data) => format!("{} ({})", self.message, data),
            None => self.message.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Receipt {
    status: Option<String>,
    block_number: Option<String>,
    gas_used: Option<String>,
}

pub struct JsonRpcBackend {
    client: reqwest::Client,
    url: String,
    transport: TransportConfig,
    next_id: AtomicU64,
}

impl JsonRpcBackend {
    pub fn new(url: impl Into<String>, transport: TransportConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(transport.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
            transport,
            next_id: AtomicU64::new(1),
        })
    }

    async fn request(&self, method: &str, params: Value) -> Result<RpcResponse> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        trace!("-> {} #{}", method, id);

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to send {} request to {}", method, self.url))?;

        response
            .json::<RpcResponse>()
            .await
            .with_context(|| format!("Failed to parse {} response", method))
    }

    async fn receipt(&self, hash: &TxHash) -> Result<Option<Receipt>> {
        let response = self
            .request("eth_getTransactionReceipt", json!([hash.to_hex()]))
            .await?;
        if let Some(error) = response.error {
            bail!("eth_getTransactionReceipt error: {}", error.describe());
        }
        match response.result {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Ok(Some(
                serde_json::from_value(value).context("Malformed transaction receipt")?,
            )),
        }
    }

    async fn wait_for_receipt(&self, hash: &TxHash) -> Result<Receipt> {
        let poll = async {
            loop {
                if let Some(receipt) = self.receipt(hash).await? {
                    return Ok::<_, anyhow::Error>(receipt);
                }
                tokio::time::sleep(self.transport.poll_interval()).await;
            }
        };

        tokio::time::timeout(self.transport.receipt_timeout(), poll)
            .await
            .with_context(|| {
                format!(
                    "No receipt for {} after {}s",
                    hash, self.transport.receipt_timeout_secs
                )
            })?
    }
}

#[async_trait]
impl Backend for JsonRpcBackend {
    async fn call(&self, request: &CallRequest) -> Result<CallOutcome> {
        let mut call = json!({
            "to": request.to.to_hex(),
            "data": format!("0x{}", hex::encode(&request.data)),
        });
        if let Some(from) = request.from {
            call["from"] = json!(from.to_hex());
        }

        let response = self.request("eth_call", json!([call, "latest"])).await?;
        if let Some(error) = response.error {
            if error.is_revert() {
                return Ok(CallOutcome::Reverted(error.describe()));
            }
            bail!("eth_call error: {}", error.describe());
        }

        let result = response.result.context("eth_call returned no result")?;
        let text = result.as_str().context("eth_call result is not a string")?;
        Ok(CallOutcome::Returned(decode_hex(text)?))
    }

    async fn submit(&self, tx: &SignedTransaction) -> Result<TxOutcome> {
        let response = self
            .request("eth_sendRawTransaction", json!([tx.raw_hex()]))
            .await?;
        if let Some(error) = response.error {
            bail!(
                "Transaction {} (nonce {}) rejected: {}",
                tx.hash(),
                tx.nonce(),
                error.describe()
            );
        }
        debug!("Submitted {} (nonce {})", tx.hash(), tx.nonce());

        let receipt = self.wait_for_receipt(tx.hash()).await?;
        Ok(TxOutcome {
            hash: *tx.hash(),
            success: receipt.status.as_deref().map(parse_quantity).transpose()? == Some(1),
            block_number: receipt
                .block_number
                .as_deref()
                .map(parse_quantity)
                .transpose()?,
            gas_used: receipt.gas_used.as_deref().map(parse_quantity).transpose()?,
        })
    }

    async fn pending_nonce(&self, address: &Address) -> Result<u64> {
        let response = self
            .request("eth_getTransactionCount", json!([address.to_hex(), "pending"]))
            .await?;
        if let Some(error) = response.error {
            bail!("eth_getTransactionCount error: {}", error.describe());
        }
        let result = response
            .result
            .context("eth_getTransactionCount returned no result")?;
        let text = result
            .as_str()
            .context("eth_getTransactionCount result is not a string")?;
        parse_quantity(text)
    }
}

fn decode_hex(text: &str) -> Result<Vec<u8>> {
    let text = text.strip_prefix("0x").unwrap_or(text);
    hex::decode(text).with_context(|| format!("Invalid hex data '{}'", text))
}

fn parse_quantity(text: &str) -> Result<u64> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    u64::from_str_radix(digits, 16).with_context(|| format!("Invalid quantity '{}'", text))
}
