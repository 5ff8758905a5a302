//! Chain A: account/nonce model (EVM-style). JSON-RPC-over-HTTP client
//! grounded on the teacher's `blockchain/evm.rs::EvmClient`.

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::{ChainAdapter, SignedTransfer};
use crate::keystore::Keystore;

const BASE_GAS_PRICE_GWEI: f64 = 20.0;
const GAS_LIMIT: u64 = 65_000;

/// Thin JSON-RPC client plus the bits of chain state the send pipeline and
/// confirmation gate need: the operator wallet address, the token contract,
/// and the signing key.
pub struct EthLikeAdapter {
    client: Client,
    rpc_url: String,
    token_address: String,
    wallet_address: String,
    keystore: Keystore,
    req_id: AtomicU64,
}

impl EthLikeAdapter {
    pub fn new(
        rpc_url: impl Into<String>,
        token_address: impl Into<String>,
        wallet_address: impl Into<String>,
        keystore: Keystore,
    ) -> Self {
        Self {
            client: Client::new(),
            rpc_url: rpc_url.into(),
            token_address: token_address.into(),
            wallet_address: wallet_address.into(),
            keystore,
            req_id: AtomicU64::new(1),
        }
    }

    pub fn wallet_address(&self) -> &str {
        &self.wallet_address
    }

    async fn rpc_call(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        let id = self.req_id.fetch_add(1, Ordering::Relaxed);

        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        tracing::debug!(chain_a_method = method, "chain A RPC request");

        let http_resp = self
            .client
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("chain A RPC `{method}` HTTP request failed"))?;

        let status = http_resp.status();
        if !status.is_success() {
            let text = http_resp.text().await.unwrap_or_default();
            tracing::error!(chain_a_method = method, http_status = %status, body = %text, "chain A RPC HTTP error");
            return Err(anyhow!("chain A RPC HTTP {}: {}", status, text));
        }

        let resp: Value = http_resp
            .json()
            .await
            .context("failed to deserialize chain A RPC response")?;

        if let Some(err) = resp.get("error") {
            let code = err.get("code").and_then(|c| c.as_i64()).unwrap_or(-1);
            let message = err.get("message").and_then(|m| m.as_str()).unwrap_or("unknown");
            tracing::error!(chain_a_method = method, error_code = code, error_message = message, "chain A RPC error");
            return Err(anyhow!("chain A RPC error {}: {}", code, message));
        }

        resp.get("result")
            .cloned()
            .ok_or_else(|| anyhow!("chain A RPC `{method}` response missing `result` field"))
    }

    async fn nonce(&self) -> Result<u64> {
        let result = self
            .rpc_call(
                "eth_getTransactionCount",
                vec![json!(self.wallet_address), json!("pending")],
            )
            .await?;
        let hex = result.as_str().ok_or_else(|| anyhow!("nonce response was not a string"))?;
        u64::from_str_radix(hex.strip_prefix("0x").unwrap_or(hex), 16).context("failed to parse nonce")
    }
}

#[async_trait]
impl ChainAdapter for EthLikeAdapter {
    async fn token_balance(&self) -> Result<i128> {
        // ERC20-style balanceOf(address) selector 0x70a08231, left-padded arg.
        let addr_clean = self.wallet_address.strip_prefix("0x").unwrap_or(&self.wallet_address);
        let data = format!("0x70a08231{:0>64}", addr_clean);
        let call_obj = json!({ "to": self.token_address, "data": data });

        let result = self.rpc_call("eth_call", vec![call_obj, json!("latest")]).await?;
        let hex = result.as_str().ok_or_else(|| anyhow!("balanceOf returned non-string"))?;
        let stripped = hex.strip_prefix("0x").unwrap_or(hex);
        i128::from_str_radix(stripped, 16).context("failed to parse token balance")
    }

    async fn block_number(&self) -> Result<u64> {
        let result = self.rpc_call("eth_blockNumber", vec![]).await?;
        let hex = result.as_str().ok_or_else(|| anyhow!("eth_blockNumber returned non-string"))?;
        u64::from_str_radix(hex.strip_prefix("0x").unwrap_or(hex), 16).context("failed to parse block number")
    }

    async fn get_tx(&self, tx_hash: &str) -> Result<Option<()>> {
        let result = self.rpc_call("eth_getTransactionByHash", vec![json!(tx_hash)]).await?;
        Ok(if result.is_null() { None } else { Some(()) })
    }

    async fn send_transfer(
        &self,
        to_addr: &str,
        amount: i64,
        gas_multiplier: f64,
    ) -> Result<SignedTransfer> {
        let nonce = self.nonce().await?;
        let gas_price = BASE_GAS_PRICE_GWEI * gas_multiplier;

        let raw = self.keystore.sign_token_transfer(
            nonce,
            &self.token_address,
            to_addr,
            amount,
            gas_price,
            GAS_LIMIT,
        )?;

        let result = self.rpc_call("eth_sendRawTransaction", vec![json!(raw)]).await?;
        let tx_hash = result
            .as_str()
            .ok_or_else(|| anyhow!("eth_sendRawTransaction returned non-string"))?
            .to_string();

        tracing::info!(to = to_addr, amount, gas_price, tx = %tx_hash, "chain A transfer broadcast");

        Ok(SignedTransfer {
            raw: tx_hash,
            gas_price_used: Some(gas_price),
        })
    }

    fn supports_wait_channel(&self) -> bool {
        true
    }
}
