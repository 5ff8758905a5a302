//! Chain N: UTXO/invocation model (NEO-style). Same JSON-RPC-over-HTTP
//! client shape as [`super::chain_a::EthLikeAdapter`], but address encoding
//! and transaction construction follow the original's base58check +
//! little-endian script-hash convention (`monitor.go::ToInvocationAddress`,
//! `reverseBytes`, `decodeAddress`).

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::{ChainAdapter, SignedTransfer};
use crate::keystore::Keystore;

pub struct NeoLikeAdapter {
    client: Client,
    rpc_url: String,
    token_script_hash: String,
    wallet_address: String,
    keystore: Keystore,
    req_id: AtomicU64,
}

impl NeoLikeAdapter {
    pub fn new(
        rpc_url: impl Into<String>,
        token_script_hash: impl Into<String>,
        wallet_address: impl Into<String>,
        keystore: Keystore,
    ) -> Self {
        Self {
            client: Client::new(),
            rpc_url: rpc_url.into(),
            token_script_hash: token_script_hash.into(),
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

        tracing::debug!(chain_n_method = method, "chain N RPC request");

        let http_resp = self
            .client
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("chain N RPC `{method}` HTTP request failed"))?;

        let status = http_resp.status();
        if !status.is_success() {
            let text = http_resp.text().await.unwrap_or_default();
            tracing::error!(chain_n_method = method, http_status = %status, body = %text, "chain N RPC HTTP error");
            return Err(anyhow!("chain N RPC HTTP {}: {}", status, text));
        }

        let resp: Value = http_resp
            .json()
            .await
            .context("failed to deserialize chain N RPC response")?;

        if let Some(err) = resp.get("error") {
            let code = err.get("code").and_then(|c| c.as_i64()).unwrap_or(-1);
            let message = err.get("message").and_then(|m| m.as_str()).unwrap_or("unknown");
            tracing::error!(chain_n_method = method, error_code = code, error_message = message, "chain N RPC error");
            return Err(anyhow!("chain N RPC error {}: {}", code, message));
        }

        resp.get("result")
            .cloned()
            .ok_or_else(|| anyhow!("chain N RPC `{method}` response missing `result` field"))
    }
}

/// Decode a base58check wallet address to its 20-byte script hash.
pub fn decode_address(address: &str) -> Result<[u8; 20]> {
    let decoded = bs58::decode(address)
        .with_check(None)
        .into_vec()
        .map_err(|e| anyhow!("base58check decode failed: {e}"))?;

    // `with_check` strips the version byte and checksum for us; the
    // remaining payload is the 20-byte script hash.
    decoded
        .get(..20)
        .map(|s| {
            let mut out = [0u8; 20];
            out.copy_from_slice(s);
            out
        })
        .ok_or_else(|| anyhow!("decoded address too short"))
}

pub fn reverse_bytes(mut bytes: Vec<u8>) -> Vec<u8> {
    bytes.reverse();
    bytes
}

/// Wallet address -> little-endian invocation script hash, hex-encoded.
pub fn to_invocation_address(address: &str) -> Result<String> {
    let script_hash = decode_address(address)?;
    Ok(hex::encode(reverse_bytes(script_hash.to_vec())))
}

#[async_trait]
impl ChainAdapter for NeoLikeAdapter {
    async fn token_balance(&self) -> Result<i128> {
        let from = to_invocation_address(&self.wallet_address)?;
        let result = self
            .rpc_call(
                "invokefunction",
                vec![json!(self.token_script_hash), json!("balanceOf"), json!([{"type": "Hash160", "value": from}])],
            )
            .await?;

        result
            .get("stack")
            .and_then(|s| s.get(0))
            .and_then(|v| v.get("value"))
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse::<i128>().ok())
            .ok_or_else(|| anyhow!("invokefunction balanceOf returned unexpected shape"))
    }

    async fn block_number(&self) -> Result<u64> {
        let result = self.rpc_call("getblockcount", vec![]).await?;
        result.as_u64().ok_or_else(|| anyhow!("getblockcount returned non-integer"))
    }

    async fn get_tx(&self, tx_hash: &str) -> Result<Option<()>> {
        let result = self.rpc_call("getrawtransaction", vec![json!(tx_hash)]).await?;
        Ok(if result.is_null() { None } else { Some(()) })
    }

    async fn send_transfer(
        &self,
        to_addr: &str,
        amount: i64,
        _gas_multiplier: f64,
    ) -> Result<SignedTransfer> {
        let from_invocation = to_invocation_address(&self.wallet_address)?;
        let to_invocation = to_invocation_address(to_addr)?;

        let raw = self.keystore.sign_nep5_transfer(
            &self.token_script_hash,
            &from_invocation,
            &to_invocation,
            amount,
        )?;

        let result = self.rpc_call("sendrawtransaction", vec![json!(raw.clone())]).await?;
        let accepted = result.as_bool().unwrap_or(false);
        if !accepted {
            return Err(anyhow!("sendrawtransaction rejected tx"));
        }

        tracing::info!(to = to_addr, amount, "chain N transfer broadcast");

        Ok(SignedTransfer {
            raw,
            gas_price_used: None,
        })
    }

    fn supports_wait_channel(&self) -> bool {
        // Chain N has no mempool-replacement story worth waiting on: the
        // send pipeline marks it SENT immediately after broadcast.
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_bytes_is_involutive() {
        let bytes = vec![1u8, 2, 3, 4];
        let once = reverse_bytes(bytes.clone());
        let twice = reverse_bytes(once.clone());
        assert_eq!(twice, bytes);
        assert_eq!(once, vec![4, 3, 2, 1]);
    }
}
