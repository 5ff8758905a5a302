//! Periodic drain of pending SendOrders: balance-gated broadcast with
//! gas escalation and, for chain A, a bounded wait for confirmation before
//! the row is marked `SENT`. Grounded in `monitor.go::EthSendMoniter`/
//! `NeoSendMoniter`/`waitEthTx`, generalized into one function parameterized
//! over [`ChainAdapter`].

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::chain::ChainAdapter;
use crate::error::AppResult;
use crate::fee;
use crate::models::{gas_multiplier, ChainSide, SendOrder, SendOrderStatus, RETRY_CAP};
use crate::store::OrderStore;

const WAIT_POLL_INTERVAL: Duration = Duration::from_secs(60);
const WAIT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Runs one tick of the send pipeline for `side`. `chain_a_tx_receiver` is
/// `Some` only for chain A, and is drained for hashes the ingest loop has
/// observed as our own outbound broadcasts landing on-chain.
pub async fn run_tick(
    store: &OrderStore,
    adapter: &dyn ChainAdapter,
    side: ChainSide,
    tax_rate: f64,
    chain_a_tx_receiver: Option<&mut mpsc::Receiver<String>>,
) -> AppResult<()> {
    let pending = store.find_pending_sends(side).await?;
    if pending.is_empty() {
        return Ok(());
    }

    let mut balance = match adapter.token_balance().await {
        Ok(b) => b,
        Err(e) => {
            tracing::error!(side = side.as_str(), error = %e, "failed to read operator balance");
            return Ok(());
        }
    };

    tracing::info!(side = side.as_str(), balance, pending = pending.len(), "send pipeline tick");

    let mut receiver = chain_a_tx_receiver;

    for send_order in pending {
        if balance < send_order.value as i128 {
            tracing::warn!(
                side = side.as_str(),
                send_order_id = send_order.id,
                balance,
                required = send_order.value,
                "operator balance insufficient, stopping tick"
            );
            break;
        }

        match process_one(store, adapter, side, tax_rate, &send_order, receiver.as_deref_mut()).await {
            Ok(true) => balance -= send_order.value as i128,
            Ok(false) => { /* broadcast failed; left untouched for next tick */ }
            Err(e) => {
                tracing::error!(send_order_id = send_order.id, error = %e, "send pipeline processing error");
            }
        }
    }

    Ok(())
}

/// Processes a single SendOrder. Returns `Ok(true)` if the value should be
/// debited from the in-memory balance estimate (broadcast succeeded),
/// `Ok(false)` if the broadcast itself failed (row left untouched).
async fn process_one(
    store: &OrderStore,
    adapter: &dyn ChainAdapter,
    side: ChainSide,
    tax_rate: f64,
    send_order: &SendOrder,
    mut chain_a_tx_receiver: Option<&mut mpsc::Receiver<String>>,
) -> AppResult<bool> {
    let (send_value, tax_cost) = fee::apply_tax(send_order.value, tax_rate);
    let mut retry = send_order.retry.min(RETRY_CAP);

    loop {
        let multiplier = gas_multiplier(retry);
        let broadcast = adapter
            .send_transfer(&send_order.to_addr, send_value, multiplier)
            .await;

        let transfer = match broadcast {
            Ok(t) => t,
            Err(e) => {
                tracing::error!(send_order_id = send_order.id, error = %e, "broadcast failed");
                return Ok(false);
            }
        };

        let out_tx = transfer.raw;

        if !adapter.supports_wait_channel() {
            // Chain N: no wait, mark SENT immediately on successful broadcast.
            store
                .complete_send(
                    send_order.id,
                    &send_order.order_tx,
                    send_value,
                    tax_cost,
                    &out_tx,
                    SendOrderStatus::Sent,
                    retry,
                )
                .await?;
            return Ok(true);
        }

        // Chain A: mark pending-replace immediately, then wait.
        store
            .complete_send(
                send_order.id,
                &send_order.order_tx,
                send_value,
                tax_cost,
                &out_tx,
                SendOrderStatus::PendingReplace,
                retry,
            )
            .await?;

        match wait_for_chain_a(adapter, &out_tx, chain_a_tx_receiver.as_deref_mut()).await? {
            WaitOutcome::Confirmed => {
                store
                    .update_send_out_tx(send_order.id, &out_tx, SendOrderStatus::Sent, retry)
                    .await?;
                return Ok(true);
            }
            WaitOutcome::Replaced => {
                store.reset_send_for_retry(send_order.id, 0).await?;
                return Ok(true);
            }
            WaitOutcome::TimedOut => {
                retry = (retry + 1).min(RETRY_CAP);
                tracing::warn!(send_order_id = send_order.id, retry, "wait timed out, escalating gas and retrying");
                continue;
            }
        }
    }
}

enum WaitOutcome {
    Confirmed,
    Replaced,
    TimedOut,
}

/// Waits up to [`WAIT_TIMEOUT`], polling every [`WAIT_POLL_INTERVAL`], for
/// `tx_hash` to either be signaled via the in-process channel (the ingest
/// loop observed it land) or found missing from the chain (replaced).
async fn wait_for_chain_a(
    adapter: &dyn ChainAdapter,
    tx_hash: &str,
    chain_a_tx_receiver: Option<&mut mpsc::Receiver<String>>,
) -> AppResult<WaitOutcome> {
    let wait_body = async {
        match chain_a_tx_receiver {
            Some(receiver) => poll_with_channel(adapter, tx_hash, receiver).await,
            None => poll_without_channel(adapter, tx_hash).await,
        }
    };

    match timeout(WAIT_TIMEOUT, wait_body).await {
        Ok(outcome) => Ok(outcome),
        Err(_) => Ok(WaitOutcome::TimedOut),
    }
}

async fn poll_with_channel(
    adapter: &dyn ChainAdapter,
    tx_hash: &str,
    receiver: &mut mpsc::Receiver<String>,
) -> WaitOutcome {
    let mut interval = tokio::time::interval(WAIT_POLL_INTERVAL);
    interval.tick().await; // first tick fires immediately; skip it

    loop {
        tokio::select! {
            seen = receiver.recv() => {
                if let Some(seen_tx) = seen {
                    if seen_tx == tx_hash {
                        return WaitOutcome::Confirmed;
                    }
                }
            }
            _ = interval.tick() => {
                if tx_is_missing(adapter, tx_hash).await {
                    return WaitOutcome::Replaced;
                }
            }
        }
    }
}

async fn poll_without_channel(adapter: &dyn ChainAdapter, tx_hash: &str) -> WaitOutcome {
    let mut interval = tokio::time::interval(WAIT_POLL_INTERVAL);
    loop {
        interval.tick().await;
        if tx_is_missing(adapter, tx_hash).await {
            return WaitOutcome::Replaced;
        }
    }
}

async fn tx_is_missing(adapter: &dyn ChainAdapter, tx_hash: &str) -> bool {
    matches!(adapter.get_tx(tx_hash).await, Ok(None))
}
