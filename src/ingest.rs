//! Per-chain ingest loop: drains a [`MessageBroker`] of newly-indexed chain
//! transactions, waits out the confirmation gate, then hands each tx to the
//! matcher's inbound or outbound leg depending on which side of it is the
//! operator's own wallet. Grounded in `monitor.go::NeoSendMoniter`/
//! `EthSendMoniter`'s outer consume loop (stripped of the send-side logic,
//! which lives in [`crate::send_pipeline`]).

use std::time::Duration;

use tokio::sync::mpsc;

use crate::broker::MessageBroker;
use crate::chain::ChainAdapter;
use crate::error::AppResult;
use crate::matcher::{self, ObservedTx};
use crate::models::ChainSide;
use crate::store::OrderStore;

/// Runs forever, pulling one message at a time off `broker`. Empty polls
/// back off briefly rather than busy-looping.
#[allow(clippy::too_many_arguments)]
pub async fn run(
    store: OrderStore,
    adapter: std::sync::Arc<dyn ChainAdapter>,
    broker: std::sync::Arc<dyn MessageBroker>,
    side: ChainSide,
    operator_address: String,
    token_address: String,
    confirm_count: u64,
    poll_interval: Duration,
    chain_a_tx_notify: Option<mpsc::Sender<String>>,
) {
    loop {
        match broker.recv().await {
            Ok(Some(message)) => {
                if let Err(e) = handle_one(
                    &store,
                    adapter.as_ref(),
                    side,
                    &operator_address,
                    &token_address,
                    confirm_count,
                    poll_interval,
                    chain_a_tx_notify.as_ref(),
                    &message.key,
                )
                .await
                {
                    tracing::error!(side = side.as_str(), tx = %message.key, error = %e, "ingest: failed to process tx");
                    continue;
                }

                if let Err(e) = broker.commit(&message).await {
                    tracing::error!(side = side.as_str(), tx = %message.key, error = %e, "ingest: failed to commit message");
                }
            }
            Ok(None) => tokio::time::sleep(Duration::from_millis(500)).await,
            Err(e) => {
                tracing::error!(side = side.as_str(), error = %e, "ingest: broker recv failed");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}

async fn handle_one(
    store: &OrderStore,
    adapter: &dyn ChainAdapter,
    side: ChainSide,
    operator_address: &str,
    token_address: &str,
    confirm_count: u64,
    poll_interval: Duration,
    chain_a_tx_notify: Option<&mpsc::Sender<String>>,
    tx_hash: &str,
) -> AppResult<()> {
    let row = match store.find_chain_tx(side, tx_hash).await? {
        Some(row) => row,
        None => {
            tracing::warn!(side = side.as_str(), tx = tx_hash, "ingest: tx not yet indexed, skipping");
            return Ok(());
        }
    };

    if !row.asset.eq_ignore_ascii_case(token_address) {
        tracing::debug!(side = side.as_str(), tx = tx_hash, asset = %row.asset, "ingest: asset is not T, skipping");
        return Ok(());
    }

    let is_outbound = row.from_addr.eq_ignore_ascii_case(operator_address);
    let is_inbound = row.to_addr.eq_ignore_ascii_case(operator_address);

    if !is_outbound && !is_inbound {
        return Ok(());
    }

    // Chain A's own outbound broadcasts short-circuit the send pipeline's
    // wait loop the moment they're observed landing at all, ahead of
    // reaching full confirmation depth -- see `BridgeContext`.
    if is_outbound {
        if let Some(notify) = chain_a_tx_notify {
            // Drop-on-full per spec: this channel is an optimization, not a
            // correctness path, and the 60s poll in the send pipeline's
            // waiter recovers a dropped signal -- so a blocking `send`
            // here would be wrong (it could stall the ingest loop on a
            // full channel for no safety benefit).
            if let Err(mpsc::error::TrySendError::Full(_)) = notify.try_send(tx_hash.to_string()) {
                tracing::debug!(tx = tx_hash, "chain A tx channel full, dropping signal");
            }
        }
    }

    let reverify = matches!(side, ChainSide::A);
    let confirmed = crate::confirm::wait_for_confirmation(
        adapter,
        tx_hash,
        row.block as u64,
        confirm_count,
        poll_interval,
        reverify,
    )
    .await?;

    if !confirmed {
        tracing::warn!(side = side.as_str(), tx = tx_hash, "ingest: tx did not reach confirmation (replaced)");
        return Ok(());
    }

    let observed = ObservedTx {
        hash: row.tx.clone(),
        from_addr: row.from_addr.clone(),
        to_addr: row.to_addr.clone(),
        value: row.value,
        block: row.block as u64,
        create_time: row.create_time,
    };

    if is_inbound {
        matcher::inbound_leg(store, side, &observed).await?;
    } else {
        matcher::outbound_leg(store, &observed).await?;
    }

    Ok(())
}
