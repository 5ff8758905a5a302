//! Matches confirmed chain transactions to orders and drives their state
//! transitions. Grounded in `monitor.go::handleETHMessage`/
//! `handleNEOMessage`, generalized from two chain-specific functions into
//! one pair of chain-agnostic legs.

use chrono::{DateTime, Utc};

use crate::error::AppResult;
use crate::models::ChainSide;
use crate::store::OrderStore;

/// An observed, already-confirmed chain transaction, as read from the
/// read-only `chain_a_txs`/`chain_n_txs` tables.
#[derive(Debug, Clone)]
pub struct ObservedTx {
    pub hash: String,
    pub from_addr: String,
    pub to_addr: String,
    pub value: i64,
    pub block: u64,
    pub create_time: DateTime<Utc>,
}

/// Inbound leg: a user's deposit to the operator's wallet on `side`.
/// On a match: records `in_tx`, logs the deposit, and queues a SendOrder
/// for the opposite side, all in the one transaction
/// [`OrderStore::record_inbound_match`] opens, per spec.md §4.3. A tx with
/// no matching order is logged and swallowed -- it cannot be legitimate and
/// redelivery would not change that, so it is treated the same as a match
/// for commit purposes; only an `Err` (an actual DB failure) leaves the
/// broker message uncommitted for retry.
pub async fn inbound_leg(store: &OrderStore, side: ChainSide, tx: &ObservedTx) -> AppResult<()> {
    let order = match store
        .find_open_for_inbound(&tx.from_addr, tx.value, tx.create_time)
        .await?
    {
        Some(order) => order,
        None => {
            tracing::warn!(tx = %tx.hash, from = %tx.from_addr, value = tx.value, "no open order for inbound tx");
            return Ok(());
        }
    };

    let content = format!("recv TNC from {} success, tx: {}", tx.from_addr, tx.hash);
    let opposite = side.opposite();
    store
        .record_inbound_match(&order.tx, &tx.hash, &content, &order.to_addr, order.value, opposite)
        .await?;

    tracing::info!(order_tx = %order.tx, in_tx = %tx.hash, "inbound leg matched");
    metrics::counter!("matcher_inbound_matches_total").increment(1);

    Ok(())
}

/// Outbound leg: the operator's own settlement payment landing in the
/// user's wallet on `side`. On a match: records `out_tx` + completion time,
/// logs it, and marks the corresponding SendOrder confirmed, all in the one
/// transaction [`OrderStore::record_outbound_match`] opens. No-match is
/// swallowed the same way as [`inbound_leg`].
pub async fn outbound_leg(store: &OrderStore, tx: &ObservedTx) -> AppResult<()> {
    let order = match store
        .find_open_for_outbound(&tx.to_addr, tx.value, tx.create_time)
        .await?
    {
        Some(order) => order,
        None => {
            tracing::warn!(tx = %tx.hash, to = %tx.to_addr, value = tx.value, "no funded order for outbound tx");
            return Ok(());
        }
    };

    let content = format!("release TNC to {} success, tx: {}", tx.to_addr, tx.hash);
    store.record_outbound_match(&order.tx, &tx.hash, &content).await?;

    tracing::info!(order_tx = %order.tx, out_tx = %tx.hash, "outbound leg matched");
    metrics::counter!("matcher_outbound_matches_total").increment(1);

    Ok(())
}
