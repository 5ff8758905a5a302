//! Background worker wiring: two ingest loops and two send-pipeline tickers,
//! one pair per chain side. Grounded in `monitor.go`'s `EthSendMoniter`/
//! `NeoSendMoniter` goroutines, which the original process launches
//! alongside the web server; here each loop is its own `tokio::spawn`ed
//! task instead of a bare goroutine, matching the teacher's
//! `tasks/deposit_monitor.rs` style of one `spawn` per independent loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::broker::MessageBroker;
use crate::models::ChainSide;
use crate::AppState;

const SEND_PIPELINE_TICK: Duration = Duration::from_secs(30);

/// Spawns all four background loops. `chain_a_tx_sender`/`chain_a_tx_receiver`
/// are the two ends of the bridge context's channel (see
/// [`crate::context::BridgeContext`]): the chain-A ingest loop notifies the
/// chain-A send pipeline the moment it observes one of our own outbound
/// broadcasts land, short-circuiting that pipeline's poll-based wait.
pub fn spawn_all(
    state: AppState,
    chain_a_broker: Arc<dyn MessageBroker>,
    chain_n_broker: Arc<dyn MessageBroker>,
    chain_a_tx_sender: mpsc::Sender<String>,
    chain_a_tx_receiver: mpsc::Receiver<String>,
) {
    spawn_ingest_loop(
        state.clone(),
        state.chain_a.clone(),
        chain_a_broker,
        ChainSide::A,
        state.chain_a_address.clone(),
        state.config.chain_a_tnc.clone(),
        state.config.chain_a_confirm_count,
        Duration::from_secs(state.config.chain_a_get_block_interval_secs),
        Some(chain_a_tx_sender),
    );

    spawn_ingest_loop(
        state.clone(),
        state.chain_n.clone(),
        chain_n_broker,
        ChainSide::N,
        state.chain_n_address.clone(),
        state.config.chain_n_tnc.clone(),
        state.config.chain_n_confirm_count,
        Duration::from_secs(state.config.chain_n_get_block_interval_secs),
        None,
    );

    spawn_send_pipeline_a(state.clone(), chain_a_tx_receiver);
    spawn_send_pipeline_n(state);
}

#[allow(clippy::too_many_arguments)]
fn spawn_ingest_loop(
    state: AppState,
    adapter: Arc<dyn crate::chain::ChainAdapter>,
    broker: Arc<dyn MessageBroker>,
    side: ChainSide,
    operator_address: String,
    token_address: String,
    confirm_count: u64,
    poll_interval: Duration,
    chain_a_tx_notify: Option<mpsc::Sender<String>>,
) {
    tokio::spawn(async move {
        crate::ingest::run(
            state.store,
            adapter,
            broker,
            side,
            operator_address,
            token_address,
            confirm_count,
            poll_interval,
            chain_a_tx_notify,
        )
        .await;
    });
}

fn spawn_send_pipeline_a(state: AppState, mut chain_a_tx_receiver: mpsc::Receiver<String>) {
    tokio::spawn(async move {
        let tax_rate = state.config.tax_rate_for(ChainSide::A);
        let mut interval = tokio::time::interval(SEND_PIPELINE_TICK);
        loop {
            interval.tick().await;
            if let Err(e) = crate::send_pipeline::run_tick(
                &state.store,
                state.chain_a.as_ref(),
                ChainSide::A,
                tax_rate,
                Some(&mut chain_a_tx_receiver),
            )
            .await
            {
                tracing::error!(side = "A", error = %e, "send pipeline tick failed");
            }
        }
    });
}

fn spawn_send_pipeline_n(state: AppState) {
    tokio::spawn(async move {
        let tax_rate = state.config.tax_rate_for(ChainSide::N);
        let mut interval = tokio::time::interval(SEND_PIPELINE_TICK);
        loop {
            interval.tick().await;
            if let Err(e) = crate::send_pipeline::run_tick(
                &state.store,
                state.chain_n.as_ref(),
                ChainSide::N,
                tax_rate,
                None,
            )
            .await
            {
                tracing::error!(side = "N", error = %e, "send pipeline tick failed");
            }
        }
    });
}
