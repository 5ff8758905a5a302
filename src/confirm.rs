//! Confirmation gate: block processing of an observed chain tx until the
//! chain head has advanced `confirm_count` blocks past the tx's block.
//! Grounded in `monitor.go::CheckEthBlockNumber`/`CheckNeoBlockNumber`.

use std::time::Duration;

use anyhow::Result;

use crate::chain::ChainAdapter;

/// Polls `adapter.block_number()` on `poll_interval` until
/// `head >= at_block + confirm_count`.
///
/// When `reverify_tx` is set (chain A), once the depth is reached the tx is
/// re-queried; if it has vanished (replaced out of the chain) this returns
/// `Ok(false)` instead of `Ok(true)`. Chain N never re-verifies -- reaching
/// the required height is itself the confirmation per the original.
pub async fn wait_for_confirmation(
    adapter: &dyn ChainAdapter,
    tx_hash: &str,
    at_block: u64,
    confirm_count: u64,
    poll_interval: Duration,
    reverify_tx: bool,
) -> Result<bool> {
    let needed = at_block + confirm_count;

    loop {
        tokio::time::sleep(poll_interval).await;

        let head = match adapter.block_number().await {
            Ok(h) => h,
            Err(e) => {
                tracing::error!(tx = tx_hash, error = %e, "confirmation gate: block_number failed");
                continue;
            }
        };

        tracing::debug!(tx = tx_hash, head, needed, "confirmation gate poll");

        if head < needed {
            continue;
        }

        if reverify_tx {
            return match adapter.get_tx(tx_hash).await {
                Ok(Some(())) => Ok(true),
                Ok(None) => {
                    tracing::error!(tx = tx_hash, "tx was replaced, confirmation failed");
                    Ok(false)
                }
                Err(e) => Err(e),
            };
        }

        return Ok(true);
    }
}
