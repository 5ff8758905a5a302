//! Owns the state that the original kept in package-level globals
//! (`var ethTxChan chan string`). Spec §9 flags global ticker/channel
//! singletons for redesign; here the channel is a field on an explicitly
//! constructed, explicitly passed `BridgeContext` instead of a `static`.

use tokio::sync::mpsc;

/// Capacity chosen to match the original's `make(chan string, 10000)`.
const CHAIN_A_TX_CHANNEL_CAPACITY: usize = 10_000;

/// Shared wiring between the chain-A ingest loop and the chain-A send
/// pipeline: when the ingest loop observes one of our own outbound chain-A
/// txs land, it notifies the send pipeline's wait loop directly instead of
/// making it poll the RPC node on every tick.
pub struct BridgeContext {
    chain_a_tx_tx: mpsc::Sender<String>,
    chain_a_tx_rx: Option<mpsc::Receiver<String>>,
}

impl BridgeContext {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(CHAIN_A_TX_CHANNEL_CAPACITY);
        Self {
            chain_a_tx_tx: tx,
            chain_a_tx_rx: Some(rx),
        }
    }

    pub fn chain_a_tx_sender(&self) -> mpsc::Sender<String> {
        self.chain_a_tx_tx.clone()
    }

    /// Takes the receiver; callable exactly once (by the chain-A send
    /// pipeline task at startup).
    pub fn take_chain_a_tx_receiver(&mut self) -> mpsc::Receiver<String> {
        self.chain_a_tx_rx
            .take()
            .expect("chain A tx receiver already taken")
    }
}

impl Default for BridgeContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sender_delivers_to_receiver() {
        let mut ctx = BridgeContext::new();
        let sender = ctx.chain_a_tx_sender();
        let mut receiver = ctx.take_chain_a_tx_receiver();

        sender.send("0xabc".to_string()).await.unwrap();
        assert_eq!(receiver.recv().await, Some("0xabc".to_string()));
    }

    #[test]
    #[should_panic(expected = "already taken")]
    fn receiver_can_only_be_taken_once() {
        let mut ctx = BridgeContext::new();
        let _first = ctx.take_chain_a_tx_receiver();
        let _second = ctx.take_chain_a_tx_receiver();
    }
}
