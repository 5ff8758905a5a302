//! Message broker abstraction the ingest loops consume. Production wiring
//! to a real queue is out of scope (spec.md's Non-goals); this trait is
//! the integration seam, grounded in the original's `gomq.Consumer`
//! interface (`Messages()`, `Errors()`, `Commit()`).

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

/// A single delivered message: the tx hash string, and an opaque token
/// used to acknowledge it once processing succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerMessage {
    pub key: String,
}

/// At-least-once delivery: `recv` may redeliver a message that was never
/// committed (e.g. after a crash). Implementations must tolerate duplicate
/// delivery -- the matcher's idempotency comes from its own query
/// predicates, not from broker semantics.
#[async_trait]
pub trait MessageBroker: Send + Sync {
    async fn recv(&self) -> Result<Option<BrokerMessage>>;
    async fn commit(&self, message: &BrokerMessage) -> Result<()>;
}
