use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{BrokerMessage, MessageBroker};

/// In-process test double for [`MessageBroker`]. Messages pushed via
/// [`InMemoryBroker::push`] are delivered in order; `commit` is a no-op
/// recorded for assertions.
pub struct InMemoryBroker {
    receiver: Mutex<mpsc::UnboundedReceiver<BrokerMessage>>,
    sender: mpsc::UnboundedSender<BrokerMessage>,
    committed: Mutex<Vec<BrokerMessage>>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            receiver: Mutex::new(receiver),
            sender,
            committed: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, key: impl Into<String>) {
        let _ = self.sender.send(BrokerMessage { key: key.into() });
    }

    pub fn committed(&self) -> Vec<BrokerMessage> {
        self.committed.lock().unwrap().clone()
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageBroker for InMemoryBroker {
    async fn recv(&self) -> Result<Option<BrokerMessage>> {
        Ok(self.receiver.lock().unwrap().try_recv().ok())
    }

    async fn commit(&self, message: &BrokerMessage) -> Result<()> {
        self.committed.lock().unwrap().push(message.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_pushed_messages_in_order() {
        let broker = InMemoryBroker::new();
        broker.push("tx1");
        broker.push("tx2");

        assert_eq!(broker.recv().await.unwrap().unwrap().key, "tx1");
        assert_eq!(broker.recv().await.unwrap().unwrap().key, "tx2");
        assert!(broker.recv().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn commit_is_recorded() {
        let broker = InMemoryBroker::new();
        broker.push("tx1");
        let msg = broker.recv().await.unwrap().unwrap();
        broker.commit(&msg).await.unwrap();

        assert_eq!(broker.committed(), vec![msg]);
    }
}
