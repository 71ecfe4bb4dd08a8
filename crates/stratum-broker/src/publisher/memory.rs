//! In-process publisher over a broadcast channel.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;

use stratum_core::result::AppResult;
use stratum_core::traits::MessagePublisher;

/// A message seen by subscribers: topic and payload.
pub type Published = (String, Vec<u8>);

/// Broadcast-backed publisher for single-node deployments and tests.
#[derive(Debug, Clone)]
pub struct MemoryPublisher {
    sender: broadcast::Sender<Published>,
}

impl MemoryPublisher {
    /// Create a publisher buffering up to `capacity` messages per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to every message published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Published> {
        self.sender.subscribe()
    }
}

impl Default for MemoryPublisher {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl MessagePublisher for MemoryPublisher {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> AppResult<()> {
        // Like Redis PUBLISH, a message nobody listens to is not an error.
        let receivers = self
            .sender
            .send((topic.to_string(), payload))
            .unwrap_or(0);
        debug!(topic = %topic, receivers, "Published in-process message");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_topic_and_payload() {
        let publisher = MemoryPublisher::default();
        let mut rx = publisher.subscribe();
        publisher.publish("t", vec![1, 2, 3]).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), ("t".to_string(), vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn publishing_without_subscribers_succeeds() {
        let publisher = MemoryPublisher::default();
        assert!(publisher.publish("t", vec![]).await.is_ok());
    }
}
