//! Outbound message channel.

use async_trait::async_trait;

use crate::result::AppResult;

/// Fire-and-forget publisher for a pub/sub channel without durability.
#[async_trait]
pub trait MessagePublisher: Send + Sync + std::fmt::Debug + 'static {
    /// Publish one payload on `topic`.
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> AppResult<()>;
}
