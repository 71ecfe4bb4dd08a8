//! Redis `PUBLISH` publisher.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::{debug, info};

use stratum_core::error::{AppError, ErrorKind};
use stratum_core::result::AppResult;
use stratum_core::traits::MessagePublisher;

/// Publisher that sends each payload with Redis `PUBLISH`.
#[derive(Clone)]
pub struct RedisPublisher {
    conn: ConnectionManager,
}

impl std::fmt::Debug for RedisPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisPublisher").finish_non_exhaustive()
    }
}

impl RedisPublisher {
    /// Connect to Redis at `url`.
    pub async fn connect(url: &str) -> AppResult<Self> {
        info!("Connecting publisher to Redis");

        let client = redis::Client::open(url).map_err(|e| {
            AppError::with_source(ErrorKind::Configuration, "Invalid Redis URL", e)
        })?;
        let conn = client.get_connection_manager().await.map_err(|e| {
            AppError::with_source(ErrorKind::ExternalService, "Redis connection failed", e)
        })?;

        info!("Publisher connected to Redis");
        Ok(Self { conn })
    }
}

#[async_trait]
impl MessagePublisher for RedisPublisher {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let receivers: i64 = redis::cmd("PUBLISH")
            .arg(topic)
            .arg(payload)
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::ExternalService, "Redis PUBLISH failed", e)
            })?;
        debug!(topic = %topic, receivers, "Published to Redis");
        Ok(())
    }
}
