//! Correlation broker: publish a request, wait for the matching webhook.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, warn};
use uuid::Uuid;

use stratum_core::config::BrokerConfig;
use stratum_core::error::AppError;
use stratum_core::result::AppResult;
use stratum_core::traits::{MessagePublisher, Placement, StorageCoordinator};
use stratum_core::types::ObjectId;

use crate::codec::derive_content_id;
use crate::message::{Operation, Request, Response};
use crate::pending::PendingTable;

/// Storage coordinator client built on a pub/sub topic and a webhook.
#[derive(Debug, Clone)]
pub struct CorrelationBroker {
    publisher: Arc<dyn MessagePublisher>,
    pending: PendingTable,
    topic: String,
    host: String,
    deadline: Duration,
}

impl CorrelationBroker {
    /// Create a broker that publishes through `publisher`.
    pub fn new(publisher: Arc<dyn MessagePublisher>, config: &BrokerConfig) -> Self {
        Self {
            publisher,
            pending: PendingTable::new(Duration::from_secs(config.consumed_ttl_seconds)),
            topic: config.topic.clone(),
            host: config.host.clone(),
            deadline: Duration::from_secs(config.response_timeout_seconds),
        }
    }

    /// Table the webhook delivers responses into.
    pub fn pending(&self) -> &PendingTable {
        &self.pending
    }

    /// Issue `operation` and wait up to the configured deadline.
    pub async fn call(
        &self,
        operation: Operation,
        content_id: ObjectId,
        size: u64,
    ) -> AppResult<Response> {
        self.call_with_deadline(operation, content_id, size, self.deadline)
            .await
    }

    /// Issue `operation` and wait up to `deadline`.
    ///
    /// The response slot is released however the call ends, including when
    /// the returned future is dropped before completion.
    pub async fn call_with_deadline(
        &self,
        operation: Operation,
        content_id: ObjectId,
        size: u64,
        deadline: Duration,
    ) -> AppResult<Response> {
        let request = Request {
            correlation_id: Uuid::new_v4(),
            host: self.host.clone(),
            operation,
            derived_content_id: derive_content_id(content_id),
            size,
        };
        let correlation_id = request.correlation_id;
        let payload = request.encode()?;

        let (guard, rx) = self.pending.register(correlation_id)?;

        self.publisher
            .publish(&self.topic, payload)
            .await
            .map_err(|e| {
                error!(
                    correlation_id = %correlation_id,
                    operation = %operation,
                    error = %e,
                    "Failed to publish storage request"
                );
                AppError::internal(format!("failed to publish {operation} request: {e}"))
            })?;

        debug!(
            correlation_id = %correlation_id,
            operation = %operation,
            content_id = %content_id,
            "Waiting for storage coordinator"
        );

        let outcome = tokio::time::timeout(deadline, rx).await;
        drop(guard);

        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => {
                return Err(AppError::internal(format!(
                    "response slot {correlation_id} closed without a response"
                )));
            }
            Err(_) => {
                warn!(
                    correlation_id = %correlation_id,
                    operation = %operation,
                    deadline_ms = millis(deadline),
                    "Storage coordinator did not respond in time"
                );
                return Err(AppError::internal(format!(
                    "deadline exceeded waiting for {operation} response"
                )));
            }
        };

        if !response.error.is_empty() {
            warn!(
                correlation_id = %correlation_id,
                operation = %operation,
                error = %response.error,
                "Storage coordinator reported a failure"
            );
            return Err(AppError::external(format!(
                "storage coordinator failed {operation}: {}",
                response.error
            )));
        }

        Ok(response)
    }

    async fn place(&self, operation: Operation, content_id: ObjectId, size: u64) -> AppResult<Placement> {
        let response = self.call(operation, content_id, size).await?;
        Ok(Placement {
            host: response.host,
            connection_id: response.connection_id,
        })
    }
}

#[async_trait]
impl StorageCoordinator for CorrelationBroker {
    async fn create(&self, content_id: ObjectId, size: u64) -> AppResult<Placement> {
        self.place(Operation::Create, content_id, size).await
    }

    async fn open(&self, content_id: ObjectId, size: u64) -> AppResult<Placement> {
        self.place(Operation::Open, content_id, size).await
    }

    async fn update(&self, content_id: ObjectId, size: u64) -> AppResult<Placement> {
        self.place(Operation::Update, content_id, size).await
    }

    async fn delete(&self, content_id: ObjectId, size: u64) -> AppResult<()> {
        self.call(Operation::Delete, content_id, size).await?;
        Ok(())
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
