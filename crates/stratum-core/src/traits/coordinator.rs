//! Seam to the external storage-node coordinator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::result::AppResult;
use crate::types::ObjectId;

/// Where the coordinator placed (or found) the bytes of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// Storage node the client should talk to.
    pub host: String,
    /// Connection handle issued by that node.
    pub connection_id: Uuid,
}

/// Content-affecting operations delegated to the storage coordinator.
///
/// Each call suspends until the coordinator answers or the configured
/// deadline elapses.
#[async_trait]
pub trait StorageCoordinator: Send + Sync + std::fmt::Debug + 'static {
    /// Reserve space for new content.
    async fn create(&self, content_id: ObjectId, size: u64) -> AppResult<Placement>;

    /// Locate existing content for reading.
    async fn open(&self, content_id: ObjectId, size: u64) -> AppResult<Placement>;

    /// Resize existing content.
    async fn update(&self, content_id: ObjectId, size: u64) -> AppResult<Placement>;

    /// Release the bytes backing the content.
    async fn delete(&self, content_id: ObjectId, size: u64) -> AppResult<()>;
}
