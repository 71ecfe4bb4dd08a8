//! File service: tree metadata plus storage-coordinator placement.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use stratum_broker::parse_node_id;
use stratum_core::error::{AppError, ErrorKind};
use stratum_core::result::AppResult;
use stratum_core::traits::{Placement, StorageCoordinator};
use stratum_core::types::{DirectoryId, FileId};
use stratum_entity::File;
use stratum_worker::{SweepJob, SweepQueue};

use crate::context::RequestContext;
use crate::directory::service::validate_name;
use crate::tree::TreeEngine;

/// A file together with the storage node holding its bytes.
#[derive(Debug, Clone, Serialize)]
pub struct FileHandle {
    /// File metadata.
    pub file: File,
    /// Storage node host.
    pub host: String,
    /// Connection handle issued by that node.
    pub connection_id: Uuid,
}

impl FileHandle {
    fn new(file: File, placement: Placement) -> Self {
        Self {
            file,
            host: placement.host,
            connection_id: placement.connection_id,
        }
    }
}

/// Manages file operations.
#[derive(Debug, Clone)]
pub struct FileService {
    /// Tree engine.
    engine: TreeEngine,
    /// Storage coordinator reached through the broker.
    coordinator: Arc<dyn StorageCoordinator>,
    /// Background sweep queue.
    sweeps: SweepQueue,
    /// Identity the storage coordinator calls back with.
    service_account: String,
}

impl FileService {
    /// Creates a new file service.
    pub fn new(
        engine: TreeEngine,
        coordinator: Arc<dyn StorageCoordinator>,
        sweeps: SweepQueue,
        service_account: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            coordinator,
            sweeps,
            service_account: service_account.into(),
        }
    }

    /// Creates the file record, then asks the coordinator where to put the
    /// bytes.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        parent_id: DirectoryId,
        name: &str,
        extension: &str,
        size: u64,
    ) -> AppResult<FileHandle> {
        let name = validate_name(name)?;
        let file = self
            .engine
            .create_file(&parent_id, &ctx.user_id, name, extension, size)
            .await?;

        let placement = self
            .coordinator
            .create(file.id.object_id(), size)
            .await
            .map_err(unreachable_fs)?;

        info!(
            user_id = %ctx.user_id,
            file_id = %file.id,
            host = %placement.host,
            "File placed"
        );
        Ok(FileHandle::new(file, placement))
    }

    /// Gets a file and a placement to read it from.
    pub async fn get(&self, ctx: &RequestContext, id: FileId) -> AppResult<FileHandle> {
        let file = self.engine.file(&id).await?;
        ctx.ensure_readable(&file.user_id, file.public)?;

        let placement = self
            .coordinator
            .open(file.id.object_id(), file.size)
            .await
            .map_err(unreachable_fs)?;
        Ok(FileHandle::new(file, placement))
    }

    /// Resizes a file and asks the coordinator for a placement to write to.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: FileId,
        size: u64,
    ) -> AppResult<Placement> {
        self.owned(ctx, &id).await?;
        let file = self.engine.resize_file(&id, size).await?;

        self.coordinator
            .update(file.id.object_id(), size)
            .await
            .map_err(unreachable_fs)
    }

    /// Deletes a file. `raw` is either the hex id or the derived content
    /// uuid the coordinator knows it by.
    pub async fn delete(&self, ctx: &RequestContext, raw: &str) -> AppResult<()> {
        let id = FileId::from(parse_node_id(raw)?);
        let is_service = ctx.user_id == self.service_account;

        if !is_service {
            self.owned(ctx, &id).await?;
        }
        let file = self.engine.delete_file(&id).await?;

        if is_service {
            info!(file_id = %id, "File deleted by storage coordinator");
        } else {
            self.sweeps.enqueue(SweepJob::ReleaseContent {
                file_id: id,
                size: file.size,
            });
        }
        Ok(())
    }

    /// Renames a file.
    pub async fn rename(&self, ctx: &RequestContext, id: FileId, name: &str) -> AppResult<File> {
        let name = validate_name(name)?;
        self.owned(ctx, &id).await?;
        self.engine.rename_file(&id, name).await
    }

    /// Moves a file under `to`. The caller must own both.
    pub async fn move_to(
        &self,
        ctx: &RequestContext,
        id: FileId,
        to: DirectoryId,
    ) -> AppResult<File> {
        self.owned(ctx, &id).await?;
        let target = self.engine.directory(&to).await?;
        ctx.ensure_owner(&target.user_id)?;
        self.engine.move_file(&id, &to).await
    }

    /// Sets the public flag.
    pub async fn share(&self, ctx: &RequestContext, id: FileId, public: bool) -> AppResult<File> {
        self.owned(ctx, &id).await?;
        self.engine.share_file(&id, public).await
    }

    /// Flips the starred flag.
    pub async fn star(&self, ctx: &RequestContext, id: FileId) -> AppResult<File> {
        self.owned(ctx, &id).await?;
        self.engine.star_file(&id).await
    }

    async fn owned(&self, ctx: &RequestContext, id: &FileId) -> AppResult<File> {
        let file = self.engine.file(id).await?;
        ctx.ensure_owner(&file.user_id)?;
        Ok(file)
    }
}

fn unreachable_fs(e: AppError) -> AppError {
    warn!(error = %e, "Storage coordinator call failed");
    AppError::with_source(ErrorKind::Internal, "unable to communicate with FS", e)
}
