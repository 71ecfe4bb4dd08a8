//! Directory mutations.

use chrono::Utc;
use tracing::{info, warn};

use stratum_core::error::{AppError, ErrorKind};
use stratum_core::result::AppResult;
use stratum_core::types::{ChildPage, DirectoryId};
use stratum_entity::{Directory, DirectoryPatch, DirectorySelector, DirectoryUpdate};
use stratum_worker::SweepJob;

use super::{TreeEngine, signed};

impl TreeEngine {
    /// Return the root of `user_id`, creating it on first access.
    pub async fn root(&self, user_id: &str) -> AppResult<Directory> {
        if let Some(root) = self.store.find_root(user_id).await? {
            return Ok(root);
        }

        let root = Directory::new_root(user_id);
        match self.store.insert_directory(&root).await {
            Ok(()) => {
                info!(user_id = %user_id, directory_id = %root.id, "Root directory created");
                Ok(root)
            }
            // Lost a creation race; the winner's root is the one to use.
            Err(e) if e.kind == ErrorKind::Conflict => self
                .store
                .find_root(user_id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("root of {user_id} not found"))),
            Err(e) => Err(e),
        }
    }

    /// A directory with one page of its children.
    pub async fn directory_page(&self, id: &DirectoryId, page: &ChildPage) -> AppResult<Directory> {
        Ok(self.directory(id).await?.into_page(page))
    }

    /// Create `name` under `parent_id` on behalf of `user_id`.
    pub async fn create_directory(
        &self,
        parent_id: &DirectoryId,
        user_id: &str,
        name: &str,
    ) -> AppResult<Directory> {
        let parent = self.directory(parent_id).await?;
        if parent.user_id != user_id {
            return Err(AppError::wrong_user());
        }

        let dir = Directory::new_child(&parent, user_id, name);
        self.store.insert_directory(&dir).await?;
        self.store
            .update_directory(parent_id, &DirectoryUpdate::AttachDirectory(Box::new(dir.clone())))
            .await?;

        info!(user_id = %user_id, directory_id = %dir.id, parent_id = %parent_id, "Directory created");
        Ok(dir)
    }

    /// Rename a directory, its parent's mirror, and every cached path entry.
    pub async fn rename_directory(&self, id: &DirectoryId, name: &str) -> AppResult<Directory> {
        let patch = DirectoryPatch {
            name: Some(name.to_string()),
            updated_at: Some(Utc::now()),
            ..Default::default()
        };
        let dir = self.set_directory(id, patch).await?;

        let rewritten = self
            .store
            .update_directories(
                &DirectorySelector::PathReferences(*id),
                &DirectoryUpdate::RenameAncestor {
                    id: *id,
                    name: name.to_string(),
                },
            )
            .await?;

        info!(directory_id = %id, rewritten, "Directory renamed");
        Ok(dir)
    }

    /// Set the public flag on a directory and its parent's mirror.
    pub async fn share_directory(&self, id: &DirectoryId, public: bool) -> AppResult<Directory> {
        let patch = DirectoryPatch {
            public: Some(public),
            updated_at: Some(Utc::now()),
            ..Default::default()
        };
        self.set_directory(id, patch).await
    }

    /// Flip the starred flag and copy the new value into the parent's mirror.
    pub async fn star_directory(&self, id: &DirectoryId) -> AppResult<Directory> {
        let dir = self
            .store
            .update_directory(
                id,
                &DirectoryUpdate::ToggleStarred {
                    updated_at: Utc::now(),
                },
            )
            .await?
            .ok_or_else(|| AppError::not_found(format!("directory {id} not found")))?;

        // A concurrent star can interleave here; the mirror takes whichever
        // value is written last.
        if let Some(parent_id) = dir.parent_directory_id {
            let patch = DirectoryPatch {
                starred: Some(dir.starred),
                updated_at: Some(dir.updated_at),
                ..Default::default()
            };
            self.store
                .update_directory(&parent_id, &DirectoryUpdate::SetChildDirectory { id: *id, patch })
                .await?;
        }
        Ok(dir)
    }

    /// Move a directory under `to`.
    pub async fn move_directory(&self, id: &DirectoryId, to: &DirectoryId) -> AppResult<Directory> {
        let dir = self.directory(id).await?;
        let Some(old_parent) = dir.parent_directory_id else {
            return Err(AppError::validation("root directory cannot be moved"));
        };
        let target = self.directory(to).await?;
        if target.id == dir.id || target.has_ancestor(&dir.id) {
            return Err(AppError::validation(
                "directory cannot be moved into itself or its descendants",
            ));
        }
        if target.user_id != dir.user_id {
            return Err(AppError::wrong_user());
        }

        // Detach from the old parent and shrink the old chain.
        self.store
            .update_directory(&old_parent, &DirectoryUpdate::DetachDirectory(*id))
            .await?;
        self.propagate_size(&dir.ancestor_ids(), -signed(dir.size))
            .await?;

        // Reattach under the target and grow the new chain.
        let new_path = target.child_path();
        let moved = self
            .store
            .update_directory(
                id,
                &DirectoryUpdate::Relocate {
                    parent_id: *to,
                    path: new_path.clone(),
                    updated_at: Utc::now(),
                },
            )
            .await?
            .ok_or_else(|| AppError::not_found(format!("directory {id} not found")))?;
        self.store
            .update_directory(to, &DirectoryUpdate::AttachDirectory(Box::new(moved.clone())))
            .await?;
        self.propagate_size(&target.lineage(), signed(moved.size))
            .await?;

        // Rebase every descendant path onto the new location.
        let rebased = self
            .store
            .update_directories(
                &DirectorySelector::PathReferences(*id),
                &DirectoryUpdate::RebaseAncestor {
                    id: *id,
                    prefix: new_path,
                },
            )
            .await?;

        info!(
            directory_id = %id,
            from = %old_parent,
            to = %to,
            rebased,
            "Directory moved"
        );
        Ok(moved)
    }

    /// Delete a directory and schedule the sweep of everything below it.
    pub async fn delete_directory(&self, id: &DirectoryId) -> AppResult<Directory> {
        let dir = self.directory(id).await?;
        let Some(parent_id) = dir.parent_directory_id else {
            return Err(AppError::validation("root directory cannot be deleted"));
        };

        self.store
            .update_directory(&parent_id, &DirectoryUpdate::DetachDirectory(*id))
            .await?;
        self.propagate_size(&dir.ancestor_ids(), -signed(dir.size))
            .await?;
        if !self.store.delete_directory(id).await? {
            warn!(directory_id = %id, "Directory vanished before delete");
        }

        let job = SweepJob::CascadeDelete {
            directories: dir.directories.iter().map(|d| d.id).collect(),
            files: dir.files.iter().map(|f| f.id).collect(),
        };
        self.sweeps.enqueue(job);

        info!(directory_id = %id, size = dir.size, "Directory deleted");
        Ok(dir)
    }

    /// Apply `patch` to a directory and the same patch to its parent's mirror.
    async fn set_directory(&self, id: &DirectoryId, patch: DirectoryPatch) -> AppResult<Directory> {
        let dir = self
            .store
            .update_directory(id, &DirectoryUpdate::Set(patch.clone()))
            .await?
            .ok_or_else(|| AppError::not_found(format!("directory {id} not found")))?;

        if let Some(parent_id) = dir.parent_directory_id {
            self.store
                .update_directory(&parent_id, &DirectoryUpdate::SetChildDirectory { id: *id, patch })
                .await?;
        }
        Ok(dir)
    }
}
