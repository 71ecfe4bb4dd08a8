//! File mutations.

use chrono::Utc;
use tracing::{info, warn};

use stratum_core::error::AppError;
use stratum_core::result::AppResult;
use stratum_core::types::{DirectoryId, FileId};
use stratum_entity::{DirectoryUpdate, File, FilePatch, FileUpdate};

use super::{TreeEngine, signed};

impl TreeEngine {
    /// Create a file record under `parent_id` on behalf of `user_id`.
    pub async fn create_file(
        &self,
        parent_id: &DirectoryId,
        user_id: &str,
        name: &str,
        extension: &str,
        size: u64,
    ) -> AppResult<File> {
        let parent = self.directory(parent_id).await?;
        if parent.user_id != user_id {
            return Err(AppError::wrong_user());
        }

        let file = File::new(*parent_id, user_id, name, extension, size);
        self.store.insert_file(&file).await?;
        self.store
            .update_directory(parent_id, &DirectoryUpdate::AttachFile(Box::new(file.clone())))
            .await?;
        self.propagate_size(&parent.lineage(), signed(size)).await?;

        info!(user_id = %user_id, file_id = %file.id, parent_id = %parent_id, size, "File created");
        Ok(file)
    }

    /// Rename a file and its parent's mirror.
    pub async fn rename_file(&self, id: &FileId, name: &str) -> AppResult<File> {
        let patch = FilePatch {
            name: Some(name.to_string()),
            updated_at: Some(Utc::now()),
            ..Default::default()
        };
        let file = self.set_file(id, patch).await?;
        info!(file_id = %id, "File renamed");
        Ok(file)
    }

    /// Set the public flag on a file and its parent's mirror.
    pub async fn share_file(&self, id: &FileId, public: bool) -> AppResult<File> {
        let patch = FilePatch {
            public: Some(public),
            updated_at: Some(Utc::now()),
            ..Default::default()
        };
        self.set_file(id, patch).await
    }

    /// Flip the starred flag and copy the new value into the parent's mirror.
    pub async fn star_file(&self, id: &FileId) -> AppResult<File> {
        let file = self
            .store
            .update_file(
                id,
                &FileUpdate::ToggleStarred {
                    updated_at: Utc::now(),
                },
            )
            .await?
            .ok_or_else(|| AppError::not_found(format!("file {id} not found")))?;

        let patch = FilePatch {
            starred: Some(file.starred),
            updated_at: Some(file.updated_at),
            ..Default::default()
        };
        self.store
            .update_directory(
                &file.parent_directory_id,
                &DirectoryUpdate::SetChildFile { id: *id, patch },
            )
            .await?;
        Ok(file)
    }

    /// Change a file's recorded size and carry the difference up the tree.
    pub async fn resize_file(&self, id: &FileId, size: u64) -> AppResult<File> {
        let before = self.file(id).await?;
        let parent = self.directory(&before.parent_directory_id).await?;
        let delta = signed(size).saturating_sub(signed(before.size));

        let patch = FilePatch {
            size: Some(size),
            updated_at: Some(Utc::now()),
            ..Default::default()
        };
        let file = self.set_file(id, patch).await?;
        self.propagate_size(&parent.lineage(), delta).await?;

        info!(file_id = %id, old_size = before.size, new_size = size, "File resized");
        Ok(file)
    }

    /// Move a file under `to`.
    pub async fn move_file(&self, id: &FileId, to: &DirectoryId) -> AppResult<File> {
        let file = self.file(id).await?;
        let target = self.directory(to).await?;
        if target.user_id != file.user_id {
            return Err(AppError::wrong_user());
        }

        let old_parent = file.parent_directory_id;
        match self.store.find_directory(&old_parent).await? {
            Some(parent) => {
                self.store
                    .update_directory(&old_parent, &DirectoryUpdate::DetachFile(*id))
                    .await?;
                self.propagate_size(&parent.lineage(), -signed(file.size))
                    .await?;
            }
            None => warn!(file_id = %id, parent_id = %old_parent, "File parent missing during move"),
        }

        let moved = self
            .store
            .update_file(
                id,
                &FileUpdate::Relocate {
                    parent_id: *to,
                    updated_at: Utc::now(),
                },
            )
            .await?
            .ok_or_else(|| AppError::not_found(format!("file {id} not found")))?;
        self.store
            .update_directory(to, &DirectoryUpdate::AttachFile(Box::new(moved.clone())))
            .await?;
        self.propagate_size(&target.lineage(), signed(moved.size))
            .await?;

        info!(file_id = %id, from = %old_parent, to = %to, "File moved");
        Ok(moved)
    }

    /// Delete a file record, detaching it and shrinking its ancestors.
    /// Releasing the bytes is left to the caller.
    pub async fn delete_file(&self, id: &FileId) -> AppResult<File> {
        let file = self.file(id).await?;

        if let Some(parent) = self.store.find_directory(&file.parent_directory_id).await? {
            self.store
                .update_directory(&parent.id, &DirectoryUpdate::DetachFile(*id))
                .await?;
            self.propagate_size(&parent.lineage(), -signed(file.size))
                .await?;
        }
        self.store.delete_file(id).await?;

        info!(file_id = %id, size = file.size, "File deleted");
        Ok(file)
    }

    /// Apply `patch` to a file and the same patch to its parent's mirror.
    async fn set_file(&self, id: &FileId, patch: FilePatch) -> AppResult<File> {
        let file = self
            .store
            .update_file(id, &FileUpdate::Set(patch.clone()))
            .await?
            .ok_or_else(|| AppError::not_found(format!("file {id} not found")))?;

        self.store
            .update_directory(
                &file.parent_directory_id,
                &DirectoryUpdate::SetChildFile { id: *id, patch },
            )
            .await?;
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use stratum_core::error::ErrorKind;

    use super::super::testing::{assert_consistent, engine};
    use super::*;

    #[tokio::test]
    async fn sizes_stay_additive_through_a_mixed_sequence() {
        let (engine, store, _rx) = engine();
        let root = engine.root("u1").await.unwrap();
        let a = engine.create_directory(&root.id, "u1", "a").await.unwrap();
        let b = engine.create_directory(&a.id, "u1", "b").await.unwrap();
        let c = engine.create_directory(&root.id, "u1", "c").await.unwrap();

        let f1 = engine.create_file(&b.id, "u1", "f1", "bin", 100).await.unwrap();
        let f2 = engine.create_file(&a.id, "u1", "f2", "bin", 30).await.unwrap();
        engine.create_file(&c.id, "u1", "f3", "bin", 7).await.unwrap();
        assert_eq!(assert_consistent(&store, &root).await, 137);

        engine.resize_file(&f1.id, 40).await.unwrap();
        assert_eq!(assert_consistent(&store, &root).await, 77);

        engine.move_file(&f2.id, &c.id).await.unwrap();
        assert_eq!(assert_consistent(&store, &root).await, 77);
        assert_eq!(engine.directory(&c.id).await.unwrap().size, 37);

        engine.move_directory(&b.id, &c.id).await.unwrap();
        assert_eq!(assert_consistent(&store, &root).await, 77);
        assert_eq!(engine.directory(&a.id).await.unwrap().size, 0);

        engine.delete_file(&f1.id).await.unwrap();
        assert_eq!(assert_consistent(&store, &root).await, 37);
    }

    #[tokio::test]
    async fn rename_share_and_star_reach_the_mirror() {
        let (engine, store, _rx) = engine();
        let root = engine.root("u1").await.unwrap();
        let f = engine.create_file(&root.id, "u1", "f", "txt", 1).await.unwrap();

        engine.rename_file(&f.id, "g").await.unwrap();
        engine.share_file(&f.id, true).await.unwrap();
        assert!(engine.star_file(&f.id).await.unwrap().starred);
        assert!(!engine.star_file(&f.id).await.unwrap().starred);

        let root_doc = engine.directory(&root.id).await.unwrap();
        assert_eq!(root_doc.files[0].name, "g");
        assert!(root_doc.files[0].public);
        assert_consistent(&store, &root).await;
    }

    #[tokio::test]
    async fn move_across_owners_is_rejected() {
        let (engine, _, _rx) = engine();
        let mine = engine.root("u1").await.unwrap();
        let theirs = engine.root("u2").await.unwrap();
        let f = engine.create_file(&mine.id, "u1", "f", "txt", 1).await.unwrap();

        let err = engine.move_file(&f.id, &theirs.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let (engine, _, _rx) = engine();
        let err = engine.delete_file(&FileId::new()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
