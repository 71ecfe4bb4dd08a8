//! Directory operations with ownership enforcement.

use tracing::info;

use stratum_core::error::AppError;
use stratum_core::result::AppResult;
use stratum_core::types::{ChildPage, DirectoryId};
use stratum_entity::{Directory, SearchQuery, SearchResult};

use crate::context::RequestContext;
use crate::tree::TreeEngine;

/// Manages directory operations on behalf of the caller.
#[derive(Debug, Clone)]
pub struct DirectoryService {
    /// Tree engine.
    engine: TreeEngine,
}

impl DirectoryService {
    /// Creates a new directory service.
    pub fn new(engine: TreeEngine) -> Self {
        Self { engine }
    }

    /// Gets a directory with one page of its children. Without an id the
    /// caller's root is returned, created on first access.
    pub async fn get(
        &self,
        ctx: &RequestContext,
        id: Option<DirectoryId>,
        page: &ChildPage,
    ) -> AppResult<Directory> {
        let Some(id) = id else {
            let root = self.engine.root(&ctx.user_id).await?;
            return Ok(root.into_page(page));
        };

        let dir = self.engine.directory(&id).await?;
        ctx.ensure_readable(&dir.user_id, dir.public)?;
        Ok(dir.into_page(page))
    }

    /// Creates a directory under `parent_id`.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        parent_id: DirectoryId,
        name: &str,
    ) -> AppResult<Directory> {
        let name = validate_name(name)?;
        self.engine
            .create_directory(&parent_id, &ctx.user_id, name)
            .await
    }

    /// Renames a directory.
    pub async fn rename(
        &self,
        ctx: &RequestContext,
        id: DirectoryId,
        name: &str,
    ) -> AppResult<Directory> {
        let name = validate_name(name)?;
        self.owned(ctx, &id).await?;
        self.engine.rename_directory(&id, name).await
    }

    /// Moves a directory under `to`. The caller must own both.
    pub async fn move_to(
        &self,
        ctx: &RequestContext,
        id: DirectoryId,
        to: DirectoryId,
    ) -> AppResult<Directory> {
        self.owned(ctx, &id).await?;
        self.owned(ctx, &to).await?;
        self.engine.move_directory(&id, &to).await
    }

    /// Deletes a directory. Its subtree is swept in the background.
    pub async fn delete(&self, ctx: &RequestContext, id: DirectoryId) -> AppResult<()> {
        self.owned(ctx, &id).await?;
        self.engine.delete_directory(&id).await?;
        info!(user_id = %ctx.user_id, directory_id = %id, "Directory delete accepted");
        Ok(())
    }

    /// Sets the public flag.
    pub async fn share(
        &self,
        ctx: &RequestContext,
        id: DirectoryId,
        public: bool,
    ) -> AppResult<Directory> {
        self.owned(ctx, &id).await?;
        self.engine.share_directory(&id, public).await
    }

    /// Flips the starred flag.
    pub async fn star(&self, ctx: &RequestContext, id: DirectoryId) -> AppResult<Directory> {
        self.owned(ctx, &id).await?;
        self.engine.star_directory(&id).await
    }

    /// Searches the caller's directories and files.
    pub async fn search(&self, ctx: &RequestContext, query: &SearchQuery) -> AppResult<SearchResult> {
        self.engine.search(&ctx.user_id, query).await
    }

    async fn owned(&self, ctx: &RequestContext, id: &DirectoryId) -> AppResult<Directory> {
        let dir = self.engine.directory(id).await?;
        ctx.ensure_owner(&dir.user_id)?;
        Ok(dir)
    }
}

/// Trimmed, non-empty node name.
pub(crate) fn validate_name(name: &str) -> AppResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("name cannot be empty"));
    }
    if name.contains('/') {
        return Err(AppError::validation("name cannot contain '/'"));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use stratum_core::error::ErrorKind;

    use super::*;
    use crate::tree::testing::engine;

    #[tokio::test]
    async fn private_directory_of_another_user_is_wrong_user() {
        let (engine, _, _rx) = engine();
        let service = DirectoryService::new(engine);
        let owner = RequestContext::new("u1");
        let other = RequestContext::new("u2");

        let root = service.get(&owner, None, &ChildPage::default()).await.unwrap();
        let secret = service.create(&owner, root.id, "secret").await.unwrap();

        let err = service
            .get(&other, Some(secret.id), &ChildPage::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.public_message(), "wrong user");

        service.share(&owner, secret.id, true).await.unwrap();
        assert!(
            service
                .get(&other, Some(secret.id), &ChildPage::default())
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn move_requires_owning_the_destination() {
        let (engine, _, _rx) = engine();
        let service = DirectoryService::new(engine);
        let u1 = RequestContext::new("u1");
        let u2 = RequestContext::new("u2");

        let r1 = service.get(&u1, None, &ChildPage::default()).await.unwrap();
        let r2 = service.get(&u2, None, &ChildPage::default()).await.unwrap();
        let a = service.create(&u1, r1.id, "a").await.unwrap();

        let err = service.move_to(&u1, a.id, r2.id).await.unwrap_err();
        assert_eq!(err.public_message(), "wrong user");
    }

    #[tokio::test]
    async fn blank_names_are_rejected() {
        let (engine, _, _rx) = engine();
        let service = DirectoryService::new(engine);
        let ctx = RequestContext::new("u1");
        let root = service.get(&ctx, None, &ChildPage::default()).await.unwrap();

        let err = service.create(&ctx, root.id, "   ").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }
}
