//! Tree consistency engine.
//!
//! Keeps the denormalized tree consistent: every directory embeds mirrors of
//! its direct children, every node caches its ancestor path, and every
//! directory caches the cumulative size of its subtree. Each mutation is a
//! sequence of single-document writes; there is no cross-document
//! transaction, so a failure part-way leaves earlier writes in place.
//!
//! Callers are expected to have authenticated the user and validated the
//! input. Ownership of the nodes being mutated is checked by the services.

mod directory;
mod file;

use std::sync::Arc;

use tracing::debug;

use stratum_core::error::AppError;
use stratum_core::result::AppResult;
use stratum_core::types::{DirectoryId, FileId};
use stratum_database::TreeStore;
use stratum_entity::{Directory, DirectorySelector, DirectoryUpdate, File, SearchQuery, SearchResult};
use stratum_worker::SweepQueue;

/// Mutations and reads over the directory tree.
#[derive(Debug, Clone)]
pub struct TreeEngine {
    store: Arc<dyn TreeStore>,
    sweeps: SweepQueue,
}

impl TreeEngine {
    /// Create an engine over `store` that hands cascading deletes to `sweeps`.
    pub fn new(store: Arc<dyn TreeStore>, sweeps: SweepQueue) -> Self {
        Self { store, sweeps }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn TreeStore> {
        &self.store
    }

    /// The queue cascading deletes are handed to.
    pub fn sweeps(&self) -> &SweepQueue {
        &self.sweeps
    }

    /// Load a directory or fail with NotFound.
    pub async fn directory(&self, id: &DirectoryId) -> AppResult<Directory> {
        self.store
            .find_directory(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("directory {id} not found")))
    }

    /// Load a file or fail with NotFound.
    pub async fn file(&self, id: &FileId) -> AppResult<File> {
        self.store
            .find_file(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("file {id} not found")))
    }

    /// Filter, sort and page both collections for `user_id`.
    pub async fn search(&self, user_id: &str, query: &SearchQuery) -> AppResult<SearchResult> {
        query.filter.validate()?;
        self.store.search(user_id, query).await
    }

    /// Add `delta` to the size of every directory in `chain`, on canonical
    /// documents and on the mirrors their parents embed.
    ///
    /// `chain` must be a root-to-node ancestor chain, so the parent of every
    /// element except the first is also in the chain.
    async fn propagate_size(&self, chain: &[DirectoryId], delta: i64) -> AppResult<()> {
        if chain.is_empty() || delta == 0 {
            return Ok(());
        }

        let canonical = self
            .store
            .update_directories(&DirectorySelector::Ids(chain.to_vec()), &DirectoryUpdate::AddSize(delta))
            .await?;
        let mirrors = self
            .store
            .update_directories(
                &DirectorySelector::ParentsOf(chain.to_vec()),
                &DirectoryUpdate::AddChildDirectorySize {
                    ids: chain.to_vec(),
                    delta,
                },
            )
            .await?;

        debug!(
            chain_len = chain.len(),
            delta,
            canonical,
            mirrors,
            "Propagated size change"
        );
        Ok(())
    }
}

/// Convert a byte count into a signed delta.
fn signed(size: u64) -> i64 {
    i64::try_from(size).unwrap_or(i64::MAX)
}
