//! Tree store abstraction.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use stratum_core::result::AppResult;
use stratum_core::types::{DirectoryId, FileId};
use stratum_entity::{
    Directory, DirectorySelector, DirectoryUpdate, File, FileUpdate, SearchQuery, SearchResult,
};

pub use memory::MemoryTreeStore;
pub use postgres::PgTreeStore;

/// Persistence over the `directories` and `files` collections.
///
/// Every write touches a single document atomically. Multi-document
/// operations ([`TreeStore::update_directories`]) apply the update to each
/// matching document independently; there is no cross-document transaction.
#[async_trait]
pub trait TreeStore: Send + Sync + std::fmt::Debug + 'static {
    /// Fetch a directory document.
    async fn find_directory(&self, id: &DirectoryId) -> AppResult<Option<Directory>>;

    /// Fetch the root directory of `user_id`.
    async fn find_root(&self, user_id: &str) -> AppResult<Option<Directory>>;

    /// Insert a directory document. Fails with `Conflict` if the id is taken,
    /// or if the document is a root and the user already has one.
    async fn insert_directory(&self, dir: &Directory) -> AppResult<()>;

    /// Apply `update` to one directory and return its post-image.
    async fn update_directory(
        &self,
        id: &DirectoryId,
        update: &DirectoryUpdate,
    ) -> AppResult<Option<Directory>>;

    /// Apply `update` to every directory matched by `selector`.
    /// Returns the number of documents that changed.
    async fn update_directories(
        &self,
        selector: &DirectorySelector,
        update: &DirectoryUpdate,
    ) -> AppResult<u64>;

    /// Delete a directory document. Returns whether it existed.
    async fn delete_directory(&self, id: &DirectoryId) -> AppResult<bool>;

    /// Fetch a file document.
    async fn find_file(&self, id: &FileId) -> AppResult<Option<File>>;

    /// Insert a file document.
    async fn insert_file(&self, file: &File) -> AppResult<()>;

    /// Apply `update` to one file and return its post-image.
    async fn update_file(&self, id: &FileId, update: &FileUpdate) -> AppResult<Option<File>>;

    /// Delete a file document. Returns whether it existed.
    async fn delete_file(&self, id: &FileId) -> AppResult<bool>;

    /// Filter, sort and page both collections for `user_id`.
    async fn search(&self, user_id: &str, query: &SearchQuery) -> AppResult<SearchResult>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> AppResult<()>;
}
