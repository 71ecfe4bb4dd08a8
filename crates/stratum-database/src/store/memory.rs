//! In-process tree store backed by concurrent maps.
//!
//! Each document sits behind its own DashMap entry lock, so a single update
//! is atomic with respect to other updates of the same document, matching
//! the per-document guarantee of the PostgreSQL backend.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use stratum_core::error::AppError;
use stratum_core::result::AppResult;
use stratum_core::types::{DirectoryId, FileId};
use stratum_entity::directory::listing::{sort_directories, sort_files};
use stratum_entity::{
    Directory, DirectorySelector, DirectoryUpdate, File, FileUpdate, SearchQuery, SearchResult,
};

use super::TreeStore;

/// Tree store that keeps documents in memory. Data is lost on drop.
#[derive(Debug, Default)]
pub struct MemoryTreeStore {
    directories: DashMap<DirectoryId, Directory>,
    files: DashMap<FileId, File>,
    roots: DashMap<String, DirectoryId>,
}

impl MemoryTreeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of directory documents.
    pub fn directory_count(&self) -> usize {
        self.directories.len()
    }

    /// Number of file documents.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

#[async_trait]
impl TreeStore for MemoryTreeStore {
    async fn find_directory(&self, id: &DirectoryId) -> AppResult<Option<Directory>> {
        Ok(self.directories.get(id).map(|d| d.value().clone()))
    }

    async fn find_root(&self, user_id: &str) -> AppResult<Option<Directory>> {
        let Some(id) = self.roots.get(user_id).map(|r| *r.value()) else {
            return Ok(None);
        };
        self.find_directory(&id).await
    }

    async fn insert_directory(&self, dir: &Directory) -> AppResult<()> {
        if dir.is_root() {
            match self.roots.entry(dir.user_id.clone()) {
                Entry::Occupied(_) => {
                    return Err(AppError::conflict(format!(
                        "user {} already has a root directory",
                        dir.user_id
                    )));
                }
                Entry::Vacant(slot) => {
                    slot.insert(dir.id);
                }
            }
        }

        match self.directories.entry(dir.id) {
            Entry::Occupied(_) => {
                if dir.is_root() {
                    self.roots.remove(&dir.user_id);
                }
                Err(AppError::conflict(format!("directory {} already exists", dir.id)))
            }
            Entry::Vacant(slot) => {
                slot.insert(dir.clone());
                Ok(())
            }
        }
    }

    async fn update_directory(
        &self,
        id: &DirectoryId,
        update: &DirectoryUpdate,
    ) -> AppResult<Option<Directory>> {
        Ok(self.directories.get_mut(id).map(|mut doc| {
            update.apply(doc.value_mut());
            doc.value().clone()
        }))
    }

    async fn update_directories(
        &self,
        selector: &DirectorySelector,
        update: &DirectoryUpdate,
    ) -> AppResult<u64> {
        let mut changed = 0;

        if let DirectorySelector::Ids(ids) = selector {
            for id in ids {
                if let Some(mut doc) = self.directories.get_mut(id) {
                    if update.apply(doc.value_mut()) {
                        changed += 1;
                    }
                }
            }
            return Ok(changed);
        }

        for mut doc in self.directories.iter_mut() {
            if selector.matches(doc.value()) && update.apply(doc.value_mut()) {
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn delete_directory(&self, id: &DirectoryId) -> AppResult<bool> {
        let Some((_, dir)) = self.directories.remove(id) else {
            return Ok(false);
        };
        if dir.is_root() {
            self.roots.remove_if(&dir.user_id, |_, root| *root == dir.id);
        }
        Ok(true)
    }

    async fn find_file(&self, id: &FileId) -> AppResult<Option<File>> {
        Ok(self.files.get(id).map(|f| f.value().clone()))
    }

    async fn insert_file(&self, file: &File) -> AppResult<()> {
        match self.files.entry(file.id) {
            Entry::Occupied(_) => Err(AppError::conflict(format!("file {} already exists", file.id))),
            Entry::Vacant(slot) => {
                slot.insert(file.clone());
                Ok(())
            }
        }
    }

    async fn update_file(&self, id: &FileId, update: &FileUpdate) -> AppResult<Option<File>> {
        Ok(self.files.get_mut(id).map(|mut doc| {
            update.apply(doc.value_mut());
            doc.value().clone()
        }))
    }

    async fn delete_file(&self, id: &FileId) -> AppResult<bool> {
        Ok(self.files.remove(id).is_some())
    }

    async fn search(&self, user_id: &str, query: &SearchQuery) -> AppResult<SearchResult> {
        let predicates = query.filter.predicates();
        let page = &query.page;
        let mut result = SearchResult::default();

        if let Some(preds) = predicates.directories {
            let mut dirs: Vec<Directory> = self
                .directories
                .iter()
                .filter(|d| d.user_id == user_id && preds.iter().all(|p| p.matches_directory(d)))
                .map(|d| d.as_mirror())
                .collect();
            sort_directories(&mut dirs, page.sort_by, page.direction);
            result.directories_count = dirs.len() as u64;
            let range = page.window.bounds(dirs.len());
            result.directories = dirs.drain(range).collect();
        }

        if let Some(preds) = predicates.files {
            let mut files: Vec<File> = self
                .files
                .iter()
                .filter(|f| f.user_id == user_id && preds.iter().all(|p| p.matches_file(f)))
                .map(|f| f.value().clone())
                .collect();
            sort_files(&mut files, page.sort_by, page.direction);
            result.files_count = files.len() as u64;
            let range = page.window.bounds(files.len());
            result.files = files.drain(range).collect();
        }

        Ok(result)
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use stratum_core::error::ErrorKind;
    use stratum_core::types::{ChildPage, Pagination};
    use stratum_entity::{NodeType, SearchFilter};

    use super::*;

    #[tokio::test]
    async fn one_root_per_user() {
        let store = MemoryTreeStore::new();
        store.insert_directory(&Directory::new_root("u1")).await.unwrap();

        let err = store
            .insert_directory(&Directory::new_root("u1"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(store.directory_count(), 1);

        store.insert_directory(&Directory::new_root("u2")).await.unwrap();
        assert!(store.find_root("u2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn deleting_a_root_frees_the_slot() {
        let store = MemoryTreeStore::new();
        let root = Directory::new_root("u1");
        store.insert_directory(&root).await.unwrap();
        assert!(store.delete_directory(&root.id).await.unwrap());
        assert!(store.find_root("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_returns_post_image() {
        let store = MemoryTreeStore::new();
        let root = Directory::new_root("u1");
        store.insert_directory(&root).await.unwrap();

        let after = store
            .update_directory(&root.id, &DirectoryUpdate::AddSize(42))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.size, 42);

        let missing = store
            .update_directory(&DirectoryId::new(), &DirectoryUpdate::AddSize(1))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn selector_updates_every_match() {
        let store = MemoryTreeStore::new();
        let root = Directory::new_root("u1");
        let a = Directory::new_child(&root, "u1", "a");
        let b = Directory::new_child(&root, "u1", "b");
        for d in [&root, &a, &b] {
            store.insert_directory(d).await.unwrap();
        }

        let changed = store
            .update_directories(
                &DirectorySelector::PathReferences(root.id),
                &DirectoryUpdate::RenameAncestor {
                    id: root.id,
                    name: "home".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(changed, 2);
        let a = store.find_directory(&a.id).await.unwrap().unwrap();
        assert_eq!(a.path[0].name, "home");
    }

    #[tokio::test]
    async fn search_scopes_to_user_and_pages() {
        let store = MemoryTreeStore::new();
        let root = Directory::new_root("u1");
        store.insert_directory(&root).await.unwrap();
        for (name, ext) in [("a", "pdf"), ("b", "pdf"), ("c", "txt")] {
            store
                .insert_file(&File::new(root.id, "u1", name, ext, 1))
                .await
                .unwrap();
        }
        store
            .insert_file(&File::new(DirectoryId::new(), "u2", "d", "pdf", 1))
            .await
            .unwrap();

        let query = SearchQuery {
            filter: SearchFilter {
                extensions: vec!["pdf".into()],
                ..Default::default()
            },
            page: ChildPage {
                window: Pagination::new(1, 10),
                ..Default::default()
            },
        };
        let result = store.search("u1", &query).await.unwrap();
        assert_eq!(result.files_count, 2);
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.files[0].name, "b");
        assert_eq!(result.directories_count, 0);

        let query = SearchQuery {
            filter: SearchFilter {
                node_type: NodeType::DirectoriesOnly,
                ..Default::default()
            },
            ..Default::default()
        };
        let result = store.search("u1", &query).await.unwrap();
        assert_eq!(result.directories_count, 1);
        assert_eq!(result.files_count, 0);
    }
}
