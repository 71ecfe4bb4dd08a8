//! Directory entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stratum_core::types::DirectoryId;

use crate::file::File;

/// Name of the directory created lazily for every user.
pub const ROOT_NAME: &str = "root";

/// One ancestor in a node's path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathElement {
    /// Ancestor directory id.
    pub id: DirectoryId,
    /// Ancestor name as of the last rename.
    pub name: String,
}

/// A directory document.
///
/// The canonical document embeds mirrors of its immediate children so a
/// listing is answered from a single read. Mirrors of child directories carry
/// empty `directories` and `files`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Directory {
    /// Unique directory identifier.
    pub id: DirectoryId,
    /// Owning user. Never changes after creation.
    pub user_id: String,
    /// Parent directory (absent for roots).
    pub parent_directory_id: Option<DirectoryId>,
    /// Ancestors from root to immediate parent.
    #[serde(default)]
    pub path: Vec<PathElement>,
    /// Directory name.
    pub name: String,
    /// When the directory was created.
    pub created_at: DateTime<Utc>,
    /// When the directory was last updated.
    pub updated_at: DateTime<Utc>,
    /// Readable by any authenticated user.
    #[serde(default)]
    pub public: bool,
    /// Starred by its owner.
    #[serde(default)]
    pub starred: bool,
    /// Cumulative size of the whole subtree in bytes.
    #[serde(default)]
    pub size: u64,
    /// Number of immediate child directories.
    #[serde(default)]
    pub directories_count: u64,
    /// Mirrored immediate child directories.
    #[serde(default)]
    pub directories: Vec<Directory>,
    /// Number of immediate child files.
    #[serde(default)]
    pub files_count: u64,
    /// Mirrored immediate child files.
    #[serde(default)]
    pub files: Vec<File>,
}

impl Directory {
    /// Build a root directory for `user_id`.
    pub fn new_root(user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: DirectoryId::new(),
            user_id: user_id.into(),
            parent_directory_id: None,
            path: Vec::new(),
            name: ROOT_NAME.to_string(),
            created_at: now,
            updated_at: now,
            public: false,
            starred: false,
            size: 0,
            directories_count: 0,
            directories: Vec::new(),
            files_count: 0,
            files: Vec::new(),
        }
    }

    /// Build an empty child of `parent`.
    pub fn new_child(parent: &Directory, user_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: DirectoryId::new(),
            user_id: user_id.into(),
            parent_directory_id: Some(parent.id),
            path: parent.child_path(),
            name: name.into(),
            created_at: now,
            updated_at: now,
            public: false,
            starred: false,
            size: 0,
            directories_count: 0,
            directories: Vec::new(),
            files_count: 0,
            files: Vec::new(),
        }
    }

    /// Check if this is a root directory (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_directory_id.is_none()
    }

    /// The path a direct child of this directory carries.
    pub fn child_path(&self) -> Vec<PathElement> {
        let mut path = self.path.clone();
        path.push(PathElement {
            id: self.id,
            name: self.name.clone(),
        });
        path
    }

    /// Ids of all ancestors, root first.
    pub fn ancestor_ids(&self) -> Vec<DirectoryId> {
        self.path.iter().map(|p| p.id).collect()
    }

    /// Ids of this directory and all its ancestors: the chain whose sizes
    /// change when a direct child is added, removed or resized.
    pub fn lineage(&self) -> Vec<DirectoryId> {
        let mut ids = self.ancestor_ids();
        ids.push(self.id);
        ids
    }

    /// Whether `id` appears among this node's ancestors.
    pub fn has_ancestor(&self, id: &DirectoryId) -> bool {
        self.path.iter().any(|p| p.id == *id)
    }

    /// Copy embedded in the parent: same fields, no nested children.
    pub fn as_mirror(&self) -> Directory {
        Directory {
            directories: Vec::new(),
            files: Vec::new(),
            ..self.clone()
        }
    }

    /// Embedded mirror of the child directory `id`, if present.
    pub fn child_directory(&self, id: &DirectoryId) -> Option<&Directory> {
        self.directories.iter().find(|d| d.id == *id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_inherits_path() {
        let root = Directory::new_root("u1");
        let docs = Directory::new_child(&root, "u1", "docs");
        let deep = Directory::new_child(&docs, "u1", "deep");

        assert!(root.is_root());
        assert_eq!(docs.parent_directory_id, Some(root.id));
        assert_eq!(
            deep.path,
            vec![
                PathElement { id: root.id, name: "root".into() },
                PathElement { id: docs.id, name: "docs".into() },
            ]
        );
        assert_eq!(deep.lineage(), vec![root.id, docs.id, deep.id]);
        assert!(deep.has_ancestor(&root.id));
        assert!(!docs.has_ancestor(&deep.id));
    }

    #[test]
    fn mirror_drops_children() {
        let root = Directory::new_root("u1");
        let mut docs = Directory::new_child(&root, "u1", "docs");
        docs.directories.push(Directory::new_child(&docs, "u1", "x"));
        docs.directories_count = 1;

        let mirror = docs.as_mirror();
        assert!(mirror.directories.is_empty());
        assert_eq!(mirror.directories_count, 1);
        assert_eq!(mirror.name, "docs");
    }
}
