//! File entity model and document updates.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stratum_core::types::{DirectoryId, FileId};

/// A file document. Its bytes live on a storage node; only metadata is kept here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    /// Unique file identifier, also the content identifier.
    pub id: FileId,
    /// Owning user.
    pub user_id: String,
    /// Directory holding the file.
    pub parent_directory_id: DirectoryId,
    /// File name without extension.
    pub name: String,
    /// Extension, e.g. `"txt"`.
    #[serde(default)]
    pub extension: String,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
    /// Readable by any authenticated user.
    #[serde(default)]
    pub public: bool,
    /// Starred by its owner.
    #[serde(default)]
    pub starred: bool,
    /// Free-form attributes.
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    /// When the file was created.
    pub created_at: DateTime<Utc>,
    /// When the file was last updated.
    pub updated_at: DateTime<Utc>,
}

impl File {
    /// Build a new file under `parent_id`.
    pub fn new(
        parent_id: DirectoryId,
        user_id: impl Into<String>,
        name: impl Into<String>,
        extension: impl Into<String>,
        size: u64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: FileId::new(),
            user_id: user_id.into(),
            parent_directory_id: parent_id,
            name: name.into(),
            extension: extension.into(),
            size,
            public: false,
            starred: false,
            attrs: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Mutable fields shared by a file's canonical document and its mirror.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilePatch {
    /// New name.
    pub name: Option<String>,
    /// New public flag.
    pub public: Option<bool>,
    /// New starred flag.
    pub starred: Option<bool>,
    /// New size.
    pub size: Option<u64>,
    /// New update timestamp.
    pub updated_at: Option<DateTime<Utc>>,
}

impl FilePatch {
    /// Apply every present field. Returns whether anything was set.
    pub fn apply(&self, file: &mut File) -> bool {
        let mut changed = false;
        if let Some(name) = &self.name {
            file.name = name.clone();
            changed = true;
        }
        if let Some(public) = self.public {
            file.public = public;
            changed = true;
        }
        if let Some(starred) = self.starred {
            file.starred = starred;
            changed = true;
        }
        if let Some(size) = self.size {
            file.size = size;
            changed = true;
        }
        if let Some(ts) = self.updated_at {
            file.updated_at = ts;
            changed = true;
        }
        changed
    }

    /// Patch carrying every mutable field of `file`.
    pub fn snapshot(file: &File) -> Self {
        Self {
            name: Some(file.name.clone()),
            public: Some(file.public),
            starred: Some(file.starred),
            size: Some(file.size),
            updated_at: Some(file.updated_at),
        }
    }
}

/// Single-document update on the files collection.
#[derive(Debug, Clone, PartialEq)]
pub enum FileUpdate {
    /// Set fields.
    Set(FilePatch),
    /// Flip the starred flag.
    ToggleStarred {
        /// Update timestamp.
        updated_at: DateTime<Utc>,
    },
    /// Reparent the file.
    Relocate {
        /// New parent directory.
        parent_id: DirectoryId,
        /// Update timestamp.
        updated_at: DateTime<Utc>,
    },
}

impl FileUpdate {
    /// Apply to a document. Returns whether the document changed.
    pub fn apply(&self, file: &mut File) -> bool {
        match self {
            Self::Set(patch) => patch.apply(file),
            Self::ToggleStarred { updated_at } => {
                file.starred = !file.starred;
                file.updated_at = *updated_at;
                true
            }
            Self::Relocate {
                parent_id,
                updated_at,
            } => {
                file.parent_directory_id = *parent_id;
                file.updated_at = *updated_at;
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_twice_restores() {
        let mut file = File::new(DirectoryId::new(), "u1", "a", "txt", 10);
        let update = FileUpdate::ToggleStarred {
            updated_at: Utc::now(),
        };
        update.apply(&mut file);
        assert!(file.starred);
        update.apply(&mut file);
        assert!(!file.starred);
    }

    #[test]
    fn empty_patch_changes_nothing() {
        let mut file = File::new(DirectoryId::new(), "u1", "a", "txt", 10);
        let before = file.clone();
        assert!(!FilePatch::default().apply(&mut file));
        assert_eq!(file, before);
    }
}
