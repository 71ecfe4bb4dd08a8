//! Typed single-document updates on the directories collection.
//!
//! A [`DirectoryUpdate`] is applied to one document at a time. Stores pick
//! the target documents with a [`DirectorySelector`] and apply the update to
//! each match as its own atomic write, the same way a document database
//! applies an update operator per matched document.

use chrono::{DateTime, Utc};

use stratum_core::types::{DirectoryId, FileId};

use super::model::{Directory, PathElement};
use crate::file::{File, FilePatch};

/// Mutable fields shared by a directory's canonical document and its mirror.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectoryPatch {
    /// New name.
    pub name: Option<String>,
    /// New public flag.
    pub public: Option<bool>,
    /// New starred flag.
    pub starred: Option<bool>,
    /// New update timestamp.
    pub updated_at: Option<DateTime<Utc>>,
}

impl DirectoryPatch {
    /// Apply every present field. Returns whether anything was set.
    pub fn apply(&self, dir: &mut Directory) -> bool {
        let mut changed = false;
        if let Some(name) = &self.name {
            dir.name = name.clone();
            changed = true;
        }
        if let Some(public) = self.public {
            dir.public = public;
            changed = true;
        }
        if let Some(starred) = self.starred {
            dir.starred = starred;
            changed = true;
        }
        if let Some(ts) = self.updated_at {
            dir.updated_at = ts;
            changed = true;
        }
        changed
    }
}

/// An update applied to a single directory document.
#[derive(Debug, Clone, PartialEq)]
pub enum DirectoryUpdate {
    /// Set fields on the document itself.
    Set(DirectoryPatch),
    /// Flip the document's starred flag.
    ToggleStarred {
        /// Update timestamp.
        updated_at: DateTime<Utc>,
    },
    /// Reparent the document and replace its path.
    Relocate {
        /// New parent.
        parent_id: DirectoryId,
        /// New ancestors, root to parent.
        path: Vec<PathElement>,
        /// Update timestamp.
        updated_at: DateTime<Utc>,
    },
    /// Add a signed delta to the document's cumulative size.
    AddSize(i64),
    /// Embed a child directory mirror and bump the directory count.
    /// Re-attaching an id that is already embedded replaces the mirror.
    AttachDirectory(Box<Directory>),
    /// Remove a child directory mirror and drop the directory count.
    DetachDirectory(DirectoryId),
    /// Embed a child file mirror and bump the file count.
    AttachFile(Box<File>),
    /// Remove a child file mirror and drop the file count.
    DetachFile(FileId),
    /// Set fields on the embedded mirror of child directory `id`.
    SetChildDirectory {
        /// Child id.
        id: DirectoryId,
        /// Fields to set.
        patch: DirectoryPatch,
    },
    /// Set fields on the embedded mirror of child file `id`.
    SetChildFile {
        /// Child id.
        id: FileId,
        /// Fields to set.
        patch: FilePatch,
    },
    /// Add a signed delta to every embedded child directory listed in `ids`.
    AddChildDirectorySize {
        /// Children to resize.
        ids: Vec<DirectoryId>,
        /// Size delta in bytes.
        delta: i64,
    },
    /// Rewrite the cached name of ancestor `id` in the document's path and
    /// in the paths of its embedded child directories.
    RenameAncestor {
        /// Renamed ancestor.
        id: DirectoryId,
        /// New name.
        name: String,
    },
    /// Replace everything before ancestor `id` with `prefix`, in the
    /// document's path and in the paths of its embedded child directories.
    RebaseAncestor {
        /// Moved ancestor.
        id: DirectoryId,
        /// Path of the moved ancestor after the move.
        prefix: Vec<PathElement>,
    },
}

impl DirectoryUpdate {
    /// Apply to a document. Returns whether the document changed.
    pub fn apply(&self, dir: &mut Directory) -> bool {
        match self {
            Self::Set(patch) => patch.apply(dir),
            Self::ToggleStarred { updated_at } => {
                dir.starred = !dir.starred;
                dir.updated_at = *updated_at;
                true
            }
            Self::Relocate {
                parent_id,
                path,
                updated_at,
            } => {
                dir.parent_directory_id = Some(*parent_id);
                dir.path = path.clone();
                dir.updated_at = *updated_at;
                true
            }
            Self::AddSize(delta) => {
                dir.size = dir.size.saturating_add_signed(*delta);
                *delta != 0
            }
            Self::AttachDirectory(child) => {
                let mirror = child.as_mirror();
                match dir.directories.iter_mut().find(|d| d.id == mirror.id) {
                    Some(existing) => *existing = mirror,
                    None => {
                        dir.directories.push(mirror);
                        dir.directories_count += 1;
                    }
                }
                true
            }
            Self::DetachDirectory(id) => {
                let before = dir.directories.len();
                dir.directories.retain(|d| d.id != *id);
                let removed = before != dir.directories.len();
                if removed {
                    dir.directories_count = dir.directories_count.saturating_sub(1);
                }
                removed
            }
            Self::AttachFile(child) => {
                match dir.files.iter_mut().find(|f| f.id == child.id) {
                    Some(existing) => *existing = (**child).clone(),
                    None => {
                        dir.files.push((**child).clone());
                        dir.files_count += 1;
                    }
                }
                true
            }
            Self::DetachFile(id) => {
                let before = dir.files.len();
                dir.files.retain(|f| f.id != *id);
                let removed = before != dir.files.len();
                if removed {
                    dir.files_count = dir.files_count.saturating_sub(1);
                }
                removed
            }
            Self::SetChildDirectory { id, patch } => dir
                .directories
                .iter_mut()
                .find(|d| d.id == *id)
                .is_some_and(|child| patch.apply(child)),
            Self::SetChildFile { id, patch } => dir
                .files
                .iter_mut()
                .find(|f| f.id == *id)
                .is_some_and(|child| patch.apply(child)),
            Self::AddChildDirectorySize { ids, delta } => {
                let mut changed = false;
                for child in dir.directories.iter_mut().filter(|d| ids.contains(&d.id)) {
                    child.size = child.size.saturating_add_signed(*delta);
                    changed = true;
                }
                changed
            }
            Self::RenameAncestor { id, name } => {
                let mut changed = rename_in_path(&mut dir.path, id, name);
                for child in dir.directories.iter_mut() {
                    changed |= rename_in_path(&mut child.path, id, name);
                }
                changed
            }
            Self::RebaseAncestor { id, prefix } => {
                let mut changed = rebase_path(&mut dir.path, id, prefix);
                for child in dir.directories.iter_mut() {
                    changed |= rebase_path(&mut child.path, id, prefix);
                }
                changed
            }
        }
    }
}

fn rename_in_path(path: &mut [PathElement], id: &DirectoryId, name: &str) -> bool {
    let mut changed = false;
    for element in path.iter_mut().filter(|p| p.id == *id) {
        element.name = name.to_string();
        changed = true;
    }
    changed
}

fn rebase_path(path: &mut Vec<PathElement>, id: &DirectoryId, prefix: &[PathElement]) -> bool {
    let Some(pos) = path.iter().position(|p| p.id == *id) else {
        return false;
    };
    let mut rebased = prefix.to_vec();
    rebased.extend(path.drain(pos..));
    *path = rebased;
    true
}

/// Which directory documents an update targets.
#[derive(Debug, Clone, PartialEq)]
pub enum DirectorySelector {
    /// Documents with one of these ids.
    Ids(Vec<DirectoryId>),
    /// Documents embedding a mirror of one of these child directories.
    ParentsOf(Vec<DirectoryId>),
    /// Documents whose path, or whose embedded children's paths, reference
    /// this directory as an ancestor.
    PathReferences(DirectoryId),
}

impl DirectorySelector {
    /// Documents with exactly this id.
    pub fn id(id: DirectoryId) -> Self {
        Self::Ids(vec![id])
    }

    /// The document embedding a mirror of this directory.
    pub fn parent_of(id: DirectoryId) -> Self {
        Self::ParentsOf(vec![id])
    }

    /// Whether `dir` is targeted.
    pub fn matches(&self, dir: &Directory) -> bool {
        match self {
            Self::Ids(ids) => ids.contains(&dir.id),
            Self::ParentsOf(ids) => dir.directories.iter().any(|d| ids.contains(&d.id)),
            Self::PathReferences(id) => {
                dir.has_ancestor(id) || dir.directories.iter().any(|d| d.has_ancestor(id))
            }
        }
    }
}
