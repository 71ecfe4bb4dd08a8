//! Structural search filter and its translation into per-collection predicates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stratum_core::error::AppError;

use crate::directory::Directory;
use crate::file::File;

/// Which collections a search covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// Directories and files.
    #[default]
    Both,
    /// Files only.
    FilesOnly,
    /// Directories only.
    DirectoriesOnly,
}

/// Caller-supplied search filter. Absent fields do not constrain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilter {
    /// Collections to search.
    #[serde(default)]
    pub node_type: NodeType,
    /// Exact name.
    pub name: Option<String>,
    /// Inclusive lower bound on creation time.
    pub created_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on creation time.
    pub created_to: Option<DateTime<Utc>>,
    /// Inclusive lower bound on update time.
    pub updated_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on update time.
    pub updated_to: Option<DateTime<Utc>>,
    /// Public flag.
    pub public: Option<bool>,
    /// Exact size in bytes.
    pub size: Option<u64>,
    /// Starred flag.
    pub starred: Option<bool>,
    /// Allowed file extensions. A non-empty list excludes directories.
    #[serde(default)]
    pub extensions: Vec<String>,
}

/// One condition on a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `name == value`.
    NameEquals(String),
    /// `from <= created_at <= to`.
    CreatedWithin {
        /// Lower bound.
        from: Option<DateTime<Utc>>,
        /// Upper bound.
        to: Option<DateTime<Utc>>,
    },
    /// `from <= updated_at <= to`.
    UpdatedWithin {
        /// Lower bound.
        from: Option<DateTime<Utc>>,
        /// Upper bound.
        to: Option<DateTime<Utc>>,
    },
    /// `public == value`.
    PublicIs(bool),
    /// `starred == value`.
    StarredIs(bool),
    /// `size == value`.
    SizeEquals(u64),
    /// `extension in values`. Only meaningful for files.
    ExtensionIn(Vec<String>),
}

fn within(ts: &DateTime<Utc>, from: &Option<DateTime<Utc>>, to: &Option<DateTime<Utc>>) -> bool {
    from.is_none_or(|f| *ts >= f) && to.is_none_or(|t| *ts <= t)
}

impl Predicate {
    /// Evaluate against a directory document.
    pub fn matches_directory(&self, dir: &Directory) -> bool {
        match self {
            Self::NameEquals(name) => dir.name == *name,
            Self::CreatedWithin { from, to } => within(&dir.created_at, from, to),
            Self::UpdatedWithin { from, to } => within(&dir.updated_at, from, to),
            Self::PublicIs(v) => dir.public == *v,
            Self::StarredIs(v) => dir.starred == *v,
            Self::SizeEquals(v) => dir.size == *v,
            Self::ExtensionIn(_) => false,
        }
    }

    /// Evaluate against a file document.
    pub fn matches_file(&self, file: &File) -> bool {
        match self {
            Self::NameEquals(name) => file.name == *name,
            Self::CreatedWithin { from, to } => within(&file.created_at, from, to),
            Self::UpdatedWithin { from, to } => within(&file.updated_at, from, to),
            Self::PublicIs(v) => file.public == *v,
            Self::StarredIs(v) => file.starred == *v,
            Self::SizeEquals(v) => file.size == *v,
            Self::ExtensionIn(exts) => exts.iter().any(|e| *e == file.extension),
        }
    }
}

/// Independent predicate sets for the two collections. `None` excludes the
/// collection from the search entirely.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPredicates {
    /// Conditions on directory documents.
    pub directories: Option<Vec<Predicate>>,
    /// Conditions on file documents.
    pub files: Option<Vec<Predicate>>,
}

impl SearchFilter {
    /// Reject contradictory ranges.
    pub fn validate(&self) -> Result<(), AppError> {
        if let (Some(from), Some(to)) = (self.created_from, self.created_to) {
            if from > to {
                return Err(AppError::validation("created_from is after created_to"));
            }
        }
        if let (Some(from), Some(to)) = (self.updated_from, self.updated_to) {
            if from > to {
                return Err(AppError::validation("updated_from is after updated_to"));
            }
        }
        Ok(())
    }

    /// Translate into per-collection predicate sets.
    pub fn predicates(&self) -> SearchPredicates {
        let mut common = Vec::new();
        if let Some(name) = &self.name {
            common.push(Predicate::NameEquals(name.clone()));
        }
        if self.created_from.is_some() || self.created_to.is_some() {
            common.push(Predicate::CreatedWithin {
                from: self.created_from,
                to: self.created_to,
            });
        }
        if self.updated_from.is_some() || self.updated_to.is_some() {
            common.push(Predicate::UpdatedWithin {
                from: self.updated_from,
                to: self.updated_to,
            });
        }
        if let Some(public) = self.public {
            common.push(Predicate::PublicIs(public));
        }
        if let Some(size) = self.size {
            common.push(Predicate::SizeEquals(size));
        }
        if let Some(starred) = self.starred {
            common.push(Predicate::StarredIs(starred));
        }

        let mut directories = Some(common.clone());
        let mut files = common;

        if !self.extensions.is_empty() {
            directories = None;
            files.push(Predicate::ExtensionIn(self.extensions.clone()));
        }

        let mut files = Some(files);
        match self.node_type {
            NodeType::Both => {}
            NodeType::FilesOnly => directories = None,
            NodeType::DirectoriesOnly => files = None,
        }

        SearchPredicates { directories, files }
    }
}
