//! Search request and result shapes.

use serde::{Deserialize, Serialize};

use stratum_core::types::ChildPage;

use super::filter::SearchFilter;
use crate::directory::Directory;
use crate::file::File;

/// A filter plus the window and ordering applied to each collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// What to match.
    #[serde(default)]
    pub filter: SearchFilter,
    /// Window and ordering.
    #[serde(default)]
    pub page: ChildPage,
}

/// Matches from both collections. Counts are totals before paging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Total matching directories.
    pub directories_count: u64,
    /// Page of matching directories, without embedded children.
    pub directories: Vec<Directory>,
    /// Total matching files.
    pub files_count: u64,
    /// Page of matching files.
    pub files: Vec<File>,
}
