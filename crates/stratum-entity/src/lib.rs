//! # stratum-entity
//!
//! Document shapes stored by the tree store, the typed document updates both
//! store backends apply, and the search filter model.

pub mod directory;
pub mod file;
pub mod search;

pub use directory::{Directory, DirectoryPatch, DirectorySelector, DirectoryUpdate, PathElement};
pub use file::{File, FilePatch, FileUpdate};
pub use search::{NodeType, Predicate, SearchFilter, SearchPredicates, SearchQuery, SearchResult};
