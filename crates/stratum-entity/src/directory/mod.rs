//! Directory documents.

pub mod listing;
pub mod model;
pub mod update;

pub use model::{Directory, PathElement};
pub use update::{DirectoryPatch, DirectorySelector, DirectoryUpdate};
