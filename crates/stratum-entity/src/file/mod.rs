//! File documents.

pub mod model;

pub use model::{File, FilePatch, FileUpdate};
