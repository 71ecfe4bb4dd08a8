//! File management and storage-coordinator orchestration.

pub mod service;

pub use service::{FileHandle, FileService};
