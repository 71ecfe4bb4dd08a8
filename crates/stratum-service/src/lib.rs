//! # stratum-service
//!
//! Tree consistency engine and the directory/file services built on it.
//! [`TreeEngine`] owns the cascading mutation algorithms; the services add
//! ownership checks and, for files, the storage-coordinator handshake.
//!
//! Services follow constructor injection: every dependency is handed over
//! at construction time.

pub mod context;
pub mod directory;
pub mod file;
pub mod tree;

pub use context::RequestContext;
pub use directory::DirectoryService;
pub use file::{FileHandle, FileService};
pub use tree::TreeEngine;
