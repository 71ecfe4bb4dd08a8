//! Typed path parameter helpers.

use stratum_broker::parse_node_id;
use stratum_core::error::AppError;
use stratum_core::types::{DirectoryId, FileId};

/// Parses a directory id from a path segment.
pub fn parse_directory_id(s: &str) -> Result<DirectoryId, AppError> {
    s.parse()
        .map_err(|_| AppError::validation(format!("Invalid directory id: {s}")))
}

/// Parses a file id given as hex or as the derived content uuid.
pub fn parse_file_id(s: &str) -> Result<FileId, AppError> {
    Ok(FileId::from(parse_node_id(s)?))
}
