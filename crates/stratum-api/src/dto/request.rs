//! Request DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use stratum_core::error::AppError;
use stratum_entity::{NodeType, SearchFilter, SearchQuery};

use crate::extractors::PageParams;

/// Create directory request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateDirectoryRequest {
    /// Parent directory id.
    pub parent_directory_id: String,
    /// Directory name.
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

/// Create file request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateFileRequest {
    /// Parent directory id.
    pub parent_directory_id: String,
    /// File name without extension.
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// Extension without the leading dot.
    #[serde(default)]
    #[validate(length(max = 32))]
    pub extension: String,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
}

/// `?name=` for renames.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RenameParams {
    /// New name.
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

/// `?to=` for moves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveParams {
    /// Destination directory id.
    pub to: String,
}

/// `?public=` for shares.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareParams {
    /// New public flag.
    pub public: bool,
}

/// `?size=` for content updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResizeParams {
    /// New size in bytes.
    pub size: u64,
}

/// Search filter and paging, flattened into query parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchParams {
    /// `both`, `files_only` or `directories_only`.
    pub node_type: Option<NodeType>,
    /// Exact name.
    pub name: Option<String>,
    /// RFC 3339 lower bound on creation time.
    pub created_from: Option<DateTime<Utc>>,
    /// RFC 3339 upper bound on creation time.
    pub created_to: Option<DateTime<Utc>>,
    /// RFC 3339 lower bound on update time.
    pub updated_from: Option<DateTime<Utc>>,
    /// RFC 3339 upper bound on update time.
    pub updated_to: Option<DateTime<Utc>>,
    /// Public flag.
    pub public: Option<bool>,
    /// Exact size.
    pub size: Option<u64>,
    /// Starred flag.
    pub starred: Option<bool>,
    /// Comma-separated extensions.
    pub extensions: Option<String>,
    /// Items to skip.
    #[serde(default)]
    pub offset: u64,
    /// Page size.
    #[serde(default)]
    pub limit: u64,
    /// Sort field.
    pub sort_by: Option<String>,
    /// Sort direction.
    pub sort_dir: Option<String>,
}

impl SearchParams {
    /// Builds the search query.
    pub fn into_query(self) -> Result<SearchQuery, AppError> {
        let page = PageParams {
            offset: self.offset,
            limit: self.limit,
            sort_by: self.sort_by,
            sort_dir: self.sort_dir,
        }
        .into_child_page()?;

        let extensions = self
            .extensions
            .map(|list| {
                list.split(',')
                    .map(|e| e.trim().trim_start_matches('.').to_string())
                    .filter(|e| !e.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(SearchQuery {
            filter: SearchFilter {
                node_type: self.node_type.unwrap_or_default(),
                name: self.name,
                created_from: self.created_from,
                created_to: self.created_to,
                updated_from: self.updated_from,
                updated_to: self.updated_to,
                public: self.public,
                size: self.size,
                starred: self.starred,
                extensions,
            },
            page,
        })
    }
}

/// Maps validator failures to a Validation error.
pub fn validated<T: Validate>(req: T) -> Result<T, AppError> {
    req.validate()
        .map_err(|e| AppError::validation(format!("Invalid request: {e}")))?;
    Ok(req)
}
