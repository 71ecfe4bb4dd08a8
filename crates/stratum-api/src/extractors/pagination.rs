//! Child-listing window and ordering query parameters.

use serde::{Deserialize, Serialize};

use stratum_core::error::AppError;
use stratum_core::types::{ChildPage, Pagination, SortDirection, SortField};

/// `offset`, `limit`, `sort_by` and `sort_dir` query parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageParams {
    /// Items to skip.
    #[serde(default)]
    pub offset: u64,
    /// Page size; 0 or absent uses the default.
    #[serde(default)]
    pub limit: u64,
    /// Sort field (`name`, `createdAt`, `updatedAt`, `size`).
    pub sort_by: Option<String>,
    /// `asc` or `desc`.
    pub sort_dir: Option<String>,
}

impl PageParams {
    /// Converts to a `ChildPage`, rejecting unknown sort fields.
    pub fn into_child_page(self) -> Result<ChildPage, AppError> {
        let sort_by = match self.sort_by.as_deref() {
            None | Some("") => SortField::default(),
            Some(s) => SortField::parse(s)
                .ok_or_else(|| AppError::validation(format!("Unknown sort field: {s}")))?,
        };
        let direction = match self.sort_dir.as_deref() {
            None | Some("") | Some("asc") => SortDirection::Asc,
            Some("desc") => SortDirection::Desc,
            Some(s) => {
                return Err(AppError::validation(format!("Unknown sort direction: {s}")));
            }
        };

        Ok(ChildPage {
            window: Pagination::new(self.offset, self.limit),
            sort_by,
            direction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_name_ascending() {
        let page = PageParams::default().into_child_page().unwrap();
        assert_eq!(page, ChildPage::default());
    }

    #[test]
    fn rejects_unknown_fields() {
        let params = PageParams {
            sort_by: Some("colour".into()),
            ..Default::default()
        };
        assert!(params.into_child_page().is_err());
    }
}
