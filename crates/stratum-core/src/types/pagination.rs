//! Offset/limit paging for child listings and search.

use serde::{Deserialize, Serialize};

use super::sorting::{SortDirection, SortField};

/// Default page size for listings.
pub const DEFAULT_LIMIT: u64 = 300;

/// Offset/limit window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Number of items to skip.
    pub offset: u64,
    /// Maximum number of items to return.
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    /// Create a window. A zero limit falls back to the default.
    pub fn new(offset: u64, limit: u64) -> Self {
        Self {
            offset,
            limit: if limit == 0 { DEFAULT_LIMIT } else { limit },
        }
    }

    /// Slice bounds for a sequence of `len` items.
    pub fn bounds(&self, len: usize) -> std::ops::Range<usize> {
        let start = usize::try_from(self.offset).unwrap_or(usize::MAX).min(len);
        let end = start
            .saturating_add(usize::try_from(self.limit).unwrap_or(usize::MAX))
            .min(len);
        start..end
    }
}

/// Window plus ordering for a directory's children or a search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildPage {
    /// Offset/limit window.
    pub window: Pagination,
    /// Sort field.
    pub sort_by: SortField,
    /// Sort direction.
    pub direction: SortDirection,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_clamp_to_length() {
        assert_eq!(Pagination::new(0, 10).bounds(3), 0..3);
        assert_eq!(Pagination::new(2, 10).bounds(3), 2..3);
        assert_eq!(Pagination::new(5, 10).bounds(3), 3..3);
        assert_eq!(Pagination::new(1, 1).bounds(3), 1..2);
    }

    #[test]
    fn zero_limit_uses_default() {
        assert_eq!(Pagination::new(0, 0).limit, DEFAULT_LIMIT);
    }
}
