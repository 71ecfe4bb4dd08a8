//! Shared value types: identifiers, paging and sorting.

pub mod id;
pub mod pagination;
pub mod sorting;

pub use id::{DirectoryId, FileId, OBJECT_ID_LEN, ObjectId, ObjectIdError};
pub use pagination::{ChildPage, Pagination};
pub use sorting::{SortDirection, SortField};
