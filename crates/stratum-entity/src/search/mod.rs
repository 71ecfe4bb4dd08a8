//! Search filters and results.

pub mod filter;
pub mod result;

pub use filter::{NodeType, Predicate, SearchFilter, SearchPredicates};
pub use result::{SearchQuery, SearchResult};
