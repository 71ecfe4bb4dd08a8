//! # stratum-core
//!
//! Core crate for the Stratum metadata service. Contains configuration
//! schemas, typed identifiers, sorting and paging types, the seams that other
//! crates implement, and the unified error system.
//!
//! This crate has **no** internal dependencies on other Stratum crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
