//! # stratum-database
//!
//! Persistence for the directory tree. The [`store::TreeStore`] trait
//! exposes single-document reads and writes over two collections,
//! `directories` and `files`; it carries no business rules. Two backends
//! implement it: [`store::PgTreeStore`] keeps JSONB documents in PostgreSQL
//! and [`store::MemoryTreeStore`] keeps them in process.

pub mod connection;
pub mod migration;
pub mod store;

pub use connection::DatabasePool;
pub use store::{MemoryTreeStore, PgTreeStore, TreeStore};
