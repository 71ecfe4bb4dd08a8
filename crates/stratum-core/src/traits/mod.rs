//! Core traits defined in `stratum-core` and implemented by other crates.

pub mod coordinator;
pub mod publisher;

pub use coordinator::{Placement, StorageCoordinator};
pub use publisher::MessagePublisher;
