//! Background sweep processing for Stratum.
//!
//! This crate provides:
//! - A bounded in-process queue that request handlers enqueue into
//! - A runner that drains the queue on detached tasks
//! - An executor that dispatches each job to its handler
//! - Handlers for cascading directory deletes and content release

pub mod executor;
pub mod jobs;
pub mod queue;
pub mod runner;

pub use executor::{SweepError, SweepExecutor, SweepHandler, SweepReport};
pub use queue::{SweepJob, SweepKind, SweepQueue, SweepReceiver};
pub use runner::SweepRunner;
