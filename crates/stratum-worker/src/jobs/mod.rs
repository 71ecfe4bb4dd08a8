//! Built-in sweep handlers.

pub mod cascade;
pub mod release;

pub use cascade::CascadeDeleteHandler;
pub use release::ReleaseContentHandler;
