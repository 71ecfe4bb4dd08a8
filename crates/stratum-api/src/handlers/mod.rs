//! HTTP request handlers.

pub mod directory;
pub mod file;
pub mod health;
pub mod internal;
