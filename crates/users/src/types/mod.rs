//! Shared types for the directory service.

pub mod errors;

pub use errors::{DirectoryError, DirectoryResult};
