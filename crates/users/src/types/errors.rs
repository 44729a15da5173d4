//! Error types surfaced by the directory service.

use thiserror::Error;

pub const CONFLICT_MESSAGE: &str = "User with email or username already exists";
pub const CREATE_FAILED_MESSAGE: &str = "Something went wrong while creating the user";
pub const LOOKUP_FAILED_MESSAGE: &str = "Something went wrong while fetching the user";

/// Directory-level errors. Storage driver errors never cross this boundary;
/// they are logged and replaced by one of the fixed messages above.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("{}", CONFLICT_MESSAGE)]
    Conflict,

    #[error("{0}")]
    Internal(&'static str),

    #[error("{0}")]
    InvalidArgument(String),
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;
