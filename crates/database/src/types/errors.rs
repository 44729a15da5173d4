//! Error types for the storage layer

use mongodb::error::{ErrorKind, WriteFailure};
use thiserror::Error;

/// MongoDB server code for a duplicate key on a unique index.
const MONGO_DUPLICATE_KEY: i32 = 11000;

/// Connection provider and schema bootstrap errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    #[error("Timed out waiting for a pooled connection")]
    PoolTimedOut,

    #[error("Database query error: {0}")]
    QueryError(String),

    #[error("Schema bootstrap error: {0}")]
    SchemaError(String),

    #[error("Invalid connection settings: {0}")]
    ConfigError(String),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => DatabaseError::PoolTimedOut,
            sqlx::Error::Configuration(e) => DatabaseError::ConfigError(e.to_string()),
            sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolClosed => {
                DatabaseError::ConnectionError(err.to_string())
            }
            _ => DatabaseError::QueryError(err.to_string()),
        }
    }
}

impl From<mongodb::error::Error> for DatabaseError {
    fn from(err: mongodb::error::Error) -> Self {
        match err.kind.as_ref() {
            ErrorKind::InvalidArgument { .. } => DatabaseError::ConfigError(err.to_string()),
            ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) => {
                DatabaseError::ConnectionError(err.to_string())
            }
            _ => DatabaseError::QueryError(err.to_string()),
        }
    }
}

/// Errors raised by the user record adapters
#[derive(Debug, Error)]
pub enum UserError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A storage-level unique constraint rejected the write.
    #[error("Duplicate user: {0}")]
    Duplicate(String),

    /// The freshly inserted record could not be read back.
    #[error("Created user could not be read back")]
    CreateFailed,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for UserError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                UserError::Duplicate(db_err.message().to_string())
            }
            other => UserError::DatabaseError(DatabaseError::from(other).to_string()),
        }
    }
}

impl From<mongodb::error::Error> for UserError {
    fn from(err: mongodb::error::Error) -> Self {
        if is_duplicate_key(&err) {
            UserError::Duplicate(err.to_string())
        } else {
            UserError::DatabaseError(DatabaseError::from(err).to_string())
        }
    }
}

impl From<DatabaseError> for UserError {
    fn from(err: DatabaseError) -> Self {
        UserError::DatabaseError(err.to_string())
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == MONGO_DUPLICATE_KEY
        }
        ErrorKind::Command(command_error) => command_error.code == MONGO_DUPLICATE_KEY,
        _ => false,
    }
}
