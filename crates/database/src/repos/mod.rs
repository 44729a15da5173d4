//! User record adapters, one per storage engine.

pub mod mongo_user_repository;
pub mod mysql_user_repository;
pub mod postgres_user_repository;

pub use mongo_user_repository::MongoUserRepository;
pub use mysql_user_repository::MySqlUserRepository;
pub use postgres_user_repository::PostgresUserRepository;

use crate::types::{UserError, UserResult};

/// Parse an identifier issued by an auto-increment column.
///
/// Text that is not an integer can never have been issued, so it resolves to
/// `None` rather than an error. Only an empty identifier is rejected.
pub(crate) fn parse_serial_id(id: &str) -> UserResult<Option<i64>> {
    let id = id.trim();
    if id.is_empty() {
        return Err(UserError::InvalidArgument("user id must not be empty".to_string()));
    }
    Ok(id.parse::<i64>().ok())
}
