//! Storage-level uniqueness for the `users` table / collection.
//!
//! The directory checks for collisions before inserting, but two concurrent
//! creates can both pass that check. The `UNIQUE` columns and unique indexes
//! created here are what actually rejects the second insert.

use mongodb::bson::{doc, Document};
use mongodb::options::IndexOptions;
use mongodb::IndexModel;
use tracing::info;

use crate::connection::{MongoProvider, MySqlProvider, PostgresProvider};
use crate::types::{DatabaseError, DatabaseResult};

pub const USERS: &str = "users";

pub const MYSQL_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INT AUTO_INCREMENT PRIMARY KEY,
    username VARCHAR(50) UNIQUE NOT NULL,
    email VARCHAR(255) UNIQUE NOT NULL,
    full_name VARCHAR(255) NOT NULL,
    password_hash VARCHAR(255) NOT NULL,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
)
"#;

pub const POSTGRES_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id SERIAL PRIMARY KEY,
    username VARCHAR(50) UNIQUE NOT NULL,
    email VARCHAR(255) UNIQUE NOT NULL,
    full_name VARCHAR(255) NOT NULL,
    password_hash VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
)
"#;

pub async fn ensure_mysql_schema(provider: &MySqlProvider) -> DatabaseResult<()> {
    sqlx::query(MYSQL_USERS_TABLE)
        .execute(provider.pool())
        .await
        .map_err(|e| DatabaseError::SchemaError(e.to_string()))?;

    info!(table = USERS, "mysql schema ready");
    Ok(())
}

pub async fn ensure_postgres_schema(provider: &PostgresProvider) -> DatabaseResult<()> {
    sqlx::query(POSTGRES_USERS_TABLE)
        .execute(provider.pool())
        .await
        .map_err(|e| DatabaseError::SchemaError(e.to_string()))?;

    info!(table = USERS, "postgres schema ready");
    Ok(())
}

fn unique_index(field: &str) -> IndexModel {
    IndexModel::builder()
        .keys(doc! { field: 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

/// Unique indexes on `username` and `email`. Creating an index that already
/// exists with the same definition is a no-op on the server.
pub async fn ensure_mongodb_indexes(provider: &MongoProvider) -> DatabaseResult<()> {
    provider
        .collection::<Document>(USERS)
        .create_indexes(vec![unique_index("username"), unique_index("email")], None)
        .await
        .map_err(|e| DatabaseError::SchemaError(e.to_string()))?;

    info!(collection = USERS, "mongodb indexes ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relational_tables_declare_unique_columns() {
        for ddl in [MYSQL_USERS_TABLE, POSTGRES_USERS_TABLE] {
            assert!(ddl.contains("username VARCHAR(50) UNIQUE NOT NULL"));
            assert!(ddl.contains("email VARCHAR(255) UNIQUE NOT NULL"));
            assert!(ddl.contains("password_hash"));
            assert!(ddl.contains("IF NOT EXISTS"));
        }
    }

    #[test]
    fn test_relational_tables_keep_the_deployed_key_types() {
        assert!(MYSQL_USERS_TABLE.contains("id INT AUTO_INCREMENT PRIMARY KEY"));
        assert!(POSTGRES_USERS_TABLE.contains("id SERIAL PRIMARY KEY"));
        assert!(POSTGRES_USERS_TABLE.contains("TIMESTAMPTZ"));
    }

    #[test]
    fn test_mongodb_index_is_unique() {
        let index = unique_index("email");
        assert_eq!(index.keys, doc! { "email": 1 });
        assert_eq!(index.options.and_then(|o| o.unique), Some(true));
    }
}
