//! MySQL user adapter (positional `?` parameters).

use crate::connection::MySqlProvider;
use crate::entities::{CreateUserRequest, User, UserId};
use crate::repos::parse_serial_id;
use crate::types::{UserError, UserResult};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlConnection, Row};
use tracing::debug;

const INSERT_USER: &str =
    "INSERT INTO users (username, email, full_name, password_hash) VALUES (?, ?, ?, ?)";
const SELECT_USER_BY_ID: &str = r#"
    SELECT CAST(id AS SIGNED) AS id, username, email, full_name, created_at, updated_at
    FROM users
    WHERE id = ?
"#;
const SELECT_ID_BY_USERNAME_OR_EMAIL: &str =
    "SELECT CAST(id AS SIGNED) AS id FROM users WHERE username = ? OR email = ? LIMIT 1";
const COUNT_USERS: &str = "SELECT COUNT(*) FROM users";

/// Repository for users stored in MySQL. `id` may be `INT` or `BIGINT`.
#[derive(Clone)]
pub struct MySqlUserRepository {
    provider: MySqlProvider,
}

impl MySqlUserRepository {
    pub fn new(provider: MySqlProvider) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &MySqlProvider {
        &self.provider
    }

    /// Insert the user, then read it back by the generated key on the same
    /// pooled connection. MySQL has no `RETURNING`, so this is two round-trips.
    pub async fn create(&self, request: &CreateUserRequest) -> UserResult<User> {
        let request = request.normalized();
        let mut conn = self.provider.acquire().await?;

        let result = sqlx::query(INSERT_USER)
            .bind(&request.username)
            .bind(&request.email)
            .bind(&request.full_name)
            .bind(request.password.expose())
            .execute(&mut *conn)
            .await?;

        let id = i64::try_from(result.last_insert_id()).map_err(|_| UserError::CreateFailed)?;
        debug!(id, "mysql user inserted");

        Self::fetch_by_id(&mut conn, id)
            .await?
            .ok_or(UserError::CreateFailed)
    }

    /// Find user by ID
    pub async fn find_by_id(&self, id: &str) -> UserResult<Option<User>> {
        let Some(id) = parse_serial_id(id)? else {
            return Ok(None);
        };

        let mut conn = self.provider.acquire().await?;
        Self::fetch_by_id(&mut conn, id).await
    }

    /// Identifier of any user holding either the username or the email.
    pub async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> UserResult<Option<UserId>> {
        let mut conn = self.provider.acquire().await?;

        let id: Option<i64> = sqlx::query_scalar(SELECT_ID_BY_USERNAME_OR_EMAIL)
            .bind(username)
            .bind(email)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(id.map(UserId::Serial))
    }

    pub async fn count(&self) -> UserResult<u64> {
        let mut conn = self.provider.acquire().await?;
        let count: i64 = sqlx::query_scalar(COUNT_USERS)
            .fetch_one(&mut *conn)
            .await?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn fetch_by_id(conn: &mut MySqlConnection, id: i64) -> UserResult<Option<User>> {
        let row = sqlx::query(SELECT_USER_BY_ID)
            .bind(id)
            .fetch_optional(conn)
            .await?;

        row.as_ref().map(user_from_row).transpose().map_err(UserError::from)
    }
}

fn user_from_row(row: &MySqlRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: UserId::Serial(row.try_get("id")?),
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        full_name: row.try_get("full_name")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
