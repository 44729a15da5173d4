//! PostgreSQL user adapter (numbered `$n` parameters).

use crate::connection::PostgresProvider;
use crate::entities::{CreateUserRequest, User, UserId};
use crate::repos::parse_serial_id;
use crate::types::{UserError, UserResult};
use sqlx::postgres::PgRow;
use sqlx::Row;
use tracing::debug;

const INSERT_USER_RETURNING: &str = r#"
    INSERT INTO users (username, email, full_name, password_hash)
    VALUES ($1, $2, $3, $4)
    RETURNING id::BIGINT AS id, username, email, full_name, created_at, updated_at
"#;
const SELECT_USER_BY_ID: &str = r#"
    SELECT id::BIGINT AS id, username, email, full_name, created_at, updated_at
    FROM users
    WHERE id = $1
"#;
const SELECT_ID_BY_USERNAME_OR_EMAIL: &str =
    "SELECT id::BIGINT AS id FROM users WHERE username = $1 OR email = $2 LIMIT 1";
const COUNT_USERS: &str = "SELECT COUNT(*) FROM users";

/// Repository for users stored in PostgreSQL
///
/// `id` is read back as `BIGINT` so tables keyed by `SERIAL` and by
/// `BIGSERIAL` both decode into `i64`.
#[derive(Clone)]
pub struct PostgresUserRepository {
    provider: PostgresProvider,
}

impl PostgresUserRepository {
    pub fn new(provider: PostgresProvider) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &PostgresProvider {
        &self.provider
    }

    /// Insert the user and get the stored row back in the same statement.
    pub async fn create(&self, request: &CreateUserRequest) -> UserResult<User> {
        let request = request.normalized();
        let mut conn = self.provider.acquire().await?;

        let row = sqlx::query(INSERT_USER_RETURNING)
            .bind(&request.username)
            .bind(&request.email)
            .bind(&request.full_name)
            .bind(request.password.expose())
            .fetch_optional(&mut *conn)
            .await?;

        let user = row
            .as_ref()
            .map(user_from_row)
            .transpose()?
            .ok_or(UserError::CreateFailed)?;

        debug!(id = %user.id, "postgres user inserted");
        Ok(user)
    }

    /// Find user by ID
    pub async fn find_by_id(&self, id: &str) -> UserResult<Option<User>> {
        let Some(id) = parse_serial_id(id)? else {
            return Ok(None);
        };

        let mut conn = self.provider.acquire().await?;
        let row = sqlx::query(SELECT_USER_BY_ID)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        row.as_ref().map(user_from_row).transpose().map_err(UserError::from)
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
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: UserId::Serial(row.try_get("id")?),
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        full_name: row.try_get("full_name")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
