use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use userdir_users::{CreateUserRequest, Secret, User, UserId};
use utoipa::ToSchema;

use crate::{ApiError, ApiResponse, AppState};

pub const MISSING_FIELDS_MESSAGE: &str = "All fields are required";
pub const USER_CREATED_MESSAGE: &str = "User created successfully";
pub const USER_FETCHED_MESSAGE: &str = "User fetched successfully";
pub const USER_NOT_FOUND_MESSAGE: &str = "User not found";

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserBody {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl CreateUserBody {
    /// Every field must be present and non-blank. Each offending field is
    /// named in the error envelope's `errors` list.
    fn into_request(self) -> Result<CreateUserRequest, ApiError> {
        let mut missing = Vec::new();
        let mut required = |name: &str, value: Option<String>| {
            let value = value.filter(|value| !value.trim().is_empty());
            if value.is_none() {
                missing.push(format!("{name} is required"));
            }
            value
        };

        let username = required("username", self.username);
        let email = required("email", self.email);
        let full_name = required("fullName", self.full_name);
        let password = required("password", self.password);

        match (username, email, full_name, password) {
            (Some(username), Some(email), Some(full_name), Some(password)) => {
                Ok(CreateUserRequest {
                    username,
                    email,
                    full_name,
                    password: Secret::new(password),
                })
            }
            _ => Err(ApiError::bad_request(MISSING_FIELDS_MESSAGE).with_errors(missing)),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// ObjectId hex string on MongoDB, integer on the relational backends.
    #[schema(value_type = String, example = "65f1c0a2b7e4d93a1c2f0e11")]
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    request_body = CreateUserBody,
    responses(
        (status = 201, description = "User created", body = crate::response::UserEnvelope),
        (status = 400, description = "A required field is missing or blank", body = crate::error::ErrorResponse),
        (status = 409, description = "Username or email already taken", body = crate::error::ErrorResponse),
        (status = 500, description = "User could not be created", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserBody>, JsonRejection>,
) -> Result<ApiResponse<UserResponse>, ApiError> {
    let Json(payload) = payload?;
    let request = payload.into_request()?;

    let user = state.users().create_user(request).await?;
    info!(id = %user.id, "user created via api");

    Ok(ApiResponse::created(user.into(), USER_CREATED_MESSAGE))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}",
    tag = "Users",
    params(
        ("user_id" = String, Path, description = "Backend-assigned user identifier")
    ),
    responses(
        (status = 200, description = "User found", body = crate::response::UserEnvelope),
        (status = 400, description = "Malformed identifier", body = crate::error::ErrorResponse),
        (status = 404, description = "No user with that identifier", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<ApiResponse<UserResponse>, ApiError> {
    let user = state
        .users()
        .get_user_by_id(&user_id)
        .await?
        .ok_or_else(|| ApiError::not_found(USER_NOT_FOUND_MESSAGE))?;

    Ok(ApiResponse::ok(user.into(), USER_FETCHED_MESSAGE))
}
