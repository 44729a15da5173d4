//! User entity definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend-assigned user identifier.
///
/// The document store issues ObjectIds (kept as their 24-char hex form),
/// relational backends issue auto-increment integers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Object(String),
    Serial(i64),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Object(hex) => f.write_str(hex),
            UserId::Serial(id) => write!(f, "{id}"),
        }
    }
}

/// A stored user as returned by every adapter. It has no credential field:
/// the secret is write-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Credential material supplied at creation.
///
/// Stored verbatim in the `password_hash` column / `password` field. Nothing
/// hashes it: that is INSECURE and left to whoever calls the directory.
/// The type cannot be serialized and its `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw credential, for the adapter that persists it.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

/// Request for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: Secret,
}

impl CreateUserRequest {
    /// Trimmed copy with username and email lowercased, the form in which
    /// users are stored and compared.
    pub fn normalized(&self) -> Self {
        Self {
            username: self.username.trim().to_lowercase(),
            email: self.email.trim().to_lowercase(),
            full_name: self.full_name.trim().to_string(),
            password: self.password.clone(),
        }
    }
}
