//! User service for the directory's create and lookup operations.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};
use userdir_database::{CreateUserRequest, User, UserError, UserId, UserResult, UserStorage};

use super::mock_repositories::MockUserRepository;
use crate::types::errors::{CREATE_FAILED_MESSAGE, LOOKUP_FAILED_MESSAGE};
use crate::types::{DirectoryError, DirectoryResult};

/// The contract every user record adapter honours.
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn create(&self, request: &CreateUserRequest) -> UserResult<User>;
    async fn find_by_id(&self, id: &str) -> UserResult<Option<User>>;
    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> UserResult<Option<UserId>>;
    async fn count(&self) -> UserResult<u64>;
}

#[async_trait]
impl UserRepo for UserStorage {
    async fn create(&self, request: &CreateUserRequest) -> UserResult<User> {
        UserStorage::create(self, request).await
    }

    async fn find_by_id(&self, id: &str) -> UserResult<Option<User>> {
        UserStorage::find_by_id(self, id).await
    }

    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> UserResult<Option<UserId>> {
        UserStorage::find_by_username_or_email(self, username, email).await
    }

    async fn count(&self) -> UserResult<u64> {
        UserStorage::count(self).await
    }
}

#[async_trait]
impl UserRepo for MockUserRepository {
    async fn create(&self, request: &CreateUserRequest) -> UserResult<User> {
        MockUserRepository::create(self, request).await
    }

    async fn find_by_id(&self, id: &str) -> UserResult<Option<User>> {
        MockUserRepository::find_by_id(self, id).await
    }

    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> UserResult<Option<UserId>> {
        MockUserRepository::find_by_username_or_email(self, username, email).await
    }

    async fn count(&self) -> UserResult<u64> {
        MockUserRepository::count(self).await
    }
}

/// Service for managing user operations
#[derive(Clone)]
pub struct UserService {
    user_repository: Arc<dyn UserRepo>,
}

impl UserService {
    /// Create a service over the adapter selected at startup
    pub fn new(storage: UserStorage) -> Self {
        Self::with_repository(Arc::new(storage))
    }

    pub fn with_repository(user_repository: Arc<dyn UserRepo>) -> Self {
        Self { user_repository }
    }

    /// Create a new user service instance for testing
    pub fn new_for_testing() -> Self {
        Self::with_repository(Arc::new(MockUserRepository::new()))
    }

    /// Create a new user.
    ///
    /// The username/email pre-check is a separate round trip from the
    /// insert, so a concurrent create can still slip between them; the
    /// storage-level unique constraint then rejects the write and the caller
    /// sees the same `Conflict`.
    pub async fn create_user(&self, request: CreateUserRequest) -> DirectoryResult<User> {
        let request = request.normalized();

        let existing = self
            .user_repository
            .find_by_username_or_email(&request.username, &request.email)
            .await
            .map_err(|e| internal(e, CREATE_FAILED_MESSAGE))?;
        if let Some(id) = existing {
            warn!(existing_id = %id, username = %request.username, "username or email already taken");
            return Err(DirectoryError::Conflict);
        }

        let user = self
            .user_repository
            .create(&request)
            .await
            .map_err(|e| match e {
                UserError::Duplicate(detail) => {
                    warn!(%detail, username = %request.username, "unique constraint rejected create");
                    DirectoryError::Conflict
                }
                other => internal(other, CREATE_FAILED_MESSAGE),
            })?;

        info!(id = %user.id, username = %user.username, "created user");
        Ok(user)
    }

    /// Get a user by ID. Absence is not an error.
    pub async fn get_user_by_id(&self, user_id: &str) -> DirectoryResult<Option<User>> {
        self.user_repository
            .find_by_id(user_id)
            .await
            .map_err(|e| internal(e, LOOKUP_FAILED_MESSAGE))
    }

    pub async fn user_count(&self) -> DirectoryResult<u64> {
        self.user_repository
            .count()
            .await
            .map_err(|e| internal(e, LOOKUP_FAILED_MESSAGE))
    }
}

/// Collapse an adapter error into a directory error. Storage faults are
/// logged here and never leave the service.
fn internal(e: UserError, message: &'static str) -> DirectoryError {
    match e {
        UserError::InvalidArgument(reason) => DirectoryError::InvalidArgument(reason),
        UserError::Duplicate(_) => DirectoryError::Conflict,
        UserError::CreateFailed => {
            error!("created user could not be read back");
            DirectoryError::Internal(message)
        }
        UserError::DatabaseError(cause) => {
            error!(error = %cause, "storage operation failed");
            DirectoryError::Internal(message)
        }
    }
}
