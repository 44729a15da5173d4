//! In-memory user repository for exercising the service without a database.
//!
//! It honours the same contract as the real adapters, including the
//! storage-level uniqueness constraint, and can be told to misbehave so the
//! service's failure paths can be driven from tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use userdir_database::{CreateUserRequest, Secret, User, UserError, UserId, UserResult};

struct StoredUser {
    user: User,
    password: Secret,
}

/// Mock user repository for testing
#[derive(Clone, Default)]
pub struct MockUserRepository {
    users: Arc<RwLock<HashMap<i64, StoredUser>>>,
    next_id: Arc<RwLock<i64>>,
    blind_lookups: Arc<AtomicBool>,
    lose_writes: Arc<AtomicBool>,
    storage_down: Arc<AtomicBool>,
    create_calls: Arc<AtomicUsize>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `find_by_username_or_email` report nothing, as if a concurrent
    /// create had not landed yet when the pre-check ran.
    pub fn with_blind_lookups(self) -> Self {
        self.blind_lookups.store(true, Ordering::SeqCst);
        self
    }

    /// Persist writes but fail to read them back.
    pub fn with_lost_writes(self) -> Self {
        self.lose_writes.store(true, Ordering::SeqCst);
        self
    }

    /// Fail every call the way an unreachable database would.
    pub fn with_storage_down(self) -> Self {
        self.storage_down.store(true, Ordering::SeqCst);
        self
    }

    /// Number of times `create` has been invoked, successful or not.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// The credential stored for a user, for checking it was passed through.
    pub async fn stored_password(&self, id: i64) -> Option<String> {
        let users = self.users.read().await;
        users.get(&id).map(|stored| stored.password.expose().to_string())
    }

    fn check_storage(&self) -> UserResult<()> {
        if self.storage_down.load(Ordering::SeqCst) {
            return Err(UserError::DatabaseError("connection refused".to_string()));
        }
        Ok(())
    }

    pub async fn create(&self, request: &CreateUserRequest) -> UserResult<User> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.check_storage()?;
        let request = request.normalized();

        let mut users = self.users.write().await;
        if users.values().any(|stored| {
            stored.user.username == request.username || stored.user.email == request.email
        }) {
            return Err(UserError::Duplicate(
                "unique constraint on username or email".to_string(),
            ));
        }

        let mut next_id = self.next_id.write().await;
        *next_id += 1;
        let user_id = *next_id;

        let now = Utc::now();
        let user = User {
            id: UserId::Serial(user_id),
            username: request.username,
            email: request.email,
            full_name: request.full_name,
            created_at: now,
            updated_at: now,
        };
        users.insert(
            user_id,
            StoredUser {
                user: user.clone(),
                password: request.password,
            },
        );

        if self.lose_writes.load(Ordering::SeqCst) {
            return Err(UserError::CreateFailed);
        }
        Ok(user)
    }

    pub async fn find_by_id(&self, id: &str) -> UserResult<Option<User>> {
        self.check_storage()?;
        let id = id.trim();
        if id.is_empty() {
            return Err(UserError::InvalidArgument("user id must not be empty".to_string()));
        }
        let Ok(id) = id.parse::<i64>() else {
            return Ok(None);
        };

        let users = self.users.read().await;
        Ok(users.get(&id).map(|stored| stored.user.clone()))
    }

    pub async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> UserResult<Option<UserId>> {
        self.check_storage()?;
        if self.blind_lookups.load(Ordering::SeqCst) {
            return Ok(None);
        }

        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|stored| stored.user.username == username || stored.user.email == email)
            .map(|stored| stored.user.id.clone()))
    }

    pub async fn count(&self) -> UserResult<u64> {
        self.check_storage()?;
        let users = self.users.read().await;
        Ok(users.len() as u64)
    }
}
