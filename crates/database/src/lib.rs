//! User Directory Storage Crate
//!
//! Connection providers, schema bootstrap, and the user record adapters for
//! the three supported engines: MongoDB, MySQL, and PostgreSQL.

use tracing::info;
use userdir_config::{DatabaseConfig, StorageBackend};

pub mod connection;
pub mod entities;
pub mod repos;
pub mod schema;
pub mod types;

pub use connection::{MongoProvider, MySqlProvider, PostgresProvider};
pub use entities::{CreateUserRequest, Secret, User, UserId};
pub use repos::{MongoUserRepository, MySqlUserRepository, PostgresUserRepository};
pub use types::{DatabaseError, DatabaseResult, UserError, UserResult};

/// The adapter for whichever backend the process was configured with.
#[derive(Clone)]
pub enum UserStorage {
    MongoDb(MongoUserRepository),
    MySql(MySqlUserRepository),
    Postgres(PostgresUserRepository),
}

impl UserStorage {
    pub fn backend(&self) -> StorageBackend {
        match self {
            UserStorage::MongoDb(_) => StorageBackend::MongoDb,
            UserStorage::MySql(_) => StorageBackend::MySql,
            UserStorage::Postgres(_) => StorageBackend::Postgres,
        }
    }

    pub async fn create(&self, request: &CreateUserRequest) -> UserResult<User> {
        match self {
            UserStorage::MongoDb(repo) => repo.create(request).await,
            UserStorage::MySql(repo) => repo.create(request).await,
            UserStorage::Postgres(repo) => repo.create(request).await,
        }
    }

    pub async fn find_by_id(&self, id: &str) -> UserResult<Option<User>> {
        match self {
            UserStorage::MongoDb(repo) => repo.find_by_id(id).await,
            UserStorage::MySql(repo) => repo.find_by_id(id).await,
            UserStorage::Postgres(repo) => repo.find_by_id(id).await,
        }
    }

    pub async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> UserResult<Option<UserId>> {
        match self {
            UserStorage::MongoDb(repo) => repo.find_by_username_or_email(username, email).await,
            UserStorage::MySql(repo) => repo.find_by_username_or_email(username, email).await,
            UserStorage::Postgres(repo) => repo.find_by_username_or_email(username, email).await,
        }
    }

    pub async fn count(&self) -> UserResult<u64> {
        match self {
            UserStorage::MongoDb(repo) => repo.count().await,
            UserStorage::MySql(repo) => repo.count().await,
            UserStorage::Postgres(repo) => repo.count().await,
        }
    }

    pub async fn test_connection(&self) -> DatabaseResult<()> {
        match self {
            UserStorage::MongoDb(repo) => repo.provider().test_connection().await,
            UserStorage::MySql(repo) => repo.provider().test_connection().await,
            UserStorage::Postgres(repo) => repo.provider().test_connection().await,
        }
    }

    /// Tear the pool down. Called once, on shutdown.
    pub async fn close(&self) {
        match self {
            UserStorage::MongoDb(repo) => repo.provider().close().await,
            UserStorage::MySql(repo) => repo.provider().close().await,
            UserStorage::Postgres(repo) => repo.provider().close().await,
        }
    }
}

/// Connect to the configured backend, check it is live, and make sure the storage
/// level uniqueness constraints exist.
pub async fn initialize_storage(config: &DatabaseConfig) -> DatabaseResult<UserStorage> {
    let settings = config.active();
    info!(
        backend = %config.backend,
        host = %settings.host,
        pool_size = settings.pool_size,
        "connecting to storage"
    );

    let storage = match config.backend {
        StorageBackend::MongoDb => {
            let provider = MongoProvider::connect(settings).await?;
            if config.ensure_schema {
                schema::ensure_mongodb_indexes(&provider).await?;
            }
            UserStorage::MongoDb(MongoUserRepository::new(provider))
        }
        StorageBackend::MySql => {
            let provider = MySqlProvider::connect(settings).await?;
            if config.ensure_schema {
                schema::ensure_mysql_schema(&provider).await?;
            }
            UserStorage::MySql(MySqlUserRepository::new(provider))
        }
        StorageBackend::Postgres => {
            let provider = PostgresProvider::connect(settings).await?;
            if config.ensure_schema {
                schema::ensure_postgres_schema(&provider).await?;
            }
            UserStorage::Postgres(PostgresUserRepository::new(provider))
        }
    };

    info!(backend = %storage.backend(), "storage ready");
    Ok(storage)
}
