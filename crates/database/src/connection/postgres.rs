//! PostgreSQL connection provider

use chrono::{DateTime, Utc};
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::Postgres;
use std::time::Duration;
use tracing::info;
use userdir_config::ConnectionConfig;

use crate::types::{DatabaseError, DatabaseResult};

/// Pooled PostgreSQL connections for one database.
#[derive(Clone)]
pub struct PostgresProvider {
    pool: PgPool,
}

impl PostgresProvider {
    /// Build the pool and run the startup liveness check.
    pub async fn connect(config: &ConnectionConfig) -> DatabaseResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect_with(connect_options(config)?)
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        let provider = Self { pool };
        provider.test_connection().await?;
        Ok(provider)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check a connection out of the pool; dropping it releases it.
    pub async fn acquire(&self) -> DatabaseResult<PoolConnection<Postgres>> {
        self.pool.acquire().await.map_err(DatabaseError::from)
    }

    pub async fn test_connection(&self) -> DatabaseResult<()> {
        let (server_time,): (DateTime<Utc>,) = sqlx::query_as("SELECT NOW()")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        info!(%server_time, "postgres connection established");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("postgres pool closed");
    }
}

fn connect_options(config: &ConnectionConfig) -> DatabaseResult<PgConnectOptions> {
    if let Some(url) = &config.url {
        return url
            .parse::<PgConnectOptions>()
            .map_err(|e| DatabaseError::ConfigError(e.to_string()));
    }

    Ok(PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(&config.password)
        .database(&config.database))
}
