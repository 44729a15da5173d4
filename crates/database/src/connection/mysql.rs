//! MySQL connection provider

use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use sqlx::pool::PoolConnection;
use sqlx::MySql;
use std::time::Duration;
use tracing::info;
use userdir_config::ConnectionConfig;

use crate::types::{DatabaseError, DatabaseResult};

/// Pooled MySQL connections for one database.
#[derive(Clone)]
pub struct MySqlProvider {
    pool: MySqlPool,
}

impl MySqlProvider {
    /// Build the pool and run the startup liveness check.
    pub async fn connect(config: &ConnectionConfig) -> DatabaseResult<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect_with(connect_options(config)?)
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        let provider = Self { pool };
        provider.test_connection().await?;
        Ok(provider)
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Check a connection out of the pool. It goes back when dropped, so
    /// every exit path of the caller releases it.
    pub async fn acquire(&self) -> DatabaseResult<PoolConnection<MySql>> {
        self.pool.acquire().await.map_err(DatabaseError::from)
    }

    pub async fn test_connection(&self) -> DatabaseResult<()> {
        let mut conn = self.acquire().await?;
        let (connection_id,): (i64,) = sqlx::query_as("SELECT CAST(CONNECTION_ID() AS SIGNED)")
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        info!(connection_id, "mysql connection established");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("mysql pool closed");
    }
}

fn connect_options(config: &ConnectionConfig) -> DatabaseResult<MySqlConnectOptions> {
    if let Some(url) = &config.url {
        return url
            .parse::<MySqlConnectOptions>()
            .map_err(|e| DatabaseError::ConfigError(e.to_string()));
    }

    Ok(MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(&config.password)
        .database(&config.database))
}
