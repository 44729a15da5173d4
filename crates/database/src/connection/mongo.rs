//! MongoDB connection provider
//!
//! The driver owns the connection pool and checks a connection out for the
//! duration of each operation, so "acquire" here hands out collection
//! handles bound to the pooled client.

use mongodb::bson::doc;
use mongodb::options::{ClientOptions, Credential};
use mongodb::{Client, Collection, Database};
use std::time::Duration;
use tracing::info;
use userdir_config::ConnectionConfig;

use crate::types::{DatabaseError, DatabaseResult};

const APP_NAME: &str = "userdir";

/// Pooled MongoDB client bound to one database.
#[derive(Clone)]
pub struct MongoProvider {
    client: Client,
    database: Database,
}

impl MongoProvider {
    /// Build the client and run the startup liveness check.
    pub async fn connect(config: &ConnectionConfig) -> DatabaseResult<Self> {
        let options = client_options(config).await?;
        let database_name = options
            .default_database
            .clone()
            .unwrap_or_else(|| config.database.clone());

        let client = Client::with_options(options)?;
        let database = client.database(&database_name);

        let provider = Self { client, database };
        provider.test_connection().await?;
        Ok(provider)
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.database.collection(name)
    }

    pub async fn test_connection(&self) -> DatabaseResult<()> {
        self.database
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        info!(database = %self.database.name(), "mongodb connection established");
        Ok(())
    }

    pub async fn close(&self) {
        self.client.clone().shutdown().await;
        info!("mongodb client closed");
    }
}

async fn client_options(config: &ConnectionConfig) -> DatabaseResult<ClientOptions> {
    let mut options = match &config.url {
        Some(url) => ClientOptions::parse(url).await?,
        None => {
            let mut options =
                ClientOptions::parse(format!("mongodb://{}:{}", config.host, config.port)).await?;
            if !config.user.is_empty() {
                let mut credential = Credential::default();
                credential.username = Some(config.user.clone());
                credential.password = Some(config.password.clone());
                options.credential = Some(credential);
            }
            options
        }
    };

    options.app_name = Some(APP_NAME.to_string());
    options.max_pool_size = Some(config.pool_size);
    options.server_selection_timeout = Some(Duration::from_secs(config.acquire_timeout_seconds));
    Ok(options)
}
