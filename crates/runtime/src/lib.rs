use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use userdir_config::AppConfig;
use userdir_database::{initialize_storage, UserStorage};
use userdir_users::UserService;

pub mod telemetry {
    use anyhow::Result;
    use tracing::Level;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_max_level(Level::INFO)
            .with_env_filter(env_filter)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

/// Everything a running directory needs, built once at startup.
#[derive(Clone)]
pub struct DirectoryServices {
    pub storage: UserStorage,
    pub users: Arc<UserService>,
}

impl DirectoryServices {
    /// Connect to the configured backend and wire the service to it. An
    /// unreachable backend is an error here; the caller is expected to abort.
    pub async fn initialise(config: &AppConfig) -> Result<Self> {
        let storage = initialize_storage(&config.database)
            .await
            .with_context(|| {
                format!("failed to initialise {} storage", config.database.backend)
            })?;

        let users = Arc::new(UserService::new(storage.clone()));
        info!(backend = %storage.backend(), "directory services ready");

        Ok(Self { storage, users })
    }

    /// Release the pool. Call after the HTTP server has drained.
    pub async fn shutdown(&self) {
        self.storage.close().await;
        info!(backend = %self.storage.backend(), "storage pool closed");
    }
}

pub async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(?error, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
