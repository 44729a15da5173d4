use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "userdir.toml",
    "config/userdir.toml",
    "crates/config/userdir.toml",
    "../userdir.toml",
    "../config/userdir.toml",
];

/// Variables understood by earlier deployments of the directory, mapped onto
/// their configuration keys. They take precedence over `USERDIR__*` values.
const LEGACY_ENV_OVERRIDES: &[(&str, &str)] = &[
    ("MONGODB_URI", "database.mongodb.url"),
    ("POSTGRES_URI", "database.postgres.url"),
    ("MYSQL_HOST", "database.mysql.host"),
    ("MYSQL_USER", "database.mysql.user"),
    ("MYSQL_PASSWORD", "database.mysql.password"),
    ("MYSQL_DATABASE", "database.mysql.database"),
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Storage engine backing the directory. Chosen once per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    MongoDb,
    MySql,
    Postgres,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::MongoDb => "mongodb",
            StorageBackend::MySql => "mysql",
            StorageBackend::Postgres => "postgres",
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    /// Create the `users` table or indexes on startup when missing.
    pub ensure_schema: bool,
    pub mongodb: ConnectionConfig,
    pub mysql: ConnectionConfig,
    pub postgres: ConnectionConfig,
}

impl DatabaseConfig {
    /// Connection settings of the selected backend.
    pub fn active(&self) -> &ConnectionConfig {
        match self.backend {
            StorageBackend::MongoDb => &self.mongodb,
            StorageBackend::MySql => &self.mysql,
            StorageBackend::Postgres => &self.postgres,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Postgres,
            ensure_schema: true,
            mongodb: ConnectionConfig::mongodb(),
            mysql: ConnectionConfig::mysql(),
            postgres: ConnectionConfig::postgres(),
        }
    }
}

/// Connection parameters for one storage engine.
///
/// When `url` is set it wins over the discrete fields.
///
/// ```
/// use userdir_config::ConnectionConfig;
///
/// let mysql = ConnectionConfig::mysql();
/// assert_eq!(mysql.port, 3306);
/// assert_eq!(mysql.user, "root");
/// assert_eq!(mysql.pool_size, 10);
/// assert!(mysql.url.is_none());
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default)]
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub pool_size: u32,
    pub acquire_timeout_seconds: u64,
}

impl ConnectionConfig {
    const DEFAULT_POOL_SIZE: u32 = 10;
    const DEFAULT_ACQUIRE_TIMEOUT: u64 = 30;

    fn with_port(port: u16, user: &str) -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port,
            user: user.to_string(),
            password: String::new(),
            database: "mydatabase".to_string(),
            pool_size: Self::DEFAULT_POOL_SIZE,
            acquire_timeout_seconds: Self::DEFAULT_ACQUIRE_TIMEOUT,
        }
    }

    pub fn mongodb() -> Self {
        Self::with_port(27017, "")
    }

    pub fn mysql() -> Self {
        Self::with_port(3306, "root")
    }

    pub fn postgres() -> Self {
        Self::with_port(5432, "postgres")
    }
}

// Hand-written so credentials never reach the logs.
impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("url", &self.url.as_ref().map(|_| "<redacted>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("pool_size", &self.pool_size)
            .field("acquire_timeout_seconds", &self.acquire_timeout_seconds)
            .finish()
    }
}

type Builder = config::ConfigBuilder<config::builder::DefaultState>;

fn connection_defaults(
    builder: Builder,
    section: &str,
    defaults: &ConnectionConfig,
) -> anyhow::Result<Builder> {
    let key = |field: &str| format!("database.{section}.{field}");

    let builder = builder
        .set_default(key("host"), defaults.host.clone())?
        .set_default(key("port"), i64::from(defaults.port))?
        .set_default(key("user"), defaults.user.clone())?
        .set_default(key("password"), defaults.password.clone())?
        .set_default(key("database"), defaults.database.clone())?
        .set_default(key("pool_size"), i64::from(defaults.pool_size))?
        .set_default(
            key("acquire_timeout_seconds"),
            i64::try_from(defaults.acquire_timeout_seconds).unwrap_or(i64::MAX),
        )?;

    Ok(builder)
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use userdir_config::load;
///
/// std::env::remove_var("USERDIR_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.http.address.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let mut builder = config::Config::builder()
        .set_default("http.address", defaults.http.address.clone())?
        .set_default("http.port", i64::from(defaults.http.port))?
        .set_default("database.backend", defaults.database.backend.as_str())?
        .set_default("database.ensure_schema", defaults.database.ensure_schema)?;

    builder = connection_defaults(builder, "mongodb", &defaults.database.mongodb)?;
    builder = connection_defaults(builder, "mysql", &defaults.database.mysql)?;
    builder = connection_defaults(builder, "postgres", &defaults.database.postgres)?;

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("USERDIR_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via USERDIR_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(config::Environment::with_prefix("USERDIR").separator("__"));

    for (variable, key) in LEGACY_ENV_OVERRIDES {
        let value = std::env::var(variable).ok();
        if value.is_some() {
            debug!(variable, key, "applying legacy environment override");
        }
        builder = builder.set_override_option(*key, value)?;
    }

    let cfg = builder.build().context("unable to build configuration")?;

    let config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    for (name, connection) in [
        ("mongodb", &config.database.mongodb),
        ("mysql", &config.database.mysql),
        ("postgres", &config.database.postgres),
    ] {
        if connection.pool_size == 0 {
            bail!("invalid configuration: database.{name}.pool_size must be at least 1");
        }
    }

    debug!(?config, "loaded directory configuration");
    Ok(config)
}
