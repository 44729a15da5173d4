//! Test plan for the `userdir-config` crate.
//!
//! These tests exercise the configuration loader across default handling,
//! file discovery, environment overrides, and validation behaviour.

use std::fs;
use std::path::{Path, PathBuf};

use serial_test::serial;
use tempfile::TempDir;

use userdir_config::{load, AppConfig, ConnectionConfig, HttpConfig, StorageBackend};

const ENV_VARS_TO_RESET: &[&str] = &[
    "USERDIR_CONFIG",
    "USERDIR__HTTP__ADDRESS",
    "USERDIR__HTTP__PORT",
    "USERDIR__DATABASE__BACKEND",
    "USERDIR__DATABASE__ENSURE_SCHEMA",
    "USERDIR__DATABASE__MYSQL__HOST",
    "USERDIR__DATABASE__MYSQL__POOL_SIZE",
    "USERDIR__DATABASE__POSTGRES__URL",
    "USERDIR__DATABASE__POSTGRES__POOL_SIZE",
    "USERDIR__DATABASE__MONGODB__URL",
    "MONGODB_URI",
    "POSTGRES_URI",
    "MYSQL_HOST",
    "MYSQL_USER",
    "MYSQL_PASSWORD",
    "MYSQL_DATABASE",
];

struct TestContext {
    vars: Vec<(String, Option<String>)>,
    original_dir: Option<PathBuf>,
}

impl TestContext {
    fn new() -> Self {
        Self {
            vars: Vec::new(),
            original_dir: None,
        }
    }

    fn reset_environment(&mut self) {
        for key in ENV_VARS_TO_RESET {
            self.remove_var(key);
        }
    }

    fn set_var(&mut self, key: &str, value: impl AsRef<str>) {
        let previous = std::env::var(key).ok();
        std::env::set_var(key, value.as_ref());
        self.vars.push((key.to_string(), previous));
    }

    fn remove_var(&mut self, key: &str) {
        let previous = std::env::var(key).ok();
        std::env::remove_var(key);
        self.vars.push((key.to_string(), previous));
    }

    fn set_current_dir(&mut self, dir: &Path) {
        if self.original_dir.is_none() {
            self.original_dir =
                Some(std::env::current_dir().expect("failed to capture current directory"));
        }
        std::env::set_current_dir(dir).expect("failed to set current directory");
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        if let Some(original) = self.original_dir.take() {
            let _ = std::env::set_current_dir(original);
        }

        while let Some((key, value)) = self.vars.pop() {
            match value {
                Some(val) => std::env::set_var(&key, val),
                None => std::env::remove_var(&key),
            }
        }
    }
}

fn write_config_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("failed to create config directories");
    }
    fs::write(path, contents).expect("failed to write config file");
}

fn isolated() -> (TempDir, TestContext) {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = TestContext::new();
    ctx.reset_environment();
    ctx.set_current_dir(temp_dir.path());
    (temp_dir, ctx)
}

#[test]
#[serial]
fn load_uses_default_values_when_no_files_found() {
    let (_temp_dir, _ctx) = isolated();

    let config = load().expect("configuration load should succeed without files");
    let defaults = AppConfig::default();

    assert_eq!(config.http.address, defaults.http.address);
    assert_eq!(config.http.port, defaults.http.port);
    assert_eq!(config.database.backend, StorageBackend::Postgres);
    assert!(config.database.ensure_schema);
    assert_eq!(config.database.mysql.host, "localhost");
    assert_eq!(config.database.mysql.user, "root");
    assert_eq!(config.database.mysql.database, "mydatabase");
    assert_eq!(config.database.mysql.pool_size, 10);
    assert_eq!(config.database.postgres.port, 5432);
    assert_eq!(config.database.mongodb.port, 27017);
    assert!(config.database.postgres.url.is_none());
}

#[test]
#[serial]
fn load_picks_first_available_file_in_search_order() {
    let (temp_dir, _ctx) = isolated();

    write_config_file(
        temp_dir.path(),
        "userdir.toml",
        r#"
        [http]
        port = 4242
        "#,
    );
    write_config_file(
        temp_dir.path(),
        "config/userdir.toml",
        r#"
        [http]
        port = 5151
        "#,
    );

    let config = load().expect("configuration load should pick the first file");
    assert_eq!(config.http.port, 4242);
}

#[test]
#[serial]
fn load_merges_partial_backend_section_with_defaults() {
    let (temp_dir, _ctx) = isolated();

    write_config_file(
        temp_dir.path(),
        "userdir.toml",
        r#"
        [database]
        backend = "mysql"

        [database.mysql]
        host = "db.internal"
        pool_size = 4
        "#,
    );

    let config = load().expect("configuration load should succeed");
    let defaults = ConnectionConfig::mysql();

    assert_eq!(config.database.backend, StorageBackend::MySql);
    assert_eq!(config.database.active().host, "db.internal");
    assert_eq!(config.database.active().pool_size, 4);
    assert_eq!(config.database.active().port, defaults.port);
    assert_eq!(config.database.active().user, defaults.user);
    assert_eq!(
        config.database.active().acquire_timeout_seconds,
        defaults.acquire_timeout_seconds
    );
}

#[test]
#[serial]
fn load_applies_environment_overrides() {
    let (temp_dir, mut ctx) = isolated();

    write_config_file(
        temp_dir.path(),
        "userdir.toml",
        r#"
        [http]
        port = 3030
        "#,
    );

    ctx.set_var("USERDIR__HTTP__PORT", "8080");
    ctx.set_var("USERDIR__DATABASE__BACKEND", "mongodb");
    ctx.set_var("USERDIR__DATABASE__POSTGRES__POOL_SIZE", "25");

    let config = load().expect("configuration load should honour env overrides");
    assert_eq!(config.http.port, 8080);
    assert_eq!(config.database.backend, StorageBackend::MongoDb);
    assert_eq!(config.database.postgres.pool_size, 25);
}

#[test]
#[serial]
fn load_reads_explicit_config_path() {
    let (temp_dir, mut ctx) = isolated();

    write_config_file(
        temp_dir.path(),
        "elsewhere/custom.toml",
        r#"
        [database]
        ensure_schema = false
        "#,
    );
    let path = temp_dir.path().join("elsewhere/custom.toml");
    ctx.set_var("USERDIR_CONFIG", path.display().to_string());

    let config = load().expect("configuration load should use USERDIR_CONFIG");
    assert!(!config.database.ensure_schema);
}

#[test]
#[serial]
fn load_honours_legacy_connection_variables() {
    let (_temp_dir, mut ctx) = isolated();

    ctx.set_var("POSTGRES_URI", "postgres://app:pw@pg:5432/users");
    ctx.set_var("MONGODB_URI", "mongodb://mongo:27017/users");
    ctx.set_var("MYSQL_HOST", "mysql.internal");
    ctx.set_var("MYSQL_USER", "directory");
    ctx.set_var("MYSQL_PASSWORD", "pw");
    ctx.set_var("MYSQL_DATABASE", "accounts");

    let config = load().expect("configuration load should read legacy variables");
    assert_eq!(
        config.database.postgres.url.as_deref(),
        Some("postgres://app:pw@pg:5432/users")
    );
    assert_eq!(
        config.database.mongodb.url.as_deref(),
        Some("mongodb://mongo:27017/users")
    );
    assert_eq!(config.database.mysql.host, "mysql.internal");
    assert_eq!(config.database.mysql.user, "directory");
    assert_eq!(config.database.mysql.password, "pw");
    assert_eq!(config.database.mysql.database, "accounts");
}

#[test]
#[serial]
fn legacy_variables_win_over_prefixed_ones() {
    let (_temp_dir, mut ctx) = isolated();

    ctx.set_var("USERDIR__DATABASE__MYSQL__HOST", "prefixed");
    ctx.set_var("MYSQL_HOST", "legacy");

    let config = load().expect("configuration load should succeed");
    assert_eq!(config.database.mysql.host, "legacy");
}

#[test]
#[serial]
fn load_rejects_zero_pool_size() {
    let (_temp_dir, mut ctx) = isolated();

    ctx.set_var("USERDIR__DATABASE__MYSQL__POOL_SIZE", "0");

    let error = load().expect_err("a zero pool size should be rejected");
    assert!(
        error.to_string().contains("pool_size"),
        "unexpected error message: {error}"
    );
}

#[test]
#[serial]
fn load_rejects_unknown_backend() {
    let (_temp_dir, mut ctx) = isolated();

    ctx.set_var("USERDIR__DATABASE__BACKEND", "sqlite");

    let error = load().expect_err("an unknown backend should be rejected");
    assert!(
        error.to_string().contains("invalid configuration"),
        "unexpected error message: {error}"
    );
}

#[test]
#[serial]
fn load_errors_on_invalid_toml_contents() {
    let (temp_dir, _ctx) = isolated();

    write_config_file(
        temp_dir.path(),
        "userdir.toml",
        r#"
        [http]
        port = "not-a-number
        "#,
    );

    let error = load().expect_err("invalid TOML should cause load to fail");
    let message = error.to_string();
    assert!(
        message.contains("invalid configuration") || message.contains("unable to build configuration"),
        "unexpected error message: {message}"
    );
}

#[test]
fn http_config_defaults_match_expected_host_and_port() {
    let defaults = HttpConfig::default();
    assert_eq!(defaults.address, "127.0.0.1");
    assert_eq!(defaults.port, 8000);
}
