use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;
use userdir_api::{build_router, AppState};
use userdir_config::load as load_config;
use userdir_database::initialize_storage;
use userdir_runtime::{telemetry, DirectoryServices};

#[derive(Parser)]
#[command(name = "userdir")]
#[command(about = "User directory over MongoDB, MySQL or PostgreSQL (serves HTTP by default)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Serve,
    /// Connect to the configured backend, ping it, and exit
    Ping,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing().context("failed to initialise tracing")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server().await,
        Commands::Ping => ping().await,
    }
}

async fn run_server() -> anyhow::Result<()> {
    info!("starting user directory");

    let config = load_config().context("failed to load configuration")?;

    let services = DirectoryServices::initialise(&config)
        .await
        .context("failed to initialise directory services")?;

    let app = build_router(AppState::new(services.users.clone()));

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, backend = %config.database.backend, "http server listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(userdir_runtime::shutdown_signal())
        .await
        .context("http server error");

    services.shutdown().await;
    served?;

    info!("user directory shut down");
    Ok(())
}

async fn ping() -> anyhow::Result<()> {
    let config = load_config().context("failed to load configuration")?;
    let mut database = config.database.clone();
    database.ensure_schema = false;

    let storage = initialize_storage(&database)
        .await
        .with_context(|| format!("failed to reach {} storage", database.backend))?;

    let ping = storage.test_connection().await;
    storage.close().await;
    ping.with_context(|| format!("{} liveness check failed", database.backend))?;

    println!("{} storage is reachable", database.backend);
    Ok(())
}
