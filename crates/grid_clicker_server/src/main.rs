//! Grid Clicker - backend CLI
//!
//! Serves the HTTP API and runs maintenance tasks against the database.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use grid_clicker_server::{
    Category, ClickerBackend, MAX_LEADERBOARD_SIZE, ServerConfig, SqliteStore,
    api::{self, AppState},
};
use tracing::{info, instrument, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info,grid_clicker_server=debug";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = ServerConfig::load(Some(cli.config.as_path()))?.with_env_overrides();
    if let Some(db_path) = cli.db_path.clone() {
        config = config.with_database_path(db_path);
    }

    let fallback = config.log_filter().clone().unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .init();

    match cli.command {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config = config.with_bind_address(bind);
            }
            run_server(config).await
        }
        Command::Migrate => run_migrate(&config),
        Command::Rerank => run_rerank(&config),
        Command::Top { category, limit } => run_top(&config, &category, limit),
    }
}

fn open_store(config: &ServerConfig) -> Result<SqliteStore> {
    Ok(SqliteStore::open_with(config.database_path(), config.store_options())?)
}

/// Run the HTTP server until Ctrl-C.
#[instrument(skip(config), fields(bind = %config.bind_address()))]
async fn run_server(config: ServerConfig) -> Result<()> {
    info!("Starting Grid Clicker backend");

    let store = open_store(&config)?;
    let backend = ClickerBackend::new(store.clone(), config.backend_settings());
    let app = api::router(AppState::new(store, backend));

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    info!(address = %listener.local_addr()?, "Server ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        return;
    }
    info!("Shutdown requested");
}

/// Open the database, applying pending migrations.
#[instrument(skip(config), fields(db_path = %config.database_path()))]
fn run_migrate(config: &ServerConfig) -> Result<()> {
    let store = open_store(config)?;
    let pending = store.run_migrations()?;
    info!(pending, "Database is up to date");
    Ok(())
}

/// Recompute every category's ranks.
#[instrument(skip(config), fields(db_path = %config.database_path()))]
fn run_rerank(config: &ServerConfig) -> Result<()> {
    let store = open_store(config)?;
    let backend = ClickerBackend::new(store, config.backend_settings());
    let entries = backend.ranker().recompute_all()?;
    info!(entries, "Leaderboards recomputed");
    Ok(())
}

/// Print a leaderboard to stdout as JSON.
#[instrument(skip(config), fields(db_path = %config.database_path()))]
fn run_top(config: &ServerConfig, category: &str, limit: Option<usize>) -> Result<()> {
    let category = Category::parse(category)?;
    let store = open_store(config)?;
    let backend = ClickerBackend::new(store, config.backend_settings());

    let rows = match limit {
        Some(limit) => backend.queries().top_n(category, limit.min(MAX_LEADERBOARD_SIZE))?,
        None => backend.on_leaderboard_query(Some(category))?,
    };

    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}
