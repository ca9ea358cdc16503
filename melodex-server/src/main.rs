//! melodex-server - music discovery service
//!
//! Configuration priority: command line, then `MELODEX_*` environment
//! variables, then the TOML file, then built-in defaults.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use melodex_common::config::{default_config_path, TomlConfig};
use melodex_server::services::{OpenAiCompletion, SpotifyCatalog};
use melodex_server::{build_router, db, AppState};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for melodex-server
#[derive(Parser, Debug)]
#[command(name = "melodex-server")]
#[command(about = "Music discovery service: catalog search, AI recommendations and favorites")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "MELODEX_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on (overrides config)
    #[arg(short, long)]
    bind: Option<String>,

    /// SQLite database file (overrides config)
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Log level (overrides config)
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let mut config = TomlConfig::load(&config_path).context("Failed to load configuration")?;
    config
        .apply_env_overrides()
        .context("Invalid environment override")?;

    if let Some(bind) = args.bind {
        config.server.bind_addr = bind;
    }
    if let Some(database) = args.database {
        config.server.database_path = Some(database);
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "melodex_server={level},melodex_common={level},tower_http={level}",
                    level = config.logging.level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting melodex-server v{} ({:?})",
        env!("CARGO_PKG_VERSION"),
        config.server.environment
    );

    let db_path = config.database_path();
    info!("Database path: {}", db_path.display());

    let pool = db::connect(&db_path)
        .await
        .context("Failed to open database")?;
    info!("Connected to database");

    let catalog =
        SpotifyCatalog::from_config(&config.catalog).context("Failed to build catalog client")?;
    if !catalog.is_configured() {
        warn!("Spotify credentials not configured - search and recommendations will fail");
    }

    let completion = OpenAiCompletion::from_config(&config.completion)
        .context("Failed to build completion client")?;
    if !completion.is_configured() {
        warn!("OpenAI API key not configured - recommendations will fail");
    }

    let state = AppState::new(
        pool,
        Arc::new(catalog),
        Arc::new(completion),
        config.server.environment,
    );
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server.bind_addr))?;

    info!("melodex-server listening on http://{}", config.server.bind_addr);
    info!("Health check: http://{}/health", config.server.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
