//! # Stockwise Server
//!
//! Loads configuration, opens the database (running migrations) and serves
//! the HTTP API until Ctrl+C / SIGTERM.

use std::sync::Arc;

use anyhow::Context;
use stockwise_db::Database;
use stockwise_server::{build_router, AppState, ServerConfig};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info,stockwise=debug,sqlx=warn,tower_http=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting Stockwise server...");

    // Load configuration
    let config = ServerConfig::load().context("Failed to load configuration")?;
    info!(
        port = config.http_port,
        database = %config.database_path.display(),
        max_connections = config.db_max_connections,
        "Configuration loaded"
    );
    if config.uses_dev_secret() {
        warn!("Using the development JWT secret; set STOCKWISE_JWT_SECRET in production");
    }

    // Connect to database (migrations run on connect)
    let db = Database::new(config.db_config())
        .await
        .context("Failed to open database")?;
    info!("Database ready");

    let state = Arc::new(AppState::new(db.clone(), &config));
    let app = build_router(state);

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
