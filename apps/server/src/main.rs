//! # Stockroom Server
//!
//! HTTP server for the Stockroom inventory and checkout backend.
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  tracing (RUST_LOG, default info)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ServerConfig::load($STOCKROOM_CONFIG)  defaults → TOML → env           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new  (pool, WAL, migrations when auto_migrate)               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  axum::serve ── until Ctrl+C / SIGTERM ──► close pool                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use stockroom_server::config::ServerConfig;
use stockroom_server::{router, AppState};
use stockroom_db::Database;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("Starting Stockroom server...");

    // Load configuration
    let config_path = std::env::var_os("STOCKROOM_CONFIG").map(PathBuf::from);
    let config = ServerConfig::load(config_path)?;
    info!(
        addr = %config.bind_address(),
        db_path = %config.database.path.display(),
        "Configuration loaded"
    );

    // Connect to database
    if !config.database.auto_migrate {
        info!("Auto migration disabled, skipping");
    }
    let db = Database::new(config.db_config()).await?;

    let state = AppState::new(db.clone(), config.checkout_timeout());

    let listener = TcpListener::bind(config.bind_address()).await?;
    info!(addr = %listener.local_addr()?, "Server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
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
