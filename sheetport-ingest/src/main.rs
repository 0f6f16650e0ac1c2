//! sheetport-ingest - bulk spreadsheet import service
//!
//! Serves template download, preview and commit endpoints over HTTP.
//! Configuration comes from a TOML file plus CLI/ENV overrides; entities are
//! stored in `sheetport.db` under the root folder.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sheetport_common::config::{load_config, RootFolderInitializer, RootFolderResolver};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sheetport_ingest::db::{init_database_pool, SqliteEntityStore};
use sheetport_ingest::{build_router, AppState};

/// Command-line arguments for sheetport-ingest
#[derive(Parser, Debug)]
#[command(name = "sheetport-ingest")]
#[command(about = "Bulk spreadsheet import service")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "SHEETPORT_CONFIG")]
    config: Option<PathBuf>,

    /// Folder holding the database
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Listen address, overrides `bind_address`
    #[arg(short, long, env = "SHEETPORT_BIND")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref()).context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting sheetport-ingest v{}",
        env!("CARGO_PKG_VERSION")
    );

    let root_folder = RootFolderResolver::new(args.root_folder.as_deref(), Some(&config)).resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;

    let db_path = initializer.database_path();
    info!("Database: {}", db_path.display());

    let pool = init_database_pool(&db_path)
        .await
        .context("Failed to open database")?;
    let store = Arc::new(SqliteEntityStore::new(pool));

    let corrector = sheetport_ingest::config::build_corrector(&config.correction)
        .context("Failed to configure header correction")?;

    let state = AppState::new(corrector, store, config.commit.effective_concurrency());
    let app = build_router(state);

    let bind_address = args
        .bind
        .unwrap_or_else(|| config.bind_address().to_string());
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_address))?;

    info!("Listening on http://{}", bind_address);
    info!("Health check: http://{}/health", bind_address);

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
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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
