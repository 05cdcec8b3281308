//! crdb-de - rowing results data entry service
//!
//! Serves the JSON API for entering regatta results and maintaining school,
//! conference and participation data. The database must already have been
//! created with `crdb-init`.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use crdb_common::config::{load_toml_config, resolve_database_path_with, DATABASE_ENV_VAR};
use crdb_common::db::open_database;
use crdb_de::{build_router, AppState};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_PORT: u16 = 5800;
const DEFAULT_BIND: &str = "127.0.0.1";

#[derive(Parser, Debug)]
#[command(name = "crdb-de")]
#[command(about = "Data entry service for college rowing results")]
#[command(version)]
struct Args {
    /// SQLite database file
    #[arg(short, long, env = "CRDB_DATABASE")]
    database: Option<PathBuf>,

    /// Port to listen on (default 5800)
    #[arg(short, long, env = "CRDB_PORT")]
    port: Option<u16>,

    /// Address to bind (default 127.0.0.1)
    #[arg(long, env = "CRDB_BIND")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting CRDB data entry (crdb-de) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();
    let config = load_toml_config();

    let db_path = resolve_database_path_with(args.database.as_deref(), DATABASE_ENV_VAR, &config);
    info!("Database path: {}", db_path.display());

    let pool = match open_database(&db_path).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Cannot open database: {}", e);
            warn!("Run crdb-init to create and seed the database first");
            return Err(e).context("Failed to open database");
        }
    };

    let port = args.port.or(config.port).unwrap_or(DEFAULT_PORT);
    let bind = args
        .bind
        .or(config.bind)
        .unwrap_or_else(|| DEFAULT_BIND.to_string());
    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", bind, port))?;

    let app = build_router(AppState::new(pool.clone()));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("crdb-de listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}

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
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
