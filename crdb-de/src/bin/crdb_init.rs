//! Database initializer
//!
//! Creates the schema and seeds schools, teams, conference affiliations and
//! the current participation season.
//!
//! **Usage:**
//! ```bash
//! crdb-init [DATABASE] [--force]
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use crdb_common::config::{resolve_database_path, DATABASE_ENV_VAR};
use crdb_common::db::init_database;
use crdb_common::db::seed::{initialize, summary};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "crdb-init")]
#[command(about = "Create and seed the college rowing results database")]
#[command(version)]
struct Args {
    /// Database file (defaults to CRDB_DATABASE, the config file, then the data directory)
    database: Option<PathBuf>,

    /// Clear existing school data (and all results) before seeding
    #[arg(long)]
    force: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        "CRDB initializer v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();
    let db_path = resolve_database_path(args.database.as_deref(), DATABASE_ENV_VAR);
    info!("Database path: {}", db_path.display());

    if args.force {
        warn!("--force: existing schools, entries and results will be removed");
    }

    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to create database at {}", db_path.display()))?;

    let report = initialize(&pool, args.force)
        .await
        .context("Failed to seed database")?;

    if report.skipped {
        info!("Database already has schools; use --force to re-seed");
    } else {
        info!(
            "Seeded {} school(s), {} team(s), {} affiliation(s), {} participation row(s)",
            report.schools_added,
            report.teams_added,
            report.affiliations_added,
            report.participations_added
        );
    }

    summary(&pool)
        .await
        .context("Failed to summarize database")?
        .log();

    pool.close().await;
    Ok(())
}
