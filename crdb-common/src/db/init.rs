//! Database initialization
//!
//! `crdb-init` creates and seeds a database with [`init_database`]. The
//! data-entry service only opens databases that already hold schools and
//! teams ([`open_database`]); pointing it at an empty file is an operator
//! mistake, not something to paper over with an empty schema.

use crate::db::schema_sync::SchemaIntrospector;
use crate::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Open (creating if needed) a database and bring its schema up to date
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let pool = connect(db_path, true).await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    prepare_schema(&pool).await?;
    Ok(pool)
}

/// Open a seeded database for data entry
///
/// Fails with [`Error::NotInitialized`] when the file is missing or has no
/// schools or teams.
pub async fn open_database(db_path: &Path) -> Result<SqlitePool> {
    if !db_path.exists() {
        return Err(Error::NotInitialized(format!(
            "{} does not exist; run crdb-init first",
            db_path.display()
        )));
    }

    let pool = connect(db_path, false).await?;

    for table in ["schools", "teams"] {
        if !SchemaIntrospector::table_exists(&pool, table).await? {
            return Err(Error::NotInitialized(format!(
                "table '{}' is missing; run crdb-init first",
                table
            )));
        }
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&pool)
            .await?;
        if count == 0 {
            return Err(Error::NotInitialized(format!(
                "table '{}' is empty; run crdb-init first",
                table
            )));
        }
    }

    info!("Opened database: {}", db_path.display());

    prepare_schema(&pool).await?;
    Ok(pool)
}

/// Schema-only in-memory database on a single connection (tests, dry runs)
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    // One connection that never expires; each memory connection is its own database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    prepare_schema(&pool).await?;
    Ok(pool)
}

async fn connect(db_path: &Path, create: bool) -> Result<SqlitePool> {
    let mode = if create { "rwc" } else { "rw" };
    let db_url = format!("sqlite://{}?mode={}", db_path.display(), mode);
    let options = SqliteConnectOptions::from_str(&db_url)?
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Bring the schema up to date, then run migrations
async fn prepare_schema(pool: &SqlitePool) -> Result<()> {
    create_schema(pool).await?;
    crate::db::migrations::run_migrations(pool).await?;
    Ok(())
}

/// Create missing tables, add missing columns, then create triggers (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_schools_table(pool).await?;
    create_teams_table(pool).await?;
    create_conference_affiliations_table(pool).await?;
    create_school_participations_table(pool).await?;
    create_regattas_table(pool).await?;
    create_events_table(pool).await?;
    create_entries_table(pool).await?;
    create_results_table(pool).await?;

    // Files from older releases may lack columns the index and trigger reference
    crate::db::table_schemas::sync_all_table_schemas(pool).await?;
    create_schools_index_and_trigger(pool).await?;
    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_schools_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schools (
            school_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            short_name TEXT,
            acronym TEXT,
            crr_name TEXT NOT NULL UNIQUE,
            color TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_schools_index_and_trigger(pool: &SqlitePool) -> Result<()> {
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_schools_crr_name ON schools(crr_name)")
        .execute(pool)
        .await?;

    // Only fires when updated_at itself was not part of the update
    sqlx::query(
        r#"
        CREATE TRIGGER IF NOT EXISTS update_schools_timestamp
        AFTER UPDATE ON schools
        WHEN NEW.updated_at IS OLD.updated_at
        BEGIN
            UPDATE schools SET updated_at = CURRENT_TIMESTAMP WHERE school_id = NEW.school_id;
        END
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_teams_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS teams (
            team_id INTEGER PRIMARY KEY AUTOINCREMENT,
            school_id INTEGER NOT NULL,
            gender TEXT NOT NULL CHECK (gender IN ('M', 'W')),
            weight TEXT NOT NULL CHECK (weight IN ('LW', 'HW', 'OW')),
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (school_id) REFERENCES schools (school_id) ON UPDATE CASCADE ON DELETE CASCADE,
            UNIQUE(school_id, gender, weight)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_conference_affiliations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS conference_affiliations (
            affiliation_id INTEGER PRIMARY KEY AUTOINCREMENT,
            team_id INTEGER NOT NULL,
            conference TEXT NOT NULL,
            start_date DATE NOT NULL,
            end_date DATE,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (team_id) REFERENCES teams (team_id) ON UPDATE CASCADE ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_school_participations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS school_participations (
            participation_id INTEGER PRIMARY KEY AUTOINCREMENT,
            school_id INTEGER NOT NULL,
            start_date DATE NOT NULL,
            end_date DATE,
            openweight_women BOOLEAN DEFAULT FALSE,
            heavyweight_men BOOLEAN DEFAULT FALSE,
            lightweight_men BOOLEAN DEFAULT FALSE,
            lightweight_women BOOLEAN DEFAULT FALSE,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (school_id) REFERENCES schools (school_id) ON UPDATE CASCADE ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_regattas_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS regattas (
            regatta_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            location TEXT,
            start_date DATE,
            end_date DATE,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_events_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS events (
            event_id INTEGER PRIMARY KEY AUTOINCREMENT,
            regatta_id INTEGER NOT NULL,
            boat_type TEXT NOT NULL CHECK (boat_type IN ('8+', '4+', '4x', '2x', '1x', '2-')),
            event_boat_class TEXT NOT NULL,
            gender TEXT NOT NULL CHECK (gender IN ('M', 'W')),
            weight TEXT NOT NULL CHECK (weight IN ('LW', 'HW', 'OW')),
            round TEXT NOT NULL,
            event_distance TEXT DEFAULT '2k',
            scheduled_at DATETIME,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (regatta_id) REFERENCES regattas (regatta_id) ON UPDATE CASCADE ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_entries_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS entries (
            entry_id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id INTEGER NOT NULL,
            team_id INTEGER NOT NULL,
            entry_boat_class TEXT,
            conference_at_time TEXT,
            seed INTEGER,
            notes TEXT DEFAULT '',
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (event_id) REFERENCES events (event_id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY (team_id) REFERENCES teams (team_id) ON UPDATE CASCADE ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_results_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS results (
            result_id INTEGER PRIMARY KEY AUTOINCREMENT,
            entry_id INTEGER NOT NULL,
            lane INTEGER,
            position INTEGER,
            elapsed_sec REAL,
            margin_sec REAL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (entry_id) REFERENCES entries (entry_id) ON UPDATE CASCADE ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
