//! Versioned data migrations
//!
//! Column additions are handled by [`super::table_schemas`]; migrations cover
//! the changes that need data rewritten or constraints added. Each migration
//! must be idempotent and must never be edited once released. Add a new
//! `migrate_vN` and bump [`CURRENT_SCHEMA_VERSION`] instead.

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Increment when adding a migration
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Latest applied version, 0 when none
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='schema_version'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than this build ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        if migrate_v1(pool).await? {
            set_schema_version(pool, 1).await?;
            info!("Migration v1 completed");
        } else {
            warn!("Migration v1 incomplete; it will be retried on next open");
        }
    }

    Ok(())
}

/// Migration v1: every school gets a CRR name, and CRR names become unique
///
/// Older files kept only `name`. Blank CRR names are filled from it, then a
/// unique index is created. Duplicate CRR names are left for the operator to
/// resolve; the index is skipped and `false` returned so the version stays
/// unrecorded.
async fn migrate_v1(pool: &SqlitePool) -> Result<bool> {
    info!("Running migration v1: backfill and index schools.crr_name");

    let backfilled = sqlx::query(
        "UPDATE schools SET crr_name = TRIM(name) WHERE crr_name IS NULL OR TRIM(crr_name) = ''",
    )
    .execute(pool)
    .await?
    .rows_affected();

    if backfilled > 0 {
        info!("  Filled crr_name for {} school(s)", backfilled);
    }

    let duplicates: Vec<String> = sqlx::query_scalar(
        "SELECT crr_name FROM schools GROUP BY crr_name HAVING COUNT(*) > 1 ORDER BY crr_name",
    )
    .fetch_all(pool)
    .await?;

    if !duplicates.is_empty() {
        warn!(
            "  Duplicate CRR names prevent the unique index: {}",
            duplicates.join(", ")
        );
        return Ok(false);
    }

    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_schools_crr_name_unique ON schools(crr_name)",
    )
    .execute(pool)
    .await?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn legacy_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        sqlx::query(
            "CREATE TABLE schema_version (version INTEGER PRIMARY KEY, applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "CREATE TABLE schools (school_id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, crr_name TEXT)",
        )
        .execute(&pool)
        .await
        .unwrap();
        pool
    }

    #[tokio::test]
    async fn test_v1_backfills_crr_name() {
        let pool = legacy_db().await;
        sqlx::query("INSERT INTO schools (name, crr_name) VALUES ('Yale University ', NULL), ('Harvard', 'Harvard University')")
            .execute(&pool)
            .await
            .unwrap();

        run_migrations(&pool).await.unwrap();

        let names: Vec<String> = sqlx::query_scalar("SELECT crr_name FROM schools ORDER BY school_id")
            .fetch_all(&pool)
            .await
            .unwrap();
        assert_eq!(names, vec!["Yale University", "Harvard University"]);
        assert_eq!(get_schema_version(&pool).await.unwrap(), CURRENT_SCHEMA_VERSION);

        // Unique index now rejects duplicates
        let dup = sqlx::query("INSERT INTO schools (name, crr_name) VALUES ('Y', 'Yale University')")
            .execute(&pool)
            .await;
        assert!(dup.is_err());
    }

    async fn crr_index_exists(pool: &SqlitePool) -> bool {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='index' AND name='idx_schools_crr_name_unique')",
        )
        .fetch_one(pool)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_v1_retried_after_duplicates_resolved() {
        let pool = legacy_db().await;
        sqlx::query("INSERT INTO schools (name, crr_name) VALUES ('A', 'Same'), ('B', 'Same')")
            .execute(&pool)
            .await
            .unwrap();

        run_migrations(&pool).await.unwrap();
        assert!(!crr_index_exists(&pool).await);
        assert_eq!(get_schema_version(&pool).await.unwrap(), 0);

        sqlx::query("UPDATE schools SET crr_name = 'Other' WHERE name = 'B'")
            .execute(&pool)
            .await
            .unwrap();

        run_migrations(&pool).await.unwrap();
        assert!(crr_index_exists(&pool).await);
        assert_eq!(get_schema_version(&pool).await.unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn test_version_zero_without_table() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        assert_eq!(get_schema_version(&pool).await.unwrap(), 0);
    }
}
