//! Season participation flags
//!
//! Each school has at most one row per season, holding a flag per team
//! category. Seasons are told apart by their start and end years; the stored
//! dates are always `YYYY-09-01` and `YYYY-08-31` (or NULL for the open one).
//!
//! Creating a season that overlaps existing ones applies the plan from
//! [`plan_overlap_resolution`] inside one transaction: affected rows are
//! captured, deleted, and re-inserted under whatever ranges survive.

use crate::categories::TeamCategory;
use crate::db::models::{ParticipationFlags, SchoolParticipation};
use crate::db::schools::ensure_team;
use crate::season::{plan_overlap_resolution, OverlapPlan, PlannedOverlap, Season};
use crate::{Error, Result};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};

/// Matches rows of one season by start and end year
const SEASON_FILTER: &str = "CAST(SUBSTR(start_date, 1, 4) AS INTEGER) = ? \
                             AND CAST(SUBSTR(end_date, 1, 4) AS INTEGER) IS ?";

const FLAG_COLUMNS: &str = "openweight_women, heavyweight_men, lightweight_men, lightweight_women";

/// Outcome of [`create_season`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateSeasonReport {
    pub season: Season,
    pub copied_from: Option<Season>,
    pub overlaps: Vec<PlannedOverlap>,
    /// Rows removed from overlapping seasons
    pub rows_deleted: u64,
    /// Rows written back under trimmed or split ranges
    pub rows_reinserted: u64,
    /// Rows created for the new season
    pub rows_created: u64,
}

/// Distinct seasons present, newest first
pub async fn list_participation_seasons(pool: &SqlitePool) -> Result<Vec<Season>> {
    let mut conn = pool.acquire().await?;
    seasons_on(&mut conn).await
}

async fn seasons_on(conn: &mut SqliteConnection) -> Result<Vec<Season>> {
    let rows: Vec<(i64, Option<i64>)> = sqlx::query_as(
        r#"
        SELECT DISTINCT CAST(SUBSTR(start_date, 1, 4) AS INTEGER) AS start_year,
                        CAST(SUBSTR(end_date, 1, 4) AS INTEGER) AS end_year
        FROM school_participations
        ORDER BY start_year DESC, end_year IS NULL DESC, end_year DESC
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    let mut seasons = Vec::with_capacity(rows.len());
    for (start, end) in rows {
        match Season::new(start as i32, end.map(|e| e as i32)) {
            Ok(season) => seasons.push(season),
            Err(e) => warn!("Ignoring malformed participation season: {}", e),
        }
    }

    Ok(seasons)
}

/// Every school with its flags for the season starting in `start_year`
///
/// Schools without a row come back with all flags false. When more than one
/// season starts that year, the open one (else the longest) is used.
pub async fn season_participations(
    pool: &SqlitePool,
    start_year: i32,
) -> Result<Vec<SchoolParticipation>> {
    let rows = sqlx::query_as::<_, SchoolParticipation>(
        r#"
        SELECT s.school_id, s.crr_name, s.name, sp.participation_id,
               COALESCE(sp.openweight_women, 0) AS openweight_women,
               COALESCE(sp.heavyweight_men, 0) AS heavyweight_men,
               COALESCE(sp.lightweight_men, 0) AS lightweight_men,
               COALESCE(sp.lightweight_women, 0) AS lightweight_women
        FROM schools s
        LEFT JOIN school_participations sp
          ON sp.participation_id = (
              SELECT p.participation_id FROM school_participations p
              WHERE p.school_id = s.school_id
                AND CAST(SUBSTR(p.start_date, 1, 4) AS INTEGER) = ?
              ORDER BY p.end_date IS NULL DESC, p.end_date DESC, p.participation_id DESC
              LIMIT 1
          )
        ORDER BY s.crr_name COLLATE NOCASE
        "#,
    )
    .bind(start_year)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Set one category flag for a school, creating its row for the season
///
/// Turning a flag on also makes sure the school has that team.
pub async fn set_participation(
    pool: &SqlitePool,
    school_id: i64,
    season_display: &str,
    category: TeamCategory,
    participating: bool,
) -> Result<()> {
    let season = Season::parse_display(season_display)?;
    let mut tx = pool.begin().await?;

    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM schools WHERE school_id = ?)")
        .bind(school_id)
        .fetch_one(&mut *tx)
        .await?;
    if !exists {
        return Err(Error::NotFound(format!("School {}", school_id)));
    }

    let updated = sqlx::query(&format!(
        "UPDATE school_participations SET {} = ? WHERE school_id = ? AND {}",
        category.column(),
        SEASON_FILTER
    ))
    .bind(participating)
    .bind(school_id)
    .bind(season.start_year)
    .bind(season.end_year)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if updated == 0 {
        sqlx::query(&format!(
            "INSERT INTO school_participations (school_id, start_date, end_date, {}) VALUES (?, ?, ?, ?)",
            category.column()
        ))
        .bind(school_id)
        .bind(season.start_date())
        .bind(season.end_date())
        .bind(participating)
        .execute(&mut *tx)
        .await?;
    }

    if participating {
        ensure_team(&mut tx, school_id, category).await?;
    }

    tx.commit().await?;

    info!(
        "School {} {} {} in {}",
        school_id,
        if participating { "rows" } else { "does not row" },
        category,
        season
    );
    Ok(())
}

/// Delete every row of seasons starting in `start_year`
pub async fn delete_participation_season(pool: &SqlitePool, start_year: i32) -> Result<u64> {
    let deleted = sqlx::query(
        "DELETE FROM school_participations WHERE CAST(SUBSTR(start_date, 1, 4) AS INTEGER) = ?",
    )
    .bind(start_year)
    .execute(pool)
    .await?
    .rows_affected();

    info!("Deleted {} participation row(s) for season {}", deleted, start_year);
    Ok(deleted)
}

/// What creating `new` would do to the existing seasons
pub async fn preview_season(pool: &SqlitePool, new: &Season) -> Result<OverlapPlan> {
    new.validate()?;
    let existing = list_participation_seasons(pool).await?;
    Ok(plan_overlap_resolution(new, &existing))
}

async fn season_flags(
    conn: &mut SqliteConnection,
    season: &Season,
) -> Result<Vec<ParticipationFlags>> {
    let flags = sqlx::query_as::<_, ParticipationFlags>(&format!(
        "SELECT school_id, {} FROM school_participations WHERE {} ORDER BY school_id",
        FLAG_COLUMNS, SEASON_FILTER
    ))
    .bind(season.start_year)
    .bind(season.end_year)
    .fetch_all(&mut *conn)
    .await?;

    Ok(flags)
}

async fn insert_flags(
    conn: &mut SqliteConnection,
    season: &Season,
    flags: &[ParticipationFlags],
) -> Result<u64> {
    for row in flags {
        sqlx::query(&format!(
            "INSERT INTO school_participations (school_id, start_date, end_date, {}) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            FLAG_COLUMNS
        ))
        .bind(row.school_id)
        .bind(season.start_date())
        .bind(season.end_date())
        .bind(row.openweight_women)
        .bind(row.heavyweight_men)
        .bind(row.lightweight_men)
        .bind(row.lightweight_women)
        .execute(&mut *conn)
        .await?;
    }

    Ok(flags.len() as u64)
}

/// Create a season, resolving overlaps with existing ones
///
/// Flags come from `copy_from` when given (read before anything changes),
/// otherwise every school gets a row with all flags false.
pub async fn create_season(
    pool: &SqlitePool,
    new: Season,
    copy_from: Option<Season>,
) -> Result<CreateSeasonReport> {
    new.validate()?;

    let mut tx = pool.begin().await?;

    let existing = seasons_on(&mut tx).await?;

    let source = match copy_from {
        Some(from) => {
            if !existing.contains(&from) {
                return Err(Error::NotFound(format!("Season {}", from)));
            }
            Some(season_flags(&mut tx, &from).await?)
        }
        None => None,
    };

    let plan = plan_overlap_resolution(&new, &existing);

    // Capture every affected season before deleting any of them
    let mut captured = Vec::with_capacity(plan.overlaps.len());
    for overlap in &plan.overlaps {
        captured.push(season_flags(&mut tx, &overlap.existing).await?);
    }

    let mut report = CreateSeasonReport {
        season: new,
        copied_from: copy_from,
        overlaps: plan.overlaps.clone(),
        rows_deleted: 0,
        rows_reinserted: 0,
        rows_created: 0,
    };

    for overlap in &plan.overlaps {
        report.rows_deleted += sqlx::query(&format!(
            "DELETE FROM school_participations WHERE {}",
            SEASON_FILTER
        ))
        .bind(overlap.existing.start_year)
        .bind(overlap.existing.end_year)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }

    for (overlap, flags) in plan.overlaps.iter().zip(&captured) {
        for range in overlap.resolution.surviving_ranges() {
            report.rows_reinserted += insert_flags(&mut tx, &range, flags).await?;
        }
    }

    report.rows_created = match &source {
        Some(flags) => insert_flags(&mut tx, &new, flags).await?,
        None => sqlx::query(
            "INSERT INTO school_participations (school_id, start_date, end_date) \
             SELECT school_id, ?, ? FROM schools",
        )
        .bind(new.start_date())
        .bind(new.end_date())
        .execute(&mut *tx)
        .await?
        .rows_affected(),
    };

    tx.commit().await?;

    info!(
        "Created season {}: {} created, {} deleted, {} re-inserted across {} overlap(s)",
        new,
        report.rows_created,
        report.rows_deleted,
        report.rows_reinserted,
        report.overlaps.len()
    );
    Ok(report)
}

/// Give every school that fields a team an open row starting in
/// `start_year`, flagged from its teams
///
/// Schools that already have a row for that start year are left alone.
pub async fn populate_initial_participations(pool: &SqlitePool, start_year: i32) -> Result<u64> {
    let season = Season::current(start_year)?;

    let created = sqlx::query(&format!(
        r#"
        INSERT INTO school_participations (school_id, start_date, end_date, {})
        SELECT t.school_id, ?, NULL,
               MAX(t.gender = 'W' AND t.weight = 'OW'),
               MAX(t.gender = 'M' AND t.weight = 'HW'),
               MAX(t.gender = 'M' AND t.weight = 'LW'),
               MAX(t.gender = 'W' AND t.weight = 'LW')
        FROM teams t
        WHERE t.school_id NOT IN (
            SELECT school_id FROM school_participations
            WHERE CAST(SUBSTR(start_date, 1, 4) AS INTEGER) = ?
        )
        GROUP BY t.school_id
        "#,
        FLAG_COLUMNS
    ))
    .bind(season.start_date())
    .bind(start_year)
    .execute(pool)
    .await?
    .rows_affected();

    info!("Created {} participation row(s) for {}", created, season);
    Ok(created)
}
