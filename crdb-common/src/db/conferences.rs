//! Conference affiliations
//!
//! Season-level editing works on one team category and one academic season
//! at a time: season `Y` covers affiliations starting between `Y-09-01` and
//! `Y+1-08-31`, and assignments made through it span exactly that range.
//! Team-level editing keeps an open-ended history where the row with no end
//! date is the current conference.

use crate::categories::TeamCategory;
use crate::db::events::parse_stored_date;
use crate::db::models::ConferenceAffiliation;
use crate::db::schools::{ensure_team, find_team_id};
use crate::season::{academic_label, academic_start_year};
use crate::{Error, Result};
use chrono::{Local, NaiveDate};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

/// Reported when no affiliation covers a date
pub const UNKNOWN_CONFERENCE: &str = "Unknown";

/// First and last day of academic season `start_year`
fn season_bounds(start_year: i32) -> (String, String) {
    (
        format!("{}-09-01", start_year),
        format!("{}-08-31", start_year + 1),
    )
}

fn required_conference(conference: &str) -> Result<&str> {
    let conference = conference.trim();
    if conference.is_empty() {
        warn!("Rejected empty conference name");
        return Err(Error::InvalidInput("Conference name is required".to_string()));
    }
    Ok(conference)
}

/// Seasons with affiliations for a category, newest first ("2024-2025")
///
/// Falls back to the current academic season so there is always one to edit.
pub async fn list_conference_seasons(
    pool: &SqlitePool,
    category: TeamCategory,
) -> Result<Vec<String>> {
    let starts: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT DISTINCT ca.start_date
        FROM conference_affiliations ca
        JOIN teams t ON ca.team_id = t.team_id
        WHERE t.gender = ? AND t.weight = ?
        "#,
    )
    .bind(category.gender().code())
    .bind(category.weight().code())
    .fetch_all(pool)
    .await?;

    let years: BTreeSet<i32> = starts
        .iter()
        .filter_map(|s| parse_stored_date(s))
        .map(academic_start_year)
        .collect();

    if years.is_empty() {
        let current = academic_start_year(Local::now().date_naive());
        return Ok(vec![academic_label(current)]);
    }

    Ok(years.into_iter().rev().map(academic_label).collect())
}

/// CRR names grouped by conference for one season
pub async fn conference_season(
    pool: &SqlitePool,
    category: TeamCategory,
    start_year: i32,
) -> Result<BTreeMap<String, Vec<String>>> {
    let (lo, hi) = season_bounds(start_year);

    let rows: Vec<(String, String)> = sqlx::query_as(
        r#"
        SELECT ca.conference, s.crr_name
        FROM conference_affiliations ca
        JOIN teams t ON ca.team_id = t.team_id
        JOIN schools s ON t.school_id = s.school_id
        WHERE t.gender = ? AND t.weight = ?
          AND ca.start_date BETWEEN ? AND ?
        ORDER BY ca.conference, s.crr_name COLLATE NOCASE
        "#,
    )
    .bind(category.gender().code())
    .bind(category.weight().code())
    .bind(&lo)
    .bind(&hi)
    .fetch_all(pool)
    .await?;

    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (conference, crr_name) in rows {
        grouped.entry(conference).or_default().push(crr_name);
    }

    Ok(grouped)
}

/// Schools that may be assigned a conference for the season
///
/// Those flagged for the category in a participation row covering the whole
/// season. Without any such rows, every school fielding the category.
pub async fn available_schools(
    pool: &SqlitePool,
    category: TeamCategory,
    start_year: i32,
) -> Result<Vec<String>> {
    let (lo, hi) = season_bounds(start_year);

    let covered: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM school_participations
            WHERE start_date <= ? AND (end_date IS NULL OR end_date >= ?)
        )
        "#,
    )
    .bind(&lo)
    .bind(&hi)
    .fetch_one(pool)
    .await?;

    let names = if covered {
        // Column name comes from a fixed set
        sqlx::query_scalar(&format!(
            r#"
            SELECT DISTINCT s.crr_name
            FROM schools s
            JOIN school_participations sp ON sp.school_id = s.school_id
            WHERE sp.start_date <= ? AND (sp.end_date IS NULL OR sp.end_date >= ?)
              AND sp.{} = 1
            ORDER BY s.crr_name COLLATE NOCASE
            "#,
            category.column()
        ))
        .bind(&lo)
        .bind(&hi)
        .fetch_all(pool)
        .await?
    } else {
        sqlx::query_scalar(
            r#"
            SELECT s.crr_name
            FROM schools s
            JOIN teams t ON t.school_id = s.school_id
            WHERE t.gender = ? AND t.weight = ?
            ORDER BY s.crr_name COLLATE NOCASE
            "#,
        )
        .bind(category.gender().code())
        .bind(category.weight().code())
        .fetch_all(pool)
        .await?
    };

    Ok(names)
}

/// Put a school's team in a conference for the season, replacing any
/// affiliation it already had there
pub async fn assign_school(
    pool: &SqlitePool,
    category: TeamCategory,
    start_year: i32,
    crr_name: &str,
    conference: &str,
) -> Result<ConferenceAffiliation> {
    let conference = required_conference(conference)?;
    let crr_name = crr_name.trim();

    let available = available_schools(pool, category, start_year).await?;
    if !available.iter().any(|name| name == crr_name) {
        warn!(
            "Rejected conference assignment: '{}' is not participating in {} {}",
            crr_name,
            category,
            academic_label(start_year)
        );
        return Err(Error::InvalidInput(format!(
            "'{}' is not participating in {} for {}",
            crr_name,
            category,
            academic_label(start_year)
        )));
    }

    let (lo, hi) = season_bounds(start_year);
    let mut tx = pool.begin().await?;

    let school_id: i64 = sqlx::query_scalar("SELECT school_id FROM schools WHERE crr_name = ?")
        .bind(crr_name)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound(format!("School '{}'", crr_name)))?;
    let team_id = ensure_team(&mut tx, school_id, category).await?;

    sqlx::query(
        "DELETE FROM conference_affiliations WHERE team_id = ? AND start_date BETWEEN ? AND ?",
    )
    .bind(team_id)
    .bind(&lo)
    .bind(&hi)
    .execute(&mut *tx)
    .await?;

    let affiliation_id = sqlx::query(
        "INSERT INTO conference_affiliations (team_id, conference, start_date, end_date) VALUES (?, ?, ?, ?)",
    )
    .bind(team_id)
    .bind(conference)
    .bind(&lo)
    .bind(&hi)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    tx.commit().await?;

    info!(
        "Assigned '{}' ({}) to {} for {}",
        crr_name,
        category,
        conference,
        academic_label(start_year)
    );

    Ok(ConferenceAffiliation {
        affiliation_id,
        team_id,
        conference: conference.to_string(),
        start_date: lo,
        end_date: Some(hi),
    })
}

/// Remove a school's affiliation for the season
pub async fn remove_school(
    pool: &SqlitePool,
    category: TeamCategory,
    start_year: i32,
    crr_name: &str,
) -> Result<u64> {
    let (lo, hi) = season_bounds(start_year);
    let mut tx = pool.begin().await?;

    let team_id = find_team_id(&mut tx, crr_name, category)
        .await?
        .ok_or_else(|| Error::NotFound(format!("{} team for '{}'", category, crr_name.trim())))?;

    let removed = sqlx::query(
        "DELETE FROM conference_affiliations WHERE team_id = ? AND start_date BETWEEN ? AND ?",
    )
    .bind(team_id)
    .bind(&lo)
    .bind(&hi)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if removed == 0 {
        return Err(Error::NotFound(format!(
            "No conference for '{}' in {}",
            crr_name.trim(),
            academic_label(start_year)
        )));
    }

    tx.commit().await?;

    info!("Removed '{}' from its {} conference", crr_name.trim(), academic_label(start_year));
    Ok(removed)
}

/// Drop one conference from the season
pub async fn delete_conference(
    pool: &SqlitePool,
    category: TeamCategory,
    start_year: i32,
    conference: &str,
) -> Result<u64> {
    let (lo, hi) = season_bounds(start_year);

    let removed = sqlx::query(
        r#"
        DELETE FROM conference_affiliations
        WHERE conference = ?
          AND start_date BETWEEN ? AND ?
          AND team_id IN (SELECT team_id FROM teams WHERE gender = ? AND weight = ?)
        "#,
    )
    .bind(conference.trim())
    .bind(&lo)
    .bind(&hi)
    .bind(category.gender().code())
    .bind(category.weight().code())
    .execute(pool)
    .await?
    .rows_affected();

    info!(
        "Deleted conference '{}' for {} {}: {} row(s)",
        conference.trim(),
        category,
        academic_label(start_year),
        removed
    );
    Ok(removed)
}

/// Drop every affiliation of the category in the season
pub async fn delete_conference_season(
    pool: &SqlitePool,
    category: TeamCategory,
    start_year: i32,
) -> Result<u64> {
    let (lo, hi) = season_bounds(start_year);

    let removed = sqlx::query(
        r#"
        DELETE FROM conference_affiliations
        WHERE start_date BETWEEN ? AND ?
          AND team_id IN (SELECT team_id FROM teams WHERE gender = ? AND weight = ?)
        "#,
    )
    .bind(&lo)
    .bind(&hi)
    .bind(category.gender().code())
    .bind(category.weight().code())
    .execute(pool)
    .await?
    .rows_affected();

    info!(
        "Deleted {} {} conference season: {} row(s)",
        category,
        academic_label(start_year),
        removed
    );
    Ok(removed)
}

/// Copy one season's affiliations into another
///
/// Teams already affiliated in the target season keep what they have.
pub async fn copy_conference_season(
    pool: &SqlitePool,
    category: TeamCategory,
    from_year: i32,
    to_year: i32,
) -> Result<u64> {
    if from_year == to_year {
        return Err(Error::InvalidInput(
            "Source and target seasons must differ".to_string(),
        ));
    }

    let (from_lo, from_hi) = season_bounds(from_year);
    let (to_lo, to_hi) = season_bounds(to_year);

    let copied = sqlx::query(
        r#"
        INSERT INTO conference_affiliations (team_id, conference, start_date, end_date)
        SELECT ca.team_id, ca.conference, ?1, ?2
        FROM conference_affiliations ca
        JOIN teams t ON ca.team_id = t.team_id
        WHERE t.gender = ?3 AND t.weight = ?4
          AND ca.start_date BETWEEN ?5 AND ?6
          AND ca.team_id NOT IN (
              SELECT team_id FROM conference_affiliations
              WHERE start_date BETWEEN ?1 AND ?2
          )
        GROUP BY ca.team_id
        "#,
    )
    .bind(&to_lo)
    .bind(&to_hi)
    .bind(category.gender().code())
    .bind(category.weight().code())
    .bind(&from_lo)
    .bind(&from_hi)
    .execute(pool)
    .await?
    .rows_affected();

    info!(
        "Copied {} {} affiliation(s) from {} to {}",
        copied,
        category,
        academic_label(from_year),
        academic_label(to_year)
    );
    Ok(copied)
}

async fn ensure_team_exists(pool: &SqlitePool, team_id: i64) -> Result<()> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM teams WHERE team_id = ?)")
        .bind(team_id)
        .fetch_one(pool)
        .await?;
    if exists {
        Ok(())
    } else {
        Err(Error::NotFound(format!("Team {}", team_id)))
    }
}

/// A team's affiliations, most recent first
pub async fn conference_history(
    pool: &SqlitePool,
    team_id: i64,
) -> Result<Vec<ConferenceAffiliation>> {
    ensure_team_exists(pool, team_id).await?;

    let history = sqlx::query_as::<_, ConferenceAffiliation>(
        r#"
        SELECT affiliation_id, team_id, conference, start_date, end_date
        FROM conference_affiliations
        WHERE team_id = ?
        ORDER BY start_date DESC, affiliation_id DESC
        "#,
    )
    .bind(team_id)
    .fetch_all(pool)
    .await?;

    Ok(history)
}

/// The open-ended affiliation, else whatever covers today
pub async fn current_conference(pool: &SqlitePool, team_id: i64) -> Result<String> {
    let open: Option<String> = sqlx::query_scalar(
        r#"
        SELECT conference FROM conference_affiliations
        WHERE team_id = ? AND end_date IS NULL
        ORDER BY start_date DESC, affiliation_id DESC
        LIMIT 1
        "#,
    )
    .bind(team_id)
    .fetch_optional(pool)
    .await?;

    if let Some(conference) = open {
        return Ok(conference);
    }

    let mut conn = pool.acquire().await?;
    conference_at_date(&mut conn, team_id, Local::now().date_naive()).await
}

/// Conference a team belonged to on `date`
///
/// End dates are inclusive, matching the season rows that end on Aug 31; on a
/// change date both rows match and the latest start wins.
pub async fn conference_at_date(
    conn: &mut SqliteConnection,
    team_id: i64,
    date: NaiveDate,
) -> Result<String> {
    let day = date.format("%Y-%m-%d").to_string();

    let conference: Option<String> = sqlx::query_scalar(
        r#"
        SELECT conference FROM conference_affiliations
        WHERE team_id = ?
          AND start_date <= ?
          AND (end_date IS NULL OR end_date >= ?)
        ORDER BY start_date DESC, affiliation_id DESC
        LIMIT 1
        "#,
    )
    .bind(team_id)
    .bind(&day)
    .bind(&day)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(conference.unwrap_or_else(|| UNKNOWN_CONFERENCE.to_string()))
}

pub async fn add_conference_affiliation(
    pool: &SqlitePool,
    team_id: i64,
    conference: &str,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
) -> Result<ConferenceAffiliation> {
    let conference = required_conference(conference)?;
    if end_date.is_some_and(|end| end <= start_date) {
        return Err(Error::InvalidInput(
            "Affiliation must end after it starts".to_string(),
        ));
    }
    ensure_team_exists(pool, team_id).await?;

    let start = start_date.format("%Y-%m-%d").to_string();
    let end = end_date.map(|d| d.format("%Y-%m-%d").to_string());

    let affiliation_id = sqlx::query(
        "INSERT INTO conference_affiliations (team_id, conference, start_date, end_date) VALUES (?, ?, ?, ?)",
    )
    .bind(team_id)
    .bind(conference)
    .bind(&start)
    .bind(&end)
    .execute(pool)
    .await?
    .last_insert_rowid();

    info!("Team {} joined {} on {}", team_id, conference, start);

    Ok(ConferenceAffiliation {
        affiliation_id,
        team_id,
        conference: conference.to_string(),
        start_date: start,
        end_date: end,
    })
}

/// Close the team's open affiliation at `change_date` and open a new one there
pub async fn update_conference_affiliation(
    pool: &SqlitePool,
    team_id: i64,
    conference: &str,
    change_date: NaiveDate,
) -> Result<ConferenceAffiliation> {
    let conference = required_conference(conference)?;
    ensure_team_exists(pool, team_id).await?;

    let day = change_date.format("%Y-%m-%d").to_string();
    let mut tx = pool.begin().await?;

    let closed = sqlx::query(
        "UPDATE conference_affiliations SET end_date = ? WHERE team_id = ? AND end_date IS NULL",
    )
    .bind(&day)
    .bind(team_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let affiliation_id = sqlx::query(
        "INSERT INTO conference_affiliations (team_id, conference, start_date) VALUES (?, ?, ?)",
    )
    .bind(team_id)
    .bind(conference)
    .bind(&day)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    tx.commit().await?;

    info!(
        "Team {} moved to {} on {} ({} open row(s) closed)",
        team_id, conference, day, closed
    );

    Ok(ConferenceAffiliation {
        affiliation_id,
        team_id,
        conference: conference.to_string(),
        start_date: day,
        end_date: None,
    })
}
