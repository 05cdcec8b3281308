//! Entries and race results for an event
//!
//! Results are entered as an ordered list of finishers. Submitting replaces
//! everything previously recorded for the event, so the operator can fix a
//! typo by re-submitting the whole grid.

use crate::categories::{notes_preview, validate_boat_class, TeamCategory, MAX_NOTES_LENGTH};
use crate::db::conferences::conference_at_date;
use crate::db::events::{get_event_date, get_event_on};
use crate::db::models::EntryWithResult;
use crate::db::schools::find_team_id;
use crate::race_time::{format_margin, format_time_seconds, parse_race_time};
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::{BTreeMap, HashSet};
use tracing::{info, warn};

/// One row of the results grid, in finishing order
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultRow {
    pub crr_name: String,
    pub lane: Option<i64>,
    /// Race time as typed ("704", "7:04.5")
    pub time: Option<String>,
    pub boat_class: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SubmitReport {
    pub entries: usize,
    pub results: usize,
    /// Entries that existed before the submit
    pub replaced_entries: u64,
}

/// Entry as shown in the results grid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryView {
    pub entry_id: i64,
    pub team_id: i64,
    pub crr_name: String,
    pub entry_boat_class: Option<String>,
    pub conference_at_time: Option<String>,
    pub notes: String,
    pub notes_preview: String,
    pub lane: Option<i64>,
    pub position: Option<i64>,
    pub elapsed_sec: Option<f64>,
    pub time: Option<String>,
    pub margin: Option<String>,
}

impl From<EntryWithResult> for EntryView {
    fn from(row: EntryWithResult) -> Self {
        let notes = row.notes.unwrap_or_default();
        let time = row.elapsed_sec.map(format_time_seconds);
        let margin = row
            .elapsed_sec
            .map(|_| format_margin(row.margin_sec.unwrap_or(0.0), row.position));
        EntryView {
            entry_id: row.entry_id,
            team_id: row.team_id,
            crr_name: row.crr_name,
            entry_boat_class: row.entry_boat_class,
            conference_at_time: row.conference_at_time,
            notes_preview: notes_preview(&notes),
            notes,
            lane: row.lane,
            position: row.position,
            elapsed_sec: row.elapsed_sec,
            time,
            margin,
        }
    }
}

/// Validated grid row
struct CheckedRow {
    crr_name: String,
    lane: Option<i64>,
    elapsed: Option<f64>,
    boat_class: String,
    notes: String,
}

fn check_notes(notes: &str) -> Result<()> {
    if notes.chars().count() > MAX_NOTES_LENGTH {
        warn!("Rejected notes longer than {} characters", MAX_NOTES_LENGTH);
        return Err(Error::InvalidInput(format!(
            "Notes cannot exceed {} characters",
            MAX_NOTES_LENGTH
        )));
    }
    Ok(())
}

async fn eligible_on(
    conn: &mut SqliteConnection,
    category: TeamCategory,
    date: NaiveDate,
) -> Result<Vec<String>> {
    let day = date.format("%Y-%m-%d").to_string();

    // Column name comes from a fixed set
    let names = sqlx::query_scalar(&format!(
        r#"
        SELECT DISTINCT s.crr_name
        FROM schools s
        JOIN teams t ON t.school_id = s.school_id
        JOIN school_participations sp ON sp.school_id = s.school_id
        WHERE t.gender = ? AND t.weight = ?
          AND sp.start_date <= ? AND (sp.end_date IS NULL OR sp.end_date >= ?)
          AND sp.{} = 1
        ORDER BY s.crr_name COLLATE NOCASE
        "#,
        category.column()
    ))
    .bind(category.gender().code())
    .bind(category.weight().code())
    .bind(&day)
    .bind(&day)
    .fetch_all(&mut *conn)
    .await?;

    Ok(names)
}

/// Schools that may enter the event: they field the category and their
/// participation on the event date includes it
pub async fn eligible_schools(pool: &SqlitePool, event_id: i64) -> Result<Vec<String>> {
    let mut conn = pool.acquire().await?;
    let event = get_event_on(&mut conn, event_id).await?;
    let date = get_event_date(&mut conn, event_id).await?;
    eligible_on(&mut conn, event.category()?, date).await
}

/// Entries of an event, finishers first
pub async fn list_event_entries(pool: &SqlitePool, event_id: i64) -> Result<Vec<EntryView>> {
    let mut conn = pool.acquire().await?;
    get_event_on(&mut conn, event_id).await?;

    let rows = sqlx::query_as::<_, EntryWithResult>(
        r#"
        SELECT e.entry_id, e.team_id, s.crr_name, e.entry_boat_class, e.conference_at_time,
               e.seed, e.notes, r.lane, r.position, r.elapsed_sec, r.margin_sec
        FROM entries e
        JOIN teams t ON e.team_id = t.team_id
        JOIN schools s ON t.school_id = s.school_id
        LEFT JOIN results r ON r.entry_id = e.entry_id
        WHERE e.event_id = ?
        ORDER BY r.position IS NULL, r.position, e.entry_id
        "#,
    )
    .bind(event_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(EntryView::from).collect())
}

fn check_rows(
    rows: &[ResultRow],
    eligible: &HashSet<String>,
    default_boat_class: &str,
    date: NaiveDate,
) -> Result<Vec<CheckedRow>> {
    let mut seen = HashSet::new();
    let mut checked: Vec<CheckedRow> = Vec::new();

    for row in rows {
        let crr_name = row.crr_name.trim();
        if crr_name.is_empty() {
            continue;
        }

        if !eligible.contains(crr_name) {
            warn!("Rejected results: '{}' not eligible on {}", crr_name, date);
            return Err(Error::InvalidInput(format!(
                "'{}' is not eligible for this event on {}",
                crr_name, date
            )));
        }
        if !seen.insert(crr_name.to_string()) {
            warn!("Rejected results: '{}' listed twice", crr_name);
            return Err(Error::InvalidInput(format!(
                "'{}' appears more than once",
                crr_name
            )));
        }

        let notes = row.notes.as_deref().unwrap_or("").trim().to_string();
        check_notes(&notes)?;

        let boat_class = match row.boat_class.as_deref().map(str::trim) {
            Some(class) if !class.is_empty() => {
                validate_boat_class(class)?;
                class.to_string()
            }
            _ => default_boat_class.to_string(),
        };

        let elapsed = match row.time.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => Some(
                parse_race_time(text)
                    .map_err(|e| {
                        Error::InvalidInput(format!("Time '{}' for '{}': {}", text, crr_name, e))
                    })?
                    .total_seconds(),
            ),
            _ => None,
        };

        checked.push(CheckedRow {
            crr_name: crr_name.to_string(),
            lane: row.lane,
            elapsed,
            boat_class,
            notes,
        });
    }

    if checked.is_empty() {
        return Err(Error::InvalidInput("At least one school is required".to_string()));
    }

    let mut previous: Option<(&str, f64)> = None;
    for row in &checked {
        let Some(elapsed) = row.elapsed else {
            continue;
        };
        if let Some((prev_name, prev_elapsed)) = previous {
            if elapsed < prev_elapsed {
                warn!("Rejected results: times out of finishing order");
                return Err(Error::InvalidInput(format!(
                    "'{}' ({}) is faster than '{}' ({}) listed ahead of it",
                    row.crr_name,
                    format_time_seconds(elapsed),
                    prev_name,
                    format_time_seconds(prev_elapsed)
                )));
            }
        }
        previous = Some((row.crr_name.as_str(), elapsed));
    }

    Ok(checked)
}

/// Replace the event's entries and results with the submitted grid
///
/// Timed rows are placed in the order given; the margin is measured from the
/// first (fastest) timed row. Every entry records the school's conference on
/// the event date.
pub async fn submit_results(
    pool: &SqlitePool,
    event_id: i64,
    rows: &[ResultRow],
) -> Result<SubmitReport> {
    let mut tx = pool.begin().await?;

    let event = get_event_on(&mut tx, event_id).await?;
    let category = event.category()?;
    let date = get_event_date(&mut tx, event_id).await?;
    let eligible: HashSet<String> = eligible_on(&mut tx, category, date)
        .await?
        .into_iter()
        .collect();

    let checked = check_rows(rows, &eligible, &event.event_boat_class, date)?;

    sqlx::query(
        "DELETE FROM results WHERE entry_id IN (SELECT entry_id FROM entries WHERE event_id = ?)",
    )
    .bind(event_id)
    .execute(&mut *tx)
    .await?;
    let replaced_entries = sqlx::query("DELETE FROM entries WHERE event_id = ?")
        .bind(event_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let fastest = checked.iter().find_map(|r| r.elapsed);
    let mut report = SubmitReport {
        replaced_entries,
        ..SubmitReport::default()
    };

    for row in &checked {
        let team_id = find_team_id(&mut tx, &row.crr_name, category)
            .await?
            .ok_or_else(|| Error::NotFound(format!("{} team for '{}'", category, row.crr_name)))?;
        let conference = conference_at_date(&mut tx, team_id, date).await?;

        let entry_id = sqlx::query(
            r#"
            INSERT INTO entries (event_id, team_id, entry_boat_class, conference_at_time, notes)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(event_id)
        .bind(team_id)
        .bind(&row.boat_class)
        .bind(&conference)
        .bind(&row.notes)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();
        report.entries += 1;

        if let (Some(elapsed), Some(fastest)) = (row.elapsed, fastest) {
            report.results += 1;
            sqlx::query(
                r#"
                INSERT INTO results (entry_id, lane, position, elapsed_sec, margin_sec)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(entry_id)
            .bind(row.lane)
            .bind(report.results as i64)
            .bind(elapsed)
            .bind(elapsed - fastest)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;

    info!(
        "Saved results for event {}: {} entries, {} timed ({} replaced)",
        event_id, report.entries, report.results, report.replaced_entries
    );
    Ok(report)
}

pub async fn update_entry_notes(pool: &SqlitePool, entry_id: i64, notes: &str) -> Result<()> {
    let notes = notes.trim();
    check_notes(notes)?;

    let updated = sqlx::query("UPDATE entries SET notes = ? WHERE entry_id = ?")
        .bind(notes)
        .bind(entry_id)
        .execute(pool)
        .await?
        .rows_affected();

    if updated == 0 {
        return Err(Error::NotFound(format!("Entry {}", entry_id)));
    }

    info!("Updated notes for entry {}", entry_id);
    Ok(())
}

/// Update notes for several entries of an event by school
///
/// Returns the number of entries changed; schools without an entry are ignored.
pub async fn update_event_notes(
    pool: &SqlitePool,
    event_id: i64,
    notes: &BTreeMap<String, String>,
) -> Result<u64> {
    for text in notes.values() {
        check_notes(text.trim())?;
    }

    let mut tx = pool.begin().await?;
    get_event_on(&mut tx, event_id).await?;

    let mut updated = 0;
    for (crr_name, text) in notes {
        updated += sqlx::query(
            r#"
            UPDATE entries SET notes = ?
            WHERE event_id = ?
              AND team_id IN (
                  SELECT t.team_id FROM teams t
                  JOIN schools s ON t.school_id = s.school_id
                  WHERE s.crr_name = ?
              )
            "#,
        )
        .bind(text.trim())
        .bind(event_id)
        .bind(crr_name.trim())
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }

    tx.commit().await?;

    info!("Updated notes on {} entries of event {}", updated, event_id);
    Ok(updated)
}
