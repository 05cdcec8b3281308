//! Event queries
//!
//! `scheduled_at` is stored as "YYYY-MM-DD HH:MM:00" when a start time is
//! known, "YYYY-MM-DD" when only the day is, and NULL otherwise.

use crate::categories::{
    validate_boat_class, validate_boat_type, Gender, TeamCategory, Weight, DEFAULT_EVENT_DISTANCE,
};
use crate::db::models::{Event, EventListing};
use crate::schedule_time::{parse_schedule_time, scheduled_at};
use crate::{Error, Result};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};

const EVENT_COLUMNS: &str = "event_id, regatta_id, boat_type, event_boat_class, gender, weight, \
                             round, event_distance, scheduled_at";

#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
    pub boat_type: String,
    pub event_boat_class: String,
    pub gender: Gender,
    pub weight: Weight,
    pub round: String,
    pub event_distance: Option<String>,
    pub scheduled_date: Option<NaiveDate>,
    /// Free-form start time ("930", "2:15pm", "noon")
    pub scheduled_time: Option<String>,
}

/// Rows removed by [`delete_event`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EventDeleteCounts {
    pub results: u64,
    pub entries: u64,
    pub events: u64,
}

/// Date part of a stored DATE/DATETIME value
pub(crate) fn parse_stored_date(value: &str) -> Option<NaiveDate> {
    value
        .get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
}

pub async fn add_event(pool: &SqlitePool, regatta_id: i64, new: NewEvent) -> Result<Event> {
    let regatta_start: Option<Option<String>> =
        sqlx::query_scalar("SELECT start_date FROM regattas WHERE regatta_id = ?")
            .bind(regatta_id)
            .fetch_optional(pool)
            .await?;
    let regatta_start = regatta_start
        .ok_or_else(|| Error::NotFound(format!("Regatta {}", regatta_id)))?
        .as_deref()
        .and_then(parse_stored_date);

    validate_boat_type(&new.boat_type)?;
    validate_boat_class(&new.event_boat_class)?;
    let category = TeamCategory::from_parts(new.gender, new.weight)?;

    let round = new.round.trim();
    if round.is_empty() {
        warn!("Rejected event without a round");
        return Err(Error::InvalidInput("Round is required".to_string()));
    }

    let time = match new.scheduled_time.as_deref() {
        Some(text) => parse_schedule_time(text)?,
        None => None,
    };
    let scheduled = match (time, new.scheduled_date) {
        (Some(hhmm), date) => {
            let date = date.or(regatta_start).ok_or_else(|| {
                Error::InvalidInput(
                    "A start time needs a date and the regatta has no start date".to_string(),
                )
            })?;
            Some(scheduled_at(date, &hhmm))
        }
        (None, Some(date)) => Some(date.format("%Y-%m-%d").to_string()),
        (None, None) => None,
    };

    let distance = new
        .event_distance
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(DEFAULT_EVENT_DISTANCE);

    let event_id = sqlx::query(
        r#"
        INSERT INTO events (regatta_id, boat_type, event_boat_class, gender, weight, round,
                            event_distance, scheduled_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(regatta_id)
    .bind(&new.boat_type)
    .bind(&new.event_boat_class)
    .bind(category.gender().code())
    .bind(category.weight().code())
    .bind(round)
    .bind(distance)
    .bind(&scheduled)
    .execute(pool)
    .await?
    .last_insert_rowid();

    info!(
        "Added event {} to regatta {}: {} {} {} {}",
        event_id, regatta_id, category, new.event_boat_class, new.boat_type, round
    );
    get_event(pool, event_id).await
}

/// Events of one regatta in schedule order
pub async fn list_events(pool: &SqlitePool, regatta_id: i64) -> Result<Vec<Event>> {
    let events = sqlx::query_as::<_, Event>(&format!(
        "SELECT {} FROM events WHERE regatta_id = ? \
         ORDER BY scheduled_at IS NULL, scheduled_at, event_id",
        EVENT_COLUMNS
    ))
    .bind(regatta_id)
    .fetch_all(pool)
    .await?;

    Ok(events)
}

/// Every event with its regatta, newest regatta first
pub async fn list_all_events(pool: &SqlitePool) -> Result<Vec<EventListing>> {
    let events = sqlx::query_as::<_, EventListing>(
        r#"
        SELECT ev.event_id, ev.regatta_id, r.name AS regatta_name,
               r.start_date AS regatta_start_date,
               ev.boat_type, ev.event_boat_class, ev.gender, ev.weight, ev.round,
               ev.scheduled_at
        FROM events ev
        JOIN regattas r ON ev.regatta_id = r.regatta_id
        ORDER BY r.start_date IS NULL, r.start_date DESC, r.regatta_id DESC,
                 ev.scheduled_at IS NULL, ev.scheduled_at, ev.event_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(events)
}

pub async fn get_event(pool: &SqlitePool, event_id: i64) -> Result<Event> {
    let mut conn = pool.acquire().await?;
    get_event_on(&mut conn, event_id).await
}

pub(crate) async fn get_event_on(conn: &mut SqliteConnection, event_id: i64) -> Result<Event> {
    sqlx::query_as::<_, Event>(&format!(
        "SELECT {} FROM events WHERE event_id = ?",
        EVENT_COLUMNS
    ))
    .bind(event_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Event {}", event_id)))
}

pub async fn event_entry_count(pool: &SqlitePool, event_id: i64) -> Result<i64> {
    get_event(pool, event_id).await?;

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entries WHERE event_id = ?")
        .bind(event_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Delete an event with its entries and results in one transaction
pub async fn delete_event(pool: &SqlitePool, event_id: i64) -> Result<EventDeleteCounts> {
    let mut tx = pool.begin().await?;
    get_event_on(&mut tx, event_id).await?;

    let results = sqlx::query(
        "DELETE FROM results WHERE entry_id IN (SELECT entry_id FROM entries WHERE event_id = ?)",
    )
    .bind(event_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let entries = sqlx::query("DELETE FROM entries WHERE event_id = ?")
        .bind(event_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let events = sqlx::query("DELETE FROM events WHERE event_id = ?")
        .bind(event_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;

    let counts = EventDeleteCounts {
        results,
        entries,
        events,
    };
    info!("Deleted event {}: {:?}", event_id, counts);
    Ok(counts)
}

/// Day the event is rowed: its schedule, else the regatta start, else today
pub async fn get_event_date(conn: &mut SqliteConnection, event_id: i64) -> Result<NaiveDate> {
    let row: Option<Option<String>> = sqlx::query_scalar(
        r#"
        SELECT COALESCE(ev.scheduled_at, r.start_date)
        FROM events ev
        JOIN regattas r ON ev.regatta_id = r.regatta_id
        WHERE ev.event_id = ?
        "#,
    )
    .bind(event_id)
    .fetch_optional(&mut *conn)
    .await?;

    let stored = row.ok_or_else(|| Error::NotFound(format!("Event {}", event_id)))?;

    Ok(stored
        .as_deref()
        .and_then(parse_stored_date)
        .unwrap_or_else(|| Local::now().date_naive()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stored_date() {
        let d = NaiveDate::from_ymd_opt(2025, 4, 12).unwrap();
        assert_eq!(parse_stored_date("2025-04-12"), Some(d));
        assert_eq!(parse_stored_date("2025-04-12 09:30:00"), Some(d));
        assert_eq!(parse_stored_date("April"), None);
        assert_eq!(parse_stored_date(""), None);
    }
}
