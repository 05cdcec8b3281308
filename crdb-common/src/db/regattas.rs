//! Regatta queries

use crate::db::models::Regatta;
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{info, warn};

#[derive(Debug, Clone, Deserialize)]
pub struct NewRegatta {
    pub name: String,
    pub location: Option<String>,
    pub start_date: Option<NaiveDate>,
    /// Defaults to `start_date`
    pub end_date: Option<NaiveDate>,
}

/// Rows removed by [`delete_regatta`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegattaDeleteCounts {
    pub results: u64,
    pub entries: u64,
    pub events: u64,
    pub regattas: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegattaCounts {
    pub events: i64,
    pub entries: i64,
}

pub async fn add_regatta(pool: &SqlitePool, new: NewRegatta) -> Result<Regatta> {
    let name = new.name.trim();
    if name.is_empty() {
        warn!("Rejected regatta without a name");
        return Err(Error::InvalidInput("Regatta name is required".to_string()));
    }

    let end_date = new.end_date.or(new.start_date);
    if let (Some(start), Some(end)) = (new.start_date, end_date) {
        if end < start {
            warn!("Rejected regatta '{}': ends {} before it starts {}", name, end, start);
            return Err(Error::InvalidInput(
                "Regatta end date cannot be before its start date".to_string(),
            ));
        }
    }

    let location = new
        .location
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty());

    let regatta_id = sqlx::query(
        "INSERT INTO regattas (name, location, start_date, end_date) VALUES (?, ?, ?, ?)",
    )
    .bind(name)
    .bind(location)
    .bind(new.start_date.map(|d| d.to_string()))
    .bind(end_date.map(|d| d.to_string()))
    .execute(pool)
    .await?
    .last_insert_rowid();

    info!("Added regatta '{}' (id {})", name, regatta_id);
    get_regatta(pool, regatta_id).await
}

/// Newest first; undated regattas last
pub async fn list_regattas(pool: &SqlitePool) -> Result<Vec<Regatta>> {
    let regattas = sqlx::query_as::<_, Regatta>(
        r#"
        SELECT regatta_id, name, location, start_date, end_date
        FROM regattas
        ORDER BY start_date IS NULL, start_date DESC, regatta_id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(regattas)
}

pub async fn get_regatta(pool: &SqlitePool, regatta_id: i64) -> Result<Regatta> {
    sqlx::query_as::<_, Regatta>(
        "SELECT regatta_id, name, location, start_date, end_date FROM regattas WHERE regatta_id = ?",
    )
    .bind(regatta_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Regatta {}", regatta_id)))
}

/// Events and entries under a regatta, shown before deleting it
pub async fn regatta_counts(pool: &SqlitePool, regatta_id: i64) -> Result<RegattaCounts> {
    get_regatta(pool, regatta_id).await?;

    let events: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events WHERE regatta_id = ?")
        .bind(regatta_id)
        .fetch_one(pool)
        .await?;
    let entries: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM entries e JOIN events ev ON e.event_id = ev.event_id WHERE ev.regatta_id = ?",
    )
    .bind(regatta_id)
    .fetch_one(pool)
    .await?;

    Ok(RegattaCounts { events, entries })
}

/// Delete a regatta and everything under it in one transaction
pub async fn delete_regatta(pool: &SqlitePool, regatta_id: i64) -> Result<RegattaDeleteCounts> {
    get_regatta(pool, regatta_id).await?;

    let mut tx = pool.begin().await?;

    let results = sqlx::query(
        r#"
        DELETE FROM results WHERE entry_id IN (
            SELECT e.entry_id FROM entries e
            JOIN events ev ON e.event_id = ev.event_id
            WHERE ev.regatta_id = ?
        )
        "#,
    )
    .bind(regatta_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let entries = sqlx::query(
        "DELETE FROM entries WHERE event_id IN (SELECT event_id FROM events WHERE regatta_id = ?)",
    )
    .bind(regatta_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let events = sqlx::query("DELETE FROM events WHERE regatta_id = ?")
        .bind(regatta_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let regattas = sqlx::query("DELETE FROM regattas WHERE regatta_id = ?")
        .bind(regatta_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;

    let counts = RegattaDeleteCounts {
        results,
        entries,
        events,
        regattas,
    };
    info!("Deleted regatta {}: {:?}", regatta_id, counts);
    Ok(counts)
}
