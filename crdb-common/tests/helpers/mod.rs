//! Shared fixtures for data-access tests
#![allow(dead_code)]

use crdb_common::categories::{Gender, Weight};
use crdb_common::db::events::{add_event, NewEvent};
use crdb_common::db::init_memory_database;
use crdb_common::db::regattas::{add_regatta, NewRegatta};
use crdb_common::db::schools::{add_school, ensure_team, NewSchool};
use crdb_common::{ChangeBus, Season, TeamCategory};
use chrono::NaiveDate;
use sqlx::SqlitePool;

pub async fn memory_db() -> SqlitePool {
    init_memory_database().await.unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Add a school fielding the given teams; returns its id
pub async fn school_with_teams(pool: &SqlitePool, crr_name: &str, teams: &[TeamCategory]) -> i64 {
    let school = add_school(
        pool,
        &ChangeBus::new(),
        NewSchool {
            crr_name: Some(crr_name.to_string()),
            ..NewSchool::default()
        },
    )
    .await
    .unwrap();

    let mut conn = pool.acquire().await.unwrap();
    for category in teams {
        ensure_team(&mut conn, school.school_id, *category).await.unwrap();
    }
    school.school_id
}

/// Participation row with the given categories flagged
pub async fn participate(pool: &SqlitePool, school_id: i64, season: Season, teams: &[TeamCategory]) {
    let flag = |c: TeamCategory| teams.contains(&c);
    sqlx::query(
        r#"
        INSERT INTO school_participations
            (school_id, start_date, end_date, openweight_women, heavyweight_men,
             lightweight_men, lightweight_women)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(school_id)
    .bind(season.start_date())
    .bind(season.end_date())
    .bind(flag(TeamCategory::OpenweightWomen))
    .bind(flag(TeamCategory::HeavyweightMen))
    .bind(flag(TeamCategory::LightweightMen))
    .bind(flag(TeamCategory::LightweightWomen))
    .execute(pool)
    .await
    .unwrap();
}

pub async fn regatta(pool: &SqlitePool, name: &str, start: Option<NaiveDate>) -> i64 {
    add_regatta(
        pool,
        NewRegatta {
            name: name.to_string(),
            location: None,
            start_date: start,
            end_date: None,
        },
    )
    .await
    .unwrap()
    .regatta_id
}

pub fn heavy_men_eight() -> NewEvent {
    NewEvent {
        boat_type: "8+".to_string(),
        event_boat_class: "1V".to_string(),
        gender: Gender::Men,
        weight: Weight::Heavyweight,
        round: "Final".to_string(),
        event_distance: None,
        scheduled_date: None,
        scheduled_time: None,
    }
}

pub async fn event(pool: &SqlitePool, regatta_id: i64, new: NewEvent) -> i64 {
    add_event(pool, regatta_id, new).await.unwrap().event_id
}
