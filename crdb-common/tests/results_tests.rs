//! Results entry: eligibility, placings, margins and notes

mod helpers;

use crdb_common::db::conferences::add_conference_affiliation;
use crdb_common::db::results::{
    eligible_schools, list_event_entries, submit_results, update_entry_notes,
    update_event_notes, ResultRow,
};
use crdb_common::{Error, Season, TeamCategory};
use helpers::{date, event, heavy_men_eight, memory_db, participate, regatta, school_with_teams};
use sqlx::SqlitePool;
use std::collections::BTreeMap;

const HM: TeamCategory = TeamCategory::HeavyweightMen;

/// Yale and Harvard row heavyweight; Brown has the team but sits the season
/// out; Cornell has no heavyweight team
async fn setup() -> (SqlitePool, i64) {
    let pool = memory_db().await;
    let season = Season::current(2024).unwrap();

    let yale = school_with_teams(&pool, "Yale", &[HM]).await;
    let harvard = school_with_teams(&pool, "Harvard", &[HM]).await;
    let brown = school_with_teams(&pool, "Brown", &[HM]).await;
    let cornell = school_with_teams(&pool, "Cornell", &[TeamCategory::LightweightMen]).await;
    participate(&pool, yale, season, &[HM]).await;
    participate(&pool, harvard, season, &[HM]).await;
    participate(&pool, brown, season, &[]).await;
    participate(&pool, cornell, season, &[HM, TeamCategory::LightweightMen]).await;

    let yale_team: i64 = sqlx::query_scalar("SELECT team_id FROM teams WHERE school_id = ?")
        .bind(yale)
        .fetch_one(&pool)
        .await
        .unwrap();
    add_conference_affiliation(&pool, yale_team, "Ivy League", date(2024, 9, 1), None)
        .await
        .unwrap();

    let regatta_id = regatta(&pool, "Dual", Some(date(2025, 4, 12))).await;
    let event_id = event(&pool, regatta_id, heavy_men_eight()).await;
    (pool, event_id)
}

fn row(crr_name: &str, time: Option<&str>) -> ResultRow {
    ResultRow {
        crr_name: crr_name.to_string(),
        time: time.map(str::to_string),
        ..ResultRow::default()
    }
}

#[tokio::test]
async fn test_eligible_schools() {
    let (pool, event_id) = setup().await;
    assert_eq!(
        eligible_schools(&pool, event_id).await.unwrap(),
        vec!["Harvard", "Yale"]
    );
    assert!(matches!(
        eligible_schools(&pool, 999).await.unwrap_err(),
        Error::NotFound(_)
    ));
}

#[tokio::test]
async fn test_submit_places_and_margins() {
    let (pool, event_id) = setup().await;

    let rows = vec![
        row("Harvard", Some("6:00")),
        ResultRow {
            lane: Some(3),
            boat_class: Some("2V".to_string()),
            notes: Some(" Raced the 2V boat ".to_string()),
            ..row("Yale", Some("6:02.5"))
        },
    ];
    let report = submit_results(&pool, event_id, &rows).await.unwrap();
    assert_eq!(report.entries, 2);
    assert_eq!(report.results, 2);
    assert_eq!(report.replaced_entries, 0);

    let entries = list_event_entries(&pool, event_id).await.unwrap();
    assert_eq!(entries.len(), 2);

    let harvard = &entries[0];
    assert_eq!(harvard.crr_name, "Harvard");
    assert_eq!(harvard.position, Some(1));
    assert_eq!(harvard.margin.as_deref(), Some("Winner"));
    assert_eq!(harvard.entry_boat_class.as_deref(), Some("1V"));
    assert_eq!(harvard.conference_at_time.as_deref(), Some("Unknown"));

    let yale = &entries[1];
    assert_eq!(yale.position, Some(2));
    assert_eq!(yale.lane, Some(3));
    assert_eq!(yale.time.as_deref(), Some("06:02.500"));
    assert_eq!(yale.margin.as_deref(), Some("+00:02.500"));
    assert_eq!(yale.entry_boat_class.as_deref(), Some("2V"));
    assert_eq!(yale.conference_at_time.as_deref(), Some("Ivy League"));
    assert_eq!(yale.notes, "Raced the 2V boat");
}

#[tokio::test]
async fn test_resubmit_replaces_entries() {
    let (pool, event_id) = setup().await;

    submit_results(
        &pool,
        event_id,
        &[row("Harvard", Some("6:00")), row("Yale", Some("6:01"))],
    )
    .await
    .unwrap();

    let report = submit_results(
        &pool,
        event_id,
        &[row("Yale", None), row("", None), row("Harvard", Some("6:04"))],
    )
    .await
    .unwrap();
    assert_eq!(report.replaced_entries, 2);
    assert_eq!(report.entries, 2);
    assert_eq!(report.results, 1);

    let entries = list_event_entries(&pool, event_id).await.unwrap();
    assert_eq!(entries[0].crr_name, "Harvard");
    assert_eq!(entries[0].position, Some(1));
    assert_eq!(entries[1].crr_name, "Yale");
    assert_eq!(entries[1].position, None);
    assert_eq!(entries[1].margin, None);

    let results: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM results")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(results, 1);
}

#[tokio::test]
async fn test_rejected_grid_leaves_results_untouched() {
    let (pool, event_id) = setup().await;
    submit_results(&pool, event_id, &[row("Yale", Some("6:00"))])
        .await
        .unwrap();

    for rows in [
        vec![row("Brown", Some("6:00"))],
        vec![row("Cornell", Some("6:00"))],
        vec![row("Yale", Some("6:05")), row("Harvard", Some("6:01"))],
        vec![row(" ", None)],
    ] {
        let err = submit_results(&pool, event_id, &rows).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)), "{:?}", err);
    }

    let entries = list_event_entries(&pool, event_id).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].crr_name, "Yale");
}

#[tokio::test]
async fn test_notes_updates() {
    let (pool, event_id) = setup().await;
    submit_results(
        &pool,
        event_id,
        &[row("Harvard", Some("6:00")), row("Yale", Some("6:01"))],
    )
    .await
    .unwrap();
    let entries = list_event_entries(&pool, event_id).await.unwrap();

    update_entry_notes(&pool, entries[0].entry_id, "Photo finish").await.unwrap();
    assert!(matches!(
        update_entry_notes(&pool, entries[0].entry_id, &"x".repeat(501))
            .await
            .unwrap_err(),
        Error::InvalidInput(_)
    ));
    assert!(matches!(
        update_entry_notes(&pool, 999, "x").await.unwrap_err(),
        Error::NotFound(_)
    ));

    let mut notes = BTreeMap::new();
    notes.insert("Yale".to_string(), "Caught a crab at 1000m".to_string());
    notes.insert("Brown".to_string(), "Not entered".to_string());
    assert_eq!(update_event_notes(&pool, event_id, &notes).await.unwrap(), 1);

    let entries = list_event_entries(&pool, event_id).await.unwrap();
    assert_eq!(entries[0].notes, "Photo finish");
    assert_eq!(entries[1].notes, "Caught a crab at 1000m");
    assert_eq!(entries[1].notes_preview, "Caught a crab at 1000m");
}
