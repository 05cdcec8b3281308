//! Participation seasons: flag editing and overlap resolution on create

mod helpers;

use crdb_common::db::participations::{
    create_season, delete_participation_season, list_participation_seasons,
    populate_initial_participations, preview_season, season_participations, set_participation,
};
use crdb_common::season::{OverlapKind, Resolution};
use crdb_common::{Error, Season, TeamCategory};
use helpers::{memory_db, participate, school_with_teams};
use sqlx::SqlitePool;

fn s(start: i32, end: Option<i32>) -> Season {
    Season::new(start, end).unwrap()
}

async fn flags_in(pool: &SqlitePool, school_id: i64, season: Season) -> Option<(bool, bool, bool, bool)> {
    sqlx::query_as(
        r#"
        SELECT openweight_women, heavyweight_men, lightweight_men, lightweight_women
        FROM school_participations
        WHERE school_id = ? AND start_date = ? AND end_date IS ?
        "#,
    )
    .bind(school_id)
    .bind(season.start_date())
    .bind(season.end_date())
    .fetch_optional(pool)
    .await
    .unwrap()
}

#[tokio::test]
async fn test_set_participation_creates_row_and_team() {
    let pool = memory_db().await;
    let yale = school_with_teams(&pool, "Yale", &[]).await;

    set_participation(&pool, yale, "2024 - current", TeamCategory::LightweightMen, true)
        .await
        .unwrap();
    assert_eq!(
        flags_in(&pool, yale, s(2024, None)).await,
        Some((false, false, true, false))
    );

    let teams: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM teams WHERE school_id = ?")
        .bind(yale)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(teams, 1);

    // Second flag lands on the same row
    set_participation(&pool, yale, "2024 - current", TeamCategory::OpenweightWomen, true)
        .await
        .unwrap();
    set_participation(&pool, yale, "2024 - current", TeamCategory::LightweightMen, false)
        .await
        .unwrap();
    assert_eq!(
        flags_in(&pool, yale, s(2024, None)).await,
        Some((true, false, false, false))
    );

    let rows = season_participations(&pool, 2024).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].flag(TeamCategory::OpenweightWomen));

    assert!(matches!(
        set_participation(&pool, yale, "someday", TeamCategory::LightweightMen, true)
            .await
            .unwrap_err(),
        Error::InvalidInput(_)
    ));
    assert!(matches!(
        set_participation(&pool, 999, "2024 - current", TeamCategory::LightweightMen, true)
            .await
            .unwrap_err(),
        Error::NotFound(_)
    ));
}

#[tokio::test]
async fn test_create_next_current_season_trims_previous() {
    let pool = memory_db().await;
    let yale = school_with_teams(&pool, "Yale", &[]).await;
    let brown = school_with_teams(&pool, "Brown", &[]).await;
    participate(&pool, yale, s(2024, None), &[TeamCategory::HeavyweightMen]).await;
    participate(&pool, brown, s(2024, None), &[TeamCategory::LightweightWomen]).await;

    let plan = preview_season(&pool, &s(2025, None)).await.unwrap();
    assert_eq!(plan.overlaps.len(), 1);
    assert_eq!(plan.overlaps[0].kind, OverlapKind::AdjacentCurrentSeasons);

    let report = create_season(&pool, s(2025, None), None).await.unwrap();
    assert_eq!(report.rows_deleted, 2);
    assert_eq!(report.rows_reinserted, 2);
    assert_eq!(report.rows_created, 2);

    assert_eq!(
        list_participation_seasons(&pool).await.unwrap(),
        vec![s(2025, None), s(2024, Some(2025))]
    );
    assert_eq!(
        flags_in(&pool, yale, s(2024, Some(2025))).await,
        Some((false, true, false, false))
    );
    assert_eq!(
        flags_in(&pool, yale, s(2025, None)).await,
        Some((false, false, false, false))
    );
}

#[tokio::test]
async fn test_create_inner_season_splits_and_copies() {
    let pool = memory_db().await;
    let yale = school_with_teams(&pool, "Yale", &[]).await;
    let brown = school_with_teams(&pool, "Brown", &[]).await;
    participate(&pool, yale, s(2020, Some(2030)), &[TeamCategory::HeavyweightMen]).await;
    participate(&pool, brown, s(2020, Some(2030)), &[TeamCategory::OpenweightWomen]).await;

    let report = create_season(&pool, s(2024, Some(2026)), Some(s(2020, Some(2030))))
        .await
        .unwrap();
    assert_eq!(report.overlaps.len(), 1);
    assert_eq!(
        report.overlaps[0].resolution,
        Resolution::Split {
            before: Some(s(2020, Some(2024))),
            after: Some(s(2026, Some(2030))),
        }
    );
    assert_eq!(report.rows_deleted, 2);
    assert_eq!(report.rows_reinserted, 4);
    assert_eq!(report.rows_created, 2);

    assert_eq!(
        list_participation_seasons(&pool).await.unwrap(),
        vec![s(2026, Some(2030)), s(2024, Some(2026)), s(2020, Some(2024))]
    );
    for season in [s(2020, Some(2024)), s(2024, Some(2026)), s(2026, Some(2030))] {
        assert_eq!(
            flags_in(&pool, brown, season).await,
            Some((true, false, false, false)),
            "{}",
            season
        );
    }
}

#[tokio::test]
async fn test_recreating_same_season_replaces_rows() {
    let pool = memory_db().await;
    let yale = school_with_teams(&pool, "Yale", &[]).await;
    participate(&pool, yale, s(2024, None), &[TeamCategory::HeavyweightMen]).await;

    let report = create_season(&pool, s(2024, None), Some(s(2024, None))).await.unwrap();
    assert_eq!(report.overlaps[0].resolution, Resolution::Replace);
    assert_eq!(report.rows_reinserted, 0);
    assert_eq!(report.rows_created, 1);
    assert_eq!(
        flags_in(&pool, yale, s(2024, None)).await,
        Some((false, true, false, false))
    );
}

#[tokio::test]
async fn test_create_season_rejects_bad_input() {
    let pool = memory_db().await;
    school_with_teams(&pool, "Yale", &[]).await;

    let missing_source = create_season(&pool, s(2024, None), Some(s(2018, Some(2019))))
        .await
        .unwrap_err();
    assert!(matches!(missing_source, Error::NotFound(_)));

    let backwards = create_season(
        &pool,
        Season {
            start_year: 2025,
            end_year: Some(2024),
        },
        None,
    )
    .await
    .unwrap_err();
    assert!(matches!(backwards, Error::InvalidInput(_)));

    // Nothing was written by the failed attempts
    assert!(list_participation_seasons(&pool).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_populate_from_teams_and_delete_season() {
    let pool = memory_db().await;
    let harvard = school_with_teams(
        &pool,
        "Harvard",
        &[TeamCategory::HeavyweightMen, TeamCategory::LightweightMen],
    )
    .await;
    let yale = school_with_teams(&pool, "Yale", &[TeamCategory::OpenweightWomen]).await;
    school_with_teams(&pool, "No Teams", &[]).await;
    participate(&pool, yale, s(2024, None), &[]).await;

    let created = populate_initial_participations(&pool, 2024).await.unwrap();
    assert_eq!(created, 1);
    assert_eq!(
        flags_in(&pool, harvard, s(2024, None)).await,
        Some((false, true, true, false))
    );
    // Existing row untouched
    assert_eq!(
        flags_in(&pool, yale, s(2024, None)).await,
        Some((false, false, false, false))
    );

    assert_eq!(delete_participation_season(&pool, 2024).await.unwrap(), 2);
    assert!(list_participation_seasons(&pool).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_season_participations_one_row_per_school() {
    let pool = memory_db().await;
    let yale = school_with_teams(&pool, "Yale", &[]).await;
    school_with_teams(&pool, "Brown", &[]).await;

    set_participation(&pool, yale, "2024 - 2025", TeamCategory::OpenweightWomen, true)
        .await
        .unwrap();
    set_participation(&pool, yale, "2024 - 2026", TeamCategory::HeavyweightMen, true)
        .await
        .unwrap();

    let rows = season_participations(&pool, 2024).await.unwrap();
    assert_eq!(rows.len(), 2);

    let yale_row = rows.iter().find(|r| r.school_id == yale).unwrap();
    assert!(yale_row.flag(TeamCategory::HeavyweightMen));
    assert!(!yale_row.flag(TeamCategory::OpenweightWomen));

    set_participation(&pool, yale, "2024 - current", TeamCategory::LightweightMen, true)
        .await
        .unwrap();
    let rows = season_participations(&pool, 2024).await.unwrap();
    assert_eq!(rows.len(), 2);
    let yale_row = rows.iter().find(|r| r.school_id == yale).unwrap();
    assert!(yale_row.flag(TeamCategory::LightweightMen));
    assert!(!yale_row.flag(TeamCategory::HeavyweightMen));
}
