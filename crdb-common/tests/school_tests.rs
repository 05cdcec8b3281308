//! School maintenance: CRR name rules, change events, cascading deletes

mod helpers;

use crdb_common::db::participations::season_participations;
use crdb_common::db::schools::{
    add_school, crr_name_usage, delete_schools, get_school_by_crr_name, list_schools, list_teams,
    update_school_field, NewSchool, SchoolField,
};
use crdb_common::{ChangeBus, Error, SchoolChange, TeamCategory};
use helpers::{memory_db, school_with_teams};

#[tokio::test]
async fn test_add_school_defaults_and_uniqueness() {
    let pool = memory_db().await;
    let changes = ChangeBus::new();
    let mut rx = changes.subscribe();

    let school = add_school(
        &pool,
        &changes,
        NewSchool {
            name: Some("  Yale University ".to_string()),
            ..NewSchool::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(school.crr_name, "Yale University");
    assert_eq!(school.name, "Yale University");
    assert_eq!(school.short_name, None);
    assert_eq!(
        rx.recv().await.unwrap(),
        SchoolChange::Created {
            crr_name: "Yale University".to_string()
        }
    );

    let duplicate = add_school(
        &pool,
        &changes,
        NewSchool {
            crr_name: Some("Yale University".to_string()),
            name: Some("Another".to_string()),
            ..NewSchool::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(duplicate, Error::Conflict(_)));

    let blank = add_school(&pool, &changes, NewSchool::default()).await.unwrap_err();
    assert!(matches!(blank, Error::InvalidInput(_)));
}

#[tokio::test]
async fn test_add_school_with_season_creates_empty_participation() {
    let pool = memory_db().await;

    let school = add_school(
        &pool,
        &ChangeBus::new(),
        NewSchool {
            crr_name: Some("Drexel".to_string()),
            name: Some("Drexel University".to_string()),
            season: Some("2024 - current".to_string()),
            ..NewSchool::default()
        },
    )
    .await
    .unwrap();

    let rows = season_participations(&pool, 2024).await.unwrap();
    let drexel = rows.iter().find(|r| r.school_id == school.school_id).unwrap();
    assert!(drexel.participation_id.is_some());
    assert!(TeamCategory::ALL.iter().all(|c| !drexel.flag(*c)));

    let bad_season = add_school(
        &pool,
        &ChangeBus::new(),
        NewSchool {
            crr_name: Some("Temple".to_string()),
            season: Some("next year".to_string()),
            ..NewSchool::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(bad_season, Error::InvalidInput(_)));
}

#[tokio::test]
async fn test_update_fields_and_rename() {
    let pool = memory_db().await;
    let changes = ChangeBus::new();
    let yale = school_with_teams(&pool, "Yale", &[]).await;
    school_with_teams(&pool, "Harvard", &[]).await;
    let mut rx = changes.subscribe();

    let updated = update_school_field(&pool, &changes, yale, SchoolField::Acronym, " YU ")
        .await
        .unwrap();
    assert_eq!(updated.acronym.as_deref(), Some("YU"));
    assert_eq!(
        rx.recv().await.unwrap(),
        SchoolChange::Updated {
            crr_name: "Yale".to_string(),
            field: "acronym".to_string()
        }
    );

    let cleared = update_school_field(&pool, &changes, yale, SchoolField::Acronym, "")
        .await
        .unwrap();
    assert_eq!(cleared.acronym, None);
    rx.recv().await.unwrap();

    let renamed = update_school_field(&pool, &changes, yale, SchoolField::CrrName, " Yale University ")
        .await
        .unwrap();
    assert_eq!(renamed.crr_name, "Yale University");
    assert_eq!(
        rx.recv().await.unwrap(),
        SchoolChange::CrrNameChanged {
            old: "Yale".to_string(),
            new: "Yale University".to_string()
        }
    );

    let taken = update_school_field(&pool, &changes, yale, SchoolField::CrrName, "Harvard")
        .await
        .unwrap_err();
    assert!(matches!(taken, Error::Conflict(_)));

    let empty = update_school_field(&pool, &changes, yale, SchoolField::CrrName, "  ")
        .await
        .unwrap_err();
    assert!(matches!(empty, Error::InvalidInput(_)));

    let blank_name = update_school_field(&pool, &changes, yale, SchoolField::Name, " \t ")
        .await
        .unwrap_err();
    assert!(matches!(blank_name, Error::InvalidInput(_)));
    let name: String = sqlx::query_scalar("SELECT name FROM schools WHERE school_id = ?")
        .bind(yale)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(!name.trim().is_empty());

    let missing = update_school_field(&pool, &changes, 999, SchoolField::Name, "x")
        .await
        .unwrap_err();
    assert!(matches!(missing, Error::NotFound(_)));
}

#[tokio::test]
async fn test_delete_cascades_to_teams_and_entries() {
    let pool = memory_db().await;
    let changes = ChangeBus::new();
    let yale = school_with_teams(
        &pool,
        "Yale",
        &[TeamCategory::HeavyweightMen, TeamCategory::OpenweightWomen],
    )
    .await;
    school_with_teams(&pool, "Brown", &[TeamCategory::HeavyweightMen]).await;

    let team_id: i64 = sqlx::query_scalar("SELECT team_id FROM teams WHERE school_id = ? AND gender = 'M'")
        .bind(yale)
        .fetch_one(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO regattas (regatta_id, name) VALUES (1, 'Sprints')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO events (event_id, regatta_id, boat_type, event_boat_class, gender, weight, round) \
         VALUES (1, 1, '8+', '1V', 'M', 'HW', 'Final')",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query("INSERT INTO entries (entry_id, event_id, team_id) VALUES (1, 1, ?)")
        .bind(team_id)
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO results (entry_id, position, elapsed_sec) VALUES (1, 1, 360.0)")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO conference_affiliations (team_id, conference, start_date) VALUES (?, 'Ivy League', '2024-09-01')",
    )
    .bind(team_id)
    .execute(&pool)
    .await
    .unwrap();

    let usage = crr_name_usage(&pool, "Yale").await.unwrap();
    assert_eq!(usage.teams, 2);
    assert_eq!(usage.entries, 1);
    assert_eq!(usage.results, 1);
    assert_eq!(usage.conference_affiliations, 1);
    assert!(!usage.is_unused());

    let mut rx = changes.subscribe();
    let deleted = delete_schools(&pool, &changes, &["Yale".to_string(), "Nowhere".to_string()])
        .await
        .unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(
        rx.recv().await.unwrap(),
        SchoolChange::Deleted {
            crr_name: "Yale".to_string()
        }
    );

    for table in ["teams", "entries", "results", "conference_affiliations"] {
        let remaining: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {} WHERE {}",
            table,
            if table == "teams" { "school_id = 1" } else { "1 = 1" }
        ))
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(remaining, 0, "{}", table);
    }

    assert!(matches!(
        get_school_by_crr_name(&pool, "Yale").await.unwrap_err(),
        Error::NotFound(_)
    ));
    assert_eq!(list_schools(&pool).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_teams_by_category() {
    let pool = memory_db().await;
    school_with_teams(
        &pool,
        "Harvard",
        &[TeamCategory::HeavyweightMen, TeamCategory::LightweightMen],
    )
    .await;
    school_with_teams(&pool, "Brown", &[TeamCategory::HeavyweightMen]).await;

    let all = list_teams(&pool, None).await.unwrap();
    assert_eq!(all.len(), 3);

    let heavy = list_teams(&pool, Some(TeamCategory::HeavyweightMen)).await.unwrap();
    let names: Vec<_> = heavy.iter().map(|t| t.crr_name.as_str()).collect();
    assert_eq!(names, vec!["Brown", "Harvard"]);
    assert_eq!(heavy[0].category().unwrap(), TeamCategory::HeavyweightMen);
}
