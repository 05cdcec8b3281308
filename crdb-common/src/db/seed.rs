//! Seed data and database initialization
//!
//! The seed holds the schools rowing at the varsity level, which teams each
//! fields, and the openweight women's conference lineup for 2024-2025.

use crate::categories::TeamCategory;
use crate::db::participations::populate_initial_participations;
use crate::db::schools::ensure_team;
use crate::season::{academic_label, current_academic_start_year};
use crate::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Season the seeded conference lineup covers
pub const SEED_CONFERENCE_START: &str = "2024-09-01";
pub const SEED_CONFERENCE_END: &str = "2025-08-31";

/// One seeded school
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSchool {
    pub crr_name: &'static str,
    pub name: &'static str,
    pub short_name: &'static str,
    pub acronym: &'static str,
    pub color: &'static str,
    /// Fielded teams in [`TeamCategory::ALL`] order
    pub teams: [bool; 4],
}

impl SeedSchool {
    pub fn categories(&self) -> impl Iterator<Item = TeamCategory> + '_ {
        TeamCategory::ALL
            .into_iter()
            .zip(self.teams)
            .filter_map(|(category, fielded)| fielded.then_some(category))
    }
}

const fn seed(
    crr_name: &'static str,
    name: &'static str,
    short_name: &'static str,
    acronym: &'static str,
    color: &'static str,
    teams: [bool; 4],
) -> SeedSchool {
    SeedSchool {
        crr_name,
        name,
        short_name,
        acronym,
        color,
        teams,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InitReport {
    /// Schools were already present and `force` was not given
    pub skipped: bool,
    pub schools_added: u64,
    pub teams_added: u64,
    pub affiliations_added: u64,
    pub participations_added: u64,
}

/// Counts shown after initialization
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatabaseSummary {
    pub schools: i64,
    pub sample_crr_names: Vec<String>,
    pub teams: i64,
    pub teams_by_category: BTreeMap<String, i64>,
    pub affiliations: i64,
    pub affiliations_by_conference: BTreeMap<String, i64>,
    pub participations: i64,
    pub current_participations: i64,
}

impl DatabaseSummary {
    pub fn log(&self) {
        info!("Schools: {} (e.g. {})", self.schools, self.sample_crr_names.join(", "));
        info!("Teams: {}", self.teams);
        for (category, count) in &self.teams_by_category {
            info!("  {}: {}", category, count);
        }
        info!("Conference affiliations: {}", self.affiliations);
        for (conference, count) in &self.affiliations_by_conference {
            info!("  {}: {}", conference, count);
        }
        info!(
            "School participations: {} ({} in the current season)",
            self.participations, self.current_participations
        );
    }
}

/// Remove all school data (results and entries go with it)
async fn clear_existing_data(pool: &SqlitePool) -> Result<()> {
    let mut tx = pool.begin().await?;
    for table in [
        "results",
        "entries",
        "school_participations",
        "conference_affiliations",
        "teams",
        "schools",
    ] {
        let removed = sqlx::query(&format!("DELETE FROM {}", table))
            .execute(&mut *tx)
            .await?
            .rows_affected();
        debug!("Cleared {} row(s) from {}", removed, table);
    }
    tx.commit().await?;
    info!("Cleared existing school data");
    Ok(())
}

/// Seed schools, teams, conferences and current participations
///
/// An already seeded database is left alone unless `force` is set, in which
/// case all school data (and every entry and result) is cleared first.
pub async fn initialize(pool: &SqlitePool, force: bool) -> Result<InitReport> {
    if force {
        clear_existing_data(pool).await?;
    }

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schools")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        info!("Database already has {} schools; use --force to re-seed", existing);
        return Ok(InitReport {
            skipped: true,
            ..InitReport::default()
        });
    }

    let mut report = InitReport::default();
    let mut tx = pool.begin().await?;

    for school in SEED_SCHOOLS {
        let blank_to_null = |s: &'static str| (!s.is_empty()).then_some(s);

        let school_id = sqlx::query(
            "INSERT INTO schools (name, short_name, acronym, crr_name, color) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(school.name)
        .bind(blank_to_null(school.short_name))
        .bind(blank_to_null(school.acronym))
        .bind(school.crr_name)
        .bind(school.color)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();
        report.schools_added += 1;

        for category in school.categories() {
            ensure_team(&mut tx, school_id, category).await?;
            report.teams_added += 1;
        }
    }

    for &(crr_name, conference) in OPENWEIGHT_WOMEN_CONFERENCES {
        let team_id: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT t.team_id FROM teams t
            JOIN schools s ON t.school_id = s.school_id
            WHERE s.crr_name = ? AND t.gender = 'W' AND t.weight = 'OW'
            "#,
        )
        .bind(crr_name)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(team_id) = team_id else {
            debug!("No openweight women's team for '{}'", crr_name);
            continue;
        };

        sqlx::query(
            "INSERT INTO conference_affiliations (team_id, conference, start_date, end_date) VALUES (?, ?, ?, ?)",
        )
        .bind(team_id)
        .bind(conference)
        .bind(SEED_CONFERENCE_START)
        .bind(SEED_CONFERENCE_END)
        .execute(&mut *tx)
        .await?;
        report.affiliations_added += 1;
    }

    tx.commit().await?;

    report.participations_added =
        populate_initial_participations(pool, current_academic_start_year()).await?;

    info!(
        "Seeded {} schools, {} teams, {} conference affiliations, {} participations",
        report.schools_added,
        report.teams_added,
        report.affiliations_added,
        report.participations_added
    );
    Ok(report)
}

/// Row counts for the initializer's closing report
pub async fn summary(pool: &SqlitePool) -> Result<DatabaseSummary> {
    let count = |sql: &'static str| sqlx::query_scalar::<_, i64>(sql).fetch_one(pool);

    let sample_crr_names: Vec<String> =
        sqlx::query_scalar("SELECT crr_name FROM schools ORDER BY crr_name LIMIT 5")
            .fetch_all(pool)
            .await?;

    let team_rows: Vec<(String, String, i64)> = sqlx::query_as(
        "SELECT gender, weight, COUNT(*) FROM teams GROUP BY gender, weight ORDER BY gender, weight",
    )
    .fetch_all(pool)
    .await?;
    let teams_by_category = team_rows
        .into_iter()
        .map(|(gender, weight, n)| {
            let label = TeamCategory::from_codes(&gender, &weight)
                .map(|c| c.to_string())
                .unwrap_or_else(|_| format!("{} {}", gender, weight));
            (label, n)
        })
        .collect();

    let affiliations_by_conference: Vec<(String, i64)> = sqlx::query_as(
        "SELECT conference, COUNT(*) FROM conference_affiliations GROUP BY conference ORDER BY conference",
    )
    .fetch_all(pool)
    .await?;

    let current_start = current_academic_start_year();
    let current_participations: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM school_participations
        WHERE CAST(SUBSTR(start_date, 1, 4) AS INTEGER) = ? AND end_date IS NULL
        "#,
    )
    .bind(current_start)
    .fetch_one(pool)
    .await?;
    debug!("Current season is {}", academic_label(current_start));

    Ok(DatabaseSummary {
        schools: count("SELECT COUNT(*) FROM schools").await?,
        sample_crr_names,
        teams: count("SELECT COUNT(*) FROM teams").await?,
        teams_by_category,
        affiliations: count("SELECT COUNT(*) FROM conference_affiliations").await?,
        affiliations_by_conference: affiliations_by_conference.into_iter().collect(),
        participations: count("SELECT COUNT(*) FROM school_participations").await?,
        current_participations,
    })
}

pub const SEED_SCHOOLS: &[SeedSchool] = &[
    seed("Alabama", "University of Alabama", "Alabama", "", "#9E1B32", [true, false, false, false]),
    seed("Boston College", "Boston College", "", "", "#98002E", [true, false, false, false]),
    seed("Boston University - BU", "Boston University", "BU", "BU", "#CC0000", [true, true, false, true]),
    seed("Brown", "Brown University", "Brown", "", "#8B0000", [true, true, false, false]),
    seed("Bryant", "Bryant University", "Bryant", "", "#002878", [true, false, false, false]),
    seed("Bucknell", "Bucknell University", "Bucknell", "", "#FF7900", [true, false, false, false]),
    seed("California", "University of California - Berkeley", "UC Berkeley", "", "#8B0000", [true, true, false, false]),
    seed("Canisius", "Canisius University", "Canisius", "", "#003DA5", [true, false, false, false]),
    seed("Clemson", "Clemson University", "Clemson", "", "#F66733", [true, false, false, false]),
    seed("Colgate", "Colgate University", "Colgate", "", "#862633", [true, true, false, false]),
    seed("Columbia", "Columbia University", "Columbia", "", "#0073E6", [true, true, true, false]),
    seed("Cornell", "Cornell University", "Cornell", "", "#A31621", [true, true, true, false]),
    seed("Creighton", "Creighton University", "Creighton", "", "#00693E", [true, false, false, false]),
    seed("Dartmouth", "Dartmouth College", "Dartmouth", "", "#1E3A8A", [true, true, true, false]),
    seed("Dayton", "University of Dayton", "Dayton", "", "#C41E3A", [true, false, false, false]),
    seed("Delaware", "University of Delaware", "Delaware", "", "#003DA5", [true, false, false, false]),
    seed("Drake", "Drake University", "Drake", "", "#004B87", [true, false, false, false]),
    seed("Drexel", "Drexel University", "Drexel", "", "#003087", [true, true, false, false]),
    seed("Duke", "Duke University", "Duke", "", "#8A0538", [true, false, false, false]),
    seed("Duquesne", "Duquesne University", "Duquesne", "", "#0047AB", [true, false, false, false]),
    seed("Eastern Michigan", "Eastern Michigan University", "Eastern Michigan", "", "#FF6600", [true, false, false, false]),
    seed("Embry-Riddle", "Embry-Riddle Aeronautical University", "Embry-Riddle", "", "#8B0000", [false, true, false, false]),
    seed("Fairfield", "Fairfield University", "Fairfield", "", "#862633", [true, true, false, false]),
    seed("Florida Tech - FIT", "Florida Institute of Technology", "Florida Tech", "FIT", "#006633", [false, true, false, false]),
    seed("Fordham", "Fordham University", "Fordham", "", "#003DA5", [true, false, false, false]),
    seed("George Mason", "George Mason University", "George Mason", "", "#1E3A8A", [true, false, false, false]),
    seed("George Washington", "George Washington University", "George Washington", "", "#003087", [true, false, false, false]),
    seed("Georgetown", "Georgetown University", "Georgetown", "", "#006747", [true, true, true, true]),
    seed("Gonzaga", "Gonzaga University", "Gonzaga", "", "#002147", [true, true, false, false]),
    seed("Gordon College", "Gordon College", "", "", "#A41034", [false, false, true, true]),
    seed("Harvard", "Harvard University", "Harvard", "", "#A41034", [false, true, true, true]),
    seed("Hobart", "Hobart College", "Hobart", "", "#7B2142", [false, true, false, false]),
    seed("Holy Cross", "College of the Holy Cross", "Holy Cross", "", "#5C0F2E", [true, true, false, false]),
    seed("Indiana", "Indiana University Bloomington", "Indiana", "", "#FF6600", [true, false, false, false]),
    seed("Iona", "Iona University", "Iona", "", "#FF6600", [true, true, false, false]),
    seed("Iowa", "University of Iowa", "Iowa", "", "#002147", [true, false, false, false]),
    seed("Jacksonville", "Jacksonville University", "Jacksonville", "", "#8E44AD", [true, true, false, false]),
    seed("Kansas", "University of Kansas", "Kansas", "", "#FF6600", [true, false, false, false]),
    seed("Kansas State - KSU", "Kansas State University", "Kansas State", "KSU", "#0053A0", [true, false, false, false]),
    seed("La Salle", "La Salle University", "La Salle", "", "#0047AB", [true, true, false, false]),
    seed("Lehigh", "Lehigh University", "Lehigh", "", "#003153", [true, false, false, false]),
    seed("Lewis & Clark", "Lewis & Clark College", "Lewis & Clark", "", "#FF6600", [false, true, false, false]),
    seed("Louisville", "University of Louisville", "Louisville", "", "#002F87", [true, false, false, false]),
    seed("Loyola Maryland", "Loyola University Maryland", "Loyola Maryland", "", "#003DA5", [true, true, false, false]),
    seed("Loyola Marymount", "Loyola Marymount University", "Loyola Marymount", "", "#8B0000", [true, false, false, false]),
    seed("Manhattan", "Manhattan University", "Manhattan", "", "#FF0000", [true, false, false, false]),
    seed("Marist", "Marist College", "Marist", "", "#003DA5", [true, true, false, false]),
    seed("Mercyhurst", "Mercyhurst University", "Mercyhurst", "", "#AD0000", [false, true, true, false]),
    seed("Miami", "University of Miami", "Miami", "", "#8C1D40", [true, false, false, false]),
    seed("Michigan", "University of Michigan", "Michigan", "", "#C41E3A", [true, false, false, false]),
    seed("Michigan State", "Michigan State University", "Michigan State", "MSU", "#0053A0", [true, false, false, false]),
    seed("Minnesota", "University of Minnesota", "Minnesota", "", "#8B0000", [true, false, false, false]),
    seed("MIT", "Massachusetts Institute of Technology", "MIT", "MIT", "#18453B", [true, true, true, true]),
    seed("Monmouth", "Monmouth University", "Monmouth", "", "#CC0000", [true, false, false, false]),
    seed("Navy", "United States Naval Academy", "Navy", "", "#003F87", [true, true, true, false]),
    seed("Northeastern", "Northeastern University", "Northeastern", "", "#BB0000", [true, true, false, false]),
    seed("Notre Dame", "University of Notre Dame", "Notre Dame", "", "#003087", [true, false, false, false]),
    seed("Ohio State", "Ohio State University", "Ohio State", "OSU", "#D21034", [true, false, false, false]),
    seed("Oklahoma", "University of Oklahoma", "Oklahoma", "", "#C41E3A", [true, false, false, false]),
    seed("Oklahoma City", "Oklahoma City University", "Oklahoma City", "OCU", "#FF6600", [false, true, false, false]),
    seed("Old Dominion", "Old Dominion University", "Old Dominion", "", "#002147", [true, false, false, false]),
    seed("Oregon State - OSU", "Oregon State University", "Oregon State", "OSU", "#C8102E", [true, true, false, false]),
    seed("Penn", "University of Pennsylvania", "Penn", "", "#FF6600", [true, true, true, false]),
    seed("Portland", "University of Portland", "Portland", "", "#4B2E83", [true, false, false, false]),
    seed("Princeton", "Princeton University", "Princeton", "", "#FF6600", [true, true, true, true]),
    seed("Radcliff", "Harvard/Radcliff", "Radcliff", "", "#FF6600", [true, false, false, false]),
    seed("Robert Morris", "Robert Morris University", "Robert Morris", "", "#003087", [true, false, false, false]),
    seed("Rollins", "Rollins College", "Rollins", "", "#8B0000", [false, true, false, false]),
    seed("Rutgers", "Rutgers University", "Rutgers", "", "#FF6600", [true, false, false, false]),
    seed("Sacramento State", "California State University - Sacramento", "Sacramento State", "", "#046A38", [true, false, false, false]),
    seed("Sacred Heart", "Sacred Heart University", "Sacred Heart", "", "#CC0000", [true, false, false, false]),
    seed("Saint Joseph's", "Saint Joseph's University", "Saint Joseph's", "", "#003DA5", [true, true, false, false]),
    seed("Saint Mary's", "Saint Mary's College of California", "Saint Mary's", "", "#002147", [true, false, false, false]),
    seed("Santa Clara", "Santa Clara University", "Santa Clara", "", "#001A57", [true, true, false, false]),
    seed("Seattle", "Seattle University", "Seattle", "", "#8B0000", [true, false, false, false]),
    seed("SMU", "Southern Methodist University", "SMU", "SMU", "#003087", [true, false, false, false]),
    seed("Stanford", "Stanford University", "Stanford", "", "#001E3C", [true, true, false, true]),
    seed("Stetson", "Stetson University", "Stetson", "", "#003DA5", [true, true, false, false]),
    seed("Syracuse", "Syracuse University", "Syracuse", "", "#8C1D40", [true, true, false, false]),
    seed("Temple", "Temple University", "Temple", "", "#FF6600", [true, true, false, false]),
    seed("Tennessee", "University of Tennessee", "Tennessee", "", "#C41E3A", [true, false, false, false]),
    seed("Texas", "University of Texas at Austin", "Texas", "", "#8B0000", [true, false, false, false]),
    seed("Tulsa", "University of Tulsa", "Tulsa", "", "#FF6600", [true, false, false, false]),
    seed("UC San Diego", "University of California - San Diego", "UC San Diego", "UCSD", "#003DA5", [true, true, false, false]),
    seed("UCF", "University of Central Florida", "UCF", "UCF", "#002147", [true, false, false, false]),
    seed("UCLA", "University of California - Los Angeles", "UCLA", "UCLA", "#FFCC00", [true, false, false, false]),
    seed("Uconn", "University of Connecticut", "UConn", "UConn", "#001B3A", [true, false, false, false]),
    seed("UMass", "University of Massachusetts - Amherst", "UMass", "", "#FFA500", [true, false, false, false]),
    seed("University of North Carolina - UNC", "University of North Carolina - Chapel Hill", "", "UNC", "#003DA5", [true, false, false, false]),
    seed("University of Rhode Island - URI", "University of Rhode Island", "", "URI", "#003DA5", [true, false, false, false]),
    seed("University of San Diego - USD", "University of San Diego", "San Diego", "USD", "#8B0000", [true, true, false, false]),
    seed("University of Southern California - USC", "University of Southern California", "USC", "USC", "#FF6600", [true, false, false, false]),
    seed("Villanova", "Villanova University", "Villanova", "", "#002F87", [true, false, false, false]),
    seed("Washington - UW", "University of Washington", "Washington", "UW", "#FF6600", [true, true, false, false]),
    seed("Washington State University - WSU", "Washington State University", "Washington State", "WSU", "#C41E3A", [true, false, false, false]),
    seed("West Virginia University - WVU", "West Virginia University", "West Virginia", "WVU", "#981E32", [true, false, false, false]),
    seed("Wisconsin", "University of Wisconsin - Madison", "Wisconsin", "", "#CC0000", [true, true, false, true]),
    seed("Yale", "Yale University", "Yale", "", "#00274C", [true, true, true, false]),
];

pub const OPENWEIGHT_WOMEN_CONFERENCES: &[(&str, &str)] = &[
    ("Boston College", "ACC"),
    ("California", "ACC"),
    ("Clemson", "ACC"),
    ("Duke", "ACC"),
    ("Louisville", "ACC"),
    ("Miami", "ACC"),
    ("University of North Carolina - UNC", "ACC"),
    ("Notre Dame", "ACC"),
    ("SMU", "ACC"),
    ("Stanford", "ACC"),
    ("Syracuse", "ACC"),

    ("Indiana", "Big Ten"),
    ("Iowa", "Big Ten"),
    ("Michigan", "Big Ten"),
    ("Michigan State", "Big Ten"),
    ("Minnesota", "Big Ten"),
    ("Ohio State", "Big Ten"),
    ("Rutgers", "Big Ten"),
    ("UCLA", "Big Ten"),
    ("University of Southern California - USC", "Big Ten"),
    ("Washington - UW", "Big Ten"),
    ("Wisconsin", "Big Ten"),

    ("Alabama", "SEC"),
    ("Oklahoma", "SEC"),
    ("Tennessee", "SEC"),
    ("Texas", "SEC"),

    ("Brown", "Ivy League"),
    ("Columbia", "Ivy League"),
    ("Cornell", "Ivy League"),
    ("Dartmouth", "Ivy League"),
    ("Penn", "Ivy League"),
    ("Princeton", "Ivy League"),
    ("Radcliff", "Ivy League"),
    ("Yale", "Ivy League"),

    ("Creighton", "WCC"),
    ("Gonzaga", "WCC"),
    ("Loyola Marymount", "WCC"),
    ("Oregon State - OSU", "WCC"),
    ("Portland", "WCC"),
    ("Saint Mary's", "WCC"),
    ("University of San Diego - USD", "WCC"),
    ("Santa Clara", "WCC"),
    ("Washington State University - WSU", "WCC"),

    ("Dayton", "A-10"),
    ("Duquesne", "A-10"),
    ("Fordham", "A-10"),
    ("George Mason", "A-10"),
    ("George Washington", "A-10"),
    ("La Salle", "A-10"),
    ("University of Rhode Island - URI", "A-10"),
    ("Saint Joseph's", "A-10"),
    ("UMass", "A-10"),

    ("Boston University - BU", "Patriot League"),
    ("Bucknell", "Patriot League"),
    ("Colgate", "Patriot League"),
    ("Holy Cross", "Patriot League"),
    ("Lehigh", "Patriot League"),
    ("Loyola Maryland", "Patriot League"),
    ("MIT", "Patriot League"),
    ("Navy", "Patriot League"),

    ("Delaware", "CAA"),
    ("Drexel", "CAA"),
    ("Eastern Michigan", "CAA"),
    ("Monmouth", "CAA"),
    ("Northeastern", "CAA"),
    ("UC San Diego", "CAA"),
    ("Uconn", "CAA"),
    ("Villanova", "CAA"),

    ("Canisius", "MAAC"),
    ("Drake", "MAAC"),
    ("Fairfield", "MAAC"),
    ("Iona", "MAAC"),
    ("Jacksonville", "MAAC"),
    ("Manhattan", "MAAC"),
    ("Marist", "MAAC"),
    ("Robert Morris", "MAAC"),
    ("Sacred Heart", "MAAC"),
    ("Stetson", "MAAC"),

    ("Kansas", "Big 12"),
    ("Kansas State - KSU", "Big 12"),
    ("Old Dominion", "Big 12"),
    ("Tulsa", "Big 12"),
    ("UCF", "Big 12"),
    ("West Virginia University - WVU", "Big 12"),

    ("Bryant", "Independent"),
    ("Georgetown", "Independent"),
    ("Sacramento State", "Independent"),
    ("Seattle", "Independent"),
    ("Temple", "Independent"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_seed_names_are_clean_and_unique() {
        let mut seen = HashSet::new();
        for school in SEED_SCHOOLS {
            assert_eq!(school.crr_name, school.crr_name.trim());
            assert!(!school.crr_name.contains("  "), "{}", school.crr_name);
            assert!(!school.name.contains("  "), "{}", school.name);
            assert!(seen.insert(school.crr_name), "duplicate {}", school.crr_name);
        }
        assert!(SEED_SCHOOLS.len() > 90);
    }

    #[test]
    fn test_conference_schools_exist_with_openweight_women() {
        for (crr_name, _) in OPENWEIGHT_WOMEN_CONFERENCES {
            let school = SEED_SCHOOLS
                .iter()
                .find(|s| s.crr_name == *crr_name)
                .unwrap_or_else(|| panic!("{} not seeded", crr_name));
            assert!(
                school.categories().any(|c| c == TeamCategory::OpenweightWomen),
                "{} has no openweight women's team",
                crr_name
            );
        }
    }

    #[test]
    fn test_categories_follow_flags() {
        let harvard = SEED_SCHOOLS.iter().find(|s| s.crr_name == "Harvard").unwrap();
        let categories: Vec<_> = harvard.categories().collect();
        assert_eq!(
            categories,
            vec![
                TeamCategory::HeavyweightMen,
                TeamCategory::LightweightMen,
                TeamCategory::LightweightWomen
            ]
        );
    }
}
