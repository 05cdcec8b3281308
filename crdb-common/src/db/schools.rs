//! School and team queries
//!
//! The CRR name is the identity operators see everywhere, so it is kept
//! trimmed, non-empty and unique. Every mutation publishes a
//! [`SchoolChange`] after its transaction commits.

use crate::categories::TeamCategory;
use crate::changes::{ChangeBus, SchoolChange};
use crate::db::models::{School, Team};
use crate::season::Season;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use std::str::FromStr;
use tracing::{info, warn};

const SCHOOL_COLUMNS: &str = "school_id, name, short_name, acronym, crr_name, color, updated_at";

/// Fields accepted when adding a school
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewSchool {
    pub name: Option<String>,
    pub crr_name: Option<String>,
    pub short_name: Option<String>,
    pub acronym: Option<String>,
    pub color: Option<String>,
    /// Season display name ("2024 - current"); creates an empty participation row
    pub season: Option<String>,
}

/// Editable school columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchoolField {
    Name,
    ShortName,
    Acronym,
    CrrName,
    Color,
}

impl SchoolField {
    pub fn column(self) -> &'static str {
        match self {
            SchoolField::Name => "name",
            SchoolField::ShortName => "short_name",
            SchoolField::Acronym => "acronym",
            SchoolField::CrrName => "crr_name",
            SchoolField::Color => "color",
        }
    }
}

impl FromStr for SchoolField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "name" => Ok(SchoolField::Name),
            "short_name" => Ok(SchoolField::ShortName),
            "acronym" => Ok(SchoolField::Acronym),
            "crr_name" => Ok(SchoolField::CrrName),
            "color" => Ok(SchoolField::Color),
            other => Err(Error::InvalidInput(format!("Field '{}' is not editable", other))),
        }
    }
}

/// Rows that reference a school, shown before deleting it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchoolUsage {
    pub teams: i64,
    pub conference_affiliations: i64,
    pub school_participations: i64,
    pub entries: i64,
    pub results: i64,
}

impl SchoolUsage {
    pub fn is_unused(&self) -> bool {
        *self == SchoolUsage::default()
    }
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// All schools ordered by CRR name
pub async fn list_schools(pool: &SqlitePool) -> Result<Vec<School>> {
    let schools = sqlx::query_as::<_, School>(&format!(
        "SELECT {} FROM schools ORDER BY crr_name COLLATE NOCASE",
        SCHOOL_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(schools)
}

pub async fn get_school(pool: &SqlitePool, school_id: i64) -> Result<School> {
    sqlx::query_as::<_, School>(&format!(
        "SELECT {} FROM schools WHERE school_id = ?",
        SCHOOL_COLUMNS
    ))
    .bind(school_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound(format!("School {}", school_id)))
}

pub async fn get_school_by_crr_name(pool: &SqlitePool, crr_name: &str) -> Result<School> {
    sqlx::query_as::<_, School>(&format!(
        "SELECT {} FROM schools WHERE crr_name = ?",
        SCHOOL_COLUMNS
    ))
    .bind(crr_name.trim())
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound(format!("School '{}'", crr_name.trim())))
}

async fn crr_name_taken(
    conn: &mut SqliteConnection,
    crr_name: &str,
    except_school_id: Option<i64>,
) -> Result<bool> {
    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM schools WHERE crr_name = ? AND school_id IS NOT ?)",
    )
    .bind(crr_name)
    .bind(except_school_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(taken)
}

/// Add a school
///
/// The CRR name defaults to the name and the name to the CRR name; at least
/// one must be given.
pub async fn add_school(pool: &SqlitePool, changes: &ChangeBus, new: NewSchool) -> Result<School> {
    let crr_name = trimmed(new.crr_name.as_deref())
        .or_else(|| trimmed(new.name.as_deref()))
        .ok_or_else(|| Error::InvalidInput("CRR name is required".to_string()))?;
    let name = trimmed(new.name.as_deref()).unwrap_or_else(|| crr_name.clone());
    let season = new
        .season
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Season::parse_display)
        .transpose()?;

    let mut tx = pool.begin().await?;

    if crr_name_taken(&mut tx, &crr_name, None).await? {
        warn!("Rejected duplicate CRR name '{}'", crr_name);
        return Err(Error::Conflict(format!("CRR name '{}' already exists", crr_name)));
    }

    let school_id = sqlx::query(
        r#"
        INSERT INTO schools (name, short_name, acronym, crr_name, color)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&name)
    .bind(trimmed(new.short_name.as_deref()))
    .bind(trimmed(new.acronym.as_deref()))
    .bind(&crr_name)
    .bind(trimmed(new.color.as_deref()))
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    if let Some(season) = season {
        sqlx::query(
            "INSERT INTO school_participations (school_id, start_date, end_date) VALUES (?, ?, ?)",
        )
        .bind(school_id)
        .bind(season.start_date())
        .bind(season.end_date())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    info!("Added school '{}' (id {})", crr_name, school_id);
    changes.emit(SchoolChange::Created {
        crr_name: crr_name.clone(),
    });

    get_school(pool, school_id).await
}

/// Update one editable column
///
/// Blank optional fields are stored as NULL. The name must stay non-empty;
/// CRR names must also stay unique.
pub async fn update_school_field(
    pool: &SqlitePool,
    changes: &ChangeBus,
    school_id: i64,
    field: SchoolField,
    value: &str,
) -> Result<School> {
    let school = get_school(pool, school_id).await?;
    let value = value.trim();

    let mut tx = pool.begin().await?;

    let stored: Option<String> = match field {
        SchoolField::CrrName => {
            if value.is_empty() {
                warn!("Rejected empty CRR name for school {}", school_id);
                return Err(Error::InvalidInput("CRR name cannot be empty".to_string()));
            }
            if crr_name_taken(&mut tx, value, Some(school_id)).await? {
                warn!("Rejected duplicate CRR name '{}'", value);
                return Err(Error::Conflict(format!("CRR name '{}' already exists", value)));
            }
            Some(value.to_string())
        }
        SchoolField::Name => {
            if value.is_empty() {
                warn!("Rejected empty name for school {}", school_id);
                return Err(Error::InvalidInput("School name cannot be empty".to_string()));
            }
            Some(value.to_string())
        }
        _ => (!value.is_empty()).then(|| value.to_string()),
    };

    sqlx::query(&format!(
        "UPDATE schools SET {} = ? WHERE school_id = ?",
        field.column()
    ))
    .bind(&stored)
    .bind(school_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    let change = match field {
        SchoolField::CrrName if school.crr_name != value => SchoolChange::CrrNameChanged {
            old: school.crr_name.clone(),
            new: value.to_string(),
        },
        _ => SchoolChange::Updated {
            crr_name: if field == SchoolField::CrrName {
                value.to_string()
            } else {
                school.crr_name.clone()
            },
            field: field.column().to_string(),
        },
    };
    info!("Updated {} of school '{}'", field.column(), school.crr_name);
    changes.emit(change);

    get_school(pool, school_id).await
}

/// Delete schools by CRR name, returning how many were removed
///
/// Participation rows are removed explicitly; teams and everything hanging off
/// them go through the foreign-key cascades. Unknown names are skipped.
pub async fn delete_schools(
    pool: &SqlitePool,
    changes: &ChangeBus,
    crr_names: &[String],
) -> Result<u64> {
    let mut tx = pool.begin().await?;
    let mut deleted = Vec::new();

    for crr_name in crr_names {
        let crr_name = crr_name.trim();
        let school_id: Option<i64> =
            sqlx::query_scalar("SELECT school_id FROM schools WHERE crr_name = ?")
                .bind(crr_name)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(school_id) = school_id else {
            warn!("Skipping delete of unknown school '{}'", crr_name);
            continue;
        };

        sqlx::query("DELETE FROM school_participations WHERE school_id = ?")
            .bind(school_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM schools WHERE school_id = ?")
            .bind(school_id)
            .execute(&mut *tx)
            .await?;

        deleted.push(crr_name.to_string());
    }

    tx.commit().await?;

    info!("Deleted {} school(s)", deleted.len());
    let count = deleted.len() as u64;
    for crr_name in deleted {
        changes.emit(SchoolChange::Deleted { crr_name });
    }

    Ok(count)
}

/// Count rows referencing a school
pub async fn crr_name_usage(pool: &SqlitePool, crr_name: &str) -> Result<SchoolUsage> {
    let school = get_school_by_crr_name(pool, crr_name).await?;

    let count = |sql: &'static str| {
        sqlx::query_scalar::<_, i64>(sql)
            .bind(school.school_id)
            .fetch_one(pool)
    };

    Ok(SchoolUsage {
        teams: count("SELECT COUNT(*) FROM teams WHERE school_id = ?").await?,
        conference_affiliations: count(
            "SELECT COUNT(*) FROM conference_affiliations ca \
             JOIN teams t ON ca.team_id = t.team_id WHERE t.school_id = ?",
        )
        .await?,
        school_participations: count(
            "SELECT COUNT(*) FROM school_participations WHERE school_id = ?",
        )
        .await?,
        entries: count(
            "SELECT COUNT(*) FROM entries e JOIN teams t ON e.team_id = t.team_id \
             WHERE t.school_id = ?",
        )
        .await?,
        results: count(
            "SELECT COUNT(*) FROM results r JOIN entries e ON r.entry_id = e.entry_id \
             JOIN teams t ON e.team_id = t.team_id WHERE t.school_id = ?",
        )
        .await?,
    })
}

/// Teams with their school's CRR name, optionally for one category
pub async fn list_teams(pool: &SqlitePool, category: Option<TeamCategory>) -> Result<Vec<Team>> {
    let teams = sqlx::query_as::<_, Team>(
        r#"
        SELECT t.team_id, t.school_id, s.crr_name, t.gender, t.weight
        FROM teams t
        JOIN schools s ON t.school_id = s.school_id
        WHERE ?1 IS NULL OR (t.gender = ?1 AND t.weight = ?2)
        ORDER BY s.crr_name COLLATE NOCASE, t.gender, t.weight
        "#,
    )
    .bind(category.map(|c| c.gender().code()))
    .bind(category.map(|c| c.weight().code()))
    .fetch_all(pool)
    .await?;

    Ok(teams)
}

/// Team id for a school in a category, creating the team if needed
pub async fn ensure_team(
    conn: &mut SqliteConnection,
    school_id: i64,
    category: TeamCategory,
) -> Result<i64> {
    sqlx::query("INSERT OR IGNORE INTO teams (school_id, gender, weight) VALUES (?, ?, ?)")
        .bind(school_id)
        .bind(category.gender().code())
        .bind(category.weight().code())
        .execute(&mut *conn)
        .await?;

    let team_id: i64 = sqlx::query_scalar(
        "SELECT team_id FROM teams WHERE school_id = ? AND gender = ? AND weight = ?",
    )
    .bind(school_id)
    .bind(category.gender().code())
    .bind(category.weight().code())
    .fetch_one(&mut *conn)
    .await?;

    Ok(team_id)
}

/// Team id for a CRR name in a category, if the school fields one
pub async fn find_team_id(
    conn: &mut SqliteConnection,
    crr_name: &str,
    category: TeamCategory,
) -> Result<Option<i64>> {
    let team_id = sqlx::query_scalar(
        r#"
        SELECT t.team_id
        FROM teams t
        JOIN schools s ON t.school_id = s.school_id
        WHERE s.crr_name = ? AND t.gender = ? AND t.weight = ?
        "#,
    )
    .bind(crr_name.trim())
    .bind(category.gender().code())
    .bind(category.weight().code())
    .fetch_optional(&mut *conn)
    .await?;

    Ok(team_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names() {
        assert_eq!("crr_name".parse::<SchoolField>().unwrap(), SchoolField::CrrName);
        assert_eq!(SchoolField::ShortName.column(), "short_name");
        assert!("school_id".parse::<SchoolField>().is_err());
    }

    #[test]
    fn test_trimmed() {
        assert_eq!(trimmed(Some("  Yale ")), Some("Yale".to_string()));
        assert_eq!(trimmed(Some("   ")), None);
        assert_eq!(trimmed(None), None);
    }
}
