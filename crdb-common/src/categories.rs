//! Team categories, boat vocabulary and display formatting
//!
//! A school fields up to four teams, one per (gender, weight) pair. Men row
//! heavyweight or lightweight; women row openweight or lightweight.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Boat types accepted on events (matches the CHECK constraint on `events.boat_type`)
pub const BOAT_TYPES: [&str; 6] = ["8+", "4+", "4x", "2x", "2-", "1x"];

/// Varsity boat classes
pub const EVENT_BOAT_CLASSES: [&str; 5] = ["1V", "2V", "3V", "4V", "5V"];

/// Suggested round names (free text is accepted)
pub const ROUNDS: [&str; 5] = ["Heat", "Semi", "Final", "Time Trial", "Scrimmage"];

pub const DEFAULT_EVENT_DISTANCE: &str = "2k";

/// Maximum characters stored in `entries.notes`
pub const MAX_NOTES_LENGTH: usize = 500;

/// Characters shown in a notes preview before the ellipsis
pub const NOTES_PREVIEW_LENGTH: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Men,
    #[serde(rename = "W")]
    Women,
}

impl Gender {
    pub fn code(self) -> &'static str {
        match self {
            Gender::Men => "M",
            Gender::Women => "W",
        }
    }

    pub fn from_code(code: &str) -> Result<Self> {
        match code {
            "M" => Ok(Gender::Men),
            "W" => Ok(Gender::Women),
            other => Err(Error::InvalidInput(format!("Unknown gender '{}'", other))),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Gender::Men => "Men's",
            Gender::Women => "Women's",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weight {
    #[serde(rename = "LW")]
    Lightweight,
    #[serde(rename = "HW")]
    Heavyweight,
    #[serde(rename = "OW")]
    Openweight,
}

impl Weight {
    pub fn code(self) -> &'static str {
        match self {
            Weight::Lightweight => "LW",
            Weight::Heavyweight => "HW",
            Weight::Openweight => "OW",
        }
    }

    pub fn from_code(code: &str) -> Result<Self> {
        match code {
            "LW" => Ok(Weight::Lightweight),
            "HW" => Ok(Weight::Heavyweight),
            "OW" => Ok(Weight::Openweight),
            other => Err(Error::InvalidInput(format!("Unknown weight class '{}'", other))),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Weight::Lightweight => "Lightweight",
            Weight::Heavyweight => "Heavyweight",
            Weight::Openweight => "Openweight",
        }
    }
}

/// One of the four team types a school can field
///
/// Serialized as the participation flag column name, which doubles as the
/// category identifier in URLs (`openweight_women`, `heavyweight_men`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamCategory {
    OpenweightWomen,
    HeavyweightMen,
    LightweightMen,
    LightweightWomen,
}

impl TeamCategory {
    pub const ALL: [TeamCategory; 4] = [
        TeamCategory::OpenweightWomen,
        TeamCategory::HeavyweightMen,
        TeamCategory::LightweightMen,
        TeamCategory::LightweightWomen,
    ];

    pub fn gender(self) -> Gender {
        match self {
            TeamCategory::OpenweightWomen | TeamCategory::LightweightWomen => Gender::Women,
            TeamCategory::HeavyweightMen | TeamCategory::LightweightMen => Gender::Men,
        }
    }

    pub fn weight(self) -> Weight {
        match self {
            TeamCategory::OpenweightWomen => Weight::Openweight,
            TeamCategory::HeavyweightMen => Weight::Heavyweight,
            TeamCategory::LightweightMen | TeamCategory::LightweightWomen => Weight::Lightweight,
        }
    }

    /// Flag column in `school_participations`
    ///
    /// Only ever one of four fixed identifiers, so it is safe to splice into SQL.
    pub fn column(self) -> &'static str {
        match self {
            TeamCategory::OpenweightWomen => "openweight_women",
            TeamCategory::HeavyweightMen => "heavyweight_men",
            TeamCategory::LightweightMen => "lightweight_men",
            TeamCategory::LightweightWomen => "lightweight_women",
        }
    }

    pub fn from_column(column: &str) -> Result<Self> {
        TeamCategory::ALL
            .into_iter()
            .find(|c| c.column() == column)
            .ok_or_else(|| Error::InvalidInput(format!("Invalid team type: {}", column)))
    }

    /// Validate a (gender, weight) pair
    pub fn from_parts(gender: Gender, weight: Weight) -> Result<Self> {
        match (gender, weight) {
            (Gender::Women, Weight::Openweight) => Ok(TeamCategory::OpenweightWomen),
            (Gender::Women, Weight::Lightweight) => Ok(TeamCategory::LightweightWomen),
            (Gender::Men, Weight::Heavyweight) => Ok(TeamCategory::HeavyweightMen),
            (Gender::Men, Weight::Lightweight) => Ok(TeamCategory::LightweightMen),
            (g, w) => Err(Error::InvalidInput(format!(
                "{} teams cannot row {}",
                g.label(),
                w.label()
            ))),
        }
    }

    /// Parse stored `teams.gender` / `teams.weight` codes
    pub fn from_codes(gender: &str, weight: &str) -> Result<Self> {
        Self::from_parts(Gender::from_code(gender)?, Weight::from_code(weight)?)
    }
}

impl fmt::Display for TeamCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.weight().label(), self.gender().label())
    }
}

/// Validate a boat type against [`BOAT_TYPES`]
pub fn validate_boat_type(boat_type: &str) -> Result<()> {
    if BOAT_TYPES.contains(&boat_type) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "Boat type must be one of {}",
            BOAT_TYPES.join(", ")
        )))
    }
}

/// Validate a boat class against [`EVENT_BOAT_CLASSES`]
pub fn validate_boat_class(boat_class: &str) -> Result<()> {
    if EVENT_BOAT_CLASSES.contains(&boat_class) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "Boat class must be one of {}",
            EVENT_BOAT_CLASSES.join(", ")
        )))
    }
}

/// Truncated notes for list views
pub fn notes_preview(notes: &str) -> String {
    if notes.chars().count() > NOTES_PREVIEW_LENGTH {
        let head: String = notes.chars().take(NOTES_PREVIEW_LENGTH).collect();
        format!("{}...", head)
    } else {
        notes.to_string()
    }
}

/// "Openweight Women's 1V 8+ - Final", plus " at <when>" if scheduled
pub fn format_event_display_name(
    category: TeamCategory,
    event_boat_class: &str,
    boat_type: &str,
    round: &str,
    scheduled_at: Option<&str>,
) -> String {
    let mut name = format!(
        "{} {} {} {} - {}",
        category.weight().label(),
        category.gender().label(),
        event_boat_class,
        boat_type,
        round
    );
    if let Some(when) = scheduled_at.filter(|s| !s.is_empty()) {
        name.push_str(" at ");
        name.push_str(when);
    }
    name
}

/// "Name - (YYYY-MM-DD)" or just the name
pub fn format_regatta_display_name(name: &str, start_date: Option<&str>) -> String {
    match start_date.filter(|s| !s.is_empty()) {
        Some(date) => format!("{} - ({})", name, date),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_pairs() {
        assert_eq!(
            TeamCategory::from_parts(Gender::Women, Weight::Openweight).unwrap(),
            TeamCategory::OpenweightWomen
        );
        assert_eq!(
            TeamCategory::from_codes("M", "LW").unwrap(),
            TeamCategory::LightweightMen
        );
        assert!(TeamCategory::from_parts(Gender::Men, Weight::Openweight).is_err());
        assert!(TeamCategory::from_parts(Gender::Women, Weight::Heavyweight).is_err());
    }

    #[test]
    fn test_column_names_round_trip() {
        for category in TeamCategory::ALL {
            assert_eq!(TeamCategory::from_column(category.column()).unwrap(), category);
        }
        assert!(TeamCategory::from_column("coxswains").is_err());
    }

    #[test]
    fn test_category_serde_matches_column() {
        let json = serde_json::to_string(&TeamCategory::HeavyweightMen).unwrap();
        assert_eq!(json, "\"heavyweight_men\"");
        let gender: Gender = serde_json::from_str("\"W\"").unwrap();
        assert_eq!(gender, Gender::Women);
    }

    #[test]
    fn test_notes_preview() {
        assert_eq!(notes_preview("short"), "short");
        let long = "x".repeat(60);
        let preview = notes_preview(&long);
        assert_eq!(preview.len(), 53);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn test_event_display_name() {
        assert_eq!(
            format_event_display_name(TeamCategory::OpenweightWomen, "1V", "8+", "Final", None),
            "Openweight Women's 1V 8+ - Final"
        );
        assert_eq!(
            format_event_display_name(
                TeamCategory::LightweightMen,
                "2V",
                "4+",
                "Heat",
                Some("2025-04-12 09:30:00")
            ),
            "Lightweight Men's 2V 4+ - Heat at 2025-04-12 09:30:00"
        );
    }

    #[test]
    fn test_regatta_display_name() {
        assert_eq!(
            format_regatta_display_name("Head of the Charles", Some("2024-10-19")),
            "Head of the Charles - (2024-10-19)"
        );
        assert_eq!(format_regatta_display_name("Dual", None), "Dual");
    }

    #[test]
    fn test_boat_validation() {
        assert!(validate_boat_type("8+").is_ok());
        assert!(validate_boat_type("8x").is_err());
        assert!(validate_boat_class("3V").is_ok());
        assert!(validate_boat_class("6V").is_err());
    }
}
