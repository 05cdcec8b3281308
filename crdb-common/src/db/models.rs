//! Row types shared by the data-access modules

use crate::categories::{format_event_display_name, format_regatta_display_name, TeamCategory};
use crate::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct School {
    pub school_id: i64,
    pub name: String,
    pub short_name: Option<String>,
    pub acronym: Option<String>,
    pub crr_name: String,
    pub color: Option<String>,
    pub updated_at: Option<String>,
}

/// A school's team in one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Team {
    pub team_id: i64,
    pub school_id: i64,
    pub crr_name: String,
    pub gender: String,
    pub weight: String,
}

impl Team {
    pub fn category(&self) -> Result<TeamCategory> {
        TeamCategory::from_codes(&self.gender, &self.weight)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Regatta {
    pub regatta_id: i64,
    pub name: String,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl Regatta {
    pub fn display_name(&self) -> String {
        format_regatta_display_name(&self.name, self.start_date.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    pub event_id: i64,
    pub regatta_id: i64,
    pub boat_type: String,
    pub event_boat_class: String,
    pub gender: String,
    pub weight: String,
    pub round: String,
    pub event_distance: Option<String>,
    pub scheduled_at: Option<String>,
}

impl Event {
    pub fn category(&self) -> Result<TeamCategory> {
        TeamCategory::from_codes(&self.gender, &self.weight)
    }

    pub fn display_name(&self) -> Result<String> {
        Ok(format_event_display_name(
            self.category()?,
            &self.event_boat_class,
            &self.boat_type,
            &self.round,
            self.scheduled_at.as_deref(),
        ))
    }
}

/// Event row joined with its regatta, for cross-regatta listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventListing {
    pub event_id: i64,
    pub regatta_id: i64,
    pub regatta_name: String,
    pub regatta_start_date: Option<String>,
    pub boat_type: String,
    pub event_boat_class: String,
    pub gender: String,
    pub weight: String,
    pub round: String,
    pub scheduled_at: Option<String>,
}

/// Entry joined with its school and (optional) result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EntryWithResult {
    pub entry_id: i64,
    pub team_id: i64,
    pub crr_name: String,
    pub entry_boat_class: Option<String>,
    pub conference_at_time: Option<String>,
    pub seed: Option<i64>,
    pub notes: Option<String>,
    pub lane: Option<i64>,
    pub position: Option<i64>,
    pub elapsed_sec: Option<f64>,
    pub margin_sec: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ConferenceAffiliation {
    pub affiliation_id: i64,
    pub team_id: i64,
    pub conference: String,
    pub start_date: String,
    pub end_date: Option<String>,
}

/// One school's participation flags for a season
///
/// Schools without a row for the season appear with every flag false and
/// `participation_id == None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SchoolParticipation {
    pub school_id: i64,
    pub crr_name: String,
    pub name: String,
    pub participation_id: Option<i64>,
    pub openweight_women: bool,
    pub heavyweight_men: bool,
    pub lightweight_men: bool,
    pub lightweight_women: bool,
}

impl SchoolParticipation {
    pub fn flag(&self, category: TeamCategory) -> bool {
        match category {
            TeamCategory::OpenweightWomen => self.openweight_women,
            TeamCategory::HeavyweightMen => self.heavyweight_men,
            TeamCategory::LightweightMen => self.lightweight_men,
            TeamCategory::LightweightWomen => self.lightweight_women,
        }
    }
}

/// Participation flags keyed by school, as copied between seasons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ParticipationFlags {
    pub school_id: i64,
    pub openweight_women: bool,
    pub heavyweight_men: bool,
    pub lightweight_men: bool,
    pub lightweight_women: bool,
}
