//! Academic seasons and participation-range overlap planning
//!
//! A season `start..end` runs from 1 September of `start` to 31 August of
//! `end`. An open season (`end_year == None`) is the "current" one and has no
//! end date. Two seasons where one ends in the year the other starts are
//! adjacent, not overlapping.
//!
//! Creating a participation season that collides with existing ones is resolved
//! per existing season: replace it, delete it, trim it, or split it around the
//! new range. [`plan_overlap_resolution`] computes the plan without touching the
//! database so it can be previewed before it is applied.

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Stand-in end year for open seasons when comparing ranges
const OPEN_END_YEAR: i32 = 9999;

const MIN_YEAR: i32 = 1900;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeasonError {
    #[error("Season end year {end} must be after start year {start}")]
    EndNotAfterStart { start: i32, end: i32 },

    #[error("Season year {0} is out of range")]
    YearOutOfRange(i32),

    #[error("Invalid season '{0}': expected 'YYYY-YYYY' or 'YYYY - current'")]
    BadDisplay(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Season {
    pub start_year: i32,
    pub end_year: Option<i32>,
}

impl Season {
    pub fn new(start_year: i32, end_year: Option<i32>) -> Result<Self, SeasonError> {
        let season = Season {
            start_year,
            end_year,
        };
        season.validate()?;
        Ok(season)
    }

    pub fn current(start_year: i32) -> Result<Self, SeasonError> {
        Self::new(start_year, None)
    }

    pub fn validate(&self) -> Result<(), SeasonError> {
        if !(MIN_YEAR..OPEN_END_YEAR).contains(&self.start_year) {
            return Err(SeasonError::YearOutOfRange(self.start_year));
        }
        if let Some(end) = self.end_year {
            if end >= OPEN_END_YEAR {
                return Err(SeasonError::YearOutOfRange(end));
            }
            if end <= self.start_year {
                return Err(SeasonError::EndNotAfterStart {
                    start: self.start_year,
                    end,
                });
            }
        }
        Ok(())
    }

    pub fn is_current(&self) -> bool {
        self.end_year.is_none()
    }

    /// "2024 - current" or "2024-2025"
    pub fn display_name(&self) -> String {
        match self.end_year {
            None => format!("{} - current", self.start_year),
            Some(end) => format!("{}-{}", self.start_year, end),
        }
    }

    /// Inverse of [`Season::display_name`]
    pub fn parse_display(text: &str) -> Result<Self, SeasonError> {
        let bad = || SeasonError::BadDisplay(text.to_string());
        let (start, end) = text.split_once('-').ok_or_else(bad)?;
        let start_year = start.trim().parse::<i32>().map_err(|_| bad())?;
        let end = end.trim();
        let end_year = if end.eq_ignore_ascii_case("current") {
            None
        } else {
            Some(end.parse::<i32>().map_err(|_| bad())?)
        };
        Self::new(start_year, end_year)
    }

    /// "YYYY-09-01"
    pub fn start_date(&self) -> String {
        format!("{}-09-01", self.start_year)
    }

    /// "YYYY-08-31", or `None` for the open season
    pub fn end_date(&self) -> Option<String> {
        self.end_year.map(|end| format!("{}-08-31", end))
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

/// Start year of the academic season containing `date`
pub fn academic_start_year(date: NaiveDate) -> i32 {
    if date.month() >= 9 {
        date.year()
    } else {
        date.year() - 1
    }
}

/// Start year of the academic season containing today
pub fn current_academic_start_year() -> i32 {
    academic_start_year(Local::now().date_naive())
}

/// Single-year label used by conference seasons: "2024-2025"
pub fn academic_label(start_year: i32) -> String {
    format!("{}-{}", start_year, start_year + 1)
}

/// How a new season relates to an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverlapKind {
    ExactMatch,
    NoOverlap,
    AdjacentCurrentSeasons,
    AdjacentCurrentToFinite,
    NewContainsExisting,
    ExistingContainsNew,
    OverlapStart,
    OverlapEnd,
}

/// What happens to an existing season when the new one is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Resolution {
    /// Same range; rows are rebuilt from the new season's source
    Replace,
    /// Fully covered by the new season
    Delete,
    /// Rows move to a shorter range
    Trim { to: Season },
    /// Rows are copied to the parts outside the new season
    Split {
        before: Option<Season>,
        after: Option<Season>,
    },
}

impl Resolution {
    /// Ranges the existing season's rows are re-inserted under
    pub fn surviving_ranges(&self) -> Vec<Season> {
        match self {
            Resolution::Replace | Resolution::Delete => Vec::new(),
            Resolution::Trim { to } => vec![*to],
            Resolution::Split { before, after } => before.iter().chain(after.iter()).copied().collect(),
        }
    }
}

/// Classify `new` against `existing`; rules are evaluated in order
pub fn analyze_overlap(new: &Season, existing: &Season) -> OverlapKind {
    if new == existing {
        return OverlapKind::ExactMatch;
    }

    // Ending in the year the other starts is adjacency
    if existing.end_year == Some(new.start_year) || new.end_year == Some(existing.start_year) {
        return OverlapKind::NoOverlap;
    }
    if existing.end_year.is_some_and(|end| new.start_year > end)
        || new.end_year.is_some_and(|end| existing.start_year > end)
    {
        return OverlapKind::NoOverlap;
    }

    if new.start_year == existing.start_year + 1 && existing.is_current() {
        return if new.is_current() {
            OverlapKind::AdjacentCurrentSeasons
        } else {
            OverlapKind::AdjacentCurrentToFinite
        };
    }

    let new_end = new.end_year.unwrap_or(OPEN_END_YEAR);
    let existing_end = existing.end_year.unwrap_or(OPEN_END_YEAR);

    if new.start_year <= existing.start_year && new_end >= existing_end {
        OverlapKind::NewContainsExisting
    } else if existing.start_year <= new.start_year && existing_end >= new_end {
        OverlapKind::ExistingContainsNew
    } else if new.start_year < existing.start_year && new_end >= existing.start_year {
        OverlapKind::OverlapStart
    } else if existing.start_year < new.start_year && new.start_year <= existing_end {
        OverlapKind::OverlapEnd
    } else {
        OverlapKind::NoOverlap
    }
}

/// Resolution for one classified overlap, `None` when there is nothing to do
pub fn resolve_overlap(new: &Season, existing: &Season, kind: OverlapKind) -> Option<Resolution> {
    let keep_until_new = Season {
        start_year: existing.start_year,
        end_year: Some(new.start_year),
    };

    let resolution = match kind {
        OverlapKind::NoOverlap => return None,
        OverlapKind::ExactMatch => Resolution::Replace,
        OverlapKind::NewContainsExisting => Resolution::Delete,
        OverlapKind::AdjacentCurrentSeasons
        | OverlapKind::AdjacentCurrentToFinite
        | OverlapKind::OverlapEnd => Resolution::Trim { to: keep_until_new },
        OverlapKind::ExistingContainsNew => {
            let before = (existing.start_year < new.start_year).then_some(keep_until_new);
            let after = match (new.end_year, existing.end_year) {
                (Some(new_end), Some(existing_end)) if existing_end > new_end => Some(Season {
                    start_year: new_end,
                    end_year: Some(existing_end),
                }),
                _ => None,
            };
            Resolution::Split { before, after }
        }
        OverlapKind::OverlapStart => match new.end_year {
            Some(new_end) => Resolution::Trim {
                to: Season {
                    start_year: new_end,
                    end_year: existing.end_year,
                },
            },
            None => Resolution::Delete,
        },
    };

    Some(resolution)
}

/// One existing season the new season collides with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedOverlap {
    pub existing: Season,
    pub kind: OverlapKind,
    pub resolution: Resolution,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OverlapSummary {
    pub total_affected: usize,
    pub deletes: usize,
    pub trims: usize,
    pub splits: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverlapPlan {
    pub new_season: Season,
    pub overlaps: Vec<PlannedOverlap>,
    pub summary: OverlapSummary,
}

impl OverlapPlan {
    pub fn has_conflicts(&self) -> bool {
        !self.overlaps.is_empty()
    }
}

/// Classify every existing season and decide how each is resolved
pub fn plan_overlap_resolution(new: &Season, existing: &[Season]) -> OverlapPlan {
    let mut overlaps = Vec::new();
    let mut summary = OverlapSummary::default();

    for season in existing {
        let kind = analyze_overlap(new, season);
        let Some(resolution) = resolve_overlap(new, season, kind) else {
            continue;
        };

        match resolution {
            Resolution::Replace | Resolution::Delete => summary.deletes += 1,
            Resolution::Trim { .. } => summary.trims += 1,
            Resolution::Split { .. } => summary.splits += 1,
        }

        overlaps.push(PlannedOverlap {
            existing: *season,
            kind,
            description: describe(season, &resolution),
            resolution,
        });
    }

    summary.total_affected = overlaps.len();

    OverlapPlan {
        new_season: *new,
        overlaps,
        summary,
    }
}

fn describe(existing: &Season, resolution: &Resolution) -> String {
    match resolution {
        Resolution::Replace => format!("Replace '{}' with new season data", existing),
        Resolution::Delete => format!("Delete '{}' (completely replaced)", existing),
        Resolution::Trim { to } => format!("Trim '{}' to '{}'", existing, to),
        Resolution::Split { before, after } => match (before, after) {
            (Some(b), Some(a)) => format!("Split '{}' into '{}' and '{}'", existing, b, a),
            (Some(part), None) | (None, Some(part)) => {
                format!("Split '{}', keeping only '{}'", existing, part)
            }
            (None, None) => format!("Split '{}', no part remains", existing),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(start: i32, end: Option<i32>) -> Season {
        Season::new(start, end).unwrap()
    }

    #[test]
    fn test_display_and_dates() {
        let open = s(2024, None);
        assert_eq!(open.display_name(), "2024 - current");
        assert_eq!(open.start_date(), "2024-09-01");
        assert_eq!(open.end_date(), None);

        let closed = s(2022, Some(2024));
        assert_eq!(closed.display_name(), "2022-2024");
        assert_eq!(closed.end_date().as_deref(), Some("2024-08-31"));
    }

    #[test]
    fn test_parse_display() {
        assert_eq!(Season::parse_display("2024 - current").unwrap(), s(2024, None));
        assert_eq!(Season::parse_display("2022-2024").unwrap(), s(2022, Some(2024)));
        assert!(Season::parse_display("2024").is_err());
        assert!(Season::parse_display("2024-2023").is_err());
        assert!(Season::parse_display("abcd-2025").is_err());
    }

    #[test]
    fn test_validation() {
        assert!(Season::new(2024, Some(2024)).is_err());
        assert!(Season::new(1800, None).is_err());
        assert!(Season::new(2024, Some(9999)).is_err());
    }

    #[test]
    fn test_academic_year() {
        let sept = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
        let aug = NaiveDate::from_ymd_opt(2025, 8, 31).unwrap();
        assert_eq!(academic_start_year(sept), 2024);
        assert_eq!(academic_start_year(aug), 2024);
        assert_eq!(academic_label(2024), "2024-2025");
    }

    #[test]
    fn test_adjacent_ranges_do_not_overlap() {
        assert_eq!(analyze_overlap(&s(2024, None), &s(2020, Some(2024))), OverlapKind::NoOverlap);
        assert_eq!(analyze_overlap(&s(2018, Some(2020)), &s(2020, None)), OverlapKind::NoOverlap);
        assert_eq!(analyze_overlap(&s(2026, Some(2028)), &s(2020, Some(2024))), OverlapKind::NoOverlap);
    }

    #[test]
    fn test_classification() {
        let cases = [
            (s(2024, None), s(2024, None), OverlapKind::ExactMatch),
            (s(2025, None), s(2024, None), OverlapKind::AdjacentCurrentSeasons),
            (s(2025, Some(2026)), s(2024, None), OverlapKind::AdjacentCurrentToFinite),
            (s(2020, Some(2026)), s(2022, Some(2024)), OverlapKind::NewContainsExisting),
            (s(2022, None), s(2024, None), OverlapKind::NewContainsExisting),
            (s(2024, Some(2026)), s(2020, Some(2030)), OverlapKind::ExistingContainsNew),
            (s(2026, None), s(2024, None), OverlapKind::ExistingContainsNew),
            (s(2020, Some(2024)), s(2022, Some(2026)), OverlapKind::OverlapStart),
            (s(2022, Some(2026)), s(2020, Some(2024)), OverlapKind::OverlapEnd),
            (s(2022, None), s(2020, Some(2024)), OverlapKind::OverlapEnd),
        ];
        for (new, existing, expected) in cases {
            assert_eq!(analyze_overlap(&new, &existing), expected, "{} vs {}", new, existing);
        }
    }

    #[test]
    fn test_trim_keeps_ranges_contiguous() {
        let new = s(2025, None);
        let existing = s(2024, None);
        let kind = analyze_overlap(&new, &existing);
        assert_eq!(
            resolve_overlap(&new, &existing, kind),
            Some(Resolution::Trim { to: s(2024, Some(2025)) })
        );

        let new = s(2020, Some(2024));
        let existing = s(2022, None);
        let kind = analyze_overlap(&new, &existing);
        assert_eq!(kind, OverlapKind::OverlapStart);
        assert_eq!(
            resolve_overlap(&new, &existing, kind),
            Some(Resolution::Trim { to: s(2024, None) })
        );
    }

    #[test]
    fn test_split_finite_season() {
        let new = s(2024, Some(2026));
        let existing = s(2020, Some(2030));
        let kind = analyze_overlap(&new, &existing);
        let resolution = resolve_overlap(&new, &existing, kind).unwrap();
        assert_eq!(
            resolution,
            Resolution::Split {
                before: Some(s(2020, Some(2024))),
                after: Some(s(2026, Some(2030))),
            }
        );
        assert_eq!(resolution.surviving_ranges().len(), 2);
    }

    #[test]
    fn test_split_open_season_drops_tail() {
        let new = s(2026, Some(2027));
        let existing = s(2024, None);
        let resolution = resolve_overlap(&new, &existing, analyze_overlap(&new, &existing)).unwrap();
        assert_eq!(
            resolution,
            Resolution::Split {
                before: Some(s(2024, Some(2026))),
                after: None,
            }
        );
    }

    #[test]
    fn test_plan_summary() {
        let new = s(2022, Some(2026));
        let existing = [
            s(2018, Some(2020)),
            s(2020, Some(2023)),
            s(2023, Some(2025)),
            s(2025, Some(2030)),
            s(2022, Some(2026)),
        ];
        let plan = plan_overlap_resolution(&new, &existing);
        assert!(plan.has_conflicts());
        assert_eq!(plan.summary.total_affected, 4);
        assert_eq!(plan.summary.deletes, 2);
        assert_eq!(plan.summary.trims, 2);
        assert_eq!(plan.summary.splits, 0);
        assert_eq!(plan.overlaps[0].description, "Trim '2020-2023' to '2020-2022'");
    }

    #[test]
    fn test_plan_without_conflicts() {
        let plan = plan_overlap_resolution(&s(2025, None), &[s(2020, Some(2025))]);
        assert!(!plan.has_conflicts());
        assert_eq!(plan.summary, OverlapSummary::default());
    }
}
