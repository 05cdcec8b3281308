//! Event start-time parsing
//!
//! Accepts "9:30", "930", "1430", "9", "9:30pm", "noon", "midnight" and
//! normalizes to 24-hour "HH:MM".

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleTimeError {
    #[error("Invalid time format. Use HH:MM or H:MM")]
    BadColonFormat,

    #[error("Hours must be 0-23, minutes 0-59")]
    OutOfRange,

    #[error("Invalid time format. Examples: 9:30, 1430, 9:30AM, noon")]
    Unrecognized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

/// Normalize a start time to "HH:MM"; blank input means no time
pub fn parse_schedule_time(text: &str) -> Result<Option<String>, ScheduleTimeError> {
    let upper = text.trim().to_uppercase();
    if upper.is_empty() {
        return Ok(None);
    }

    let (body, meridiem) = if let Some(rest) = upper.strip_suffix("AM") {
        (rest.trim(), Some(Meridiem::Am))
    } else if let Some(rest) = upper.strip_suffix("PM") {
        (rest.trim(), Some(Meridiem::Pm))
    } else {
        (upper.as_str(), None)
    };

    if body.contains(':') {
        let mut parts = body.split(':');
        let hours = parts
            .next()
            .and_then(|h| h.trim().parse::<u32>().ok())
            .ok_or(ScheduleTimeError::BadColonFormat)?;
        let minutes = match parts.next() {
            Some(m) => m
                .trim()
                .parse::<u32>()
                .map_err(|_| ScheduleTimeError::BadColonFormat)?,
            None => 0,
        };
        // Range failures in colon form report the format hint
        return normalize(hours, minutes, meridiem)
            .map(Some)
            .map_err(|_| ScheduleTimeError::BadColonFormat);
    }

    if !body.is_empty() && body.bytes().all(|b| b.is_ascii_digit()) {
        let (hours, minutes) = match body.len() {
            1 | 2 => (body, "0"),
            3 => body.split_at(1),
            4 => body.split_at(2),
            _ => return Err(ScheduleTimeError::Unrecognized),
        };
        let hours = hours.parse::<u32>().map_err(|_| ScheduleTimeError::Unrecognized)?;
        let minutes = minutes.parse::<u32>().map_err(|_| ScheduleTimeError::Unrecognized)?;
        return normalize(hours, minutes, meridiem).map(Some);
    }

    let lower = body.to_lowercase();
    if lower.contains("noon") {
        return Ok(Some("12:00".to_string()));
    }
    if lower.contains("midnight") {
        return Ok(Some("00:00".to_string()));
    }

    Err(ScheduleTimeError::Unrecognized)
}

fn normalize(
    mut hours: u32,
    minutes: u32,
    meridiem: Option<Meridiem>,
) -> Result<String, ScheduleTimeError> {
    match meridiem {
        Some(Meridiem::Pm) if hours != 12 => hours += 12,
        Some(Meridiem::Am) if hours == 12 => hours = 0,
        _ => {}
    }

    if hours > 23 || minutes > 59 {
        return Err(ScheduleTimeError::OutOfRange);
    }

    Ok(format!("{:02}:{:02}", hours, minutes))
}

/// Stored `events.scheduled_at` value: "YYYY-MM-DD HH:MM:00"
pub fn scheduled_at(date: NaiveDate, hhmm: &str) -> String {
    format!("{} {}:00", date.format("%Y-%m-%d"), hhmm)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> String {
        parse_schedule_time(text).unwrap().unwrap()
    }

    #[test]
    fn test_digit_forms() {
        assert_eq!(parse("9"), "09:00");
        assert_eq!(parse("14"), "14:00");
        assert_eq!(parse("930"), "09:30");
        assert_eq!(parse("1430"), "14:30");
        assert_eq!(parse("0000"), "00:00");
    }

    #[test]
    fn test_colon_forms() {
        assert_eq!(parse("9:30"), "09:30");
        assert_eq!(parse("14:05"), "14:05");
        assert_eq!(parse(" 7 : 45 "), "07:45");
        assert_eq!(parse_schedule_time("7:").unwrap_err(), ScheduleTimeError::BadColonFormat);
    }

    #[test]
    fn test_meridiem() {
        assert_eq!(parse("9:30pm"), "21:30");
        assert_eq!(parse("9:30 AM"), "09:30");
        assert_eq!(parse("12PM"), "12:00");
        assert_eq!(parse("12am"), "00:00");
        assert_eq!(parse("1230am"), "00:30");
    }

    #[test]
    fn test_words() {
        assert_eq!(parse("noon"), "12:00");
        assert_eq!(parse("Midnight"), "00:00");
    }

    #[test]
    fn test_blank_is_none() {
        assert_eq!(parse_schedule_time("   ").unwrap(), None);
    }

    #[test]
    fn test_rejections() {
        assert_eq!(parse_schedule_time("24").unwrap_err(), ScheduleTimeError::OutOfRange);
        assert_eq!(parse_schedule_time("960").unwrap_err(), ScheduleTimeError::OutOfRange);
        assert_eq!(parse_schedule_time("13pm").unwrap_err(), ScheduleTimeError::OutOfRange);
        assert_eq!(parse_schedule_time("12345").unwrap_err(), ScheduleTimeError::Unrecognized);
        assert_eq!(parse_schedule_time("25:00").unwrap_err(), ScheduleTimeError::BadColonFormat);
        assert_eq!(parse_schedule_time("a:30").unwrap_err(), ScheduleTimeError::BadColonFormat);
        assert_eq!(parse_schedule_time("soon").unwrap_err(), ScheduleTimeError::Unrecognized);
    }

    #[test]
    fn test_scheduled_at() {
        let date = NaiveDate::from_ymd_opt(2025, 4, 12).unwrap();
        assert_eq!(scheduled_at(date, "09:30"), "2025-04-12 09:30:00");
    }
}
