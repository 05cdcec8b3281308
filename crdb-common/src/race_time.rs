//! Race time parsing and formatting
//!
//! Operators type finish times as fast as possible, usually as bare digits read
//! off a stopwatch. Digits are assigned by position:
//!
//! | Digit | Meaning            |
//! |-------|--------------------|
//! | 1st   | minutes            |
//! | 2nd   | tens of seconds    |
//! | 3rd   | seconds            |
//! | 4th-6th | milliseconds     |
//! | extra leading digits | tens of minutes |
//!
//! So `"704"` is 7:04.000 and `"11150123"` is 111:50.123. Text that already
//! contains `:` or `.` is first read as a formatted time (`"7:04.123"`,
//! `"404.123"`); if that reading is invalid the digit rule applies instead.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RaceTimeError {
    #[error("No digits found")]
    NoDigits,

    #[error("Seconds must be less than 60")]
    SecondsOutOfRange,

    #[error("Time is too large")]
    TooLarge,
}

/// A finish time split into display components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceTime {
    pub minutes: u32,
    pub seconds: u32,
    pub millis: u32,
}

impl RaceTime {
    pub fn total_seconds(&self) -> f64 {
        f64::from(self.minutes) * 60.0 + f64::from(self.seconds) + f64::from(self.millis) / 1000.0
    }
}

impl fmt::Display for RaceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}.{:03}", self.minutes, self.seconds, self.millis)
    }
}

/// Parse operator input into a race time
pub fn parse_race_time(text: &str) -> Result<RaceTime, RaceTimeError> {
    let text = text.trim();

    if text.contains(':') || text.contains('.') {
        if let Some(time) = parse_formatted(text) {
            return Ok(time);
        }
    }

    parse_digits(text)
}

/// "M:SS[.fff]" or "SSS.fff"; `None` sends the caller to the digit rule
fn parse_formatted(text: &str) -> Option<RaceTime> {
    let (minutes, seconds, millis) = if let Some((min_part, rest)) = text.split_once(':') {
        let minutes = parse_component(min_part)?;
        let sec_part = rest.split_once(':').map_or(rest, |(head, _)| head);
        match sec_part.split_once('.') {
            Some((sec_str, ms_str)) => (minutes, parse_component(sec_str)?, parse_fraction(ms_str)?),
            None => (minutes, parse_component(sec_part)?, 0),
        }
    } else {
        let (sec_str, ms_str) = text.split_once('.')?;
        (0, parse_component(sec_str)?, parse_fraction(ms_str)?)
    };

    if seconds >= 60 {
        return None;
    }

    Some(RaceTime {
        minutes,
        seconds,
        millis,
    })
}

/// Whole-number component; empty reads as zero
fn parse_component(s: &str) -> Option<u32> {
    if s.is_empty() {
        return Some(0);
    }
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Fractional seconds padded or truncated to three digits
fn parse_fraction(s: &str) -> Option<u32> {
    let mut ms: String = s.chars().take(3).collect();
    while ms.len() < 3 {
        ms.push('0');
    }
    parse_component(&ms)
}

fn parse_digits(text: &str) -> Result<RaceTime, RaceTimeError> {
    let digits: Vec<u32> = text.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.is_empty() {
        return Err(RaceTimeError::NoDigits);
    }

    let (extra, core) = if digits.len() <= 6 {
        let mut core = digits;
        core.resize(6, 0);
        (Vec::new(), core)
    } else {
        let split = digits.len() - 6;
        (digits[..split].to_vec(), digits[split..].to_vec())
    };

    let tens_of_minutes = extra.iter().try_fold(0u32, |acc, d| {
        acc.checked_mul(10)
            .and_then(|v| v.checked_add(*d))
            .ok_or(RaceTimeError::TooLarge)
    })?;
    let minutes = tens_of_minutes
        .checked_mul(10)
        .and_then(|v| v.checked_add(core[0]))
        .ok_or(RaceTimeError::TooLarge)?;
    let seconds = core[1] * 10 + core[2];
    let millis = core[3] * 100 + core[4] * 10 + core[5];

    if seconds >= 60 {
        return Err(RaceTimeError::SecondsOutOfRange);
    }

    Ok(RaceTime {
        minutes,
        seconds,
        millis,
    })
}

/// Parse to total seconds, 0.0 when the text is not a time
pub fn time_to_seconds(text: &str) -> f64 {
    parse_race_time(text).map_or(0.0, |t| t.total_seconds())
}

/// "MM:SS.fff", rounded to the millisecond
pub fn format_time_seconds(total_seconds: f64) -> String {
    let total_ms = (total_seconds * 1000.0).round().max(0.0) as u64;
    let minutes = total_ms / 60_000;
    let seconds = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{:02}:{:02}.{:03}", minutes, seconds, millis)
}

/// Margin behind the winner; the winner's row reads "Winner"
pub fn format_margin(margin_seconds: f64, position: Option<i64>) -> String {
    if position == Some(1) {
        "Winner".to_string()
    } else {
        format!("+{}", format_time_seconds(margin_seconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rt(minutes: u32, seconds: u32, millis: u32) -> RaceTime {
        RaceTime {
            minutes,
            seconds,
            millis,
        }
    }

    #[test]
    fn test_digit_positions() {
        assert_eq!(parse_race_time("704").unwrap(), rt(7, 4, 0));
        assert_eq!(parse_race_time("7").unwrap(), rt(7, 0, 0));
        assert_eq!(parse_race_time("645123").unwrap(), rt(6, 45, 123));
        assert_eq!(parse_race_time("1150123").unwrap(), rt(11, 50, 123));
        assert_eq!(parse_race_time("11150123").unwrap(), rt(111, 50, 123));
    }

    #[test]
    fn test_formatted_input() {
        assert_eq!(parse_race_time("7:04.123").unwrap(), rt(7, 4, 123));
        assert_eq!(parse_race_time("7:04").unwrap(), rt(7, 4, 0));
        assert_eq!(parse_race_time("6:58.4").unwrap(), rt(6, 58, 400));
        assert_eq!(parse_race_time("6:58.45678").unwrap(), rt(6, 58, 456));
        assert_eq!(parse_race_time(":45.5").unwrap(), rt(0, 45, 500));
        assert_eq!(parse_race_time("  7:04.1  ").unwrap(), rt(7, 4, 100));
    }

    #[test]
    fn test_formatted_falls_back_to_digits() {
        // 404 seconds is not a valid seconds field, so the digits are re-read
        assert_eq!(parse_race_time("404.123").unwrap(), rt(4, 4, 123));
        assert_eq!(parse_race_time("45.2").unwrap(), rt(0, 45, 200));
        assert_eq!(parse_race_time("7-04").unwrap(), rt(7, 4, 0));
    }

    #[test]
    fn test_rejections() {
        assert_eq!(parse_race_time("").unwrap_err(), RaceTimeError::NoDigits);
        assert_eq!(parse_race_time("abc").unwrap_err(), RaceTimeError::NoDigits);
        assert_eq!(parse_race_time("775").unwrap_err(), RaceTimeError::SecondsOutOfRange);
        assert_eq!(parse_race_time("7:75").unwrap_err(), RaceTimeError::SecondsOutOfRange);
        assert_eq!(
            parse_race_time("99999999999999999").unwrap_err(),
            RaceTimeError::TooLarge
        );
    }

    #[test]
    fn test_total_seconds_and_display() {
        let time = rt(7, 4, 123);
        assert!((time.total_seconds() - 424.123).abs() < 1e-9);
        assert_eq!(time.to_string(), "07:04.123");
        assert_eq!(time_to_seconds("704"), 424.0);
        assert_eq!(time_to_seconds("nope"), 0.0);
    }

    #[test]
    fn test_format_time_seconds() {
        assert_eq!(format_time_seconds(424.123), "07:04.123");
        assert_eq!(format_time_seconds(59.9996), "01:00.000");
        assert_eq!(format_time_seconds(6710.5), "111:50.500");
        assert_eq!(format_time_seconds(0.0), "00:00.000");
    }

    #[test]
    fn test_format_margin() {
        assert_eq!(format_margin(0.0, Some(1)), "Winner");
        assert_eq!(format_margin(3.25, Some(2)), "+00:03.250");
        assert_eq!(format_margin(61.0, None), "+01:01.000");
    }
}
