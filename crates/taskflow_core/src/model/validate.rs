//! Field-level validation shared by creation payloads and patches.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static HEX_COLOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("valid hex color regex")
});

const DAY_FORMAT: &str = "%Y-%m-%d";
const REMINDER_TIME_FORMAT: &str = "%H:%M";

/// Validation errors for model payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    /// Task or subtask title is blank after trim.
    BlankTitle,
    /// Project, category or tag name is blank after trim.
    BlankName,
    /// Category icon is blank after trim.
    BlankIcon,
    /// Category reference is blank.
    BlankCategoryId,
    /// Color is not a `#RGB` or `#RRGGBB` hex string.
    InvalidColor(String),
    /// Day is not formatted as `YYYY-MM-DD`.
    InvalidDay(String),
    /// Reminder time is not formatted as `HH:MM`.
    InvalidTime(String),
    /// Timestamp is neither RFC 3339 nor `YYYY-MM-DD`.
    InvalidTimestamp(String),
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "title must not be blank"),
            Self::BlankName => write!(f, "name must not be blank"),
            Self::BlankIcon => write!(f, "icon must not be blank"),
            Self::BlankCategoryId => write!(f, "category id must not be blank"),
            Self::InvalidColor(value) => write!(f, "invalid color `{value}`; expected #RGB or #RRGGBB"),
            Self::InvalidDay(value) => write!(f, "invalid day `{value}`; expected YYYY-MM-DD"),
            Self::InvalidTime(value) => write!(f, "invalid time `{value}`; expected HH:MM"),
            Self::InvalidTimestamp(value) => write!(f, "invalid timestamp `{value}`"),
        }
    }
}

impl Error for ModelValidationError {}

pub(crate) fn require_title(value: &str) -> Result<(), ModelValidationError> {
    if value.trim().is_empty() {
        return Err(ModelValidationError::BlankTitle);
    }
    Ok(())
}

pub(crate) fn require_name(value: &str) -> Result<(), ModelValidationError> {
    if value.trim().is_empty() {
        return Err(ModelValidationError::BlankName);
    }
    Ok(())
}

/// Checks that `value` is a hex color such as `#5D5FEF` or `#000`.
pub fn validate_color(value: &str) -> Result<(), ModelValidationError> {
    if HEX_COLOR_RE.is_match(value) {
        Ok(())
    } else {
        Err(ModelValidationError::InvalidColor(value.to_string()))
    }
}

/// Parses a calendar day in `YYYY-MM-DD` form.
pub fn parse_day(value: &str) -> Result<NaiveDate, ModelValidationError> {
    NaiveDate::parse_from_str(value.trim(), DAY_FORMAT)
        .map_err(|_| ModelValidationError::InvalidDay(value.to_string()))
}

/// Parses a reminder time in 24h `HH:MM` form.
pub fn parse_reminder_time(value: &str) -> Result<NaiveTime, ModelValidationError> {
    NaiveTime::parse_from_str(value.trim(), REMINDER_TIME_FORMAT)
        .map_err(|_| ModelValidationError::InvalidTime(value.to_string()))
}

pub(crate) fn format_reminder_time(value: &NaiveTime) -> String {
    value.format(REMINDER_TIME_FORMAT).to_string()
}

/// Parses an RFC 3339 timestamp, or a bare `YYYY-MM-DD` day as midnight UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, ModelValidationError> {
    let trimmed = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(trimmed, DAY_FORMAT)
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| ModelValidationError::InvalidTimestamp(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn color_accepts_short_and_long_hex() {
        assert!(validate_color("#000").is_ok());
        assert!(validate_color("#5D5FEF").is_ok());
        assert_eq!(
            validate_color("red"),
            Err(ModelValidationError::InvalidColor("red".to_string()))
        );
        assert!(validate_color("#12345").is_err());
    }

    #[test]
    fn timestamp_accepts_bare_day_as_utc_midnight() {
        let parsed = parse_timestamp("2024-01-01").expect("bare day should parse");
        assert_eq!(parsed.year(), 2024);
        assert_eq!(parsed.hour(), 0);

        let offset = parse_timestamp("2024-01-01T09:30:00+02:00").expect("rfc3339 should parse");
        assert_eq!(offset.hour(), 7);

        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn reminder_time_requires_hh_mm() {
        let time = parse_reminder_time(" 08:15 ").expect("HH:MM should parse");
        assert_eq!((time.hour(), time.minute()), (8, 15));
        assert_eq!(format_reminder_time(&time), "08:15");
        assert!(parse_reminder_time("8am").is_err());
    }
}
