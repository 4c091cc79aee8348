//! Calendar-date handling.
//!
//! Expiration dates are plain calendar dates with no time-of-day and no
//! timezone. Inputs that carry a time component are truncated to their date
//! part, so `2025-03-01T23:30:00-05:00` is stored and compared as `2025-03-01`.

use chrono::NaiveDate;

use crate::error::{DomainError, DomainResult};

/// Wire format for calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` date, discarding any time component that follows.
pub fn parse_calendar_date(raw: &str) -> DomainResult<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed
        .split(|c: char| c == 'T' || c == ' ')
        .next()
        .unwrap_or_default();

    NaiveDate::parse_from_str(date_part, DATE_FORMAT)
        .map_err(|e| DomainError::validation(format!("invalid date '{trimmed}': {e}")))
}

/// Parse an optional date where an empty string means "no date".
pub fn parse_optional_calendar_date(raw: Option<&str>) -> DomainResult<Option<NaiveDate>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_calendar_date(s).map(Some),
    }
}

/// Format a date as `YYYY-MM-DD`.
pub fn format_calendar_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Serde adapter for `Option<NaiveDate>` fields exchanged as `YYYY-MM-DD`
/// strings (time components are truncated on input, `null`/`""` mean none).
pub mod serde_opt {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(d) => serializer.serialize_str(&super::format_calendar_date(*d)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        super::parse_optional_calendar_date(raw.as_deref()).map_err(serde::de::Error::custom)
    }
}
