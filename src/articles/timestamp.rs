//! Publication timestamp normalization.
//!
//! Only textual timestamps are considered. Numbers are rejected rather than
//! read as epoch seconds since sources disagree on units.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use std::fmt;

/// A publication timestamp as found in an article, before parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawTimestamp<'a> {
    Text(&'a str),
    /// Present but not a string (number, bool, object, ...).
    NonText,
    Missing,
}

impl<'a> From<Option<&'a Value>> for RawTimestamp<'a> {
    fn from(value: Option<&'a Value>) -> Self {
        match value {
            None | Some(Value::Null) => RawTimestamp::Missing,
            Some(Value::String(s)) => RawTimestamp::Text(s),
            Some(_) => RawTimestamp::NonText,
        }
    }
}

impl<'a> From<Option<&'a str>> for RawTimestamp<'a> {
    fn from(value: Option<&'a str>) -> Self {
        value.map_or(RawTimestamp::Missing, RawTimestamp::Text)
    }
}

/// Why a timestamp could not be turned into an instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unparseable {
    Missing,
    NotAString,
    Empty,
    Malformed,
}

impl fmt::Display for Unparseable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Unparseable::Missing => "missing",
            Unparseable::NotAString => "not a string",
            Unparseable::Empty => "empty",
            Unparseable::Malformed => "malformed",
        };
        f.write_str(s)
    }
}

// Tried in order after RFC 3339 and RFC 2822. `%#z` takes `Z`, `+05`,
// `+0530` and `+05:30`.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%d %H:%M%#z",
    "%Y%m%dT%H%M%S%#z",
];

// Naive formats are taken as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y%m%dT%H%M%S",
    "%Y/%m/%d %H:%M:%S",
    "%a %b %e %H:%M:%S %Y",
    "%b %d, %Y %I:%M %p",
    "%B %d, %Y %I:%M %p",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%d %b %Y"];

/// Normalize a raw timestamp into a UTC instant.
pub fn normalize(raw: RawTimestamp<'_>) -> Result<DateTime<Utc>, Unparseable> {
    match raw {
        RawTimestamp::Missing => Err(Unparseable::Missing),
        RawTimestamp::NonText => Err(Unparseable::NotAString),
        RawTimestamp::Text(text) if text.trim().is_empty() => Err(Unparseable::Empty),
        RawTimestamp::Text(text) => parse_timestamp(text).ok_or(Unparseable::Malformed),
    }
}

/// Parse common machine and human date-time spellings.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.and_utc());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    None
}
