//! Lenient parsing for `release_date` request values.
//!
//! Accepted, in order of precedence:
//!
//! - a date-time with an offset (`2018-08-30T21:00:00-03:00`, `...Z`,
//!   `... 21:00:00-0300`), converted to UTC before the offset is dropped
//! - a naive date-time with `T` or a space between date and time, seconds
//!   and fractional seconds optional
//! - a bare date, taken as midnight
//!
//! Responses always serialize the stored naive value as
//! `YYYY-MM-DDTHH:MM:SS[.f]`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses a client-supplied release date. Returns `None` if no accepted
/// form matches.
pub fn parse(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    let with_offset = DateTime::parse_from_rfc3339(raw).ok().or_else(|| {
        OFFSET_FORMATS
            .iter()
            .find_map(|format| DateTime::parse_from_str(raw, format).ok())
    });
    if let Some(with_offset) = with_offset {
        return Some(with_offset.naive_utc());
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|day| day.and_hms_opt(0, 0, 0))
        })
}

/// `deserialize_with` adapter for a required release date.
pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| {
        D::Error::custom(format!(
            "invalid release_date `{}`: expected an ISO 8601 date or date-time",
            raw
        ))
    })
}

/// `deserialize_with` adapter for an update field. Paired with
/// `#[serde(default)]`, an absent key stays `None`; `null` is an error.
pub fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize(deserializer).map(Some)
}
