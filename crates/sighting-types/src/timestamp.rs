//! Lenient timestamp parsing and ISO-8601 rendering.
//!
//! Producers send timestamps either as Unix epoch seconds (integer or
//! fractional, bare or quoted) or as a datetime string. Everything is
//! normalised to UTC on the way in. On the way out a timestamp renders as
//! `YYYY-MM-DDTHH:MM:SS`, with a microsecond suffix only when the
//! sub-second part is non-zero.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Epoch values above this magnitude are read as milliseconds.
///
/// `2e10` seconds is the year 2603, so no realistic seconds value
/// crosses it while every millisecond value after 1970-08 does.
const MILLIS_THRESHOLD: u64 = 20_000_000_000;

/// Float form of [`MILLIS_THRESHOLD`].
const MILLIS_THRESHOLD_F64: f64 = 2e10;

/// Largest microsecond count that still fits in an `i64`, rounded down.
const MAX_MICROS_F64: f64 = 9.2e18;

/// Naive layouts tried after RFC 3339, with `T` already substituted for a
/// space separator. Naive values are taken as UTC.
const NAIVE_LAYOUTS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Timestamp exactly as it arrived in an ingest payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    /// Whole Unix seconds (or milliseconds past [`MILLIS_THRESHOLD`]).
    Seconds(i64),
    /// Fractional Unix seconds.
    Fractional(f64),
    /// A datetime string, or a number sent as a string.
    Text(String),
}

impl RawTimestamp {
    /// Resolve the raw value into a UTC instant.
    pub fn resolve(&self) -> Result<DateTime<Utc>, ValidationError> {
        match self {
            Self::Seconds(value) => from_integer(*value),
            Self::Fractional(value) => from_float(*value),
            Self::Text(text) => from_text(text),
        }
    }
}

fn from_integer(value: i64) -> Result<DateTime<Utc>, ValidationError> {
    let parsed = if value.unsigned_abs() > MILLIS_THRESHOLD {
        DateTime::from_timestamp_millis(value)
    } else {
        DateTime::from_timestamp(value, 0)
    };
    parsed.ok_or_else(|| ValidationError::TimestampOutOfRange {
        input: value.to_string(),
    })
}

fn from_float(value: f64) -> Result<DateTime<Utc>, ValidationError> {
    let out_of_range = || ValidationError::TimestampOutOfRange {
        input: value.to_string(),
    };
    if !value.is_finite() {
        return Err(out_of_range());
    }
    let seconds = if value.abs() > MILLIS_THRESHOLD_F64 {
        value / 1000.0
    } else {
        value
    };
    let micros = (seconds * 1_000_000.0).round();
    if micros.abs() >= MAX_MICROS_F64 {
        return Err(out_of_range());
    }
    #[allow(clippy::cast_possible_truncation)] // bounded above
    let micros = micros as i64;
    DateTime::from_timestamp_micros(micros).ok_or_else(out_of_range)
}

fn from_text(text: &str) -> Result<DateTime<Utc>, ValidationError> {
    let trimmed = text.trim();

    if let Ok(value) = trimmed.parse::<i64>() {
        return from_integer(value);
    }
    if let Ok(value) = trimmed.parse::<f64>() {
        return from_float(value);
    }

    let normalized = trimmed.replacen(' ', "T", 1);
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&normalized) {
        return Ok(parsed.with_timezone(&Utc));
    }
    for layout in NAIVE_LAYOUTS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(&normalized, layout) {
            return Ok(parsed.and_utc());
        }
    }
    if let Some(midnight) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc());
    }

    Err(ValidationError::UnparsableTimestamp {
        input: text.to_owned(),
    })
}

/// Render a UTC instant the way history and stream consumers expect it.
pub fn render(value: &DateTime<Utc>) -> String {
    if value.timestamp_subsec_micros() == 0 {
        value.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        value.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

/// `#[serde(with = "...")]` adapter for [`render`]. Serialize only.
pub mod iso8601 {
    use chrono::{DateTime, Utc};
    use serde::Serializer;

    /// Serialize a UTC instant as an ISO-8601 string without offset.
    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::render(value))
    }
}
