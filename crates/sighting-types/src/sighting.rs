//! The sighting record and its wire projections.
//!
//! A [`SightingPayload`] is what a producer posts. Converting it into a
//! [`Sighting`] is the whole of ingest validation: every field must be
//! present and well typed, and the timestamp must resolve to an instant.
//! Once built, a [`Sighting`] is never mutated; the hub shares it behind
//! an `Arc`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::timestamp::RawTimestamp;

/// One accepted geolocation sighting.
///
/// Identity is arrival order, not content: two sightings with identical
/// fields are distinct history entries.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Sighting {
    /// Origin identifier of the sighting, usually a network address.
    pub ip: String,
    /// Latitude in degrees. Not range checked.
    pub latitude: f64,
    /// Longitude in degrees. Not range checked.
    pub longitude: f64,
    /// When the sighting happened, rendered as ISO-8601 without offset.
    #[serde(with = "crate::timestamp::iso8601")]
    #[ts(type = "string")]
    pub timestamp: DateTime<Utc>,
    /// Suspicion marker; `0` means clean.
    pub suspicious: i64,
}

/// Suspicion marker as sent by the producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawFlag {
    /// Integer marker, kept as is.
    Integer(i64),
    /// Boolean marker, mapped to `1` / `0`.
    Boolean(bool),
}

impl RawFlag {
    /// The marker as an integer.
    pub const fn value(self) -> i64 {
        match self {
            Self::Integer(value) => value,
            Self::Boolean(true) => 1,
            Self::Boolean(false) => 0,
        }
    }
}

/// Request body of the ingest endpoint.
///
/// Unknown fields are ignored. Missing or mistyped fields fail
/// deserialization, so a malformed body never becomes a [`Sighting`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SightingPayload {
    /// Origin identifier.
    pub ip: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Unix seconds or a datetime string.
    pub timestamp: RawTimestamp,
    /// Integer or boolean suspicion marker.
    pub suspicious: RawFlag,
}

impl TryFrom<SightingPayload> for Sighting {
    type Error = ValidationError;

    fn try_from(payload: SightingPayload) -> Result<Self, Self::Error> {
        Ok(Self {
            timestamp: payload.timestamp.resolve()?,
            ip: payload.ip,
            latitude: payload.latitude,
            longitude: payload.longitude,
            suspicious: payload.suspicious.value(),
        })
    }
}

/// A sighting as pushed to one stream session.
///
/// Serializes to the history record shape plus `package_id`, the
/// session-local delivery sequence number.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Delivery<'a> {
    /// The delivered record.
    #[serde(flatten)]
    pub sighting: &'a Sighting,
    /// Delivery sequence within the receiving session, starting at 1.
    pub package_id: u64,
}
