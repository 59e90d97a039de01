//! Validation errors for incoming sighting payloads.

/// Reasons an ingest payload is rejected before it reaches the history log.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The timestamp text matched none of the accepted formats.
    #[error("invalid timestamp {input:?}: expected Unix seconds or an ISO-8601 datetime")]
    UnparsableTimestamp {
        /// The rejected input, as received.
        input: String,
    },

    /// The timestamp was numeric but outside the representable range.
    #[error("timestamp {input} is out of range")]
    TimestampOutOfRange {
        /// The rejected input, rendered as text.
        input: String,
    },
}
