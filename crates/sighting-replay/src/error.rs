//! Error types for the replay client.

/// Errors that stop a replay run.
///
/// Per-row delivery failures are logged and counted, not returned.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// Configuration is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// The dataset could not be read or a row did not match the schema.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// A row's timestamp is outside the representable range.
    #[error("row {row}: timestamp {value} is out of range")]
    Timestamp {
        /// One-based data row number.
        row: usize,
        /// The offending Unix seconds value.
        value: i64,
    },

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}
