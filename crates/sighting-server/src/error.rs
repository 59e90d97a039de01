//! Error types for the server binary.

use sighting_observer::ServerError;

/// Top-level errors from the server binary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// The HTTP server failed to bind or serve.
    #[error(transparent)]
    Server(#[from] ServerError),
}
