//! Shared application state for the HTTP server.

use std::sync::Arc;

use sighting_hub::{Gateway, StreamConfig, StreamSession};

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// History log and broadcast hub behind a single ingest entry point.
    pub gateway: Arc<Gateway>,
    /// Tunables handed to every new stream session.
    pub stream_config: Arc<StreamConfig>,
}

impl AppState {
    /// Create state with empty history and default stream settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create state with custom stream settings.
    pub fn with_stream_config(stream_config: StreamConfig) -> Self {
        Self {
            gateway: Arc::new(Gateway::new()),
            stream_config: Arc::new(stream_config),
        }
    }

    /// Register a new stream session with the hub.
    pub fn open_session(&self) -> StreamSession {
        self.gateway.open_session(Arc::clone(&self.stream_config))
    }
}
