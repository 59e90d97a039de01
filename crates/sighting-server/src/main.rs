//! Sighting feed server.
//!
//! Accepts sightings over HTTP, keeps them for the life of the process,
//! and pushes every new one to all connected Server-Sent Events clients.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from the environment
//! 3. Create the shared gateway (history log + broadcast hub)
//! 4. Serve until Ctrl-C, then close live streams and drain

mod config;
mod error;

use std::sync::Arc;

use sighting_observer::state::AppState;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::Settings;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the server fails to
/// bind or serve.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("sighting-server starting");

    // 2. Load configuration.
    let settings = Settings::from_env()?;
    info!(
        host = settings.server.host,
        port = settings.server.port,
        heartbeat_secs = settings.stream.heartbeat.as_secs(),
        retry_ms = settings.stream.retry.as_millis(),
        event_name = settings.stream.event_name,
        "configuration loaded"
    );

    // 3. Shared state.
    let state = Arc::new(AppState::with_stream_config(settings.stream));

    // 4. Serve.
    sighting_observer::start_server(&settings.server, state, shutdown_signal())
        .await
        .map_err(error::AppError::from)?;

    Ok(())
}

/// Resolve when the process receives Ctrl-C.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Ctrl-C received, shutting down"),
        Err(e) => {
            error!(error = %e, "failed to listen for Ctrl-C, serving until killed");
            std::future::pending::<()>().await;
        }
    }
}
