//! Replay client for the sighting feed.
//!
//! Reads a recorded dataset and posts each row to the server's ingest
//! endpoint, sleeping between rows for the gap between their recorded
//! timestamps. This simulates live arrival from historical data.

mod config;
mod error;
mod replay;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::ReplayConfig;
use crate::replay::Replayer;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the dataset cannot be
/// read. Individual delivery failures are logged and do not abort.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config = ReplayConfig::from_env()?;
    info!(
        csv_file = config.csv_file,
        server_url = config.server_url,
        speed = config.speed,
        "configuration loaded"
    );

    let file = std::fs::File::open(&config.csv_file)?;
    let rows = replay::read_rows(file)?;
    info!(rows = rows.len(), "dataset loaded");

    let replayer = Replayer::new(config.server_url, config.speed)?;
    let summary = replayer.run(&rows).await;
    info!(sent = summary.sent, failed = summary.failed, "replay finished");

    Ok(())
}
