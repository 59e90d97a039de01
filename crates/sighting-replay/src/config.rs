//! Replay configuration loaded from the environment.
//!
//! Optional variables:
//! - `CSV_FILE` -- dataset path (default `data/data.csv`)
//! - `SERVER_URL` -- ingest endpoint (default `http://localhost:8080/receive`)
//! - `REPLAY_SPEED` -- pacing divisor; `2` replays twice as fast (default `1`)

use crate::error::ReplayError;

/// Complete replay configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayConfig {
    /// Path of the CSV dataset.
    pub csv_file: String,
    /// URL sightings are posted to.
    pub server_url: String,
    /// Pacing divisor applied to the gaps between rows.
    pub speed: f64,
}

impl ReplayConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ReplayError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ReplayError> {
        let csv_file = lookup("CSV_FILE").unwrap_or_else(|| "data/data.csv".to_owned());
        let server_url =
            lookup("SERVER_URL").unwrap_or_else(|| "http://localhost:8080/receive".to_owned());

        let speed: f64 = lookup("REPLAY_SPEED")
            .unwrap_or_else(|| "1".to_owned())
            .trim()
            .parse()
            .map_err(|e| ReplayError::Config(format!("invalid REPLAY_SPEED: {e}")))?;
        if !speed.is_finite() || speed <= 0.0 {
            return Err(ReplayError::Config(format!(
                "REPLAY_SPEED must be a positive number, got {speed}"
            )));
        }

        Ok(Self {
            csv_file,
            server_url,
            speed,
        })
    }
}
