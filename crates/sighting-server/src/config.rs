//! Server configuration loaded from the environment.
//!
//! Every variable is optional:
//!
//! - `HOST` -- bind address (default `0.0.0.0`)
//! - `PORT` -- TCP port (default `8080`)
//! - `HEARTBEAT_SECS` -- idle seconds before a stream keep-alive (default `30`)
//! - `RETRY_MS` -- reconnect hint sent with each event (default `3000`)
//! - `STREAM_EVENT_NAME` -- SSE event type for sightings (default `package`)

use std::time::Duration;

use sighting_hub::session::{DEFAULT_EVENT_NAME, DEFAULT_HEARTBEAT, DEFAULT_RETRY};
use sighting_hub::StreamConfig;
use sighting_observer::ServerConfig;

use crate::error::AppError;

/// Complete server configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Where to listen.
    pub server: ServerConfig,
    /// Stream session tunables.
    pub stream: StreamConfig,
}

impl Settings {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = ServerConfig::default();
        let host = lookup("HOST").unwrap_or(defaults.host);
        let port = parse_or(&lookup, "PORT", defaults.port)?;

        let heartbeat_secs = parse_or(&lookup, "HEARTBEAT_SECS", DEFAULT_HEARTBEAT.as_secs())?;
        if heartbeat_secs == 0 {
            return Err(AppError::Config(
                "HEARTBEAT_SECS must be at least 1".to_owned(),
            ));
        }

        let retry_ms = parse_or(
            &lookup,
            "RETRY_MS",
            u64::try_from(DEFAULT_RETRY.as_millis()).unwrap_or(3000),
        )?;

        let event_name =
            lookup("STREAM_EVENT_NAME").unwrap_or_else(|| DEFAULT_EVENT_NAME.to_owned());
        if event_name.is_empty() || event_name.contains(['\n', '\r']) {
            return Err(AppError::Config(format!(
                "invalid STREAM_EVENT_NAME: {event_name:?}"
            )));
        }

        Ok(Self {
            server: ServerConfig { host, port },
            stream: StreamConfig {
                heartbeat: Duration::from_secs(heartbeat_secs),
                retry: Duration::from_millis(retry_ms),
                event_name,
            },
        })
    }
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_or<T>(lookup: impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(name).map_or(Ok(default), |raw| {
        raw.trim()
            .parse()
            .map_err(|e| AppError::Config(format!("invalid {name}: {e}")))
    })
}
