//! Paced replay of a recorded dataset.
//!
//! Rows are posted in file order. Before each row after the first, the
//! replayer sleeps for the gap between that row's recorded timestamp and
//! the previous one (never negative, divided by the configured speed),
//! so the server sees sightings arrive as they originally did.

use std::io::Read;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sighting_types::{RawFlag, RawTimestamp, SightingPayload};
use tracing::{error, info};

use crate::error::ReplayError;

/// One dataset row, keyed by the recorded CSV headers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReplayRow {
    /// Origin address.
    #[serde(rename = "ip address")]
    pub ip: String,
    /// Latitude in degrees.
    #[serde(rename = "Latitude")]
    pub latitude: f64,
    /// Longitude in degrees.
    #[serde(rename = "Longitude")]
    pub longitude: f64,
    /// Unix seconds.
    #[serde(rename = "Timestamp")]
    pub timestamp: i64,
    /// Suspicion marker.
    pub suspicious: i64,
}

/// A row with its timestamp resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedRow {
    /// When the sighting was recorded.
    pub observed_at: DateTime<Utc>,
    /// The payload to post.
    pub payload: SightingPayload,
}

impl TimedRow {
    fn from_row(index: usize, row: ReplayRow) -> Result<Self, ReplayError> {
        let observed_at = DateTime::from_timestamp(row.timestamp, 0).ok_or(
            ReplayError::Timestamp {
                row: index.saturating_add(1),
                value: row.timestamp,
            },
        )?;
        let payload = SightingPayload {
            ip: row.ip,
            latitude: row.latitude,
            longitude: row.longitude,
            timestamp: RawTimestamp::Text(observed_at.format("%Y-%m-%d %H:%M:%S").to_string()),
            suspicious: RawFlag::Integer(row.suspicious),
        };
        Ok(Self {
            observed_at,
            payload,
        })
    }
}

/// Read every row of a CSV dataset.
pub fn read_rows<R: Read>(source: R) -> Result<Vec<TimedRow>, ReplayError> {
    csv::Reader::from_reader(source)
        .deserialize::<ReplayRow>()
        .enumerate()
        .map(|(index, row)| TimedRow::from_row(index, row?))
        .collect()
}

/// Sleep owed before posting `next`, given the previous row's timestamp.
///
/// Out-of-order rows are sent immediately.
pub fn pacing_delay(previous: DateTime<Utc>, next: DateTime<Utc>, speed: f64) -> Duration {
    next.signed_duration_since(previous)
        .to_std()
        .map_or(Duration::ZERO, |gap| {
            Duration::try_from_secs_f64(gap.as_secs_f64() / speed).unwrap_or(Duration::MAX)
        })
}

/// Outcome counts of a replay run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Rows the server acknowledged with `200`.
    pub sent: usize,
    /// Rows that were rejected or could not be delivered.
    pub failed: usize,
}

/// Posts rows to the ingest endpoint at their recorded pace.
#[derive(Debug, Clone)]
pub struct Replayer {
    client: reqwest::Client,
    url: String,
    speed: f64,
}

impl Replayer {
    /// Create a replayer for the given endpoint.
    pub fn new(url: String, speed: f64) -> Result<Self, ReplayError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, url, speed })
    }

    /// Replay all rows in order. A failed row is logged and skipped.
    pub async fn run(&self, rows: &[TimedRow]) -> ReplaySummary {
        let mut summary = ReplaySummary::default();
        let mut previous: Option<DateTime<Utc>> = None;

        for row in rows {
            if let Some(prev) = previous {
                let delay = pacing_delay(prev, row.observed_at, self.speed);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            previous = Some(row.observed_at);

            if self.post(&row.payload).await {
                summary.sent = summary.sent.saturating_add(1);
            } else {
                summary.failed = summary.failed.saturating_add(1);
            }
        }

        summary
    }

    async fn post(&self, payload: &SightingPayload) -> bool {
        match self.client.post(&self.url).json(payload).send().await {
            Ok(response) if response.status() == reqwest::StatusCode::OK => {
                info!(ip = %payload.ip, status = %response.status(), "sighting sent");
                true
            }
            Ok(response) => {
                error!(ip = %payload.ip, status = %response.status(), "server rejected sighting");
                false
            }
            Err(e) => {
                error!(ip = %payload.ip, error = %e, "failed to send sighting");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::indexing_slicing)]

    use std::sync::Arc;

    use sighting_observer::state::AppState;

    use super::*;

    const DATASET: &str = "\
ip address,Latitude,Longitude,Timestamp,suspicious
1.2.3.4,10.0,20.0,1700000000,0
5.6.7.8,-33.5,151.25,1700000002,1
9.9.9.9,0,0,1700000001,0
";

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(seconds, 0).unwrap()
    }

    #[test]
    fn rows_become_payloads() {
        let rows = read_rows(DATASET.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].observed_at, at(1_700_000_000));
        assert_eq!(
            rows[0].payload.timestamp,
            RawTimestamp::Text("2023-11-14 22:13:20".to_owned())
        );
        assert_eq!(rows[1].payload.ip, "5.6.7.8");
        assert_eq!(rows[1].payload.suspicious, RawFlag::Integer(1));
    }

    #[test]
    fn malformed_row_is_an_error() {
        let data = "ip address,Latitude,Longitude,Timestamp,suspicious\nx,north,0,1,0\n";
        assert!(matches!(read_rows(data.as_bytes()), Err(ReplayError::Csv(_))));
    }

    #[test]
    fn delay_follows_recorded_gap() {
        assert_eq!(
            pacing_delay(at(100), at(103), 1.0),
            Duration::from_secs(3)
        );
        assert_eq!(
            pacing_delay(at(100), at(104), 2.0),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn backwards_gap_is_clamped_to_zero() {
        assert_eq!(pacing_delay(at(100), at(90), 1.0), Duration::ZERO);
    }

    #[tokio::test]
    async fn replays_rows_into_a_live_server() {
        let state = Arc::new(AppState::new());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = sighting_observer::build_router(Arc::clone(&state));
        tokio::spawn(async move { axum::serve(listener, router).await });

        let rows = read_rows(DATASET.as_bytes()).unwrap();
        let replayer = Replayer::new(format!("http://{addr}/receive"), 1000.0).unwrap();
        let summary = replayer.run(&rows).await;

        assert_eq!(summary, ReplaySummary { sent: 3, failed: 0 });
        let history = state.gateway.history().snapshot();
        let ips: Vec<&str> = history.iter().map(|r| r.ip.as_str()).collect();
        assert_eq!(ips, ["1.2.3.4", "5.6.7.8", "9.9.9.9"]);
    }

    #[tokio::test]
    async fn unreachable_server_counts_failures() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let rows = read_rows(DATASET.as_bytes()).unwrap();
        let replayer = Replayer::new(format!("http://{addr}/receive"), 1000.0).unwrap();
        let summary = replayer.run(&rows).await;

        assert_eq!(summary, ReplaySummary { sent: 0, failed: 3 });
    }
}
