//! REST endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/health` | Liveness plus history and session counts |
//! | `POST` | `/receive` | Ingest one sighting |
//! | `GET` | `/history` | Every accepted sighting, oldest first |

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum::Json;
use sighting_types::{Sighting, SightingPayload};
use tracing::{info, warn};

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Acknowledgement returned by `POST /receive`.
#[derive(Debug, serde::Serialize)]
struct ReceiveResponse {
    /// Human-readable message.
    message: &'static str,
}

/// Body of `GET /health`.
#[derive(Debug, serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    sightings: usize,
    sessions: usize,
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing feed status and endpoint links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let sightings = state.gateway.history().len();
    let sessions = state.gateway.hub().session_count();

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Sighting Feed</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
    </style>
</head>
<body>
    <h1>Sighting Feed</h1>

    <div>
        <div class="metric">
            <div class="label">Sightings</div>
            <div class="value">{sightings}</div>
        </div>
        <div class="metric">
            <div class="label">Live streams</div>
            <div class="value">{sessions}</div>
        </div>
    </div>

    <h2>Endpoints</h2>
    <ul>
        <li>POST /receive -- Ingest one sighting</li>
        <li>GET <a href="/history">/history</a> -- All sightings, oldest first</li>
        <li>GET /stream -- Live Server-Sent Events feed</li>
        <li>GET <a href="/health">/health</a> -- Health check</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Report liveness along with the history length and live session count.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        sightings: state.gateway.history().len(),
        sessions: state.gateway.hub().session_count(),
    })
}

// ---------------------------------------------------------------------------
// POST /receive -- ingest
// ---------------------------------------------------------------------------

/// Validate a sighting, append it to history, and fan it out to streams.
///
/// A malformed body (bad JSON, wrong content type, missing or mistyped
/// field, unparsable timestamp) is rejected with `400` and leaves all
/// state untouched.
pub async fn receive(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SightingPayload>, JsonRejection>,
) -> Result<impl IntoResponse, ObserverError> {
    let Json(payload) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "rejected sighting payload");
        ObserverError::MalformedPayload(rejection.body_text())
    })?;

    let record = state.gateway.ingest(payload).inspect_err(|e| {
        warn!(error = %e, "rejected sighting payload");
    })?;

    info!(
        ip = %record.ip,
        latitude = record.latitude,
        longitude = record.longitude,
        timestamp = %record.timestamp,
        suspicious = record.suspicious,
        "sighting received"
    );

    Ok(Json(ReceiveResponse {
        message: "Sighting received",
    }))
}

// ---------------------------------------------------------------------------
// GET /history
// ---------------------------------------------------------------------------

/// Return every accepted sighting in arrival order.
///
/// Serialization works on a detached snapshot, so a large history never
/// holds up ingest.
pub async fn history(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let snapshot = state.gateway.history().snapshot();
    let records: Vec<&Sighting> = snapshot.iter().map(AsRef::as_ref).collect();
    Ok(Json(serde_json::to_value(records)?))
}
