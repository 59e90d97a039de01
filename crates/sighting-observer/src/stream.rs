//! Server-Sent Events handler for live sightings.
//!
//! Clients connect to `GET /stream` and receive one `package` event per
//! sighting accepted after they connected. Each event carries a
//! per-connection `id`, a `retry` hint, and the sighting as JSON with a
//! `package_id` field. Idle connections get a `: heartbeat` comment every
//! heartbeat period.
//!
//! Clients that need records from before they connected fetch
//! `/history` separately; nothing is backfilled on the stream.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::http::header::{self, HeaderName, HeaderValue};
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use futures::StreamExt as _;
use sighting_hub::StreamFrame;

use crate::state::AppState;

/// Tells reverse proxies such as nginx not to buffer the stream.
const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

/// Open a stream session and serve it as `text/event-stream`.
///
/// # Route
///
/// `GET /stream`
pub async fn stream(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session = state.open_session();
    let events = session
        .into_stream()
        .map(|frame| Ok::<_, Infallible>(to_event(frame)));

    (
        [
            (header::CONNECTION, HeaderValue::from_static("keep-alive")),
            (X_ACCEL_BUFFERING, HeaderValue::from_static("no")),
        ],
        Sse::new(events),
    )
}

/// Map a session frame onto the SSE wire format.
fn to_event(frame: StreamFrame) -> Event {
    match frame {
        StreamFrame::Delivery(delivery) => Event::default()
            .id(delivery.id.to_string())
            .event(delivery.event)
            .retry(delivery.retry)
            .data(delivery.data),
        StreamFrame::KeepAlive => Event::default().comment("heartbeat"),
    }
}
