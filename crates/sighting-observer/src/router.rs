//! Axum router construction.
//!
//! Assembles all routes into a single [`Router`] with CORS middleware
//! enabled so the browser frontend can read history and the stream from
//! another origin.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::stream;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /health` -- health check
/// - `POST /receive` -- ingest one sighting
/// - `GET /history` -- all sightings in arrival order
/// - `GET /stream` -- Server-Sent Events feed
///
/// CORS allows any origin and exposes every response header.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/receive", post(handlers::receive))
        .route("/history", get(handlers::history))
        .route("/stream", get(stream::stream))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
