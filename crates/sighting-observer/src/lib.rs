//! HTTP surface for the sighting feed.
//!
//! This crate provides an Axum server that exposes:
//!
//! - **Ingest endpoint** (`POST /receive`) that validates a sighting and
//!   hands it to the [`Gateway`](sighting_hub::Gateway)
//! - **History endpoint** (`GET /history`) returning every accepted
//!   sighting in arrival order
//! - **Server-Sent Events endpoint** (`GET /stream`) pushing each new
//!   sighting to every connected observer, with periodic keep-alives
//! - **Status endpoints** (`GET /`, `GET /health`)
//!
//! # Architecture
//!
//! Handlers only translate HTTP to calls on the shared [`AppState`]. All
//! coordination (ordering, fan-out, wake-ups) lives in `sighting-hub`.
//! Each `/stream` request owns one
//! [`StreamSession`](sighting_hub::StreamSession); when the client goes
//! away Axum drops the response body, which drops the session and
//! deregisters it from the hub.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod stream;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{start_server, ServerConfig, ServerError};
pub use state::AppState;
