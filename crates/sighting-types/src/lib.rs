//! Shared type definitions for the sighting feed.
//!
//! This crate is the single source of truth for the record that flows
//! from the ingest endpoint through the history log and out over live
//! streams. The record shape is exported to `TypeScript` via `ts-rs` for
//! the globe frontend.
//!
//! # Modules
//!
//! - [`ids`] -- Session identifier assigned to every stream connection
//! - [`sighting`] -- The accepted [`Sighting`] record, its ingest payload,
//!   and the per-session [`Delivery`] projection
//! - [`timestamp`] -- Lenient timestamp parsing and ISO-8601 rendering
//! - [`error`] -- Validation failures raised while accepting a payload

pub mod error;
pub mod ids;
pub mod sighting;
pub mod timestamp;

pub use error::ValidationError;
pub use ids::SessionId;
pub use sighting::{Delivery, RawFlag, Sighting, SightingPayload};
pub use timestamp::RawTimestamp;
