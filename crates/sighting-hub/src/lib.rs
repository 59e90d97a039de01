//! Ingestion, retention, and real-time fan-out for sightings.
//!
//! This crate is transport-agnostic. It owns the shared state that the
//! HTTP layer drives:
//!
//! - [`HistoryLog`] -- append-only record of every accepted sighting,
//!   served as snapshots
//! - [`BroadcastHub`] -- registry of live sessions, each with its own
//!   pending buffer and wake signal
//! - [`StreamSession`] -- per-connection delivery loop producing
//!   [`StreamFrame`]s (deliveries and keep-alives)
//! - [`Gateway`] -- the single entry point that appends to history and
//!   publishes to the hub as one ordered step
//!
//! # Concurrency
//!
//! Every lock in this crate is a [`std::sync::Mutex`] held only for a
//! push, drain, or copy. No lock is ever held across an `.await`. The
//! only suspension point is [`Subscription::wait_for_activity`], which
//! parks one session on its own [`tokio::sync::Notify`] without
//! affecting producers or other sessions.

pub mod gateway;
pub mod history;
pub mod hub;
pub mod session;

pub use gateway::Gateway;
pub use history::HistoryLog;
pub use hub::{BroadcastHub, Subscription};
pub use session::{DeliveryFrame, SessionState, StreamConfig, StreamFrame, StreamSession};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the guard if a previous holder panicked.
///
/// Every critical section in this crate is a single push, drain, or copy,
/// so the protected data is consistent even after a poisoning panic.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
