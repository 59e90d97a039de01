//! Single entry point for accepted sightings.
//!
//! [`Gateway::accept`] appends to the [`HistoryLog`] and publishes to the
//! [`BroadcastHub`] under one ordering lock. History and every live
//! stream therefore observe records in the same relative order, and a
//! record can never land in one without the other.

use std::sync::{Arc, Mutex};

use sighting_types::{Sighting, SightingPayload, ValidationError};
use tracing::debug;

use crate::history::HistoryLog;
use crate::hub::BroadcastHub;
use crate::lock;
use crate::session::{StreamConfig, StreamSession};

/// Owner of the history log and broadcast hub.
#[derive(Debug, Default)]
pub struct Gateway {
    history: HistoryLog,
    hub: BroadcastHub,
    ordering: Mutex<()>,
}

impl Gateway {
    /// Create a gateway with empty history and no sessions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a payload and accept it.
    ///
    /// A payload that fails validation touches neither history nor the
    /// hub.
    pub fn ingest(&self, payload: SightingPayload) -> Result<Arc<Sighting>, ValidationError> {
        let sighting = Sighting::try_from(payload)?;
        Ok(self.accept(sighting))
    }

    /// Record an already validated sighting and fan it out.
    pub fn accept(&self, sighting: Sighting) -> Arc<Sighting> {
        let record = Arc::new(sighting);
        let sessions = {
            let _ordering = lock(&self.ordering);
            self.history.append(Arc::clone(&record));
            self.hub.publish(&record)
        };
        debug!(ip = %record.ip, sessions, "sighting published");
        record
    }

    /// Open a stream session that sees every record accepted from now on.
    pub fn open_session(&self, config: Arc<StreamConfig>) -> StreamSession {
        StreamSession::new(self.hub.subscribe(), config)
    }

    /// The history log.
    pub const fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// The broadcast hub.
    pub const fn hub(&self) -> &BroadcastHub {
        &self.hub
    }
}
