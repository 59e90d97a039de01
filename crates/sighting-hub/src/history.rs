//! Append-only history of accepted sightings.

use std::sync::{Arc, Mutex};

use sighting_types::Sighting;

use crate::lock;

/// Ordered store of every sighting accepted since process start.
///
/// Insertion order is the only ordering. There is no deduplication and
/// no upper bound; the log is cleared only by restarting the process.
#[derive(Debug, Default)]
pub struct HistoryLog {
    records: Mutex<Vec<Arc<Sighting>>>,
}

impl HistoryLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record to the end of the log.
    pub fn append(&self, record: Arc<Sighting>) {
        lock(&self.records).push(record);
    }

    /// Copy of the full log at the moment of the call.
    ///
    /// The lock is released before returning, so callers can serialize
    /// the result at leisure without stalling ingest.
    pub fn snapshot(&self) -> Vec<Arc<Sighting>> {
        lock(&self.records).clone()
    }

    /// Number of records accepted so far.
    pub fn len(&self) -> usize {
        lock(&self.records).len()
    }

    /// Whether nothing has been accepted yet.
    pub fn is_empty(&self) -> bool {
        lock(&self.records).is_empty()
    }
}
