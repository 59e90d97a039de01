//! Fan-out broadcast hub.
//!
//! Every stream session registers a [`Subscription`] holding its own
//! pending buffer and wake signal. [`BroadcastHub::publish`] appends the
//! record to every registered buffer, so each live session sees each
//! record exactly once regardless of how many sessions are attached.
//! Dropping a [`Subscription`] deregisters it.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use sighting_types::{SessionId, Sighting};
use tokio::sync::Notify;
use tracing::debug;

use crate::lock;

/// Per-session pending buffer plus its wake signal.
#[derive(Debug, Default)]
struct Mailbox {
    pending: Mutex<Vec<Arc<Sighting>>>,
    signal: Notify,
    closed: AtomicBool,
}

impl Mailbox {
    fn push(&self, record: Arc<Sighting>) {
        lock(&self.pending).push(record);
        // `notify_one` stores a permit when nobody is waiting, so a record
        // pushed between a drain and the next wait still wakes the session.
        self.signal.notify_one();
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.signal.notify_one();
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

#[derive(Debug, Default)]
struct HubInner {
    sessions: Mutex<BTreeMap<SessionId, Arc<Mailbox>>>,
    closed: AtomicBool,
}

/// Registry of live stream sessions.
///
/// Cheap to clone; clones share the same registry.
#[derive(Debug, Clone, Default)]
pub struct BroadcastHub {
    inner: Arc<HubInner>,
}

impl BroadcastHub {
    /// Create a hub with no sessions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session and return its subscription.
    ///
    /// The session only sees records published after this call. If the
    /// hub is already closed the subscription starts out closed.
    pub fn subscribe(&self) -> Subscription {
        let id = SessionId::new();
        let mailbox = Arc::new(Mailbox::default());
        {
            let mut sessions = lock(&self.inner.sessions);
            // Checked under the registry lock so `close` cannot miss us.
            if self.inner.closed.load(Ordering::Acquire) {
                mailbox.close();
            } else {
                sessions.insert(id, Arc::clone(&mailbox));
            }
        }
        debug!(session_id = %id, "session registered with hub");
        Subscription {
            id,
            mailbox,
            hub: Arc::downgrade(&self.inner),
        }
    }

    /// Queue a record for every registered session and wake them.
    ///
    /// Never blocks on a consumer. Returns the number of sessions the
    /// record was queued for; zero is normal when nobody is watching.
    pub fn publish(&self, record: &Arc<Sighting>) -> usize {
        let sessions = lock(&self.inner.sessions);
        for mailbox in sessions.values() {
            mailbox.push(Arc::clone(record));
        }
        sessions.len()
    }

    /// Close the hub: every session is woken and ends its stream.
    ///
    /// Used on server shutdown so long-lived streams do not hold the
    /// graceful-shutdown drain open. Idempotent.
    pub fn close(&self) {
        let mut sessions = lock(&self.inner.sessions);
        self.inner.closed.store(true, Ordering::Release);
        for mailbox in sessions.values() {
            mailbox.close();
        }
        sessions.clear();
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Number of currently registered sessions.
    pub fn session_count(&self) -> usize {
        lock(&self.inner.sessions).len()
    }
}

/// One session's registration with the [`BroadcastHub`].
///
/// Owns the session's pending buffer. Dropping it removes the session
/// from the hub, after which nothing more is queued for it.
#[derive(Debug)]
pub struct Subscription {
    id: SessionId,
    mailbox: Arc<Mailbox>,
    hub: Weak<HubInner>,
}

impl Subscription {
    /// The session this subscription belongs to.
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Wait until a record is published, the hub closes, or `timeout`
    /// elapses.
    ///
    /// Returns `true` on activity and `false` on timeout. A wake-up can
    /// be spurious (the record may already have been drained), so callers
    /// must tolerate an empty [`drain_all`](Self::drain_all).
    pub async fn wait_for_activity(&self, timeout: Duration) -> bool {
        if self.mailbox.is_closed() {
            return true;
        }
        tokio::time::timeout(timeout, self.mailbox.signal.notified())
            .await
            .is_ok()
    }

    /// Remove and return everything pending for this session, in publish
    /// order.
    pub fn drain_all(&self) -> Vec<Arc<Sighting>> {
        std::mem::take(&mut *lock(&self.mailbox.pending))
    }

    /// Whether the hub has closed this subscription.
    pub fn is_closed(&self) -> bool {
        self.mailbox.is_closed()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            lock(&hub.sessions).remove(&self.id);
        }
        debug!(session_id = %self.id, "session deregistered from hub");
    }
}
