//! Per-connection delivery loop.
//!
//! A [`StreamSession`] cycles through four states:
//!
//! ```text
//!            activity                 batch emitted
//! WAITING ------------> DELIVERING ----------------> WAITING
//!    |
//!    | heartbeat timeout         keep-alive emitted
//!    +-----------------> HEARTBEAT ----------------> WAITING
//!
//! any state --(hub closed / connection dropped)--> CLOSED
//! ```
//!
//! Each delivered record gets the next value of the session's own
//! sequence counter, starting at 1. Counters are independent across
//! sessions. Dropping the session (the HTTP layer does so when the peer
//! disconnects) drops its [`Subscription`], which deregisters it from the
//! hub.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use futures::Stream;
use sighting_types::{Delivery, SessionId, Sighting};
use tracing::{debug, error, info};

use crate::hub::Subscription;

/// Default idle period before a keep-alive is emitted.
pub const DEFAULT_HEARTBEAT: Duration = Duration::from_secs(30);

/// Default reconnect hint sent with every delivery.
pub const DEFAULT_RETRY: Duration = Duration::from_millis(3000);

/// Default event type label on deliveries.
pub const DEFAULT_EVENT_NAME: &str = "package";

/// Tunables shared by every stream session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Longest a session waits for data before emitting a keep-alive.
    /// Must be finite so dead connections are noticed.
    pub heartbeat: Duration,
    /// Reconnect delay hint attached to deliveries.
    pub retry: Duration,
    /// Event type label attached to deliveries.
    pub event_name: String,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            heartbeat: DEFAULT_HEARTBEAT,
            retry: DEFAULT_RETRY,
            event_name: DEFAULT_EVENT_NAME.to_owned(),
        }
    }
}

/// Where a session is in its delivery cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Parked until activity or the heartbeat timeout.
    Waiting,
    /// Emitting a drained batch.
    Delivering,
    /// The wait timed out; a keep-alive is due.
    Heartbeat,
    /// Terminal. No further frames are produced.
    Closed,
}

/// One self-contained delivery unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFrame {
    /// Session-local sequence number.
    pub id: u64,
    /// Event type label.
    pub event: String,
    /// Reconnect delay hint.
    pub retry: Duration,
    /// JSON-encoded [`Delivery`].
    pub data: String,
}

/// Output of a [`StreamSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFrame {
    /// A sighting for the observer.
    Delivery(DeliveryFrame),
    /// No data arrived within the heartbeat period.
    KeepAlive,
}

/// Renders a delivery into the frame's data payload.
type Encoder = fn(&Delivery<'_>) -> serde_json::Result<String>;

fn to_json(delivery: &Delivery<'_>) -> serde_json::Result<String> {
    serde_json::to_string(delivery)
}

/// Live delivery loop for one connected observer.
#[derive(Debug)]
pub struct StreamSession {
    subscription: Subscription,
    config: Arc<StreamConfig>,
    state: SessionState,
    sequence: u64,
    backlog: VecDeque<Arc<Sighting>>,
    encoder: Encoder,
}

impl StreamSession {
    /// Start a session on an existing hub subscription.
    pub fn new(subscription: Subscription, config: Arc<StreamConfig>) -> Self {
        info!(session_id = %subscription.id(), "stream session opened");
        Self {
            subscription,
            config,
            state: SessionState::Waiting,
            sequence: 0,
            backlog: VecDeque::new(),
            encoder: to_json,
        }
    }

    /// Identifier used on every log line for this session.
    pub const fn id(&self) -> SessionId {
        self.subscription.id()
    }

    /// Current state.
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Last sequence number handed out (0 before the first delivery).
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Produce the next frame, or `None` once the session is closed.
    ///
    /// Cancel-safe with respect to the hub: dropping the returned future
    /// mid-wait loses nothing for other sessions.
    pub async fn next_frame(&mut self) -> Option<StreamFrame> {
        loop {
            match self.state {
                SessionState::Closed => return None,
                SessionState::Heartbeat => {
                    self.state = SessionState::Waiting;
                    debug!(session_id = %self.id(), "heartbeat");
                    return Some(StreamFrame::KeepAlive);
                }
                SessionState::Delivering => {
                    let Some(record) = self.backlog.pop_front() else {
                        self.state = SessionState::Waiting;
                        continue;
                    };
                    if self.backlog.is_empty() {
                        self.state = SessionState::Waiting;
                    }
                    self.sequence = self.sequence.saturating_add(1);
                    if let Some(frame) = self.encode(&record) {
                        return Some(StreamFrame::Delivery(frame));
                    }
                }
                SessionState::Waiting => {
                    if self.subscription.is_closed() {
                        self.close();
                        continue;
                    }
                    let active = self
                        .subscription
                        .wait_for_activity(self.config.heartbeat)
                        .await;
                    if !active {
                        self.state = SessionState::Heartbeat;
                        continue;
                    }
                    if self.subscription.is_closed() {
                        self.close();
                        continue;
                    }
                    let drained = self.subscription.drain_all();
                    if !drained.is_empty() {
                        self.backlog.extend(drained);
                        self.state = SessionState::Delivering;
                    }
                }
            }
        }
    }

    /// Move to the terminal state, discarding anything not yet emitted.
    pub fn close(&mut self) {
        if self.state != SessionState::Closed {
            self.state = SessionState::Closed;
            self.backlog.clear();
        }
    }

    /// Turn the session into a stream of frames that ends on close.
    pub fn into_stream(self) -> impl Stream<Item = StreamFrame> + Send {
        futures::stream::unfold(self, |mut session| async move {
            let frame = session.next_frame().await?;
            Some((frame, session))
        })
    }

    /// Render one record at the current sequence number.
    ///
    /// A record that fails to serialize is logged and skipped; its
    /// sequence number is not reused.
    fn encode(&self, record: &Sighting) -> Option<DeliveryFrame> {
        let delivery = Delivery {
            sighting: record,
            package_id: self.sequence,
        };
        match (self.encoder)(&delivery) {
            Ok(data) => {
                debug!(
                    session_id = %self.id(),
                    package_id = self.sequence,
                    ip = %record.ip,
                    "sighting sent"
                );
                Some(DeliveryFrame {
                    id: self.sequence,
                    event: self.config.event_name.clone(),
                    retry: self.config.retry,
                    data,
                })
            }
            Err(e) => {
                error!(
                    session_id = %self.id(),
                    package_id = self.sequence,
                    error = %e,
                    "sighting serialization failed, skipping"
                );
                None
            }
        }
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        info!(
            session_id = %self.id(),
            delivered = self.sequence,
            "stream session closed"
        );
    }
}
