//! Broadcast fan-out of state-change and liveness events.
//!
//! Decoupled from the command path: publishing never blocks, and a slow
//! subscriber lags (dropping its oldest events) without affecting the
//! coordinator or other subscribers.

use crate::coordinator::Liveness;
use crate::types::{Outcome, SessionState};
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Ring capacity per subscriber. A lagging subscriber loses oldest
/// events and re-synchronizes via `query()`.
const CHANNEL_CAPACITY: usize = 64;

/// An event fanned out to observers.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The session state changed; carries the full post-change snapshot.
    StateChanged(SessionState),
    /// A participant's liveness was updated.
    LivenessChanged {
        /// Participant the update is about.
        participant_id: String,
        /// The new liveness status.
        liveness: Liveness,
    },
    /// The session was reset; carries the fresh snapshot.
    SessionReset(SessionState),
    /// The session reached a terminal outcome.
    SessionEnded(Outcome),
}

/// Publish/subscribe hub for session events.
///
/// Fresh subscribers receive no backlog: call `query()` on the
/// coordinator for an initial snapshot, then follow the stream for
/// deltas.
#[derive(Debug, Clone)]
pub struct BroadcastHub {
    tx: broadcast::Sender<SessionEvent>,
}

impl BroadcastHub {
    /// Creates a hub with no subscribers.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Subscribes to the event stream from this point on.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Publishes an event to all current subscribers.
    ///
    /// Infallible from the publisher's view: with zero subscribers the
    /// event is simply dropped.
    pub fn publish(&self, event: SessionEvent) {
        match self.tx.send(event) {
            Ok(n) => trace!(subscribers = n, "Event published"),
            Err(_) => debug!("Event published with no subscribers"),
        }
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}
