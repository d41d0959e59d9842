//! Session coordinator: the single mutation entry point.
//!
//! Composes the rule engine, the turn arbiter, and the canonical state
//! into one serialized actor. All mutating operations take the state
//! lock for their whole validate-apply-publish sequence, so no two
//! applies ever interleave; reads clone a snapshot under the same lock
//! and never observe a half-applied board.

use crate::arbiter::TurnArbiter;
use crate::command::{Command, CommandResult};
use crate::error::{Reject, SessionError};
use crate::hub::{BroadcastHub, SessionEvent};
use crate::rules;
use crate::types::{Outcome, Participant, Role, SessionState, SessionStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

/// Opaque identifier for a participant.
pub type ParticipantId = String;

/// What a participant is currently doing.
///
/// Best-effort and non-authoritative: set by out-of-band calls that are
/// deliberately uncorrelated with the mutation lock, last write wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Liveness {
    /// Waiting, nothing in flight.
    Idle,
    /// Reasoning about a move.
    Deliberating,
    /// Submitting a command.
    Acting,
}

/// Per-participant liveness record.
///
/// Ephemeral: lives outside `SessionState`, is never snapshotted, and
/// rebuilds from zero on restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessRecord {
    /// Current status.
    pub status: Liveness,
    /// When the status was last written.
    pub last_updated_at: DateTime<Utc>,
}

fn random_first_turn() -> Role {
    if rand::random() { Role::X } else { Role::O }
}

/// The single-writer authority over one session.
///
/// Cloning yields another handle to the same session; every mutating
/// call runs one-at-a-time regardless of how many handles exist.
#[derive(Debug, Clone)]
pub struct SessionCoordinator {
    state: Arc<Mutex<SessionState>>,
    liveness: Arc<Mutex<HashMap<ParticipantId, LivenessRecord>>>,
    hub: BroadcastHub,
}

impl SessionCoordinator {
    /// Creates a coordinator for a fresh pending session with a
    /// randomized first turn.
    #[instrument]
    pub fn new() -> Self {
        let first = random_first_turn();
        info!(first_turn = %first, "Creating session coordinator");
        Self {
            state: Arc::new(Mutex::new(SessionState::new(first))),
            liveness: Arc::new(Mutex::new(HashMap::new())),
            hub: BroadcastHub::new(),
        }
    }

    /// Restores a coordinator from an exported snapshot.
    ///
    /// The snapshot is invariant-checked before it is accepted; liveness
    /// records start empty.
    #[instrument(skip(snapshot))]
    pub fn from_snapshot(snapshot: SessionState) -> Result<Self, SessionError> {
        snapshot.check_invariants()?;
        info!(status = ?snapshot.status, moves = snapshot.move_history.len(), "Restoring session from snapshot");
        Ok(Self {
            state: Arc::new(Mutex::new(snapshot)),
            liveness: Arc::new(Mutex::new(HashMap::new())),
            hub: BroadcastHub::new(),
        })
    }

    /// Binds an identity to a role.
    ///
    /// Once the last seat binds, the session flips from pending to
    /// active and the new state is published.
    #[instrument(skip(self, id, name))]
    pub fn assign_participant(
        &self,
        role: Role,
        id: impl Into<ParticipantId>,
        name: impl Into<String>,
    ) -> Result<SessionState, SessionError> {
        let id = id.into();
        let mut state = self.state.lock().unwrap();

        if state.participant(role).is_some() {
            warn!(%role, "Role already bound");
            return Err(SessionError::RoleOccupied(role));
        }
        if state.role_of(&id).is_some() {
            warn!(participant_id = %id, "Participant already holds a seat");
            return Err(SessionError::DuplicateParticipant(id));
        }

        let participant = Participant::new(id.clone(), name);
        match role {
            Role::X => state.player_x = Some(participant),
            Role::O => state.player_o = Some(participant),
        }

        if state.status == SessionStatus::Pending && state.roster_complete() {
            state.status = SessionStatus::Active;
            info!("All roles bound, session is now active");
        }

        info!(participant_id = %id, %role, status = ?state.status, "Participant assigned");
        let snapshot = state.clone();
        self.hub.publish(SessionEvent::StateChanged(snapshot.clone()));
        Ok(snapshot)
    }

    /// Submits a command on behalf of a participant.
    ///
    /// Resolve, validate, apply, terminal-check, and advance run as one
    /// atomic step under the state lock. Rejections come back inside the
    /// `CommandResult` and publish nothing; the only error path is an
    /// invariant violation on the candidate state, which aborts the
    /// submit and leaves the committed state untouched.
    #[instrument(skip(self))]
    pub fn submit(
        &self,
        participant_id: &str,
        command: Command,
    ) -> Result<CommandResult, SessionError> {
        let mut state = self.state.lock().unwrap();

        let Some(role) = state.role_of(participant_id) else {
            warn!("Unknown participant attempted a command");
            return Ok(CommandResult::rejected(
                Reject::UnknownParticipant,
                state.clone(),
            ));
        };

        if let Err(reason) = rules::validate(&state, role, &command) {
            warn!(%role, %command, %reason, "Command rejected");
            return Ok(CommandResult::rejected(reason, state.clone()));
        }

        let mut next = rules::apply(&state, role, &command, Utc::now());

        let outcome = rules::detect_terminal(&next);
        match outcome {
            Some(o) => {
                next.status = SessionStatus::Terminal;
                next.outcome = Some(o);
                if let Outcome::Winner(winner) = o {
                    match winner {
                        Role::X => {
                            if let Some(p) = next.player_x.as_mut() {
                                p.wins += 1;
                            }
                        }
                        Role::O => {
                            if let Some(p) = next.player_o.as_mut() {
                                p.wins += 1;
                            }
                        }
                    }
                }
            }
            None => TurnArbiter::advance(&mut next),
        }

        // Commit only a state that still satisfies every invariant.
        next.check_invariants()?;
        *state = next;
        let snapshot = state.clone();
        drop(state);

        self.record_liveness(participant_id, Liveness::Idle);
        self.hub.publish(SessionEvent::StateChanged(snapshot.clone()));
        if let Some(o) = outcome {
            info!(%role, %command, outcome = ?o, "Command accepted, session ended");
            self.hub.publish(SessionEvent::SessionEnded(o));
        } else {
            info!(%role, %command, next_turn = %snapshot.turn, "Command accepted");
        }

        Ok(CommandResult::accepted(snapshot, outcome))
    }

    /// Returns a consistent snapshot of the session state.
    #[instrument(skip(self))]
    pub fn query(&self) -> SessionState {
        let state = self.state.lock().unwrap();
        debug!(status = ?state.status, moves = state.move_history.len(), "State queried");
        state.clone()
    }

    /// Exports the snapshot record for an external sink.
    ///
    /// Identical to `query()`; named for the export call sites.
    pub fn export_snapshot(&self) -> SessionState {
        self.query()
    }

    /// Records a participant's liveness and publishes it immediately.
    ///
    /// Unvalidated and last-write-wins; independent of the state lock,
    /// so it never contends with an in-flight submit.
    #[instrument(skip(self))]
    pub fn set_liveness(&self, participant_id: &str, status: Liveness) {
        self.record_liveness(participant_id, status);
        debug!(participant_id, ?status, "Liveness updated");
        self.hub.publish(SessionEvent::LivenessChanged {
            participant_id: participant_id.to_string(),
            liveness: status,
        });
    }

    /// Returns the liveness record for a participant, if one was ever
    /// written.
    pub fn liveness_of(&self, participant_id: &str) -> Option<LivenessRecord> {
        self.liveness.lock().unwrap().get(participant_id).copied()
    }

    /// Returns the session to a fresh board with a re-randomized first
    /// turn.
    ///
    /// Participants and their cumulative win counters are preserved;
    /// board, history, and outcome are zeroed. Status returns to active
    /// when both seats are still bound, pending otherwise.
    #[instrument(skip(self))]
    pub fn reset(&self) -> SessionState {
        let mut state = self.state.lock().unwrap();
        let mut fresh = SessionState::new(random_first_turn());
        fresh.player_x = state.player_x.take();
        fresh.player_o = state.player_o.take();
        if fresh.roster_complete() {
            fresh.status = SessionStatus::Active;
        }
        info!(first_turn = %fresh.turn, status = ?fresh.status, "Session reset");
        *state = fresh;
        let snapshot = state.clone();
        drop(state);
        self.hub.publish(SessionEvent::SessionReset(snapshot.clone()));
        snapshot
    }

    /// Subscribes to the event stream from this point on.
    ///
    /// No backlog is delivered: call `query()` first for the initial
    /// snapshot, then follow the stream for deltas.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.hub.subscribe()
    }

    fn record_liveness(&self, participant_id: &str, status: Liveness) {
        let mut liveness = self.liveness.lock().unwrap();
        liveness.insert(
            participant_id.to_string(),
            LivenessRecord {
                status,
                last_updated_at: Utc::now(),
            },
        );
    }
}

impl Default for SessionCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
