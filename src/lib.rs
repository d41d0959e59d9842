//! Turnhall - authoritative, real-time-synchronized turn-based session core.
//!
//! A single source of truth for one session's state, mutated only through
//! validated commands from independently-timed participants and observed
//! by any number of passive subscribers that always see a consistent,
//! monotonically-advancing view.
//!
//! # Architecture
//!
//! - **SessionState**: canonical data (board, roster, turn, history)
//! - **RuleEngine** (`rules`): pure validate / apply / terminal detection
//! - **TurnArbiter**: gates mutation to the acting role, advances the turn
//! - **SessionCoordinator**: the single-writer actor composing the above
//! - **BroadcastHub**: non-blocking event fan-out to observers
//!
//! # Example
//!
//! ```
//! use turnhall::{Command, Role, SessionCoordinator};
//!
//! # fn example() -> anyhow::Result<()> {
//! let session = SessionCoordinator::new();
//! session.assign_participant(Role::X, "agent-1", "Ada")?;
//! session.assign_participant(Role::O, "agent-2", "Grace")?;
//!
//! let _events = session.subscribe();
//! let acting = session.query().turn;
//! let id = session.query().participant(acting).unwrap().id.clone();
//! let result = session.submit(&id, Command::Claim { row: 1, col: 1 })?;
//! assert!(result.accepted);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod arbiter;
mod command;
mod coordinator;
mod error;
mod hub;
mod position;
mod rules;
mod types;

// Crate-level exports - Turn arbitration
pub use arbiter::TurnArbiter;

// Crate-level exports - Commands
pub use command::{Command, CommandResult};

// Crate-level exports - Coordinator
pub use coordinator::{Liveness, LivenessRecord, ParticipantId, SessionCoordinator};

// Crate-level exports - Errors
pub use error::{Reject, SessionError};

// Crate-level exports - Broadcast hub
pub use hub::{BroadcastHub, SessionEvent};

// Crate-level exports - Positions
pub use position::Position;

// Crate-level exports - Rule engine
pub use rules::{apply, detect_terminal, validate};

// Crate-level exports - Session state
pub use types::{
    Board, Cell, MoveRecord, Outcome, Participant, Role, SessionState, SessionStatus,
};
