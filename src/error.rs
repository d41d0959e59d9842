//! Rejection taxonomy and session-level errors.

use crate::position::Position;
use crate::types::Role;
use serde::{Deserialize, Serialize};

/// Why a submitted command was not applied.
///
/// Every variant is recoverable: the session is untouched and the caller
/// may submit again. Validation checks are ordered and non-overlapping,
/// so exactly one reason is ever reported for a given submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
pub enum Reject {
    /// The submitting participant ID has no bound role.
    #[display("Unknown participant")]
    UnknownParticipant,

    /// The session has already ended; only reset can revive it.
    #[display("Session is over")]
    SessionTerminal,

    /// Another role holds the turn.
    #[display("Not your turn. Waiting for player {}", _0)]
    NotYourTurn(Role),

    /// The command's target falls outside the board.
    #[display("Position ({}, {}) is out of bounds", row, col)]
    OutOfBounds {
        /// Submitted row.
        row: u8,
        /// Submitted column.
        col: u8,
    },

    /// The target cell is already claimed.
    #[display("{} is already occupied", _0)]
    PositionOccupied(Position),

    /// Domain rule violation not covered by the structural checks.
    #[display("Illegal command: {}", _0)]
    IllegalCommand(String),
}

impl std::error::Error for Reject {}

/// Errors from coordinator operations outside the command path, plus the
/// single internal-fault case.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum SessionError {
    /// The role already has a participant bound.
    #[display("Role {} is already taken", _0)]
    RoleOccupied(Role),

    /// The participant ID is already bound to the other role.
    #[display("Participant {} is already registered", _0)]
    DuplicateParticipant(String),

    /// A structural invariant failed on a candidate state.
    ///
    /// The only fatal path of a `submit`: the call aborts and the
    /// pre-state stays committed, so observers never see the bad state.
    #[display("Invariant violation: {}", _0)]
    InvariantViolation(String),
}

impl std::error::Error for SessionError {}
