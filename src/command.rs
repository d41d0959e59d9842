//! First-class command types.
//!
//! Commands are domain events, not side effects: they carry a
//! participant's intent and can be validated, logged, and replayed
//! independently of execution.

use crate::error::Reject;
use crate::types::{Outcome, SessionState};
use serde::{Deserialize, Serialize};

/// A proposed mutation submitted by a participant.
///
/// A closed variant type: the rule engine matches on it exhaustively, so
/// adding a command kind is a compile-time-checked change rather than a
/// string comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Command {
    /// Claim the cell at the given coordinates.
    ///
    /// Coordinates are raw `u8`s on purpose: bounds live in validation,
    /// so a malformed target is a rejection, not a panic.
    Claim {
        /// Row (0-2).
        row: u8,
        /// Column (0-2).
        col: u8,
    },
    /// Give up the turn without touching the board.
    ///
    /// The designated command for externally-owned turn-expiry policies:
    /// a supervisor submits it on a stalled participant's behalf and it
    /// goes through the same atomic path as any other command.
    Pass,
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Claim { row, col } => write!(f, "claim ({}, {})", row, col),
            Command::Pass => write!(f, "pass"),
        }
    }
}

/// Synchronous result of a `submit` call.
///
/// Rejections are values here, never errors: a rejected command changes
/// nothing observable and the reason travels back only to the submitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    /// Whether the command was applied.
    pub accepted: bool,
    /// Why the command was rejected, when it was.
    pub reason: Option<Reject>,
    /// Snapshot after the call: the post-state on accept, the unchanged
    /// pre-state on rejection.
    pub state: SessionState,
    /// Terminal outcome, when this command ended the session.
    pub outcome: Option<Outcome>,
}

impl CommandResult {
    /// Builds an accepted result.
    pub fn accepted(state: SessionState, outcome: Option<Outcome>) -> Self {
        Self {
            accepted: true,
            reason: None,
            state,
            outcome,
        }
    }

    /// Builds a rejected result carrying the unchanged state.
    pub fn rejected(reason: Reject, state: SessionState) -> Self {
        Self {
            accepted: false,
            reason: Some(reason),
            state,
            outcome: None,
        }
    }
}
