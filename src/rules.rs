//! Rule engine: pure validation, application, and terminal detection.
//!
//! Nothing here mutates shared state. `validate` reads, `apply` builds
//! the next state from a copy, and the coordinator decides what to do
//! with it.

use crate::arbiter::TurnArbiter;
use crate::command::Command;
use crate::error::Reject;
use crate::position::Position;
use crate::types::{Cell, MoveRecord, Outcome, Role, SessionState, SessionStatus};
use chrono::{DateTime, Utc};
use tracing::instrument;

/// All winning lines, scanned rows first, then columns, then diagonals.
///
/// Scan order is the tie-break: if several lines complete at once the
/// first match wins, deterministically.
const LINES: [[Position; 3]; 8] = [
    // Rows
    [Position::TopLeft, Position::TopCenter, Position::TopRight],
    [
        Position::MiddleLeft,
        Position::Center,
        Position::MiddleRight,
    ],
    [
        Position::BottomLeft,
        Position::BottomCenter,
        Position::BottomRight,
    ],
    // Columns
    [
        Position::TopLeft,
        Position::MiddleLeft,
        Position::BottomLeft,
    ],
    [
        Position::TopCenter,
        Position::Center,
        Position::BottomCenter,
    ],
    [
        Position::TopRight,
        Position::MiddleRight,
        Position::BottomRight,
    ],
    // Diagonals
    [Position::TopLeft, Position::Center, Position::BottomRight],
    [Position::TopRight, Position::Center, Position::BottomLeft],
];

/// Validates a proposed command against the current state.
///
/// Checks in order: session not terminal, session active, role holds the
/// turn, target in bounds, target unclaimed. The first failing check is
/// the reported reason; the checks do not overlap.
#[instrument(skip(state))]
pub fn validate(state: &SessionState, role: Role, command: &Command) -> Result<(), Reject> {
    if state.status == SessionStatus::Terminal {
        return Err(Reject::SessionTerminal);
    }
    if state.status == SessionStatus::Pending {
        return Err(Reject::IllegalCommand(
            "session is not active: roles are still unassigned".to_string(),
        ));
    }
    if !TurnArbiter::check_turn(state, role) {
        return Err(Reject::NotYourTurn(state.turn));
    }
    match command {
        Command::Claim { row, col } => {
            let pos = Position::from_coords(*row, *col)
                .ok_or(Reject::OutOfBounds { row: *row, col: *col })?;
            if !state.board.is_empty(pos) {
                return Err(Reject::PositionOccupied(pos));
            }
            Ok(())
        }
        // A pass is always legal on your turn; it exists precisely so a
        // supervisor can expire a stalled turn through the normal path.
        Command::Pass => Ok(()),
    }
}

/// Applies a validated command, returning the next state.
///
/// Precondition: `validate` returned `Ok` for the same `(state, role,
/// command)`. Only the coordinator calls this, after validating.
#[instrument(skip(state))]
pub fn apply(
    state: &SessionState,
    role: Role,
    command: &Command,
    at: DateTime<Utc>,
) -> SessionState {
    let mut next = state.clone();
    if let Command::Claim { row, col } = command {
        // Validated above, so the coordinates name a real cell.
        if let Some(pos) = Position::from_coords(*row, *col) {
            next.board.set(pos, Cell::Owned(role));
        }
    }
    next.move_history.push(MoveRecord {
        role,
        command: *command,
        at,
    });
    next.last_mutated_at = at;
    next
}

/// Detects a terminal condition on the board.
///
/// Evaluated once, immediately after every successful apply. Returns
/// `Winner` for the first completed line in scan order, `Draw` for a
/// full board with no winner, `None` otherwise.
#[instrument(skip(state))]
pub fn detect_terminal(state: &SessionState) -> Option<Outcome> {
    for [a, b, c] in LINES {
        let cell = state.board.get(a);
        if cell != Cell::Empty && cell == state.board.get(b) && cell == state.board.get(c) {
            if let Cell::Owned(role) = cell {
                return Some(Outcome::Winner(role));
            }
        }
    }

    if state.board.is_full() {
        return Some(Outcome::Draw);
    }

    None
}
