//! Turn arbitration: who may act, and how the pointer advances.

use crate::types::{Role, SessionState};

/// Gates mutation to the role whose turn it is and advances the pointer.
///
/// Stateless: the turn pointer lives in `SessionState`, the arbiter owns
/// the discipline around it.
#[derive(Debug, Clone, Copy)]
pub struct TurnArbiter;

impl TurnArbiter {
    /// Whether the given role currently holds the turn. Pure read.
    pub fn check_turn(state: &SessionState, role: Role) -> bool {
        state.turn == role
    }

    /// Advances the turn to the next role in cyclic order.
    ///
    /// Runs unconditionally after every successful apply that does not
    /// end the session; once terminal the pointer stays frozen at its
    /// last value.
    pub fn advance(state: &mut SessionState) {
        state.turn = state.turn.opponent();
    }
}
