//! Canonical session state and its leaf types.
//!
//! `SessionState` is pure data plus invariant checks: all mutation goes
//! through the rule engine and the coordinator.

use crate::command::Command;
use crate::error::SessionError;
use crate::position::Position;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A seat in the session, fixed at creation.
///
/// Distinct from the participant identity bound to it: `X` and `O` exist
/// from the start, identities arrive when participants register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// The X seat.
    X,
    /// The O seat.
    O,
}

impl Role {
    /// Returns the other role. Two-role sessions make the cyclic turn
    /// order a simple flip.
    pub fn opponent(self) -> Self {
        match self {
            Role::X => Role::O,
            Role::O => Role::X,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::X => write!(f, "X"),
            Role::O => write!(f, "O"),
        }
    }
}

/// A participant bound to a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Opaque ID the transport layer uses to address this participant.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Cumulative win counter; survives `reset()`.
    pub wins: u32,
}

impl Participant {
    /// Creates a participant with a zeroed win counter.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            wins: 0,
        }
    }
}

/// A cell on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    /// Unclaimed cell.
    Empty,
    /// Cell claimed by a role. Set-once: ownership never changes except
    /// via full reset.
    Owned(Role),
}

/// 3x3 board of claimable cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    /// Cells in row-major order (0-8).
    cells: [Cell; 9],
}

impl Board {
    /// Creates a new empty board.
    pub fn new() -> Self {
        Self {
            cells: [Cell::Empty; 9],
        }
    }

    /// Gets the cell at the given position.
    pub fn get(&self, pos: Position) -> Cell {
        self.cells[pos.to_index()]
    }

    /// Sets the cell at the given position.
    pub fn set(&mut self, pos: Position, cell: Cell) {
        self.cells[pos.to_index()] = cell;
    }

    /// Checks if a cell is unclaimed.
    pub fn is_empty(&self, pos: Position) -> bool {
        self.get(pos) == Cell::Empty
    }

    /// Checks if every cell is claimed.
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|c| *c != Cell::Empty)
    }

    /// Number of claimed cells.
    pub fn claimed_count(&self) -> usize {
        self.cells.iter().filter(|c| **c != Cell::Empty).count()
    }

    /// Returns all cells as a slice.
    pub fn cells(&self) -> &[Cell; 9] {
        &self.cells
    }

    /// Formats the board as a human-readable string.
    ///
    /// Empty cells show their index so a participant can name a target.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for row in 0..3 {
            for col in 0..3 {
                let idx = row * 3 + col;
                let symbol = match self.cells[idx] {
                    Cell::Empty => idx.to_string(),
                    Cell::Owned(role) => role.to_string(),
                };
                result.push_str(&symbol);
                if col < 2 {
                    result.push('|');
                }
            }
            if row < 2 {
                result.push_str("\n-+-+-\n");
            }
        }
        result
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Not all roles assigned yet; commands are rejected.
    Pending,
    /// Accepting commands.
    Active,
    /// Immutable except for reset.
    Terminal,
}

/// How a terminal session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The given role completed a line.
    Winner(Role),
    /// Board exhausted with no winner.
    Draw,
}

/// One applied command in the history log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// Role that acted.
    pub role: Role,
    /// The command that was applied.
    pub command: Command,
    /// When the command was applied.
    pub at: DateTime<Utc>,
}

/// Complete canonical state of one session.
///
/// This flat record is also the exported snapshot layout: serializing it
/// and deserializing it back must reproduce an identical state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Participant bound to the X seat, if any.
    pub player_x: Option<Participant>,
    /// Participant bound to the O seat, if any.
    pub player_o: Option<Participant>,
    /// The board.
    pub board: Board,
    /// Role currently permitted to act. Frozen once terminal.
    pub turn: Role,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Set exactly when `status` is terminal.
    pub outcome: Option<Outcome>,
    /// Append-only log of applied commands; cleared only by reset.
    pub move_history: Vec<MoveRecord>,
    /// When this session (or the last reset) started.
    pub started_at: DateTime<Utc>,
    /// When the last successful mutation happened.
    pub last_mutated_at: DateTime<Utc>,
}

impl SessionState {
    /// Creates a pending session with an empty board.
    pub fn new(first_turn: Role) -> Self {
        let now = Utc::now();
        Self {
            player_x: None,
            player_o: None,
            board: Board::new(),
            turn: first_turn,
            status: SessionStatus::Pending,
            outcome: None,
            move_history: Vec::new(),
            started_at: now,
            last_mutated_at: now,
        }
    }

    /// Returns the participant bound to the given role.
    pub fn participant(&self, role: Role) -> Option<&Participant> {
        match role {
            Role::X => self.player_x.as_ref(),
            Role::O => self.player_o.as_ref(),
        }
    }

    /// Resolves a participant ID to its role.
    pub fn role_of(&self, participant_id: &str) -> Option<Role> {
        if self.player_x.as_ref().map(|p| p.id.as_str()) == Some(participant_id) {
            Some(Role::X)
        } else if self.player_o.as_ref().map(|p| p.id.as_str()) == Some(participant_id) {
            Some(Role::O)
        } else {
            None
        }
    }

    /// Whether every role has a participant bound.
    pub fn roster_complete(&self) -> bool {
        self.player_x.is_some() && self.player_o.is_some()
    }

    /// Serializes the snapshot record to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Restores a snapshot record from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Human-readable rendering hook for display collaborators.
    pub fn render(&self) -> String {
        let name = |p: &Option<Participant>| {
            p.as_ref()
                .map(|p| p.name.clone())
                .unwrap_or_else(|| "(waiting)".to_string())
        };
        let status_line = match (self.status, self.outcome) {
            (SessionStatus::Terminal, Some(Outcome::Winner(role))) => {
                format!("Player {} wins!", role)
            }
            (SessionStatus::Terminal, _) => "Draw.".to_string(),
            (SessionStatus::Pending, _) => "Waiting for participants.".to_string(),
            (SessionStatus::Active, _) => format!("Player {} to move.", self.turn),
        };
        format!(
            "X: {}\nO: {}\n{}\nMoves: {}\n\n{}",
            name(&self.player_x),
            name(&self.player_o),
            status_line,
            self.move_history.len(),
            self.board.display()
        )
    }

    /// Verifies the structural invariants of the state.
    ///
    /// The coordinator runs this on every candidate state before
    /// committing it; a failure aborts the submit instead of publishing
    /// a corrupt state.
    pub fn check_invariants(&self) -> Result<(), SessionError> {
        if self.status == SessionStatus::Active && self.participant(self.turn).is_none() {
            return Err(SessionError::InvariantViolation(format!(
                "turn points at unbound role {}",
                self.turn
            )));
        }
        if (self.status == SessionStatus::Terminal) != self.outcome.is_some() {
            return Err(SessionError::InvariantViolation(
                "outcome must be set exactly when status is terminal".to_string(),
            ));
        }
        let claims = self
            .move_history
            .iter()
            .filter(|r| matches!(r.command, Command::Claim { .. }))
            .count();
        if claims != self.board.claimed_count() {
            return Err(SessionError::InvariantViolation(format!(
                "{} claim records but {} claimed cells",
                claims,
                self.board.claimed_count()
            )));
        }
        Ok(())
    }
}
