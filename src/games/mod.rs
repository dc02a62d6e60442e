//! Game rule sets.
//!
//! The session layer treats a game as a capability: hand a rule set the
//! current state and a move, get back the next state or a rejection.
//! New game variants plug in by implementing [`RuleSet`] and taking a
//! slot in the [`GameKind`] registry; session and polling code never
//! change.

mod tictactoe;

pub use tictactoe::TicTacToe;

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};

/// Mark owned by one of the two players.
///
/// Player index 0 plays X and moves first; index 1 plays O.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    /// First player's mark.
    X,
    /// Second player's mark.
    O,
}

impl Mark {
    /// Returns the opposing mark.
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }

    /// Maps a player index to their mark.
    pub fn for_player(index: usize) -> Option<Self> {
        match index {
            0 => Some(Mark::X),
            1 => Some(Mark::O),
            _ => None,
        }
    }
}

/// Outcome recorded when a game reaches a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner {
    /// Player X won.
    X,
    /// Player O won.
    O,
    /// Board filled with no uniform line.
    #[serde(rename = "tie")]
    Tie,
}

impl From<Mark> for Winner {
    fn from(mark: Mark) -> Self {
        match mark {
            Mark::X => Winner::X,
            Mark::O => Winner::O,
        }
    }
}

/// Authoritative per-match game state.
///
/// `winner` and `winning_line` are write-once: they are set exactly when
/// `game_over` flips to true and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Cells in row-major order; `None` is empty.
    pub board: Vec<Option<Mark>>,
    /// Index of the player whose move is next (0 or 1).
    pub turn: usize,
    /// Whether the game has reached a terminal state.
    pub game_over: bool,
    /// Set exactly once, when `game_over` becomes true.
    pub winner: Option<Winner>,
    /// Board indices of the winning triple; empty unless a non-tie win
    /// occurred.
    pub winning_line: Vec<usize>,
}

/// Reasons the rule engine rejects a move.
///
/// Kept distinct so clients can tell the player what went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum MoveRejection {
    /// The game already reached a terminal state.
    #[display("the game is already over")]
    GameOver,
    /// It is the other player's turn.
    #[display("not your turn")]
    NotYourTurn,
    /// The targeted cell already holds a mark.
    #[display("that cell is already occupied")]
    CellOccupied,
    /// The cell index falls outside the board.
    #[display("cell index is out of bounds")]
    OutOfBounds,
}

/// Capability the session layer requires of a game variant.
///
/// Implementations are pure: `apply_move` never mutates shared state
/// and never blocks, so the store can call it inside a per-session
/// critical section.
pub trait RuleSet: Send + Sync + std::fmt::Debug {
    /// Fresh state for a newly started match.
    fn initial_state(&self) -> GameState;

    /// Applies one move, returning the successor state or a rejection.
    fn apply_move(
        &self,
        state: &GameState,
        mover: usize,
        cell: usize,
    ) -> Result<GameState, MoveRejection>;
}

/// Registry of playable game variants.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum GameKind {
    /// Classic 3x3 tic-tac-toe.
    #[default]
    TicTacToe,
}

impl GameKind {
    /// Resolves the rule set for this game variant.
    pub fn rules(self) -> &'static dyn RuleSet {
        match self {
            GameKind::TicTacToe => &TicTacToe,
        }
    }
}
