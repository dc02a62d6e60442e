//! Tic-tac-toe rules.
//!
//! Pure transformation over [`GameState`]: no hidden state, no I/O.
//! Terminal evaluation checks the 8 standard lines; a full board with
//! no uniform line is a tie.

use super::{GameState, Mark, MoveRejection, RuleSet, Winner};
use tracing::instrument;

/// Number of cells on the board.
pub const BOARD_CELLS: usize = 9;

/// The 8 winning lines: 3 rows, 3 columns, 2 diagonals.
const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Rule set for classic 3x3 tic-tac-toe.
#[derive(Debug, Clone, Copy, Default)]
pub struct TicTacToe;

impl RuleSet for TicTacToe {
    fn initial_state(&self) -> GameState {
        GameState {
            board: vec![None; BOARD_CELLS],
            turn: 0,
            game_over: false,
            winner: None,
            winning_line: Vec::new(),
        }
    }

    #[instrument(skip(self, state))]
    fn apply_move(
        &self,
        state: &GameState,
        mover: usize,
        cell: usize,
    ) -> Result<GameState, MoveRejection> {
        if state.game_over {
            return Err(MoveRejection::GameOver);
        }
        if state.turn != mover {
            return Err(MoveRejection::NotYourTurn);
        }
        if cell >= state.board.len() {
            return Err(MoveRejection::OutOfBounds);
        }
        if state.board[cell].is_some() {
            return Err(MoveRejection::CellOccupied);
        }
        let mark = Mark::for_player(mover).ok_or(MoveRejection::NotYourTurn)?;

        let mut next = state.clone();
        next.board[cell] = Some(mark);

        if let Some(line) = winning_line(&next.board) {
            next.game_over = true;
            next.winner = Some(Winner::from(mark));
            next.winning_line = line.to_vec();
        } else if next.board.iter().all(Option::is_some) {
            next.game_over = true;
            next.winner = Some(Winner::Tie);
        } else {
            next.turn = 1 - mover;
        }

        Ok(next)
    }
}

/// Returns the indices of a uniform non-empty line, if any.
fn winning_line(board: &[Option<Mark>]) -> Option<[usize; 3]> {
    for line in LINES {
        let [a, b, c] = line;
        if let Some(mark) = board[a]
            && board[b] == Some(mark)
            && board[c] == Some(mark)
        {
            return Some(line);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_is_empty_with_first_player_to_move() {
        let state = TicTacToe.initial_state();
        assert_eq!(state.board.len(), BOARD_CELLS);
        assert!(state.board.iter().all(Option::is_none));
        assert_eq!(state.turn, 0);
        assert!(!state.game_over);
        assert!(state.winner.is_none());
        assert!(state.winning_line.is_empty());
    }

    #[test]
    fn out_of_bounds_cell_is_rejected() {
        let state = TicTacToe.initial_state();
        assert_eq!(
            TicTacToe.apply_move(&state, 0, BOARD_CELLS),
            Err(MoveRejection::OutOfBounds)
        );
    }
}
