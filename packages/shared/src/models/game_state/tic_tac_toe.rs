use serde::{Deserialize, Serialize};

use super::{GameOutcome, IllegalMove, Seat};

pub const BOARD_CELLS: usize = 9;

/// Rows, columns and both diagonals.
pub const WINNING_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    /// Player1 plays X, player2 plays O.
    pub fn for_seat(seat: Seat) -> Mark {
        match seat {
            Seat::Player1 => Mark::X,
            Seat::Player2 => Mark::O,
        }
    }

    pub fn seat(self) -> Seat {
        match self {
            Mark::X => Seat::Player1,
            Mark::O => Seat::Player2,
        }
    }

    pub fn opponent(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicTacToeState {
    pub board: [Option<Mark>; BOARD_CELLS],
    pub turn: Mark,
}

impl Default for TicTacToeState {
    fn default() -> Self {
        Self::new()
    }
}

impl TicTacToeState {
    pub fn new() -> Self {
        TicTacToeState {
            board: [None; BOARD_CELLS],
            turn: Mark::X,
        }
    }

    pub fn seat_to_move(&self) -> Seat {
        self.turn.seat()
    }

    /// Places the mark of `seat` on `cell` and hands the turn over.
    pub fn place(&mut self, seat: Seat, cell: usize) -> Result<(), IllegalMove> {
        if self.outcome().is_some() {
            return Err(IllegalMove::GameOver);
        }

        let mark = Mark::for_seat(seat);
        if mark != self.turn {
            return Err(IllegalMove::NotYourTurn);
        }

        let slot = self
            .board
            .get_mut(cell)
            .ok_or(IllegalMove::CellOutOfRange(cell))?;
        if slot.is_some() {
            return Err(IllegalMove::CellOccupied(cell));
        }

        *slot = Some(mark);
        self.turn = mark.opponent();
        Ok(())
    }

    /// Mark of the first complete line, if any.
    pub fn winning_mark(&self) -> Option<Mark> {
        WINNING_LINES.iter().find_map(|&[a, b, c]| {
            match (self.board[a], self.board[b], self.board[c]) {
                (Some(first), Some(second), Some(third)) if first == second && second == third => {
                    Some(first)
                }
                _ => None,
            }
        })
    }

    pub fn is_full(&self) -> bool {
        self.board.iter().all(Option::is_some)
    }

    pub fn marks_placed(&self) -> usize {
        self.board.iter().filter(|cell| cell.is_some()).count()
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        if let Some(mark) = self.winning_mark() {
            return Some(GameOutcome::Winner(mark.seat()));
        }
        if self.is_full() {
            return Some(GameOutcome::Draw);
        }
        None
    }
}
