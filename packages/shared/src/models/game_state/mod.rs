pub mod rock_paper_scissors;
pub mod tic_tac_toe;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use rock_paper_scissors::{Choice, RockPaperScissorsState};
use tic_tac_toe::TicTacToeState;

/// The games a room can host. Fixed when the room is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    TicTacToe,
    RockPaperScissors,
}

impl GameType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameType::TicTacToe => "tic_tac_toe",
            GameType::RockPaperScissors => "rock_paper_scissors",
        }
    }
}

impl std::fmt::Display for GameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Side of the room a participant occupies. The creator is always `Player1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Seat {
    Player1,
    Player2,
}

impl Seat {
    pub fn opponent(self) -> Seat {
        match self {
            Seat::Player1 => Seat::Player2,
            Seat::Player2 => Seat::Player1,
        }
    }
}

/// Result of a terminal check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Winner(Seat),
    Draw,
}

/// A move proposed by one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlayerMove {
    Place { cell: usize },
    Choose { choice: Choice },
}

impl PlayerMove {
    pub fn game_type(&self) -> GameType {
        match self {
            PlayerMove::Place { .. } => GameType::TicTacToe,
            PlayerMove::Choose { .. } => GameType::RockPaperScissors,
        }
    }
}

/// Why a proposed move left the room untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IllegalMove {
    #[error("room is not in progress")]
    RoomNotInProgress,
    #[error("caller is not a participant of this room")]
    NotParticipant,
    #[error("it is not the caller's turn")]
    NotYourTurn,
    #[error("cell {0} is outside the board")]
    CellOutOfRange(usize),
    #[error("cell {0} is already occupied")]
    CellOccupied(usize),
    #[error("caller has already made a choice")]
    AlreadyChosen,
    #[error("game is already over")]
    GameOver,
    #[error("move does not belong to a {0} room")]
    WrongGameType(GameType),
}

/// Game-specific payload of a room, tagged by game type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "game_type", rename_all = "snake_case")]
pub enum GameState {
    TicTacToe(TicTacToeState),
    RockPaperScissors(RockPaperScissorsState),
}

impl GameState {
    /// Empty state for a freshly created room.
    pub fn new(game_type: GameType) -> Self {
        match game_type {
            GameType::TicTacToe => GameState::TicTacToe(TicTacToeState::new()),
            GameType::RockPaperScissors => {
                GameState::RockPaperScissors(RockPaperScissorsState::default())
            }
        }
    }

    pub fn game_type(&self) -> GameType {
        match self {
            GameState::TicTacToe(_) => GameType::TicTacToe,
            GameState::RockPaperScissors(_) => GameType::RockPaperScissors,
        }
    }

    /// Terminal check, derived purely from the payload.
    pub fn outcome(&self) -> Option<GameOutcome> {
        match self {
            GameState::TicTacToe(state) => state.outcome(),
            GameState::RockPaperScissors(state) => state.outcome(),
        }
    }

    /// Whether `seat` is expected to act next.
    pub fn awaits(&self, seat: Seat) -> bool {
        if self.outcome().is_some() {
            return false;
        }
        match self {
            GameState::TicTacToe(state) => state.seat_to_move() == seat,
            GameState::RockPaperScissors(state) => state.choice(seat).is_none(),
        }
    }

    pub fn apply(&mut self, seat: Seat, player_move: &PlayerMove) -> Result<(), IllegalMove> {
        match (self, player_move) {
            (GameState::TicTacToe(state), PlayerMove::Place { cell }) => state.place(seat, *cell),
            (GameState::RockPaperScissors(state), PlayerMove::Choose { choice }) => {
                state.choose(seat, *choice)
            }
            (state, _) => Err(IllegalMove::WrongGameType(state.game_type())),
        }
    }
}
