use serde::{Deserialize, Serialize};

use crate::models::game_state::{rock_paper_scissors::Choice, GameType};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateRoomRequest {
    pub game_type: GameType,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TicTacToeMoveRequest {
    pub cell: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RockPaperScissorsChoiceRequest {
    pub choice: Choice,
}
