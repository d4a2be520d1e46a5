use serde::{Deserialize, Serialize};

use super::{GameOutcome, IllegalMove, Seat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Choice {
    Rock,
    Paper,
    Scissors,
}

impl Choice {
    /// Rock beats scissors, scissors beats paper, paper beats rock.
    pub fn beats(self, other: Choice) -> bool {
        matches!(
            (self, other),
            (Choice::Rock, Choice::Scissors)
                | (Choice::Scissors, Choice::Paper)
                | (Choice::Paper, Choice::Rock)
        )
    }
}

/// One optional choice per seat. Choices are simultaneous, so there is no turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RockPaperScissorsState {
    pub player1_choice: Option<Choice>,
    pub player2_choice: Option<Choice>,
}

impl RockPaperScissorsState {
    pub fn choice(&self, seat: Seat) -> Option<Choice> {
        match seat {
            Seat::Player1 => self.player1_choice,
            Seat::Player2 => self.player2_choice,
        }
    }

    pub fn choose(&mut self, seat: Seat, choice: Choice) -> Result<(), IllegalMove> {
        let slot = match seat {
            Seat::Player1 => &mut self.player1_choice,
            Seat::Player2 => &mut self.player2_choice,
        };
        if slot.is_some() {
            return Err(IllegalMove::AlreadyChosen);
        }
        *slot = Some(choice);
        Ok(())
    }

    /// Decided once both seats have chosen.
    pub fn outcome(&self) -> Option<GameOutcome> {
        let (first, second) = (self.player1_choice?, self.player2_choice?);
        if first == second {
            Some(GameOutcome::Draw)
        } else if first.beats(second) {
            Some(GameOutcome::Winner(Seat::Player1))
        } else {
            Some(GameOutcome::Winner(Seat::Player2))
        }
    }
}
