use crate::game::{GameError, GameOutcome, GameState, Player};
use std::fmt;

/// Players take turns subtracting a positive perfect square, no larger than the number,
/// from it. Whoever reaches zero wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtractSquare {
    number: u32,
    player: Player,
}

impl SubtractSquare {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            player: Player::First,
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }
}

impl Default for SubtractSquare {
    fn default() -> Self {
        SubtractSquare::new(13)
    }
}

impl GameState for SubtractSquare {
    /// The square subtracted.
    type Action = u32;

    fn player_to_move(&self) -> Player {
        self.player
    }

    fn legal_actions(&self) -> Vec<Self::Action> {
        (1u32..)
            .map_while(|i: u32| i.checked_mul(i))
            .take_while(|&square| square <= self.number)
            .collect()
    }

    fn apply(&self, action: &Self::Action) -> Result<Self, GameError> {
        self.ensure_legal(action)?;
        Ok(Self {
            number: self.number - action,
            player: self.player.opponent(),
        })
    }

    fn is_terminal(&self) -> bool {
        self.number == 0
    }

    fn result(&self) -> Result<GameOutcome, GameError> {
        if !self.is_terminal() {
            return Err(GameError::NotTerminal);
        }
        Ok(GameOutcome::win_for(self.player.opponent()))
    }
}

impl fmt::Display for SubtractSquare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Current number: {}, {} to move", self.number, self.player)
    }
}
