use crate::game::{GameError, GameOutcome, GameState, Player};
use std::fmt;

/// Players take turns counting up by one to `max_step` from the current count. Whoever
/// says the target number wins.
///
/// An action is the number said. With the default target of 21 and steps up to 3 the
/// first player wins by always landing on a multiple of 4 plus 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountToN {
    target: u32,
    count: u32,
    max_step: u32,
    player: Player,
}

impl CountToN {
    /// Creates a game at `count` with `player` to move and steps of at most 3.
    pub fn new(target: u32, count: u32, player: Player) -> Self {
        Self {
            target,
            count,
            max_step: 3,
            player,
        }
    }

    pub fn with_max_step(mut self, max_step: u32) -> Self {
        self.max_step = max_step.max(1);
        self
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn target(&self) -> u32 {
        self.target
    }
}

impl Default for CountToN {
    fn default() -> Self {
        CountToN::new(21, 0, Player::First)
    }
}

impl GameState for CountToN {
    type Action = u32;

    fn player_to_move(&self) -> Player {
        self.player
    }

    fn legal_actions(&self) -> Vec<Self::Action> {
        if self.is_terminal() {
            return Vec::new();
        }
        let highest = self.count.saturating_add(self.max_step).min(self.target);
        (self.count + 1..=highest).collect()
    }

    fn apply(&self, action: &Self::Action) -> Result<Self, GameError> {
        self.ensure_legal(action)?;
        Ok(Self {
            count: *action,
            player: self.player.opponent(),
            ..self.clone()
        })
    }

    fn is_terminal(&self) -> bool {
        self.count >= self.target
    }

    fn result(&self) -> Result<GameOutcome, GameError> {
        if !self.is_terminal() {
            return Err(GameError::NotTerminal);
        }
        // The player who reached the target has just handed the turn over.
        Ok(GameOutcome::win_for(self.player.opponent()))
    }
}

impl fmt::Display for CountToN {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Count: {}/{}, {} to move", self.count, self.target, self.player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_up_to_three() {
        let game = CountToN::default();
        assert_eq!(game.legal_actions(), vec![1, 2, 3]);
        let game = game.apply(&3).unwrap();
        assert_eq!(game.count(), 3);
        assert_eq!(game.player_to_move(), Player::Second);
        assert_eq!(game.legal_actions(), vec![4, 5, 6]);
    }

    #[test]
    fn never_counts_past_target() {
        let game = CountToN::new(21, 19, Player::First);
        assert_eq!(game.legal_actions(), vec![20, 21]);
        assert!(matches!(
            game.apply(&22),
            Err(GameError::InvalidAction { .. })
        ));
        assert!(matches!(
            game.apply(&19),
            Err(GameError::InvalidAction { .. })
        ));
    }

    #[test]
    fn whoever_says_target_wins() {
        let game = CountToN::new(21, 20, Player::Second).apply(&21).unwrap();
        assert!(game.is_terminal());
        assert!(game.legal_actions().is_empty());
        assert_eq!(game.result(), Ok(GameOutcome::SECOND_WINS));
        assert_eq!(
            CountToN::default().result(),
            Err(GameError::NotTerminal)
        );
    }

    #[test]
    fn custom_step() {
        let game = CountToN::new(10, 0, Player::First).with_max_step(5);
        assert_eq!(game.legal_actions(), vec![1, 2, 3, 4, 5]);
        assert_eq!(game.target(), 10);
        assert_eq!(game.to_string(), "Count: 0/10, player 0 to move");
    }
}
