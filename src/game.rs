use std::fmt::{self, Debug};
use thiserror::Error;

/// The central trait of the library, defining the interface for a game state.
///
/// To search a custom game, this trait must be implemented for its state type.
/// A state is an immutable position: [`GameState::apply`] never mutates `self`, it
/// returns a new, independent state.
pub trait GameState: Clone {
    /// The type representing an action in the game. The engine never looks inside it,
    /// it only compares actions for equality and hands them back to [`GameState::apply`].
    type Action: Clone + PartialEq + Debug;

    /// Returns the player whose turn it is to act.
    fn player_to_move(&self) -> Player;

    /// Returns all legal actions from this state.
    ///
    /// Must be non-empty for every non-terminal state. The order is significant: the
    /// search keeps children in exactly this order, and ties are broken by it.
    fn legal_actions(&self) -> Vec<Self::Action>;

    /// Returns the state reached by playing `action`.
    ///
    /// Fails with [`GameError::InvalidAction`] if `action` is not an element of
    /// [`GameState::legal_actions`].
    fn apply(&self, action: &Self::Action) -> Result<Self, GameError>;

    /// Returns `true` if no further play is possible.
    fn is_terminal(&self) -> bool;

    /// Returns the final scores. Fails with [`GameError::NotTerminal`] on a live state.
    fn result(&self) -> Result<GameOutcome, GameError>;

    /// Checks that `action` is currently legal.
    fn ensure_legal(&self, action: &Self::Action) -> Result<(), GameError> {
        if self.legal_actions().contains(action) {
            Ok(())
        } else {
            Err(GameError::InvalidAction {
                action: format!("{action:?}"),
            })
        }
    }
}

/// Errors raised by game implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("invalid action {action}: not among the legal actions of this state")]
    InvalidAction { action: String },

    #[error("result requested on a non-terminal state")]
    NotTerminal,
}

/// One of the two players of a game.
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub enum Player {
    /// Player 0, who moves first in every bundled game.
    First = 0,
    /// Player 1.
    Second = 1,
}

impl Player {
    /// Slot of this player in score vectors.
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn opponent(self) -> Player {
        match self {
            Player::First => Player::Second,
            Player::Second => Player::First,
        }
    }

    pub const fn from_index(index: usize) -> Option<Player> {
        match index {
            0 => Some(Player::First),
            1 => Some(Player::Second),
            _ => None,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player {}", self.index())
    }
}

/// The scores of a finished game, indexed by player.
///
/// Conventionally one of [`GameOutcome::FIRST_WINS`], [`GameOutcome::SECOND_WINS`] or
/// [`GameOutcome::DRAW`], but the engine treats both numbers as opaque utilities.
#[derive(Debug, PartialEq, Copy, Clone)]
pub struct GameOutcome {
    scores: [f64; 2],
}

impl GameOutcome {
    pub const FIRST_WINS: GameOutcome = GameOutcome::new(1.0, -1.0);
    pub const SECOND_WINS: GameOutcome = GameOutcome::new(-1.0, 1.0);
    pub const DRAW: GameOutcome = GameOutcome::new(0.0, 0.0);

    pub const fn new(first: f64, second: f64) -> Self {
        Self {
            scores: [first, second],
        }
    }

    /// The conventional outcome in which `player` wins.
    pub const fn win_for(player: Player) -> Self {
        match player {
            Player::First => Self::FIRST_WINS,
            Player::Second => Self::SECOND_WINS,
        }
    }

    pub fn score(&self, player: Player) -> f64 {
        self.scores[player.index()]
    }

    pub fn scores(&self) -> [f64; 2] {
        self.scores
    }

    /// The player with the strictly higher score, if any.
    pub fn winner(&self) -> Option<Player> {
        let [first, second] = self.scores;
        if first > second {
            Some(Player::First)
        } else if second > first {
            Some(Player::Second)
        } else {
            None
        }
    }
}

impl fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.scores[0], self.scores[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn players_alternate() {
        assert_eq!(Player::First.opponent(), Player::Second);
        assert_eq!(Player::Second.opponent(), Player::First);
        assert_eq!(Player::from_index(1), Some(Player::Second));
        assert_eq!(Player::from_index(2), None);
    }

    #[test]
    fn outcome_reports_winner() {
        assert_eq!(GameOutcome::FIRST_WINS.winner(), Some(Player::First));
        assert_eq!(GameOutcome::SECOND_WINS.winner(), Some(Player::Second));
        assert_eq!(GameOutcome::DRAW.winner(), None);
        assert_eq!(GameOutcome::win_for(Player::Second).score(Player::Second), 1.0);
    }
}
