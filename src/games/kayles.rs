use crate::game::{GameError, GameOutcome, GameState, Player};
use std::fmt;

/// Knocks down pins in Kayles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KaylesAction {
    /// One standing pin.
    Single(usize),
    /// Two adjacent standing pins, at the given position and the one after it.
    Pair(usize),
}

/// A row of pins. Players take turns knocking down one pin or two adjacent pins; whoever
/// knocks down the last pin wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kayles {
    pins: Vec<bool>,
    player: Player,
}

impl Kayles {
    pub fn new(pins: usize) -> Self {
        Self {
            pins: vec![true; pins],
            player: Player::First,
        }
    }

    pub fn standing(&self) -> usize {
        self.pins.iter().filter(|&&pin| pin).count()
    }

    pub fn is_standing(&self, position: usize) -> bool {
        self.pins.get(position).copied().unwrap_or(false)
    }
}

impl Default for Kayles {
    fn default() -> Self {
        Kayles::new(8)
    }
}

impl GameState for Kayles {
    type Action = KaylesAction;

    /// Singles in position order, then pairs in position order.
    fn legal_actions(&self) -> Vec<Self::Action> {
        let singles = (0..self.pins.len())
            .filter(|&i| self.pins[i])
            .map(KaylesAction::Single);
        let pairs = self
            .pins
            .windows(2)
            .enumerate()
            .filter(|(_, pair)| pair[0] && pair[1])
            .map(|(i, _)| KaylesAction::Pair(i));
        singles.chain(pairs).collect()
    }

    fn player_to_move(&self) -> Player {
        self.player
    }

    fn apply(&self, action: &Self::Action) -> Result<Self, GameError> {
        self.ensure_legal(action)?;
        let mut next = self.clone();
        match *action {
            KaylesAction::Single(i) => next.pins[i] = false,
            KaylesAction::Pair(i) => {
                next.pins[i] = false;
                next.pins[i + 1] = false;
            }
        }
        next.player = self.player.opponent();
        Ok(next)
    }

    fn is_terminal(&self) -> bool {
        !self.pins.iter().any(|&pin| pin)
    }

    fn result(&self) -> Result<GameOutcome, GameError> {
        if !self.is_terminal() {
            return Err(GameError::NotTerminal);
        }
        Ok(GameOutcome::win_for(self.player.opponent()))
    }
}

impl fmt::Display for Kayles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Turn: {}", self.player)?;
        let pins: String = self
            .pins
            .iter()
            .map(|&pin| if pin { "| " } else { "  " })
            .collect();
        writeln!(f, "Pins: {}", pins.trim_end())?;
        let positions: Vec<String> = (0..self.pins.len()).map(|i| i.to_string()).collect();
        write!(f, "      {}", positions.join(" "))
    }
}
