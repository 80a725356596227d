use crate::game::{GameError, GameOutcome, GameState, Player};
use std::fmt;

const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// An implementation of the `GameState` trait for Tic-Tac-Toe on a `rows` x `cols` grid,
/// won by `in_a_row` marks in a horizontal, vertical or diagonal line.
///
/// Cells are numbered row by row from the top-left corner. An action is the index of an
/// empty cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicTacToe {
    rows: usize,
    cols: usize,
    in_a_row: usize,
    field: Vec<Option<Mark>>,
    current_player: Player,
    winner: Option<Player>,
}

impl TicTacToe {
    /// Creates an empty board. Panics if `in_a_row` is zero or longer than both sides.
    pub fn new(rows: usize, cols: usize, in_a_row: usize) -> Self {
        assert!(
            in_a_row > 0 && (in_a_row <= rows || in_a_row <= cols),
            "a {in_a_row}-in-a-row line does not fit on a {rows}x{cols} board"
        );
        Self {
            rows,
            cols,
            in_a_row,
            field: vec![None; rows * cols],
            current_player: Player::First,
            winner: None,
        }
    }

    /// The 3x4 variant with 3 in a row, a first-player win.
    pub fn three_by_four() -> Self {
        TicTacToe::new(3, 4, 3)
    }

    pub fn cell_index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    pub fn winner(&self) -> Option<Player> {
        self.winner
    }

    /// Returns `true` if the line through `cell` in any direction has `in_a_row` marks of
    /// its owner.
    fn completes_line(&self, cell: usize) -> bool {
        let Some(mark) = self.field[cell] else {
            return false;
        };
        let (row, col) = ((cell / self.cols) as isize, (cell % self.cols) as isize);

        DIRECTIONS.iter().any(|&(dr, dc)| {
            let run = 1
                + self.run_length(row, col, dr, dc, mark)
                + self.run_length(row, col, -dr, -dc, mark);
            run >= self.in_a_row
        })
    }

    fn run_length(&self, row: isize, col: isize, dr: isize, dc: isize, mark: Mark) -> usize {
        let mut length = 0;
        let (mut r, mut c) = (row + dr, col + dc);
        while r >= 0
            && c >= 0
            && (r as usize) < self.rows
            && (c as usize) < self.cols
            && self.field[r as usize * self.cols + c as usize] == Some(mark)
        {
            length += 1;
            r += dr;
            c += dc;
        }
        length
    }
}

impl Default for TicTacToe {
    /// Creates the classic 3x3 board with the first player ('X') to move.
    fn default() -> Self {
        TicTacToe::new(3, 3, 3)
    }
}

impl GameState for TicTacToe {
    type Action = usize;

    fn player_to_move(&self) -> Player {
        self.current_player
    }

    fn legal_actions(&self) -> Vec<Self::Action> {
        if self.winner.is_some() {
            return Vec::new();
        }

        self.field
            .iter()
            .enumerate()
            .filter(|(_, x)| x.is_none())
            .map(|(i, _)| i)
            .collect()
    }

    fn apply(&self, action: &Self::Action) -> Result<Self, GameError> {
        self.ensure_legal(action)?;
        let mut next = self.clone();
        next.field[*action] = Some(Mark::of(self.current_player));
        if next.completes_line(*action) {
            next.winner = Some(self.current_player);
        }
        next.current_player = self.current_player.opponent();
        Ok(next)
    }

    fn is_terminal(&self) -> bool {
        self.winner.is_some() || self.field.iter().all(|x| x.is_some())
    }

    fn result(&self) -> Result<GameOutcome, GameError> {
        if !self.is_terminal() {
            return Err(GameError::NotTerminal);
        }
        Ok(self.winner.map_or(GameOutcome::DRAW, GameOutcome::win_for))
    }
}

impl fmt::Display for TicTacToe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Turn: {}", Mark::of(self.current_player))?;
        for row in 0..self.rows {
            let cells: Vec<String> = (0..self.cols)
                .map(|col| match self.field[self.cell_index(row, col)] {
                    Some(mark) => mark.to_string(),
                    None => ".".to_string(),
                })
                .collect();
            writeln!(f, "{}", cells.join(" "))?;
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
enum Mark {
    X,
    O,
}

impl Mark {
    fn of(player: Player) -> Mark {
        match player {
            Player::First => Mark::X,
            Player::Second => Mark::O,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::X => write!(f, "X"),
            Mark::O => write!(f, "O"),
        }
    }
}
