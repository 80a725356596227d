//! Ready-made implementations of the `GameState` trait.

/// Counting to a target number in steps of one to three.
pub mod count_to_n;
/// Kayles, a row of pins knocked down one or two at a time.
pub mod kayles;
/// Subtract a square.
pub mod subtract_square;
/// Tic-Tac-Toe on an arbitrary grid.
pub mod tic_tac_toe;
