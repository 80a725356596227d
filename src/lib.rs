//! Monte Carlo tree search for two-player zero-sum games, plus a driver that plays whole
//! games between strategies under per-move and per-game limits.
//!
//! Games implement [`GameState`]. A search ([`MonteCarloTreeSearch`], or the reusable
//! [`MctsEngine`]) runs a fixed number of select / expand / simulate / backpropagate
//! iterations and answers with the most visited move. [`BoundedPlayout`] alternates two
//! [`Strategy`] implementations from an initial state to the end of the game, and
//! [`count_wins`] plays a seeded series between two searches.
//!
//! # Example
//!
//! ```rust
//! use mcts_arena::games::count_to_n::CountToN;
//! use mcts_arena::mcts::MonteCarloTreeSearch;
//! use mcts_arena::random::SeededRandomGenerator;
//!
//! // Count to 21 in steps of 1 to 3; saying 21 wins.
//! let game = CountToN::default();
//!
//! let mut mcts = MonteCarloTreeSearch::builder(game)
//!     .with_random_generator(SeededRandomGenerator::new(42))
//!     .with_exploration_constant(1.0)
//!     .build();
//!
//! mcts.iterate_n_times(1000).unwrap();
//!
//! let best_move = mcts.best_action().unwrap();
//! println!("The best move is: {best_move}");
//! ```

/// Series of seeded playouts and their tally.
pub mod arena;
/// Cooperative cancellation for searches.
pub mod cancel;
pub mod config;
/// Contains the `GameState` trait, players and outcomes.
pub mod game;
pub mod games;
/// The core module of the library, containing the `MonteCarloTreeSearch` implementation.
pub mod mcts;
/// Contains the `MctsNode` struct, which represents a node in the search tree.
pub mod mcts_node;
/// Bounded playouts between two strategies.
pub mod playout;
/// Contains traits and implementations for random number generation.
pub mod random;
/// Move-choosing strategies used by the playout driver.
pub mod strategy;

pub use arena::{WinTally, count_wins};
pub use cancel::CancelToken;
pub use config::{ArenaConfig, ConfigError, SearchConfig, load_config};
pub use game::{GameError, GameOutcome, GameState, Player};
pub use mcts::{MctsEngine, MonteCarloTreeSearch, SearchError};
pub use playout::{BoundedPlayout, PlayoutError, PlayoutLimits, PlayoutRecord};
pub use strategy::{FnStrategy, MctsStrategy, RandomStrategy, Strategy};
