//! Plays complete games between two strategies under time and step ceilings.
//!
//! Every move is computed on its own worker thread and raced against the per-move
//! timeout. A move that misses its deadline aborts the whole playout: the worker's cancel
//! token is tripped so a cooperative strategy unwinds, and whatever it eventually returns
//! is dropped. Nothing is retried here; callers decide whether to replay the game.

use crate::cancel::CancelToken;
use crate::game::{GameError, GameOutcome, GameState, Player};
use crate::mcts::SearchError;
use crate::strategy::Strategy;
use serde::{Deserialize, Serialize};
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that end a playout.
#[derive(Debug, Error)]
pub enum PlayoutError {
    #[error(transparent)]
    Game(#[from] GameError),

    #[error("{player} did not choose a move within {timeout:?} ({moves_played} moves played)")]
    MoveTimeout {
        player: Player,
        moves_played: usize,
        timeout: Duration,
    },

    #[error("playout exceeded the ceiling of {max_moves} moves")]
    StepCeilingExceeded { max_moves: usize },

    #[error("playout ran for {elapsed:?}, over the {limit:?} ceiling")]
    TimeCeilingExceeded { elapsed: Duration, limit: Duration },

    #[error("{player} failed to choose a move: {source}")]
    Strategy {
        player: Player,
        #[source]
        source: SearchError,
    },

    #[error("strategy of {player} panicked")]
    StrategyPanicked { player: Player },

    #[error("strategy of {player} is still computing a move abandoned after a timeout")]
    StrategyBusy { player: Player },

    #[error("failed to spawn move worker: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Time and step ceilings for one playout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayoutLimits {
    /// Budget for a single move decision.
    #[serde(with = "crate::config::duration_secs")]
    pub per_move_timeout: Duration,
    /// Number of moves after which the game is considered runaway.
    pub max_moves: usize,
    /// Wall-clock budget for the whole game.
    #[serde(with = "crate::config::duration_secs")]
    pub max_total_time: Duration,
}

impl Default for PlayoutLimits {
    fn default() -> Self {
        Self {
            per_move_timeout: Duration::from_secs(30),
            max_moves: 90,
            max_total_time: Duration::from_secs(1000),
        }
    }
}

impl PlayoutLimits {
    pub fn with_per_move_timeout(mut self, timeout: Duration) -> Self {
        self.per_move_timeout = timeout;
        self
    }

    pub fn with_max_moves(mut self, max_moves: usize) -> Self {
        self.max_moves = max_moves;
        self
    }

    pub fn with_max_total_time(mut self, max_total_time: Duration) -> Self {
        self.max_total_time = max_total_time;
        self
    }
}

/// One applied action and the state it produced.
#[derive(Debug, Clone)]
pub struct PlayedMove<T: GameState> {
    pub player: Player,
    pub action: T::Action,
    pub state: T,
}

/// Everything that happened in a finished playout.
#[derive(Debug, Clone)]
pub struct PlayoutRecord<T: GameState> {
    pub initial: T,
    pub moves: Vec<PlayedMove<T>>,
    pub outcome: GameOutcome,
    pub elapsed: Duration,
}

impl<T: GameState> PlayoutRecord<T> {
    pub fn final_state(&self) -> &T {
        self.moves.last().map_or(&self.initial, |played| &played.state)
    }
}

/// Where a strategy lives between moves. A worker takes it out of the slot for one move
/// and puts it back when done; the lock is only held to swap the contents.
enum Slot<T: GameState> {
    Idle(Box<dyn Strategy<T>>),
    /// Lent to a worker that has not returned it yet.
    Busy,
    /// Its worker panicked; the strategy is gone.
    Lost,
}

type SharedStrategy<T> = Arc<Mutex<Slot<T>>>;

/// Alternates two strategies over a game until it ends or a limit trips.
pub struct BoundedPlayout<T: GameState> {
    strategies: [SharedStrategy<T>; 2],
    limits: PlayoutLimits,
}

impl<T> BoundedPlayout<T>
where
    T: GameState + Send + 'static,
    T::Action: Send + 'static,
{
    pub fn new(
        first: impl Strategy<T> + 'static,
        second: impl Strategy<T> + 'static,
        limits: PlayoutLimits,
    ) -> Self {
        Self {
            strategies: [share(first), share(second)],
            limits,
        }
    }

    pub fn limits(&self) -> &PlayoutLimits {
        &self.limits
    }

    /// Plays `initial` to the end and returns the full record.
    pub fn play(&self, initial: T) -> Result<PlayoutRecord<T>, PlayoutError> {
        let start = Instant::now();
        let mut state = initial.clone();
        let mut moves: Vec<PlayedMove<T>> = Vec::new();
        info!(
            per_move_timeout = ?self.limits.per_move_timeout,
            max_moves = self.limits.max_moves,
            max_total_time = ?self.limits.max_total_time,
            "Starting playout"
        );

        while !state.is_terminal() {
            let player = state.player_to_move();
            let action = self.request_move(player, &state, moves.len())?;
            let next = state.apply(&action)?;
            debug!(%player, ?action, moves = moves.len() + 1, "Applied move");
            moves.push(PlayedMove {
                player,
                action,
                state: next.clone(),
            });
            state = next;

            if moves.len() > self.limits.max_moves {
                warn!(max_moves = self.limits.max_moves, "Step ceiling exceeded");
                return Err(PlayoutError::StepCeilingExceeded {
                    max_moves: self.limits.max_moves,
                });
            }
            let elapsed = start.elapsed();
            if elapsed > self.limits.max_total_time {
                warn!(?elapsed, limit = ?self.limits.max_total_time, "Time ceiling exceeded");
                return Err(PlayoutError::TimeCeilingExceeded {
                    elapsed,
                    limit: self.limits.max_total_time,
                });
            }
        }

        let outcome = state.result()?;
        let elapsed = start.elapsed();
        info!(moves = moves.len(), %outcome, ?elapsed, "Playout finished");
        Ok(PlayoutRecord {
            initial,
            moves,
            outcome,
            elapsed,
        })
    }

    /// Asks `player`'s strategy for a move on a worker thread, waiting at most the per-move
    /// timeout.
    fn request_move(
        &self,
        player: Player,
        state: &T,
        moves_played: usize,
    ) -> Result<T::Action, PlayoutError> {
        let timeout = self.limits.per_move_timeout;
        let cancel = CancelToken::with_timeout(timeout);
        let (tx, rx) = mpsc::channel();

        let slot = Arc::clone(&self.strategies[player.index()]);
        let mut strategy = checkout(&slot, player)?;
        let worker_slot = Arc::clone(&slot);
        let worker_state = state.clone();
        let worker_cancel = cancel.clone();
        let spawned = thread::Builder::new()
            .name(format!("move-worker-{}", player.index()))
            .spawn(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    strategy.choose_action(&worker_state, &worker_cancel)
                }));
                match result {
                    Ok(result) => {
                        store(&worker_slot, Slot::Idle(strategy));
                        // The driver may have stopped listening after a timeout.
                        let _ = tx.send(result);
                    }
                    // Dropping the sender unsent reads as a panic on the other end.
                    Err(_) => store(&worker_slot, Slot::Lost),
                }
            });
        if let Err(err) = spawned {
            store(&slot, Slot::Lost);
            return Err(PlayoutError::Spawn(err));
        }

        match rx.recv_timeout(timeout) {
            Ok(Ok(action)) => Ok(action),
            Ok(Err(SearchError::Cancelled { .. })) | Err(RecvTimeoutError::Timeout) => {
                cancel.cancel();
                warn!(%player, ?timeout, moves_played, "Move timed out");
                Err(PlayoutError::MoveTimeout {
                    player,
                    moves_played,
                    timeout,
                })
            }
            Ok(Err(source)) => Err(PlayoutError::Strategy { player, source }),
            Err(RecvTimeoutError::Disconnected) => Err(PlayoutError::StrategyPanicked { player }),
        }
    }
}

fn share<T: GameState>(strategy: impl Strategy<T> + 'static) -> SharedStrategy<T> {
    let boxed: Box<dyn Strategy<T>> = Box::new(strategy);
    Arc::new(Mutex::new(Slot::Idle(boxed)))
}

/// Takes the strategy out of its slot, leaving it marked busy.
fn checkout<T: GameState>(
    slot: &SharedStrategy<T>,
    player: Player,
) -> Result<Box<dyn Strategy<T>>, PlayoutError> {
    let mut guard = slot
        .lock()
        .map_err(|_| PlayoutError::StrategyPanicked { player })?;
    match mem::replace(&mut *guard, Slot::Busy) {
        Slot::Idle(strategy) => Ok(strategy),
        Slot::Busy => Err(PlayoutError::StrategyBusy { player }),
        Slot::Lost => {
            *guard = Slot::Lost;
            Err(PlayoutError::StrategyPanicked { player })
        }
    }
}

fn store<T: GameState>(slot: &SharedStrategy<T>, value: Slot<T>) {
    // The lock is never held across a strategy call, so it cannot be poisoned by one.
    if let Ok(mut guard) = slot.lock() {
        *guard = value;
    }
}

/// Plays one game between two strategies and returns its record.
pub fn play<T>(
    initial: T,
    first: impl Strategy<T> + 'static,
    second: impl Strategy<T> + 'static,
    limits: PlayoutLimits,
) -> Result<PlayoutRecord<T>, PlayoutError>
where
    T: GameState + Send + 'static,
    T::Action: Send + 'static,
{
    BoundedPlayout::new(first, second, limits).play(initial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::count_to_n::CountToN;
    use crate::games::tic_tac_toe::TicTacToe;
    use crate::random::SeededRandomGenerator;
    use crate::strategy::{FnStrategy, MctsStrategy, RandomStrategy};

    fn first_legal(state: &CountToN, _: &CancelToken) -> Result<u32, SearchError> {
        Ok(state.legal_actions()[0])
    }

    fn random(seed: u64) -> RandomStrategy<SeededRandomGenerator> {
        RandomStrategy::new(SeededRandomGenerator::new(seed))
    }

    #[test]
    fn record_follows_the_rules() {
        let record = play(
            TicTacToe::default(),
            random(1),
            random(2),
            PlayoutLimits::default(),
        )
        .unwrap();

        let mut previous = &record.initial;
        for played in &record.moves {
            assert_eq!(played.player, previous.player_to_move());
            assert!(previous.legal_actions().contains(&played.action));
            previous = &played.state;
        }
        assert!(record.final_state().is_terminal());
        assert_eq!(record.outcome, record.final_state().result().unwrap());
    }

    #[test]
    fn hanging_strategy_times_out_without_moving() {
        let sleeper = FnStrategy(|state: &CountToN, _: &CancelToken| {
            thread::sleep(Duration::from_secs(2));
            Ok::<_, SearchError>(state.legal_actions()[0])
        });
        let limits = PlayoutLimits::default().with_per_move_timeout(Duration::from_millis(100));

        let started = Instant::now();
        let err = play(CountToN::default(), FnStrategy(first_legal), sleeper, limits).unwrap_err();

        assert!(matches!(
            err,
            PlayoutError::MoveTimeout {
                player: Player::Second,
                moves_played: 1,
                ..
            }
        ));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn cooperative_search_unwinds_on_timeout() {
        let limits = PlayoutLimits::default().with_per_move_timeout(Duration::from_millis(50));
        let err = play(
            TicTacToe::default(),
            MctsStrategy::seeded(u32::MAX, 1),
            MctsStrategy::seeded(u32::MAX, 2),
            limits,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PlayoutError::MoveTimeout {
                player: Player::First,
                moves_played: 0,
                ..
            }
        ));
    }

    #[test]
    fn step_ceiling_trips() {
        let limits = PlayoutLimits::default().with_max_moves(3);
        let err = play(CountToN::default(), random(3), random(4), limits).unwrap_err();
        assert!(matches!(
            err,
            PlayoutError::StepCeilingExceeded { max_moves: 3 }
        ));
    }

    #[test]
    fn time_ceiling_trips() {
        let slow = |state: &CountToN, _: &CancelToken| {
            thread::sleep(Duration::from_millis(20));
            Ok::<_, SearchError>(state.legal_actions()[0])
        };
        let limits = PlayoutLimits::default().with_max_total_time(Duration::from_millis(30));
        let err = play(CountToN::default(), FnStrategy(slow), FnStrategy(slow), limits)
            .unwrap_err();
        assert!(matches!(err, PlayoutError::TimeCeilingExceeded { .. }));
    }

    #[test]
    fn illegal_action_is_surfaced() {
        let cheat = |_: &CountToN, _: &CancelToken| Ok::<_, SearchError>(99);
        let err = play(
            CountToN::default(),
            FnStrategy(cheat),
            random(5),
            PlayoutLimits::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PlayoutError::Game(GameError::InvalidAction { .. })
        ));
    }

    #[test]
    fn strategy_failure_is_attributed() {
        let offline = |_: &CountToN, _: &CancelToken| {
            Err::<u32, _>(SearchError::Strategy("model offline".into()))
        };
        let err = play(
            CountToN::default(),
            random(6),
            FnStrategy(offline),
            PlayoutLimits::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PlayoutError::Strategy {
                player: Player::Second,
                ..
            }
        ));
    }

    #[test]
    fn panicking_strategy_is_reported() {
        let broken = |_: &CountToN, _: &CancelToken| -> Result<u32, SearchError> {
            panic!("strategy bug");
        };
        let err = play(
            CountToN::default(),
            FnStrategy(broken),
            random(7),
            PlayoutLimits::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PlayoutError::StrategyPanicked {
                player: Player::First
            }
        ));
    }

    #[test]
    fn driver_can_be_reused() {
        let playout = BoundedPlayout::new(random(8), random(9), PlayoutLimits::default());
        for _ in 0..3 {
            let record = playout.play(CountToN::default()).unwrap();
            assert!(record.outcome.winner().is_some());
        }
        assert_eq!(playout.limits().max_moves, 90);
    }

    #[test]
    fn driver_recovers_once_abandoned_move_returns() {
        let mut calls = 0;
        let slow_start = FnStrategy(move |state: &CountToN, _: &CancelToken| {
            calls += 1;
            if calls == 1 {
                thread::sleep(Duration::from_millis(800));
            }
            Ok::<_, SearchError>(state.legal_actions()[0])
        });
        let limits = PlayoutLimits::default().with_per_move_timeout(Duration::from_millis(100));
        let playout = BoundedPlayout::new(slow_start, random(10), limits);

        let err = playout.play(CountToN::default()).unwrap_err();
        assert!(matches!(
            err,
            PlayoutError::MoveTimeout {
                player: Player::First,
                moves_played: 0,
                ..
            }
        ));

        // The first call is still sleeping on its worker.
        let err = playout.play(CountToN::default()).unwrap_err();
        assert!(matches!(
            err,
            PlayoutError::StrategyBusy {
                player: Player::First
            }
        ));

        thread::sleep(Duration::from_millis(1500));
        let record = playout.play(CountToN::default()).unwrap();
        assert!(record.final_state().is_terminal());
    }

    #[test]
    fn panicked_strategy_stays_unavailable() {
        let broken = |_: &CountToN, _: &CancelToken| -> Result<u32, SearchError> {
            panic!("strategy bug");
        };
        let playout = BoundedPlayout::new(FnStrategy(broken), random(11), PlayoutLimits::default());
        for _ in 0..2 {
            assert!(matches!(
                playout.play(CountToN::default()),
                Err(PlayoutError::StrategyPanicked {
                    player: Player::First
                })
            ));
        }
    }
}
