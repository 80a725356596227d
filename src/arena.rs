use crate::config::ArenaConfig;
use crate::game::{GameOutcome, GameState};
use crate::playout::{BoundedPlayout, PlayoutError};
use crate::random::SeededRandomGenerator;
use crate::strategy::MctsStrategy;
use tracing::{debug, info};

/// Results of a series of playouts, from the first player's point of view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WinTally {
    pub first_wins: usize,
    pub second_wins: usize,
    pub draws: usize,
}

impl WinTally {
    /// Counts `(1, -1)` as a first-player win, `(-1, 1)` as a second-player win and
    /// anything else as a draw.
    pub fn record(&mut self, outcome: &GameOutcome) {
        if *outcome == GameOutcome::FIRST_WINS {
            self.first_wins += 1;
        } else if *outcome == GameOutcome::SECOND_WINS {
            self.second_wins += 1;
        } else {
            self.draws += 1;
        }
    }

    pub fn games(&self) -> usize {
        self.first_wins + self.second_wins + self.draws
    }
}

/// Plays `games` independent playouts between two seeded tree searches and tallies the
/// results.
///
/// Game `i` seeds the first player with `seed + 2i` and the second with `seed + 2i + 1`, so
/// a tally is reproducible from its seed. The first failing playout aborts the series.
pub fn count_wins<T, F>(
    mut new_game: F,
    iterations_first: u32,
    iterations_second: u32,
    games: usize,
    config: &ArenaConfig,
    seed: u64,
) -> Result<WinTally, PlayoutError>
where
    F: FnMut() -> T,
    T: GameState + Send + 'static,
    T::Action: Send + 'static,
{
    let mut tally = WinTally::default();
    for game in 0..games {
        let game_seed = seed.wrapping_add(2 * game as u64);
        let search = config.search.clone();
        let first = MctsStrategy::from_config(
            &search.clone().with_iterations(iterations_first),
            SeededRandomGenerator::new(game_seed),
        );
        let second = MctsStrategy::from_config(
            &search.with_iterations(iterations_second),
            SeededRandomGenerator::new(game_seed.wrapping_add(1)),
        );

        let record = BoundedPlayout::new(first, second, config.limits.clone()).play(new_game())?;
        tally.record(&record.outcome);
        debug!(
            game = game + 1,
            games,
            outcome = %record.outcome,
            first_wins = tally.first_wins,
            "Game finished"
        );
    }

    info!(
        iterations_first,
        iterations_second,
        first_wins = tally.first_wins,
        second_wins = tally.second_wins,
        draws = tally.draws,
        "Series finished"
    );
    Ok(tally)
}
