extern crate mcts_arena;

use mcts_arena::config::load_config;
use mcts_arena::games::count_to_n::CountToN;
use mcts_arena::mcts::MonteCarloTreeSearch;
use mcts_arena::playout::BoundedPlayout;
use mcts_arena::random::SeededRandomGenerator;
use mcts_arena::strategy::MctsStrategy;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_config()?;

    // Search the opening position and print how often each move was tried
    let mut mcts = MonteCarloTreeSearch::builder(CountToN::default())
        .with_random_generator(SeededRandomGenerator::new(21))
        .with_exploration_constant(config.search.exploration_constant)
        .build();
    mcts.iterate_n_times(config.search.iterations)?;

    for (action, visits) in mcts.root_child_visits() {
        println!("Move: {action} = {visits} visits");
    }
    println!("The best move is: {}", mcts.best_action()?);

    // Play a whole game between two searches
    let first = MctsStrategy::from_config(&config.search, SeededRandomGenerator::new(1));
    let second = MctsStrategy::from_config(&config.search, SeededRandomGenerator::new(2));
    let playout = BoundedPlayout::new(first, second, config.limits.clone());
    let record = playout.play(CountToN::default())?;

    for played in &record.moves {
        println!("{} says {}", played.player, played.action);
    }
    println!(
        "Outcome {} after {} moves in {:.2?}",
        record.outcome,
        record.moves.len(),
        record.elapsed
    );
    Ok(())
}
