use crate::cancel::CancelToken;
use crate::config::SearchConfig;
use crate::game::GameState;
use crate::mcts::{MctsEngine, SearchError};
use crate::random::{RandomGenerator, SeededRandomGenerator};

/// Something that picks the next action for the player to move.
///
/// The playout driver runs each call on its own worker thread and trips `cancel` when the
/// per-move budget runs out. Implementations should poll it if they can run long; one
/// that ignores it is abandoned and its eventual answer discarded.
pub trait Strategy<T: GameState>: Send {
    fn choose_action(
        &mut self,
        state: &T,
        cancel: &CancelToken,
    ) -> Result<T::Action, SearchError>;
}

/// Plays the robust child of a fresh tree search with a fixed iteration budget.
#[derive(Debug, Clone)]
pub struct MctsStrategy<K: RandomGenerator> {
    engine: MctsEngine<K>,
    iterations: u32,
}

impl<K: RandomGenerator> MctsStrategy<K> {
    pub fn new(engine: MctsEngine<K>, iterations: u32) -> Self {
        Self { engine, iterations }
    }

    pub fn from_config(config: &SearchConfig, random: K) -> Self {
        Self::new(MctsEngine::from_config(config, random), config.iterations)
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }
}

impl MctsStrategy<SeededRandomGenerator> {
    /// A reproducible strategy with the default exploration constant.
    pub fn seeded(iterations: u32, seed: u64) -> Self {
        Self::new(MctsEngine::new(SeededRandomGenerator::new(seed)), iterations)
    }
}

impl<T: GameState, K: RandomGenerator + Send> Strategy<T> for MctsStrategy<K> {
    fn choose_action(
        &mut self,
        state: &T,
        cancel: &CancelToken,
    ) -> Result<T::Action, SearchError> {
        self.engine.choose_action_until(state, self.iterations, cancel)
    }
}

/// Plays a uniformly random legal action.
#[derive(Debug, Clone, Default)]
pub struct RandomStrategy<K: RandomGenerator> {
    random: K,
}

impl<K: RandomGenerator> RandomStrategy<K> {
    pub fn new(random: K) -> Self {
        Self { random }
    }
}

impl<T: GameState, K: RandomGenerator + Send> Strategy<T> for RandomStrategy<K> {
    fn choose_action(
        &mut self,
        state: &T,
        _cancel: &CancelToken,
    ) -> Result<T::Action, SearchError> {
        if state.is_terminal() {
            return Err(SearchError::TerminalState);
        }
        let actions = state.legal_actions();
        self.random
            .pick(&actions)
            .cloned()
            .ok_or(SearchError::NoLegalActions)
    }
}

/// Wraps a closure, e.g. a human prompt or a remote model client, as a strategy.
pub struct FnStrategy<F>(pub F);

impl<T, F> Strategy<T> for FnStrategy<F>
where
    T: GameState,
    F: FnMut(&T, &CancelToken) -> Result<T::Action, SearchError> + Send,
{
    fn choose_action(
        &mut self,
        state: &T,
        cancel: &CancelToken,
    ) -> Result<T::Action, SearchError> {
        (self.0)(state, cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::count_to_n::CountToN;
    use crate::games::kayles::Kayles;

    #[test]
    fn mcts_strategy_uses_its_budget() {
        let mut strategy = MctsStrategy::seeded(300, 5);
        let state = CountToN::default();
        let action = strategy.choose_action(&state, &CancelToken::new()).unwrap();
        assert!(state.legal_actions().contains(&action));
        assert_eq!(strategy.iterations(), 300);
    }

    #[test]
    fn random_strategy_picks_legal_actions() {
        let mut strategy = RandomStrategy::new(SeededRandomGenerator::new(1));
        let mut state = Kayles::default();
        while !state.is_terminal() {
            let action = strategy.choose_action(&state, &CancelToken::new()).unwrap();
            assert!(state.legal_actions().contains(&action));
            state = state.apply(&action).unwrap();
        }
        assert_eq!(
            Strategy::<Kayles>::choose_action(&mut strategy, &state, &CancelToken::new()),
            Err(SearchError::TerminalState)
        );
    }

    #[test]
    fn closures_are_strategies() {
        let mut calls = 0;
        let mut strategy = FnStrategy(|state: &CountToN, _: &CancelToken| {
            calls += 1;
            Ok::<_, SearchError>(state.legal_actions()[0])
        });
        let action = strategy
            .choose_action(&CountToN::default(), &CancelToken::new())
            .unwrap();
        assert_eq!(action, 1);
        drop(strategy);
        assert_eq!(calls, 1);
    }
}
