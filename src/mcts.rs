use crate::cancel::CancelToken;
use crate::config::SearchConfig;
use crate::game::{GameError, GameOutcome, GameState};
use crate::mcts_node::{MctsNode, best_child, is_fully_expanded, most_visited_child};
use crate::random::{RandomGenerator, StandardRandomGenerator};
use ego_tree::{NodeId, NodeMut, NodeRef, Tree};
use thiserror::Error;
use tracing::{debug, trace};

/// Exploration constant used when none is configured.
pub const DEFAULT_EXPLORATION_CONSTANT: f64 = 1.0;

/// Errors that can occur while choosing an action.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    #[error(transparent)]
    Game(#[from] GameError),

    #[error("cannot search from a terminal state")]
    TerminalState,

    #[error("non-terminal state has no legal actions")]
    NoLegalActions,

    #[error("root has no children; run at least one iteration first")]
    NotExpanded,

    #[error("search cancelled after {completed} completed iterations")]
    Cancelled { completed: u32 },

    #[error("strategy failed: {0}")]
    Strategy(String),
}

/// The main struct for running the Monte Carlo Tree Search algorithm.
///
/// It holds one search tree, built for a single move decision and dropped afterwards, plus
/// the random number generator and the exploration constant.
pub struct MonteCarloTreeSearch<T: GameState, K: RandomGenerator> {
    tree: Tree<MctsNode<T>>,
    root_id: NodeId,
    random: K,
    exploration_constant: f64,
    cancel: CancelToken,
}

/// A builder for creating instances of `MonteCarloTreeSearch`.
pub struct MonteCarloTreeSearchBuilder<T: GameState, K: RandomGenerator> {
    state: T,
    random_generator: K,
    exploration_constant: f64,
    cancel: CancelToken,
}

impl<T: GameState> MonteCarloTreeSearchBuilder<T, StandardRandomGenerator> {
    /// Creates a new builder with the given root state.
    pub fn new(state: T) -> Self {
        Self {
            state,
            random_generator: StandardRandomGenerator,
            exploration_constant: DEFAULT_EXPLORATION_CONSTANT,
            cancel: CancelToken::new(),
        }
    }
}

impl<T: GameState, K: RandomGenerator> MonteCarloTreeSearchBuilder<T, K> {
    /// Sets the random number generator used for expansion and rollouts.
    pub fn with_random_generator<R: RandomGenerator>(
        self,
        rg: R,
    ) -> MonteCarloTreeSearchBuilder<T, R> {
        MonteCarloTreeSearchBuilder {
            state: self.state,
            random_generator: rg,
            exploration_constant: self.exploration_constant,
            cancel: self.cancel,
        }
    }

    /// Sets the weight of the exploration term in the selection score.
    pub fn with_exploration_constant(mut self, exploration_constant: f64) -> Self {
        self.exploration_constant = exploration_constant;
        self
    }

    /// Sets the token polled between iterations and rollout steps.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Builds the `MonteCarloTreeSearch` instance with the configured parameters.
    pub fn build(self) -> MonteCarloTreeSearch<T, K> {
        MonteCarloTreeSearch::new(
            self.state,
            self.random_generator,
            self.exploration_constant,
            self.cancel,
        )
    }
}

impl<T: GameState> MonteCarloTreeSearch<T, StandardRandomGenerator> {
    /// Returns a new builder for `MonteCarloTreeSearch`.
    pub fn builder(state: T) -> MonteCarloTreeSearchBuilder<T, StandardRandomGenerator> {
        MonteCarloTreeSearchBuilder::new(state)
    }
}

impl<T: GameState, K: RandomGenerator> MonteCarloTreeSearch<T, K> {
    /// Creates a new `MonteCarloTreeSearch` instance.
    ///
    /// It is recommended to use the builder pattern via `MonteCarloTreeSearch::builder()` instead.
    pub fn new(state: T, rg: K, exploration_constant: f64, cancel: CancelToken) -> Self {
        let tree = Tree::new(MctsNode::new(state));
        let root_id = tree.root().id();

        Self {
            tree,
            root_id,
            random: rg,
            exploration_constant,
            cancel,
        }
    }

    /// Returns an immutable reference to the underlying search tree.
    pub fn get_tree(&self) -> &Tree<MctsNode<T>> {
        &self.tree
    }

    /// Returns the root node of the search tree.
    pub fn get_root(&self) -> NodeRef<'_, MctsNode<T>> {
        self.node(self.root_id)
    }

    /// Performs one full iteration: selection, expansion, simulation and backpropagation.
    /// Returns the path of nodes that were updated during backpropagation, leaf first.
    pub fn do_iteration(&mut self) -> Result<Vec<NodeId>, SearchError> {
        let selected = self.select_next_node();
        let leaf = if self.node(selected).value().is_terminal {
            selected
        } else {
            self.expand_node(selected)?
        };
        let outcome = self.simulate(leaf)?;
        Ok(self.backpropagate(leaf, outcome))
    }

    /// Runs the search for `n` iterations, stopping early if the cancel token trips.
    pub fn iterate_n_times(&mut self, n: u32) -> Result<(), SearchError> {
        for completed in 0..n {
            if self.cancel.is_cancelled() {
                return Err(SearchError::Cancelled { completed });
            }
            self.do_iteration()?;
        }
        Ok(())
    }

    /// Returns the root child with the highest visit count.
    pub fn get_most_visited_child(&self) -> Option<NodeRef<'_, MctsNode<T>>> {
        most_visited_child(self.get_root())
    }

    /// Returns the action leading to the most visited root child.
    pub fn best_action(&self) -> Result<T::Action, SearchError> {
        self.get_most_visited_child()
            .and_then(|child| child.value().action.clone())
            .ok_or(SearchError::NotExpanded)
    }

    /// Visit counts of the root children, in child order.
    pub fn root_child_visits(&self) -> Vec<(T::Action, u32)> {
        self.get_root()
            .children()
            .filter_map(|child| {
                let node = child.value();
                node.action.clone().map(|action| (action, node.visits))
            })
            .collect()
    }

    /// Descends from the root while nodes are fully expanded, following the best UCB child
    /// for the player to move. Stops at a terminal node or one that still needs expanding.
    fn select_next_node(&self) -> NodeId {
        let mut current = self.get_root();
        while !current.value().is_terminal && is_fully_expanded(current) {
            let perspective = current.value().state.player_to_move();
            match best_child(current, perspective, self.exploration_constant) {
                Some(child) => current = child,
                None => break,
            }
        }
        current.id()
    }

    /// Creates one child per legal action of the node and returns a uniformly random one.
    fn expand_node(&mut self, node_id: NodeId) -> Result<NodeId, SearchError> {
        let node = self.node(node_id);
        let mut children = Vec::new();
        if !node.has_children() {
            let state = &node.value().state;
            for action in state.legal_actions() {
                let child_state = state.apply(&action)?;
                children.push(MctsNode::with_action(child_state, action));
            }
        }

        let mut parent = self.node_mut(node_id);
        let new_ids: Vec<NodeId> = children
            .into_iter()
            .map(|child| parent.append(child).id())
            .collect();
        trace!(children = new_ids.len(), "expanded node");

        self.random
            .pick(&new_ids)
            .copied()
            .ok_or(SearchError::NoLegalActions)
    }

    /// Plays uniformly random actions from the node's state to the end of the game.
    fn simulate(&mut self, node_id: NodeId) -> Result<GameOutcome, SearchError> {
        let completed = self.get_root().value().visits;
        let state = self.node(node_id).value().state.clone();
        match play_out(state, &mut self.random, &self.cancel) {
            Err(SearchError::Cancelled { .. }) => Err(SearchError::Cancelled { completed }),
            other => other,
        }
    }

    /// Adds the rollout result to every node from the leaf up to the root.
    fn backpropagate(&mut self, node_id: NodeId, outcome: GameOutcome) -> Vec<NodeId> {
        let mut branch = vec![node_id];
        branch.extend(self.node(node_id).ancestors().map(|ancestor| ancestor.id()));

        let scores = outcome.scores();
        for &id in &branch {
            let mut node = self.node_mut(id);
            let stats = node.value();
            stats.visits += 1;
            stats.total_score[0] += scores[0];
            stats.total_score[1] += scores[1];
        }

        branch
    }

    // Node ids are only produced by this tree, which never removes nodes.
    fn node(&self, id: NodeId) -> NodeRef<'_, MctsNode<T>> {
        self.tree.get(id).expect("node id belongs to this search tree")
    }

    fn node_mut(&mut self, id: NodeId) -> NodeMut<'_, MctsNode<T>> {
        self.tree
            .get_mut(id)
            .expect("node id belongs to this search tree")
    }
}

/// Applies uniformly random legal actions from `state` until the game ends and returns the
/// final result. Never touches a search tree.
pub fn rollout<T: GameState, K: RandomGenerator>(
    state: &T,
    random: &mut K,
    cancel: &CancelToken,
) -> Result<GameOutcome, SearchError> {
    play_out(state.clone(), random, cancel)
}

fn play_out<T: GameState, K: RandomGenerator>(
    mut current: T,
    random: &mut K,
    cancel: &CancelToken,
) -> Result<GameOutcome, SearchError> {
    while !current.is_terminal() {
        if cancel.is_cancelled() {
            return Err(SearchError::Cancelled { completed: 0 });
        }
        let actions = current.legal_actions();
        let action = random.pick(&actions).ok_or(SearchError::NoLegalActions)?;
        current = current.apply(action)?;
    }
    Ok(current.result()?)
}

/// Chooses actions by building a fresh search tree for every decision.
#[derive(Debug, Clone)]
pub struct MctsEngine<K: RandomGenerator> {
    random: K,
    exploration_constant: f64,
}

impl<K: RandomGenerator> MctsEngine<K> {
    pub fn new(random: K) -> Self {
        Self {
            random,
            exploration_constant: DEFAULT_EXPLORATION_CONSTANT,
        }
    }

    pub fn from_config(config: &SearchConfig, random: K) -> Self {
        Self::new(random).with_exploration_constant(config.exploration_constant)
    }

    pub fn with_exploration_constant(mut self, exploration_constant: f64) -> Self {
        self.exploration_constant = exploration_constant;
        self
    }

    /// Runs `iterations` search iterations from `state` and returns the robust child's action.
    pub fn choose_action<T: GameState>(
        &mut self,
        state: &T,
        iterations: u32,
    ) -> Result<T::Action, SearchError> {
        self.choose_action_until(state, iterations, &CancelToken::new())
    }

    /// Same as [`MctsEngine::choose_action`], but gives up once `cancel` trips.
    pub fn choose_action_until<T: GameState>(
        &mut self,
        state: &T,
        iterations: u32,
        cancel: &CancelToken,
    ) -> Result<T::Action, SearchError> {
        if state.is_terminal() {
            return Err(SearchError::TerminalState);
        }

        let mut search = MonteCarloTreeSearch::builder(state.clone())
            .with_random_generator(&mut self.random)
            .with_exploration_constant(self.exploration_constant)
            .with_cancel_token(cancel.clone())
            .build();
        search.iterate_n_times(iterations)?;

        let action = search.best_action()?;
        debug!(
            iterations,
            action = ?action,
            visits = ?search.root_child_visits(),
            "search finished"
        );
        Ok(action)
    }
}
