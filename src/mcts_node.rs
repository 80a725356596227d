use crate::game::{GameState, Player};
use ego_tree::NodeRef;

/// Represents a single node in the Monte Carlo search tree.
///
/// Each node owns one game state together with the statistics gathered by the search.
/// Parent and child links live in the surrounding [`ego_tree::Tree`], which stores nodes
/// in a flat arena and links them by id.
#[derive(Debug, Clone)]
pub struct MctsNode<T: GameState> {
    /// The game state that this node represents.
    pub state: T,
    /// The action that led to this node's state from its parent. `None` for the root node.
    pub action: Option<T::Action>,
    /// Cached `state.is_terminal()`.
    pub is_terminal: bool,
    /// The number of times this node has been visited during the search.
    pub visits: u32,
    /// Sum of all rollout results backed up through this node, indexed by player.
    pub total_score: [f64; 2],
}

impl<T: GameState> MctsNode<T> {
    /// Creates a new root node with no statistics.
    pub fn new(state: T) -> Self {
        let is_terminal = state.is_terminal();
        MctsNode {
            state,
            action: None,
            is_terminal,
            visits: 0,
            total_score: [0.0, 0.0],
        }
    }

    /// Creates the node reached from a parent by `action`.
    pub fn with_action(state: T, action: T::Action) -> Self {
        let mut node = MctsNode::new(state);
        node.action = Some(action);
        node
    }

    /// Average score of this node from `perspective`, or zero before the first visit.
    pub fn mean_score(&self, perspective: Player) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.total_score[perspective.index()] / f64::from(self.visits)
        }
    }

    /// UCB1 variant used during selection.
    ///
    /// Unvisited nodes score positive infinity so that every sibling is tried once before
    /// any value estimate is trusted.
    pub fn ucb_score(
        &self,
        perspective: Player,
        parent_visits: u32,
        exploration_constant: f64,
    ) -> f64 {
        if self.visits == 0 {
            return f64::INFINITY;
        }

        let exploitation = self.total_score[perspective.index()] / f64::from(self.visits);
        let exploration = exploration_constant
            * f64::sqrt(f64::ln(f64::from(parent_visits)) / (1.0 + f64::from(self.visits)));
        exploitation + exploration
    }
}

/// Returns `true` once `node` has one child per legal action of its state.
///
/// The legal actions are recomputed on every call.
pub fn is_fully_expanded<T: GameState>(node: NodeRef<'_, MctsNode<T>>) -> bool {
    node.children().count() == node.value().state.legal_actions().len()
}

/// Returns the child with the highest UCB score from `perspective`.
///
/// Ties go to the first maximal child in child order. `None` if `node` has no children.
pub fn best_child<'a, T: GameState>(
    node: NodeRef<'a, MctsNode<T>>,
    perspective: Player,
    exploration_constant: f64,
) -> Option<NodeRef<'a, MctsNode<T>>> {
    let parent_visits = node.value().visits;
    let mut best: Option<(f64, NodeRef<'a, MctsNode<T>>)> = None;
    for child in node.children() {
        let score = child
            .value()
            .ucb_score(perspective, parent_visits, exploration_constant);
        if best.is_none_or(|(max_score, _)| score > max_score) {
            best = Some((score, child));
        }
    }
    best.map(|(_, child)| child)
}

/// Returns the child with the most visits, the "robust child".
///
/// Ties go to the first maximal child in child order. `None` if `node` has no children.
pub fn most_visited_child<T: GameState>(
    node: NodeRef<'_, MctsNode<T>>,
) -> Option<NodeRef<'_, MctsNode<T>>> {
    let mut best: Option<NodeRef<'_, MctsNode<T>>> = None;
    for child in node.children() {
        if best.is_none_or(|current| child.value().visits > current.value().visits) {
            best = Some(child);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::count_to_n::CountToN;
    use ego_tree::Tree;

    fn expanded_root() -> Tree<MctsNode<CountToN>> {
        let root_state = CountToN::default();
        let mut tree = Tree::new(MctsNode::new(root_state.clone()));
        for action in root_state.legal_actions() {
            let child = root_state.apply(&action).unwrap();
            tree.root_mut().append(MctsNode::with_action(child, action));
        }
        tree
    }

    fn set_stats(tree: &mut Tree<MctsNode<CountToN>>, index: usize, visits: u32, first: f64) {
        let id = tree.root().children().nth(index).unwrap().id();
        let mut node = tree.get_mut(id).unwrap();
        node.value().visits = visits;
        node.value().total_score = [first, -first];
    }

    #[test]
    fn fully_expanded_tracks_child_count() {
        let root_state = CountToN::default();
        let mut tree = Tree::new(MctsNode::new(root_state.clone()));
        assert!(!is_fully_expanded(tree.root()));

        let action = root_state.legal_actions()[0];
        let child = root_state.apply(&action).unwrap();
        tree.root_mut().append(MctsNode::with_action(child, action));
        assert!(!is_fully_expanded(tree.root()));

        assert!(is_fully_expanded(expanded_root().root()));
    }

    #[test]
    fn unvisited_child_is_preferred() {
        let mut tree = expanded_root();
        tree.root_mut().value().visits = 10;
        set_stats(&mut tree, 0, 5, 5.0);
        set_stats(&mut tree, 1, 4, 4.0);

        let best = best_child(tree.root(), Player::First, 1.0).unwrap();
        assert_eq!(best.value().action, Some(3));
    }

    #[test]
    fn best_child_respects_perspective() {
        let mut tree = expanded_root();
        tree.root_mut().value().visits = 30;
        set_stats(&mut tree, 0, 10, 8.0);
        set_stats(&mut tree, 1, 10, 0.0);
        set_stats(&mut tree, 2, 10, -8.0);

        let for_first = best_child(tree.root(), Player::First, 1.0).unwrap();
        let for_second = best_child(tree.root(), Player::Second, 1.0).unwrap();
        assert_eq!(for_first.value().action, Some(1));
        assert_eq!(for_second.value().action, Some(3));
    }

    #[test]
    fn ties_resolve_to_first_child() {
        let mut tree = expanded_root();
        tree.root_mut().value().visits = 6;
        for index in 0..3 {
            set_stats(&mut tree, index, 2, 0.0);
        }
        assert_eq!(
            best_child(tree.root(), Player::First, 1.0).unwrap().value().action,
            Some(1)
        );
        assert_eq!(most_visited_child(tree.root()).unwrap().value().action, Some(1));
    }

    #[test]
    fn robust_child_ignores_average() {
        let mut tree = expanded_root();
        set_stats(&mut tree, 0, 3, 3.0);
        set_stats(&mut tree, 1, 7, -7.0);
        set_stats(&mut tree, 2, 7, 7.0);
        assert_eq!(most_visited_child(tree.root()).unwrap().value().action, Some(2));
    }

    #[test]
    fn ucb_matches_formula() {
        let mut node = MctsNode::new(CountToN::default());
        node.visits = 4;
        node.total_score = [2.0, -2.0];
        let expected = 0.5 + 1.5 * f64::sqrt(f64::ln(16.0) / 5.0);
        let actual = node.ucb_score(Player::First, 16, 1.5);
        assert!((actual - expected).abs() < 1e-12);
        assert_eq!(node.mean_score(Player::Second), -0.5);
    }
}
