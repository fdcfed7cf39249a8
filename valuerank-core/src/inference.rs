/// Preference graph and transitive inference.
///
/// Every recorded decision is a directed edge winner -> loser. If a chain of
/// explicit wins already leads from A to B, asking the user "A or B?" is
/// redundant. The adjacency is maintained incrementally and reachability sets
/// are memoized per source until the next edge arrives.
///
/// `PreferenceGraph` works on store indices. `reachable_in_history` answers
/// the same question by name, straight from a saved decision list.
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use crate::types::{Decision, Side};

/// What history says about an unordered pair `(left, right)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Implication {
    /// No chain in either direction.
    Undetermined,
    /// A chain exists only from the given side to the other.
    Implied(Side),
    /// Chains exist in both directions: the evidence contains a cycle.
    Contradictory,
}

#[derive(Debug, Clone, Default)]
pub struct PreferenceGraph {
    /// `beaten[i]` lists every item `i` has an explicit win over (deduplicated).
    beaten: Vec<Vec<usize>>,
    /// Memoized reachability per source, cleared on every new edge.
    reach_cache: RefCell<HashMap<usize, Vec<bool>>>,
}

impl PreferenceGraph {
    pub fn new(num_items: usize) -> Self {
        PreferenceGraph {
            beaten: vec![Vec::new(); num_items],
            reach_cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn num_items(&self) -> usize {
        self.beaten.len()
    }

    /// Add the edge winner -> loser. Repeated edges are stored once.
    pub fn record(&mut self, winner: usize, loser: usize) {
        if self.beaten[winner].contains(&loser) {
            return;
        }
        self.beaten[winner].push(loser);
        self.reach_cache.get_mut().clear();
    }

    /// True iff a chain of explicit wins leads from `from` to `to`.
    /// An item trivially reaches itself.
    pub fn is_reachable(&self, from: usize, to: usize) -> bool {
        if let Some(set) = self.reach_cache.borrow().get(&from) {
            return set[to];
        }
        let set = self.reachable_set(from);
        let result = set[to];
        self.reach_cache.borrow_mut().insert(from, set);
        result
    }

    fn reachable_set(&self, from: usize) -> Vec<bool> {
        let mut visited = vec![false; self.beaten.len()];
        let mut queue = VecDeque::new();
        visited[from] = true;
        queue.push_back(from);
        while let Some(curr) = queue.pop_front() {
            for &next in &self.beaten[curr] {
                if !visited[next] {
                    visited[next] = true;
                    queue.push_back(next);
                }
            }
        }
        visited
    }

    /// Shortest chain of wins from `from` to `to`, both ends included.
    pub fn path(&self, from: usize, to: usize) -> Option<Vec<usize>> {
        let n = self.beaten.len();
        let mut parent: Vec<Option<usize>> = vec![None; n];
        let mut visited = vec![false; n];
        let mut queue = VecDeque::new();
        visited[from] = true;
        queue.push_back(from);

        while let Some(curr) = queue.pop_front() {
            if curr == to {
                let mut chain = vec![to];
                let mut node = to;
                while let Some(p) = parent[node] {
                    chain.push(p);
                    node = p;
                }
                chain.reverse();
                return Some(chain);
            }
            for &next in &self.beaten[curr] {
                if !visited[next] {
                    visited[next] = true;
                    parent[next] = Some(curr);
                    queue.push_back(next);
                }
            }
        }
        None
    }

    pub fn classify(&self, left: usize, right: usize) -> Implication {
        let left_beats_right = self.is_reachable(left, right);
        let right_beats_left = self.is_reachable(right, left);
        match (left_beats_right, right_beats_left) {
            (true, true) => Implication::Contradictory,
            (true, false) => Implication::Implied(Side::Left),
            (false, true) => Implication::Implied(Side::Right),
            (false, false) => Implication::Undetermined,
        }
    }
}

/// Reachability computed directly from a decision history by name, rebuilding
/// the graph on every call. Equivalent to `PreferenceGraph::is_reachable` for
/// a graph built from the same history.
pub fn reachable_in_history(decisions: &[Decision], from: &str, to: &str) -> bool {
    let mut graph: HashMap<&str, Vec<&str>> = HashMap::new();
    for d in decisions {
        graph.entry(d.winner.as_str()).or_default().push(d.loser.as_str());
    }

    let mut queue = VecDeque::from([from]);
    let mut visited = std::collections::HashSet::new();
    while let Some(curr) = queue.pop_front() {
        if curr == to {
            return true;
        }
        if !visited.insert(curr) {
            continue;
        }
        if let Some(next) = graph.get(curr) {
            queue.extend(next.iter().copied().filter(|n| !visited.contains(n)));
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decision(w: &str, l: &str) -> Decision {
        Decision {
            winner: w.into(),
            loser: l.into(),
            timestamp: 0,
            duration_ms: 1000,
            was_auto: false,
        }
    }

    // A=0 B=1 C=2 D=3
    fn chain_graph() -> PreferenceGraph {
        let mut g = PreferenceGraph::new(4);
        g.record(0, 1); // A > B
        g.record(1, 2); // B > C
        g
    }

    #[test]
    fn test_transitive_chain() {
        let g = chain_graph();
        assert!(g.is_reachable(0, 2));
        assert!(!g.is_reachable(2, 0));
        assert!(!g.is_reachable(0, 3));
        assert_eq!(g.classify(0, 2), Implication::Implied(Side::Left));
        assert_eq!(g.classify(2, 0), Implication::Implied(Side::Right));
        assert_eq!(g.classify(0, 3), Implication::Undetermined);
    }

    #[test]
    fn test_cache_invalidated_by_new_edge() {
        let mut g = chain_graph();
        assert!(!g.is_reachable(2, 3));
        g.record(2, 3);
        assert!(g.is_reachable(2, 3));
        assert!(g.is_reachable(0, 3));
    }

    #[test]
    fn test_cycle_is_contradictory() {
        let mut g = chain_graph();
        g.record(2, 0); // C > A closes the cycle
        assert_eq!(g.classify(0, 2), Implication::Contradictory);
        assert_eq!(g.classify(0, 1), Implication::Contradictory);
    }

    #[test]
    fn test_path_reports_shortest_chain() {
        let mut g = chain_graph();
        g.record(2, 3);
        assert_eq!(g.path(0, 3), Some(vec![0, 1, 2, 3]));
        g.record(0, 3);
        assert_eq!(g.path(0, 3), Some(vec![0, 3]));
        assert_eq!(g.path(3, 0), None);
    }

    #[test]
    fn test_history_reachability_matches_graph() {
        let history = vec![decision("A", "B"), decision("B", "C"), decision("D", "A")];
        assert!(reachable_in_history(&history, "A", "C"));
        assert!(reachable_in_history(&history, "D", "C"));
        assert!(!reachable_in_history(&history, "C", "A"));
        assert!(!reachable_in_history(&history, "B", "D"));

        let mut g = PreferenceGraph::new(4);
        g.record(0, 1);
        g.record(1, 2);
        g.record(3, 0);
        assert!(g.is_reachable(3, 2));
        assert!(!g.is_reachable(1, 3));
    }
}
