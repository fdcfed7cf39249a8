/// Phase-aware pair selection.
///
/// Two phases over never-faced pairs, then a fallback once every pair has met:
///   Discovery:  largest combined RD first, to shrink uncertainty fast.
///   Tournament: smallest rating gap first, where the order is least settled.
///   Exhausted:  rematch the current rating leaders.
///
/// The pair shown immediately before is never returned again while any other
/// candidate exists.
use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::store::ItemStore;
use crate::types::IndexedPair;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Discovery,
    Tournament,
    Exhausted,
}

/// A chosen pair plus the phase that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub pair: IndexedPair,
    pub phase: Phase,
}

/// Order-insensitive pair equality.
pub fn same_pair(a: IndexedPair, b: IndexedPair) -> bool {
    (a.0 == b.0 && a.1 == b.1) || (a.0 == b.1 && a.1 == b.0)
}

/// Phase implied by the decision count alone, ignoring exhaustion.
pub fn phase_for(total_decisions: usize, discovery_cutoff: usize) -> Phase {
    if total_decisions < discovery_cutoff {
        Phase::Discovery
    } else {
        Phase::Tournament
    }
}

/// Every pair (i < j) that has never been compared, in catalogue order.
pub fn unplayed_pairs(store: &ItemStore) -> Vec<IndexedPair> {
    let n = store.len();
    let mut pairs = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            if !store.have_faced(i, j) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

/// Pick the next pair to present.
///
/// `store` must hold at least two items (guaranteed by `ItemStore`'s constructors).
pub fn select_next_pair(
    store: &ItemStore,
    total_decisions: usize,
    discovery_cutoff: usize,
    previous: Option<IndexedPair>,
) -> Selection {
    let mut candidates = unplayed_pairs(store);

    let phase = if candidates.is_empty() {
        candidates = leader_rematches(store);
        Phase::Exhausted
    } else {
        let phase = phase_for(total_decisions, discovery_cutoff);
        sort_candidates(store, &mut candidates, phase);
        phase
    };

    let pair = pick_avoiding_repeat(&candidates, previous);
    Selection { pair, phase }
}

fn sort_candidates(store: &ItemStore, candidates: &mut [IndexedPair], phase: Phase) {
    match phase {
        Phase::Discovery => {
            // Stable sort: equal uncertainty keeps catalogue order.
            candidates.sort_by(|&a, &b| {
                let rd_a = store.get(a.0).rd + store.get(a.1).rd;
                let rd_b = store.get(b.0).rd + store.get(b.1).rd;
                rd_b.partial_cmp(&rd_a).unwrap_or(Ordering::Equal)
            });
        }
        Phase::Tournament => {
            candidates.sort_by(|&a, &b| {
                let diff_a = (store.get(a.0).rating - store.get(a.1).rating).abs();
                let diff_b = (store.get(b.0).rating - store.get(b.1).rating).abs();
                diff_a.partial_cmp(&diff_b).unwrap_or(Ordering::Equal)
            });
        }
        Phase::Exhausted => {}
    }
}

/// Adjacent pairs among the top three by rating: (1st, 2nd) then (2nd, 3rd).
fn leader_rematches(store: &ItemStore) -> Vec<IndexedPair> {
    let leaders = store.by_rating_desc();
    leaders.windows(2).take(2).map(|w| (w[0], w[1])).collect()
}

fn pick_avoiding_repeat(candidates: &[IndexedPair], previous: Option<IndexedPair>) -> IndexedPair {
    let best = candidates[0];
    match previous {
        Some(prev) if same_pair(best, prev) && candidates.len() > 1 => candidates[1],
        _ => best,
    }
}
