/// Ranking engine orchestrator.
///
/// Owns the whole session (items, decisions, conflicts) and runs one
/// comparison at a time: pick a pair, auto-resolve it from history when the
/// answer is already implied, otherwise wait for the host to submit the
/// user's choice. No IO. The host persists `snapshot()` after each decision.
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::conflicts::ConflictLog;
use crate::constants::{CONFIDENT_THRESHOLD_MS, DISCOVERY_CUTOFF, HARD_CHOICE_THRESHOLD_MS};
use crate::error::{EngineError, Result};
use crate::events::{EngineEvent, Justification};
use crate::inference::{Implication, PreferenceGraph};
use crate::matchmaking::{phase_for, select_next_pair, unplayed_pairs, Phase};
use crate::progress::{progress_for, Progress};
use crate::rating::{RatingConfig, RatingUpdate};
use crate::session::PersistedSession;
use crate::store::ItemStore;
use crate::types::{ConflictRecord, Decision, IndexedPair, Item, PairKind, RankedItem, Side};

/// Configuration for the ranking engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub rating: RatingConfig,
    /// Decisions before matchmaking moves from discovery to tournament.
    pub discovery_cutoff: usize,
    pub confident_threshold_ms: u64,
    pub hard_choice_threshold_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            rating: RatingConfig::default(),
            discovery_cutoff: DISCOVERY_CUTOFF,
            confident_threshold_ms: CONFIDENT_THRESHOLD_MS,
            hard_choice_threshold_ms: HARD_CHOICE_THRESHOLD_MS,
        }
    }
}

/// A pair waiting for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingPair {
    pub id: u64,
    pub left: String,
    pub right: String,
    pub kind: PairKind,
    pub phase: Phase,
}

/// Result of asking the engine for the next pair.
#[derive(Debug, Clone, PartialEq)]
pub enum Presentation {
    /// The user must choose. Answer with `submit_decision(pair.id, ..)`.
    Choose(PendingPair),
    /// History already decided this pair; the decision has been recorded.
    AutoResolved {
        pair_id: u64,
        left: String,
        right: String,
        decision: Decision,
        justification: Justification,
    },
    /// The user already answered this exact pair and history still agrees.
    /// Nothing was recorded. Only `present` returns this.
    Decided {
        left: String,
        right: String,
        decision: Decision,
    },
}

/// Everything that changed because of one committed decision.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionOutcome {
    pub decision: Decision,
    pub confident: bool,
    pub update: RatingUpdate,
    pub conflict: Option<ConflictRecord>,
    pub progress: Progress,
}

/// Outcome of `RankingEngine::resume`. `recovered` holds the error that forced
/// a fresh session, if the persisted one could not be used.
pub struct Resumed {
    pub engine: RankingEngine,
    pub recovered: Option<EngineError>,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    id: u64,
    pair: IndexedPair,
    kind: PairKind,
    phase: Phase,
}

pub struct RankingEngine {
    store: ItemStore,
    decisions: Vec<Decision>,
    conflicts: ConflictLog,
    graph: PreferenceGraph,
    pending: Option<Pending>,
    /// Last pair presented (auto-resolved ones included), for anti-repeat.
    last_pair: Option<IndexedPair>,
    next_pair_id: u64,
    events: Vec<EngineEvent>,
    config: EngineConfig,
}

impl RankingEngine {
    /// Fresh session over an ordered catalogue of names.
    pub fn new<S: AsRef<str>>(catalogue: &[S], config: EngineConfig) -> Result<Self> {
        let store = ItemStore::from_catalogue(catalogue, config.rating.initial_rating, config.rating.initial_rd)?;
        info!(items = store.len(), "new ranking session");
        Ok(Self::from_parts(store, Vec::new(), Vec::new(), config))
    }

    /// Rebuild an engine from a session. References are validated and
    /// opponent sets and match counts are rebuilt from the decisions.
    pub fn restore(session: PersistedSession, config: EngineConfig) -> Result<Self> {
        let session = session.normalize(&config)?;
        let store = ItemStore::from_items(session.items)?;
        Ok(Self::from_parts(store, session.decisions, session.conflicts, config))
    }

    /// Resume from persisted JSON if there is any, otherwise start fresh.
    ///
    /// A persisted session that cannot be used is replaced by a fresh one built
    /// from `catalogue`; only a degenerate catalogue is an error.
    pub fn resume<S: AsRef<str>>(catalogue: &[S], persisted: Option<&str>, config: EngineConfig) -> Result<Resumed> {
        let Some(json) = persisted else {
            return Ok(Resumed { engine: Self::new(catalogue, config)?, recovered: None });
        };

        let restored = PersistedSession::from_json(json, &config).and_then(|session| {
            let store = ItemStore::from_items(session.items)?;
            Ok(Self::from_parts(store, session.decisions, session.conflicts, config.clone()))
        });

        match restored {
            Ok(engine) => {
                info!(decisions = engine.decisions.len(), "session resumed");
                Ok(Resumed { engine, recovered: None })
            }
            Err(err) => {
                warn!(error = %err, "persisted session unusable, starting fresh");
                Ok(Resumed { engine: Self::new(catalogue, config)?, recovered: Some(err) })
            }
        }
    }

    fn from_parts(store: ItemStore, decisions: Vec<Decision>, conflicts: Vec<ConflictRecord>, config: EngineConfig) -> Self {
        let mut graph = PreferenceGraph::new(store.len());
        for d in &decisions {
            if let (Some(w), Some(l)) = (store.index_of(&d.winner), store.index_of(&d.loser)) {
                graph.record(w, l);
            }
        }

        RankingEngine {
            store,
            decisions,
            conflicts: ConflictLog::from_records(conflicts, config.hard_choice_threshold_ms),
            graph,
            pending: None,
            last_pair: None,
            next_pair_id: 1,
            events: Vec::new(),
            config,
        }
    }

    // -----------------------------------------------------------------------
    // Comparison flow
    // -----------------------------------------------------------------------

    /// Present the next pair chosen by the matchmaker.
    ///
    /// If a pair is already pending it is returned again unchanged.
    pub fn next_pair(&mut self) -> Presentation {
        if let Some(pending) = self.pending {
            return Presentation::Choose(self.pending_view(pending));
        }

        let selection = select_next_pair(
            &self.store,
            self.decisions.len(),
            self.config.discovery_cutoff,
            self.last_pair,
        );
        debug!(
            left = self.store.name(selection.pair.0),
            right = self.store.name(selection.pair.1),
            phase = ?selection.phase,
            "pair selected"
        );

        // Rematches are always asked, never auto-resolved.
        if selection.phase == Phase::Exhausted {
            return self.ask(selection.pair, PairKind::Rematch, selection.phase);
        }
        self.present_indexed(selection.pair, selection.phase)
    }

    /// Present a specific pair chosen by the host.
    ///
    /// A pair the user already decided directly is answered from history with
    /// `Decided` and nothing is recorded. Contradicted pairs are always asked.
    pub fn present(&mut self, left: &str, right: &str) -> Result<Presentation> {
        if let Some(pending) = self.pending {
            return Err(EngineError::InvalidDecision(format!(
                "pair {} is still pending",
                pending.id
            )));
        }
        let l = self.require_index(left)?;
        let r = self.require_index(right)?;
        if l == r {
            return Err(EngineError::InvalidDecision(format!("cannot compare \"{left}\" with itself")));
        }
        if let Implication::Implied(side) = self.graph.classify(l, r) {
            let (winner, loser) = oriented((l, r), side);
            if let Some(decision) = self.direct_decision(winner, loser).cloned() {
                debug!(winner = %decision.winner, loser = %decision.loser, "pair already decided");
                return Ok(Presentation::Decided {
                    left: left.to_string(),
                    right: right.to_string(),
                    decision,
                });
            }
        }
        Ok(self.present_indexed((l, r), self.phase()))
    }

    /// Latest explicit or auto decision with exactly this winner and loser.
    fn direct_decision(&self, winner: usize, loser: usize) -> Option<&Decision> {
        let (w, l) = (self.store.name(winner), self.store.name(loser));
        self.decisions.iter().rev().find(|d| d.winner == w && d.loser == l)
    }

    fn present_indexed(&mut self, pair: IndexedPair, phase: Phase) -> Presentation {
        match self.graph.classify(pair.0, pair.1) {
            Implication::Implied(side) => self.auto_resolve(pair, side),
            Implication::Contradictory => self.ask(pair, PairKind::Contradiction, phase),
            Implication::Undetermined => self.ask(pair, PairKind::Comparison, phase),
        }
    }

    fn ask(&mut self, pair: IndexedPair, kind: PairKind, phase: Phase) -> Presentation {
        let id = self.take_pair_id();
        self.last_pair = Some(pair);
        let pending = Pending { id, pair, kind, phase };
        self.pending = Some(pending);

        let view = self.pending_view(pending);
        self.events.push(EngineEvent::PairPresented {
            pair_id: id,
            left: view.left.clone(),
            right: view.right.clone(),
            kind,
            auto_resolution: None,
        });
        Presentation::Choose(view)
    }

    fn auto_resolve(&mut self, pair: IndexedPair, side: Side) -> Presentation {
        let id = self.take_pair_id();
        self.last_pair = Some(pair);
        let (winner, loser) = oriented(pair, side);

        // Computed before the new edge makes the path trivial.
        let chain = self.graph.path(winner, loser).unwrap_or_else(|| vec![winner, loser]);
        let justification = Justification {
            chain: chain.into_iter().map(|i| self.store.name(i).to_string()).collect(),
        };
        debug!(%justification, "pair auto-resolved");

        let left = self.store.name(pair.0).to_string();
        let right = self.store.name(pair.1).to_string();
        self.events.push(EngineEvent::PairPresented {
            pair_id: id,
            left: left.clone(),
            right: right.clone(),
            kind: PairKind::Comparison,
            auto_resolution: Some(justification.clone()),
        });

        let outcome = self.commit(pair, winner, loser, 0, true);
        Presentation::AutoResolved {
            pair_id: id,
            left,
            right,
            decision: outcome.decision,
            justification,
        }
    }

    /// Record the user's choice for the pending pair.
    ///
    /// `side` is the slot index (0 = left, 1 = right). `elapsed_ms` is the time
    /// between presentation and choice. Rejected calls change nothing.
    pub fn submit_decision(&mut self, pair_id: u64, side: usize, elapsed_ms: u64) -> Result<DecisionOutcome> {
        let side = Side::from_index(side)
            .ok_or_else(|| EngineError::InvalidDecision(format!("side {side} is not 0 or 1")))?;
        let pending = match self.pending {
            Some(p) if p.id == pair_id => p,
            Some(p) => {
                return Err(EngineError::InvalidDecision(format!(
                    "pair {pair_id} is not pending (pending pair is {})",
                    p.id
                )))
            }
            None => return Err(EngineError::InvalidDecision(format!("pair {pair_id} is not pending"))),
        };

        self.pending = None;
        let (winner, loser) = oriented(pending.pair, side);
        Ok(self.commit(pending.pair, winner, loser, elapsed_ms, false))
    }

    fn commit(&mut self, presented: IndexedPair, winner: usize, loser: usize, elapsed_ms: u64, auto: bool) -> DecisionOutcome {
        let confident = !auto && elapsed_ms < self.config.confident_threshold_ms;

        let update = {
            let (w, l) = self.store.pair_mut(winner, loser);
            self.config.rating.apply_result(w, l, confident, auto)
        };
        self.store.record_pairing(winner, loser);
        self.graph.record(winner, loser);

        let decision = Decision {
            winner: self.store.name(winner).to_string(),
            loser: self.store.name(loser).to_string(),
            timestamp: Utc::now().timestamp_millis(),
            duration_ms: if auto { 0 } else { elapsed_ms },
            was_auto: auto,
        };
        self.decisions.push(decision.clone());

        let pair_names = [
            self.store.name(presented.0).to_string(),
            self.store.name(presented.1).to_string(),
        ];
        let conflict = self.conflicts.record_if_hard(&decision, pair_names).cloned();
        let progress = progress_for(self.decisions.len());

        info!(
            winner = %decision.winner,
            loser = %decision.loser,
            delta = update.delta,
            auto,
            confident,
            "decision committed"
        );

        self.events.push(EngineEvent::DecisionCommitted { decision: decision.clone(), confident });
        if let Some(record) = &conflict {
            self.events.push(EngineEvent::ConflictRecorded { record: record.clone() });
        }
        self.events.push(EngineEvent::ProgressChanged { progress });

        DecisionOutcome { decision, confident, update, conflict, progress }
    }

    /// Clear items, decisions and conflicts back to the initial catalogue state.
    pub fn request_reset(&mut self) {
        let rating = &self.config.rating;
        self.store.reset(rating.initial_rating, rating.initial_rd);
        self.decisions.clear();
        self.conflicts.clear();
        self.graph = PreferenceGraph::new(self.store.len());
        self.pending = None;
        self.last_pair = None;
        info!(items = self.store.len(), "session reset");
        self.events.push(EngineEvent::SessionReset);
        self.events.push(EngineEvent::ProgressChanged { progress: self.progress() });
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Does recorded history imply `from` is preferred over `to`?
    /// Unknown names are never reachable.
    pub fn is_reachable(&self, from: &str, to: &str) -> bool {
        match (self.store.index_of(from), self.store.index_of(to)) {
            (Some(f), Some(t)) => self.graph.is_reachable(f, t),
            _ => false,
        }
    }

    pub fn num_items(&self) -> usize {
        self.store.len()
    }

    pub fn items(&self) -> &[Item] {
        self.store.items()
    }

    pub fn item(&self, name: &str) -> Option<&Item> {
        self.store.by_name(name)
    }

    pub fn decisions(&self) -> &[Decision] {
        &self.decisions
    }

    pub fn conflicts(&self) -> &[ConflictRecord] {
        self.conflicts.records()
    }

    pub fn rankings(&self) -> Vec<RankedItem> {
        self.store.ranked()
    }

    pub fn progress(&self) -> Progress {
        progress_for(self.decisions.len())
    }

    pub fn pending(&self) -> Option<PendingPair> {
        self.pending.map(|p| self.pending_view(p))
    }

    /// Phase the matchmaker is currently in.
    pub fn phase(&self) -> Phase {
        if unplayed_pairs(&self.store).is_empty() {
            Phase::Exhausted
        } else {
            phase_for(self.decisions.len(), self.config.discovery_cutoff)
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Take all events emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    // -----------------------------------------------------------------------
    // Manual order and persistence
    // -----------------------------------------------------------------------

    pub fn apply_manual_order<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        self.store.apply_manual_order(names)
    }

    pub fn clear_manual_order(&mut self) {
        self.store.clear_manual_order();
    }

    pub fn snapshot(&self) -> PersistedSession {
        PersistedSession {
            schema_version: crate::constants::SESSION_SCHEMA_VERSION,
            items: self.store.items().to_vec(),
            decisions: self.decisions.clone(),
            conflicts: self.conflicts.records().to_vec(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        self.snapshot().to_json()
    }

    // -----------------------------------------------------------------------

    fn pending_view(&self, p: Pending) -> PendingPair {
        PendingPair {
            id: p.id,
            left: self.store.name(p.pair.0).to_string(),
            right: self.store.name(p.pair.1).to_string(),
            kind: p.kind,
            phase: p.phase,
        }
    }

    fn take_pair_id(&mut self) -> u64 {
        let id = self.next_pair_id;
        self.next_pair_id += 1;
        id
    }

    fn require_index(&self, name: &str) -> Result<usize> {
        self.store
            .index_of(name)
            .ok_or_else(|| EngineError::InvalidDecision(format!("unknown item \"{name}\"")))
    }
}

/// (winner, loser) for a pair given the winning side.
fn oriented(pair: IndexedPair, side: Side) -> (usize, usize) {
    match side {
        Side::Left => (pair.0, pair.1),
        Side::Right => (pair.1, pair.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(names: &[&str]) -> RankingEngine {
        RankingEngine::new(names, EngineConfig::default()).unwrap()
    }

    /// Present the next pair and, if it needs a user, pick `side`.
    fn play(engine: &mut RankingEngine, side: usize, elapsed_ms: u64) -> Decision {
        match engine.next_pair() {
            Presentation::Choose(p) => engine.submit_decision(p.id, side, elapsed_ms).unwrap().decision,
            Presentation::AutoResolved { decision, .. } | Presentation::Decided { decision, .. } => decision,
        }
    }

    fn force(engine: &mut RankingEngine, winner: &str, loser: &str) {
        match engine.present(winner, loser).unwrap() {
            Presentation::Choose(p) => {
                engine.submit_decision(p.id, 0, 5_000).unwrap();
            }
            other => panic!("{winner} vs {loser} was already implied: {other:?}"),
        }
    }

    #[test]
    fn test_requires_two_items() {
        let err = RankingEngine::new(&["Only"], EngineConfig::default()).err().unwrap();
        assert!(matches!(err, EngineError::DegenerateCatalogue(_)));
    }

    #[test]
    fn test_transitive_scenario_auto_resolves() {
        let mut e = engine(&["A", "B", "C", "D"]);
        force(&mut e, "A", "B");
        force(&mut e, "B", "C");

        assert!(e.is_reachable("A", "C"));
        assert!(!e.is_reachable("C", "A"));

        let before_a = e.item("A").unwrap().rating;
        match e.present("A", "C").unwrap() {
            Presentation::AutoResolved { decision, justification, .. } => {
                assert_eq!(decision.winner, "A");
                assert_eq!(decision.loser, "C");
                assert!(decision.was_auto);
                assert_eq!(decision.duration_ms, 0);
                assert_eq!(justification.chain, vec!["A", "B", "C"]);
                assert_eq!(justification.to_string(), "Logic: A > B > C");
            }
            other => panic!("expected auto-resolution, got {other:?}"),
        }
        assert!(e.item("A").unwrap().rating > before_a);
        assert_eq!(e.decisions().len(), 3);
        assert!(e.pending().is_none());
    }

    #[test]
    fn test_auto_resolution_in_matchmaker_flow() {
        let mut e = engine(&["A", "B", "C"]);
        // A vs B, then A vs C (equal uncertainty keeps catalogue order).
        assert_eq!(play(&mut e, 0, 1_000).winner, "A");
        assert_eq!(play(&mut e, 1, 1_000).winner, "C");
        // C > A > B leaves only B vs C, already implied.
        match e.next_pair() {
            Presentation::AutoResolved { decision, .. } => {
                assert_eq!(decision.winner, "C");
                assert_eq!(decision.loser, "B");
            }
            other => panic!("expected auto-resolution, got {other:?}"),
        }
    }

    #[test]
    fn test_explicit_contradiction_is_recorded() {
        let mut e = engine(&["A", "B", "C"]);
        play(&mut e, 0, 1_000);
        play(&mut e, 1, 1_000);
        play(&mut e, 0, 1_000); // auto

        let pending = match e.next_pair() {
            Presentation::Choose(p) => p,
            other => panic!("rematches are always asked, got {other:?}"),
        };
        assert_eq!(pending.kind, PairKind::Rematch);
        assert_eq!(pending.phase, Phase::Exhausted);

        let left_implied = e.is_reachable(&pending.left, &pending.right);
        let (side, winner, loser) = if left_implied {
            (1, pending.right.clone(), pending.left.clone())
        } else {
            (0, pending.left.clone(), pending.right.clone())
        };
        e.submit_decision(pending.id, side, 2_000).unwrap();

        let last = e.decisions().last().unwrap();
        assert_eq!((last.winner.as_str(), last.loser.as_str()), (winner.as_str(), loser.as_str()));
        assert_eq!(e.decisions().len(), 4);
        assert!(e.is_reachable(&winner, &loser));
        assert!(e.is_reachable(&loser, &winner));
    }

    #[test]
    fn test_contradictory_pair_flagged() {
        // Cycles only enter through rematches or older sessions; load one.
        let json = r#"{"items": [{"name": "A"}, {"name": "B"}, {"name": "C"}, {"name": "D"}],
                       "history": [
                         {"winner": "A", "loser": "B", "timestamp": 1, "duration": 2000, "auto": false},
                         {"winner": "B", "loser": "C", "timestamp": 2, "duration": 2000, "auto": false},
                         {"winner": "C", "loser": "A", "timestamp": 3, "duration": 2000, "auto": false}
                       ]}"#;
        let mut e = RankingEngine::resume(&["A", "B", "C", "D"], Some(json), EngineConfig::default())
            .unwrap()
            .engine;
        assert!(e.is_reachable("A", "C") && e.is_reachable("C", "A"));

        match e.present("A", "C").unwrap() {
            Presentation::Choose(p) => {
                assert_eq!(p.kind, PairKind::Contradiction);
                assert!(p.kind.is_tie_breaker());
            }
            other => panic!("expected a tie-break, got {other:?}"),
        }
    }

    #[test]
    fn test_hard_choice_logged_only_when_manual() {
        let mut e = engine(&["A", "B", "C"]);
        let p = match e.present("A", "B").unwrap() {
            Presentation::Choose(p) => p,
            other => panic!("unexpected {other:?}"),
        };
        let outcome = e.submit_decision(p.id, 0, 12_000).unwrap();
        assert!(!outcome.confident);
        assert_eq!(
            outcome.conflict,
            Some(ConflictRecord { pair: ["A".into(), "B".into()], winner: "A".into(), duration_ms: 12_000 })
        );
        assert_eq!(e.conflicts().len(), 1);

        force(&mut e, "B", "C");
        // A vs C now auto-resolves; nothing new in the log.
        assert!(matches!(e.present("A", "C").unwrap(), Presentation::AutoResolved { .. }));
        assert_eq!(e.conflicts().len(), 1);
    }

    #[test]
    fn test_fast_choice_is_confident() {
        let mut e = engine(&["A", "B"]);
        let p = match e.next_pair() {
            Presentation::Choose(p) => p,
            other => panic!("unexpected {other:?}"),
        };
        let outcome = e.submit_decision(p.id, 1, 900).unwrap();
        assert!(outcome.confident);
        // K = 40 * 1.5, expected 0.5
        assert!((outcome.update.delta - 30.0).abs() < 1e-9);
        assert_eq!(outcome.decision.winner, "B");
        assert_eq!(outcome.decision.duration_ms, 900);
    }

    #[test]
    fn test_rejected_submissions_change_nothing() {
        let mut e = engine(&["A", "B", "C"]);
        let p = match e.next_pair() {
            Presentation::Choose(p) => p,
            other => panic!("unexpected {other:?}"),
        };
        let before = e.snapshot();

        assert!(matches!(e.submit_decision(p.id, 2, 100), Err(EngineError::InvalidDecision(_))));
        assert!(matches!(e.submit_decision(p.id + 7, 0, 100), Err(EngineError::InvalidDecision(_))));
        assert_eq!(e.snapshot(), before);
        assert_eq!(e.pending(), Some(p.clone()));

        e.submit_decision(p.id, 0, 100).unwrap();
        assert!(matches!(e.submit_decision(p.id, 0, 100), Err(EngineError::InvalidDecision(_))));
    }

    #[test]
    fn test_next_pair_returns_pending_again() {
        let mut e = engine(&["A", "B", "C"]);
        let first = e.next_pair();
        assert_eq!(e.next_pair(), first);
        assert!(e.present("A", "C").is_err());
    }

    #[test]
    fn test_present_rejects_bad_names() {
        let mut e = engine(&["A", "B"]);
        assert!(matches!(e.present("A", "Z"), Err(EngineError::InvalidDecision(_))));
        assert!(matches!(e.present("A", "A"), Err(EngineError::InvalidDecision(_))));
    }

    #[test]
    fn test_session_invariants_hold() {
        let names = ["A", "B", "C", "D", "E", "F"];
        let mut e = engine(&names);
        let mut previous: Option<(String, String)> = None;
        let mut last_rd: Vec<f64> = e.items().iter().map(|i| i.rd).collect();

        for round in 0..60 {
            let phase = e.phase();
            let before: Vec<f64> = e.items().iter().map(|i| i.rating).collect();

            let (left, right, decision) = match e.next_pair() {
                Presentation::Choose(p) => {
                    let d = e.submit_decision(p.id, round % 2, 1_500 + round as u64 * 300).unwrap().decision;
                    (p.left, p.right, d)
                }
                Presentation::AutoResolved { left, right, decision, .. } => (left, right, decision),
                other => panic!("next_pair never answers from history: {other:?}"),
            };

            assert_ne!(left, right);
            if phase != Phase::Exhausted {
                if let Some((pl, pr)) = &previous {
                    let repeated = (pl == &left && pr == &right) || (pl == &right && pr == &left);
                    assert!(!repeated, "pair {left}/{right} repeated at round {round}");
                }
            }
            previous = Some((left, right));

            // Zero-sum for this event.
            let after: Vec<f64> = e.items().iter().map(|i| i.rating).collect();
            let w = e.items().iter().position(|i| i.name == decision.winner).unwrap();
            let l = e.items().iter().position(|i| i.name == decision.loser).unwrap();
            assert!(((after[w] - before[w]) + (after[l] - before[l])).abs() < 1e-9);

            for (i, item) in e.items().iter().enumerate() {
                assert!(item.rd <= last_rd[i]);
                assert!(item.rd >= 50.0);
                last_rd[i] = item.rd;
            }
        }

        // Opponent sets are the symmetric closure of history.
        for d in e.decisions() {
            assert!(e.item(&d.winner).unwrap().opponents.contains(&d.loser));
            assert!(e.item(&d.loser).unwrap().opponents.contains(&d.winner));
        }
        assert_eq!(e.phase(), Phase::Exhausted);
    }

    #[test]
    fn test_never_same_item_twice_small_catalogue() {
        let mut e = engine(&["A", "B"]);
        for _ in 0..5 {
            match e.next_pair() {
                Presentation::Choose(p) => {
                    assert_ne!(p.left, p.right);
                    e.submit_decision(p.id, 0, 4_000).unwrap();
                }
                Presentation::AutoResolved { left, right, .. } => assert_ne!(left, right),
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(e.decisions().len(), 5);
    }

    #[test]
    fn test_round_trip_persistence() {
        let mut e = engine(&["A", "B", "C", "D"]);
        for round in 0..8 {
            play(&mut e, round % 2, if round == 3 { 15_000 } else { 2_500 });
        }
        e.apply_manual_order(&["D", "A"]).unwrap();

        let json = e.to_json().unwrap();
        let resumed = RankingEngine::resume(&["A", "B", "C", "D"], Some(&json), EngineConfig::default()).unwrap();
        assert!(resumed.recovered.is_none());

        let restored = resumed.engine;
        assert_eq!(restored.snapshot(), e.snapshot());
        assert_eq!(restored.items(), e.items());
        assert_eq!(restored.decisions(), e.decisions());
        assert_eq!(restored.conflicts(), e.conflicts());
        assert_eq!(restored.to_json().unwrap(), json);
    }

    #[test]
    fn test_malformed_session_falls_back_to_fresh() {
        let json = r#"{"items": [{"name": "A"}, {"name": "B"}],
                       "decisions": [{"winner": "A", "loser": "Ghost", "timestamp": 0, "durationMs": 0, "auto": false}]}"#;
        let resumed = RankingEngine::resume(&["X", "Y", "Z"], Some(json), EngineConfig::default()).unwrap();
        assert!(matches!(resumed.recovered, Some(EngineError::MalformedSession(_))));
        assert_eq!(resumed.engine.num_items(), 3);
        assert!(resumed.engine.decisions().is_empty());

        let resumed = RankingEngine::resume(&["X", "Y"], Some("{}"), EngineConfig::default()).unwrap();
        assert!(resumed.recovered.is_some());
    }

    #[test]
    fn test_reset_restores_catalogue_state() {
        let mut e = engine(&["A", "B", "C"]);
        let p = match e.next_pair() {
            Presentation::Choose(p) => p,
            other => panic!("unexpected {other:?}"),
        };
        e.submit_decision(p.id, 0, 20_000).unwrap();
        e.next_pair();
        e.apply_manual_order(&["C"]).unwrap();
        e.drain_events();

        e.request_reset();
        assert!(e.decisions().is_empty());
        assert!(e.conflicts().is_empty());
        assert!(e.pending().is_none());
        assert_eq!(e.phase(), Phase::Discovery);
        for item in e.items() {
            assert_eq!(item.rating, 1500.0);
            assert_eq!(item.rd, 350.0);
            assert_eq!(item.match_count, 0);
            assert!(item.opponents.is_empty());
            assert!(item.manual_rank.is_none());
        }
        let names: Vec<&str> = e.items().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(e.drain_events()[0], EngineEvent::SessionReset);
    }

    #[test]
    fn test_events_emitted_in_order() {
        let mut e = engine(&["A", "B", "C"]);
        let p = match e.next_pair() {
            Presentation::Choose(p) => p,
            other => panic!("unexpected {other:?}"),
        };
        e.submit_decision(p.id, 0, 11_000).unwrap();

        let events = e.drain_events();
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], EngineEvent::PairPresented { auto_resolution: None, .. }));
        assert!(matches!(events[1], EngineEvent::DecisionCommitted { confident: false, .. }));
        assert!(matches!(events[2], EngineEvent::ConflictRecorded { .. }));
        assert!(matches!(events[3], EngineEvent::ProgressChanged { .. }));
        assert!(e.drain_events().is_empty());
    }

    #[test]
    fn test_discovery_then_tournament() {
        let config = EngineConfig { discovery_cutoff: 2, ..EngineConfig::default() };
        let mut e = RankingEngine::new(&["A", "B", "C", "D", "E"], config).unwrap();
        assert_eq!(e.phase(), Phase::Discovery);
        play(&mut e, 0, 1_000);
        play(&mut e, 0, 1_000);
        assert_eq!(e.phase(), Phase::Tournament);
    }
    #[test]
    fn test_present_decided_pair_records_nothing() {
        let mut e = engine(&["A", "B", "C"]);
        force(&mut e, "A", "B");
        let before = e.snapshot();

        for (left, right) in [("A", "B"), ("B", "A")] {
            match e.present(left, right).unwrap() {
                Presentation::Decided { decision, .. } => {
                    assert_eq!(decision.winner, "A");
                    assert_eq!(decision.loser, "B");
                    assert!(!decision.was_auto);
                }
                other => panic!("expected the stored answer, got {other:?}"),
            }
        }
        assert_eq!(e.snapshot(), before);
        assert!(e.pending().is_none());
        // A transitive pair is still auto-resolved once, then answered from history.
        force(&mut e, "B", "C");
        assert!(matches!(e.present("A", "C").unwrap(), Presentation::AutoResolved { .. }));
        let count = e.decisions().len();
        assert!(matches!(e.present("C", "A").unwrap(), Presentation::Decided { .. }));
        assert_eq!(e.decisions().len(), count);
    }

    #[test]
    fn test_restore_validates_and_normalizes() {
        let decision = Decision {
            winner: "A".into(),
            loser: "B".into(),
            timestamp: 1,
            duration_ms: 2_000,
            was_auto: false,
        };
        let session = PersistedSession {
            schema_version: 1,
            items: vec![Item::new("A"), Item::new("B"), Item::new("C")],
            decisions: vec![decision.clone()],
            conflicts: vec![],
        };

        let restored = RankingEngine::restore(session.clone(), EngineConfig::default()).unwrap();
        assert!(restored.item("A").unwrap().has_faced("B"));
        assert!(restored.item("B").unwrap().has_faced("A"));
        assert_eq!(restored.item("A").unwrap().match_count, 1);
        assert!(!restored.item("C").unwrap().has_faced("A"));

        let mut ghost = session.clone();
        ghost.conflicts.push(ConflictRecord {
            pair: ["A".into(), "Ghost".into()],
            winner: "Ghost".into(),
            duration_ms: 12_000,
        });
        assert!(matches!(
            RankingEngine::restore(ghost, EngineConfig::default()),
            Err(EngineError::MalformedSession(_))
        ));

        let mut stray_winner = session;
        stray_winner.conflicts.push(ConflictRecord {
            pair: ["A".into(), "B".into()],
            winner: "C".into(),
            duration_ms: 12_000,
        });
        assert!(matches!(
            RankingEngine::restore(stray_winner, EngineConfig::default()),
            Err(EngineError::MalformedSession(_))
        ));
    }
}
