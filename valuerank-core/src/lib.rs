/// valuerank-core: Pairwise preference ranking engine.
///
/// "Which of these two matters more to you?" → Glicko-lite ratings → ordered list.
/// No IO, no rendering, no clock other than decision timestamps. The host shows
/// pairs, measures think-time, and persists `snapshot()` after each decision.
///
/// Items are identified by their names. The crate maps them to array indices
/// internally.
///
/// # Quick start
///
/// ```rust
/// use valuerank_core::{EngineConfig, Presentation, RankingEngine};
///
/// let mut engine = RankingEngine::new(&["Family", "Freedom", "Wealth"], EngineConfig::default())?;
///
/// for _ in 0..3 {
///     match engine.next_pair() {
///         Presentation::Choose(pair) => {
///             // Ask the user; here the left item always wins after 2.5s.
///             engine.submit_decision(pair.id, 0, 2_500)?;
///         }
///         Presentation::AutoResolved { justification, .. } => {
///             println!("skipped: {justification}");
///         }
///         Presentation::Decided { .. } => unreachable!("only `present` answers from history"),
///     }
/// }
///
/// for r in engine.rankings() {
///     println!("#{} {} ({:.0} ± {:.0})", r.rank, r.name, r.rating, r.rd);
/// }
/// # Ok::<(), valuerank_core::EngineError>(())
/// ```

pub mod conflicts;
pub mod constants;
pub mod engine;
pub mod error;
pub mod events;
pub mod inference;
pub mod matchmaking;
pub mod progress;
pub mod rating;
pub mod session;
pub mod simulation;
pub mod store;
pub mod types;

// Re-export primary public API at crate root.
pub use conflicts::ConflictLog;
pub use constants::DEFAULT_CATALOGUE;
pub use engine::{DecisionOutcome, EngineConfig, PendingPair, Presentation, RankingEngine, Resumed};
pub use error::EngineError;
pub use events::{EngineEvent, Justification};
pub use inference::{reachable_in_history, Implication, PreferenceGraph};
pub use matchmaking::{select_next_pair, Phase, Selection};
pub use progress::{estimate_progress, progress_for, Progress};
pub use rating::{expected_score, RatingConfig, RatingUpdate};
pub use session::PersistedSession;
pub use simulation::{simulate, AccuracyRow, Model, ModelReport, SimulationConfig};
pub use store::ItemStore;
pub use types::{ConflictRecord, Decision, Item, PairKind, RankedItem, Side};
