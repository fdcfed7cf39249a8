/// Error kinds surfaced by the ranking engine.
///
/// Internal invariant violations are normalized into one of these three kinds
/// so the host can decide how to word them. None of them leaves the engine in
/// a partially mutated state.
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Persisted state could not be trusted (no catalogue, unknown names, bad JSON).
    #[error("malformed session: {0}")]
    MalformedSession(String),

    /// A decision was submitted that does not match the pending pair.
    #[error("invalid decision: {0}")]
    InvalidDecision(String),

    /// The catalogue cannot support matchmaking.
    #[error("degenerate catalogue: {0}")]
    DegenerateCatalogue(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
