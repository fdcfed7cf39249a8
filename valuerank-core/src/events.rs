/// Facts the engine emits for its host. The engine never renders; the host
/// drains these after each call and decides what to show.
use std::fmt;

use serde::Serialize;

use crate::progress::Progress;
use crate::types::{ConflictRecord, Decision, PairKind};

/// Why a pair was decided without asking: the chain of explicit wins that
/// implies it, winner first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Justification {
    pub chain: Vec<String>,
}

impl fmt::Display for Justification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Logic: {}", self.chain.join(" > "))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    /// A pair was put in front of the user, or auto-resolved if
    /// `auto_resolution` is set.
    PairPresented {
        pair_id: u64,
        left: String,
        right: String,
        kind: PairKind,
        auto_resolution: Option<Justification>,
    },
    DecisionCommitted {
        decision: Decision,
        confident: bool,
    },
    ConflictRecorded {
        record: ConflictRecord,
    },
    ProgressChanged {
        progress: Progress,
    },
    SessionReset,
}
