/// Log of hard choices: manual decisions that took longer than the threshold.
/// Append-only, display only. Never feeds back into matchmaking.
use crate::constants::HARD_CHOICE_THRESHOLD_MS;
use crate::types::{ConflictRecord, Decision};

#[derive(Debug, Clone, PartialEq)]
pub struct ConflictLog {
    records: Vec<ConflictRecord>,
    threshold_ms: u64,
}

impl Default for ConflictLog {
    fn default() -> Self {
        ConflictLog::new(HARD_CHOICE_THRESHOLD_MS)
    }
}

impl ConflictLog {
    pub fn new(threshold_ms: u64) -> Self {
        ConflictLog {
            records: Vec::new(),
            threshold_ms,
        }
    }

    pub fn from_records(records: Vec<ConflictRecord>, threshold_ms: u64) -> Self {
        ConflictLog { records, threshold_ms }
    }

    pub fn is_hard(&self, decision: &Decision) -> bool {
        !decision.was_auto && decision.duration_ms > self.threshold_ms
    }

    /// Append a record for `decision` if it was a slow manual choice.
    /// `pair` is the pair as it was presented.
    pub fn record_if_hard(&mut self, decision: &Decision, pair: [String; 2]) -> Option<&ConflictRecord> {
        if !self.is_hard(decision) {
            return None;
        }
        self.records.push(ConflictRecord {
            pair,
            winner: decision.winner.clone(),
            duration_ms: decision.duration_ms,
        });
        self.records.last()
    }

    pub fn records(&self) -> &[ConflictRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decision(duration_ms: u64, was_auto: bool) -> Decision {
        Decision {
            winner: "A".into(),
            loser: "B".into(),
            timestamp: 0,
            duration_ms,
            was_auto,
        }
    }

    fn pair() -> [String; 2] {
        ["A".to_string(), "B".to_string()]
    }

    #[test]
    fn test_slow_manual_decision_is_logged() {
        let mut log = ConflictLog::default();
        let record = log.record_if_hard(&decision(12_000, false), pair()).cloned();
        assert_eq!(
            record,
            Some(ConflictRecord { pair: pair(), winner: "A".into(), duration_ms: 12_000 })
        );
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_auto_decision_never_logged() {
        let mut log = ConflictLog::default();
        assert!(log.record_if_hard(&decision(12_000, true), pair()).is_none());
        assert!(log.is_empty());
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let mut log = ConflictLog::default();
        assert!(log.record_if_hard(&decision(10_000, false), pair()).is_none());
        assert!(log.record_if_hard(&decision(10_001, false), pair()).is_some());
    }
}
