use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::constants::{INITIAL_RATING, INITIAL_RD};
use crate::error::{EngineError, Result};

/// A rateable entity and its rating state.
///
/// Items are identified by name. Field names serialize in the persisted
/// session shape (`matchCount`, `manualRank`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub name: String,
    pub rating: f64,
    /// Rating deviation. Non-increasing over the life of the item.
    pub rd: f64,
    pub match_count: u32,
    /// Names of every item this one has been compared against.
    pub opponents: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_rank: Option<u32>,
}

impl Item {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_rating(name, INITIAL_RATING, INITIAL_RD)
    }

    pub fn with_rating(name: impl Into<String>, rating: f64, rd: f64) -> Self {
        Item {
            name: name.into(),
            rating,
            rd,
            match_count: 0,
            opponents: BTreeSet::new(),
            manual_rank: None,
        }
    }

    pub fn has_faced(&self, other: &str) -> bool {
        self.opponents.contains(other)
    }
}

/// One recorded preference. Immutable once appended to history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub winner: String,
    pub loser: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Think-time. Always 0 for auto-resolved decisions.
    pub duration_ms: u64,
    #[serde(rename = "auto")]
    pub was_auto: bool,
}

/// A comparison the user struggled with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictRecord {
    /// Names in presentation order.
    pub pair: [String; 2],
    pub winner: String,
    pub duration_ms: u64,
}

/// Which slot of a presented pair the user picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Map a raw slot index (0 or 1) from the UI to a side.
    pub fn from_index(index: usize) -> Option<Side> {
        match index {
            0 => Some(Side::Left),
            1 => Some(Side::Right),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }

    pub fn other(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// How a presented pair should be labelled by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairKind {
    /// Nothing in history decides this pair.
    Comparison,
    /// History implies both directions (a preference cycle). The user breaks the tie.
    Contradiction,
    /// Every pair has been played; the current leaders are rematched.
    Rematch,
}

impl PairKind {
    pub fn is_tie_breaker(self) -> bool {
        !matches!(self, PairKind::Comparison)
    }
}

/// An item in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedItem {
    /// 1-based display position.
    pub rank: usize,
    pub name: String,
    pub rating: f64,
    pub rd: f64,
    pub match_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual_rank: Option<u32>,
}

/// Index pair into the item store.
pub type IndexedPair = (usize, usize);

/// Maps item names to internal 0..N indices.
#[derive(Debug, Clone, Default)]
pub(crate) struct NameIndex {
    name_to_idx: HashMap<String, usize>,
}

impl NameIndex {
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let mut name_to_idx = HashMap::new();
        for (idx, name) in names.into_iter().enumerate() {
            if name_to_idx.insert(name.to_string(), idx).is_some() {
                return Err(EngineError::DegenerateCatalogue(format!(
                    "duplicate item name \"{name}\""
                )));
            }
        }
        Ok(NameIndex { name_to_idx })
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.name_to_idx.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.name_to_idx.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_from_index() {
        assert_eq!(Side::from_index(0), Some(Side::Left));
        assert_eq!(Side::from_index(1), Some(Side::Right));
        assert_eq!(Side::from_index(2), None);
        assert_eq!(Side::Left.other(), Side::Right);
    }

    #[test]
    fn test_name_index_rejects_duplicates() {
        let err = NameIndex::from_names(["Love", "Fun", "Love"]).unwrap_err();
        assert!(matches!(err, EngineError::DegenerateCatalogue(_)));
    }

    #[test]
    fn test_item_serializes_in_session_shape() {
        let mut item = Item::new("Wisdom");
        item.opponents.insert("Fame".to_string());
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["matchCount"], 0);
        assert_eq!(json["rating"], 1500.0);
        assert_eq!(json["opponents"][0], "Fame");
        assert!(json.get("manualRank").is_none());
    }

    #[test]
    fn test_decision_uses_auto_key() {
        let d = Decision {
            winner: "A".into(),
            loser: "B".into(),
            timestamp: 1,
            duration_ms: 0,
            was_auto: true,
        };
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["auto"], true);
        assert_eq!(json["durationMs"], 0);
    }
}
