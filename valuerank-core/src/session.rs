/// Persisted session shape and its versioned migration.
///
/// `PersistedSession` is what the host stores after every decision. Loading goes
/// through `RawSession`, a lenient mirror that accepts every layout ever
/// written, and `migrate`, which upgrades it to the current version:
///
///   v0 (original points-based layout): `values`/`history` keys, no rating or
///      rd, `playedAgainst`, `matches`, `duration`. Ratings are rebuilt by
///      replaying history through the rating model.
///   v1: current layout. Missing per-item fields are backfilled with defaults.
///
/// In every version, opponent sets and match counts are recomputed as the
/// symmetric closure of the decision history.
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::SESSION_SCHEMA_VERSION;
use crate::engine::EngineConfig;
use crate::error::{EngineError, Result};
use crate::store::ItemStore;
use crate::types::{ConflictRecord, Decision, Item, NameIndex};

/// Session state as stored: items, decisions and conflicts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    pub schema_version: u32,
    pub items: Vec<Item>,
    pub decisions: Vec<Decision>,
    pub conflicts: Vec<ConflictRecord>,
}

impl PersistedSession {
    /// Parse any known layout and migrate it to the current one.
    pub fn from_json(json: &str, config: &EngineConfig) -> Result<Self> {
        let raw: RawSession = serde_json::from_str(json)
            .map_err(|e| EngineError::MalformedSession(format!("unreadable session JSON: {e}")))?;
        migrate(raw, config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| EngineError::MalformedSession(format!("failed to serialize session: {e}")))
    }
}

/// Lenient mirror of every persisted layout.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSession {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default, alias = "values")]
    pub items: Option<Vec<RawItem>>,
    #[serde(default, alias = "history")]
    pub decisions: Vec<RawDecision>,
    #[serde(default)]
    pub conflicts: Vec<RawConflict>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawItem {
    pub name: String,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub rd: Option<f64>,
    #[serde(default)]
    pub manual_rank: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDecision {
    pub winner: String,
    pub loser: String,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default, alias = "duration")]
    pub duration_ms: u64,
    #[serde(default, rename = "auto")]
    pub was_auto: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConflict {
    pub pair: [String; 2],
    pub winner: String,
    #[serde(default, alias = "duration")]
    pub duration_ms: u64,
}

/// Upgrade a raw session to the current schema, validating every reference.
pub fn migrate(raw: RawSession, config: &EngineConfig) -> Result<PersistedSession> {
    let version = raw.schema_version.unwrap_or(0);
    check_version(version)?;

    let raw_items = match raw.items {
        Some(items) if !items.is_empty() => items,
        _ => return Err(EngineError::MalformedSession("session has no item catalogue".into())),
    };

    let replay = version == 0 && raw_items.iter().all(|i| i.rating.is_none());
    let rating = &config.rating;

    let items: Vec<Item> = raw_items
        .into_iter()
        .map(|raw| {
            let mut item = Item::with_rating(
                clean(raw.name),
                raw.rating.unwrap_or(rating.initial_rating),
                raw.rd.unwrap_or(rating.initial_rd),
            );
            item.manual_rank = raw.manual_rank;
            item
        })
        .collect();

    let decisions: Vec<Decision> = raw
        .decisions
        .into_iter()
        .map(|d| Decision {
            winner: clean(d.winner),
            loser: clean(d.loser),
            timestamp: d.timestamp,
            duration_ms: d.duration_ms,
            was_auto: d.was_auto,
        })
        .collect();

    let conflicts: Vec<ConflictRecord> = raw
        .conflicts
        .into_iter()
        .map(|c| {
            let [left, right] = c.pair;
            ConflictRecord {
                pair: [clean(left), clean(right)],
                winner: clean(c.winner),
                duration_ms: c.duration_ms,
            }
        })
        .collect();

    let session = rebuild(items, decisions, conflicts, replay, config)?;
    debug!(from_version = version, replayed = replay, decisions = session.decisions.len(), "session migrated");
    Ok(session)
}

impl PersistedSession {
    /// Validate every reference and rebuild opponent sets and match counts
    /// as the symmetric closure of the decisions. Ratings are kept.
    pub fn normalize(self, config: &EngineConfig) -> Result<Self> {
        check_version(self.schema_version)?;
        rebuild(self.items, self.decisions, self.conflicts, false, config)
    }
}

fn check_version(version: u32) -> Result<()> {
    if version > SESSION_SCHEMA_VERSION {
        return Err(EngineError::MalformedSession(format!(
            "session schema version {version} is newer than supported version {SESSION_SCHEMA_VERSION}"
        )));
    }
    Ok(())
}

fn clean(name: String) -> String {
    name.trim().to_string()
}

/// Shared by `migrate` and `normalize`. With `replay`, ratings are rebuilt by
/// running every decision through the rating model.
fn rebuild(
    mut items: Vec<Item>,
    mut decisions: Vec<Decision>,
    conflicts: Vec<ConflictRecord>,
    replay: bool,
    config: &EngineConfig,
) -> Result<PersistedSession> {
    for item in &mut items {
        item.opponents.clear();
        item.match_count = 0;
    }

    let names = NameIndex::from_names(items.iter().map(|i| i.name.as_str()))
        .map_err(|e| EngineError::MalformedSession(e.to_string()))?;

    for (i, d) in decisions.iter_mut().enumerate() {
        for name in [&d.winner, &d.loser] {
            if !names.contains(name) {
                return Err(EngineError::MalformedSession(format!(
                    "decision {i} references unknown item \"{name}\""
                )));
            }
        }
        if d.winner == d.loser {
            return Err(EngineError::MalformedSession(format!(
                "decision {i} has \"{}\" beating itself",
                d.winner
            )));
        }
        if d.was_auto {
            d.duration_ms = 0;
        }
    }

    for (i, c) in conflicts.iter().enumerate() {
        if let Some(name) = c.pair.iter().find(|n| !names.contains(n)) {
            return Err(EngineError::MalformedSession(format!(
                "conflict {i} references unknown item \"{name}\""
            )));
        }
        if !c.pair.contains(&c.winner) {
            return Err(EngineError::MalformedSession(format!(
                "conflict {i} winner \"{}\" is not one of its pair",
                c.winner
            )));
        }
    }

    let mut store = ItemStore::from_items(items)
        .map_err(|e| EngineError::MalformedSession(e.to_string()))?;
    let rating = &config.rating;

    for d in &decisions {
        // Names were validated above.
        let (Some(w), Some(l)) = (store.index_of(&d.winner), store.index_of(&d.loser)) else {
            continue;
        };
        if replay {
            let confident = !d.was_auto && d.duration_ms < config.confident_threshold_ms;
            let (winner, loser) = store.pair_mut(w, l);
            rating.apply_result(winner, loser, confident, d.was_auto);
        }
        store.record_pairing(w, l);
    }

    Ok(PersistedSession {
        schema_version: SESSION_SCHEMA_VERSION,
        items: store.into_items(),
        decisions,
        conflicts,
    })
}
