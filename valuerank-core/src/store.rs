/// Item store: the fixed catalogue and its rating state.
///
/// Items live in catalogue order for the whole session. Everything else in the
/// crate refers to them by `usize` index; names only appear at the API edge.
use std::cmp::Ordering;

use crate::error::{EngineError, Result};
use crate::types::{Item, NameIndex, RankedItem};

#[derive(Debug, Clone)]
pub struct ItemStore {
    items: Vec<Item>,
    index: NameIndex,
}

impl ItemStore {
    /// Fresh store from an ordered list of names.
    pub fn from_catalogue<S: AsRef<str>>(names: &[S], initial_rating: f64, initial_rd: f64) -> Result<Self> {
        let items = names
            .iter()
            .map(|n| Item::with_rating(n.as_ref().trim(), initial_rating, initial_rd))
            .collect();
        Self::from_items(items)
    }

    /// Store from already-built items (e.g. a migrated session).
    pub fn from_items(items: Vec<Item>) -> Result<Self> {
        if items.len() < 2 {
            return Err(EngineError::DegenerateCatalogue(format!(
                "at least two items are required to compare, got {}",
                items.len()
            )));
        }
        if let Some(blank) = items.iter().position(|i| i.name.is_empty()) {
            return Err(EngineError::DegenerateCatalogue(format!(
                "item at position {blank} has an empty name"
            )));
        }
        let index = NameIndex::from_names(items.iter().map(|i| i.name.as_str()))?;
        Ok(ItemStore { items, index })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Item> {
        self.items
    }

    pub fn get(&self, idx: usize) -> &Item {
        &self.items[idx]
    }

    pub fn name(&self, idx: usize) -> &str {
        &self.items[idx].name
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains(name)
    }

    pub fn by_name(&self, name: &str) -> Option<&Item> {
        self.index_of(name).map(|idx| &self.items[idx])
    }

    /// Mutable access to two distinct items at once.
    pub(crate) fn pair_mut(&mut self, a: usize, b: usize) -> (&mut Item, &mut Item) {
        assert_ne!(a, b, "pair_mut requires two distinct items");
        if a < b {
            let (lo, hi) = self.items.split_at_mut(b);
            (&mut lo[a], &mut hi[0])
        } else {
            let (lo, hi) = self.items.split_at_mut(a);
            (&mut hi[0], &mut lo[b])
        }
    }

    /// Mark two items as having faced each other.
    pub(crate) fn record_pairing(&mut self, a: usize, b: usize) {
        let name_a = self.items[a].name.clone();
        let name_b = self.items[b].name.clone();
        let (item_a, item_b) = self.pair_mut(a, b);
        item_a.opponents.insert(name_b);
        item_b.opponents.insert(name_a);
        item_a.match_count += 1;
        item_b.match_count += 1;
    }

    pub fn have_faced(&self, a: usize, b: usize) -> bool {
        self.items[a].has_faced(&self.items[b].name)
    }

    /// Indices sorted by rating, highest first. Ties keep catalogue order.
    pub fn by_rating_desc(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.items.len()).collect();
        order.sort_by(|&a, &b| compare_rating_desc(&self.items[a], &self.items[b]));
        order
    }

    /// Display order.
    ///
    /// Items carrying a manual rank come first, in manual-rank order. The rest
    /// follow by rating. With no manual ranks at all this is pure rating order.
    pub fn ranked(&self) -> Vec<RankedItem> {
        let mut order: Vec<usize> = (0..self.items.len()).collect();
        order.sort_by(|&a, &b| {
            let (ia, ib) = (&self.items[a], &self.items[b]);
            match (ia.manual_rank, ib.manual_rank) {
                (Some(ra), Some(rb)) => ra.cmp(&rb),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => compare_rating_desc(ia, ib),
            }
        });

        order
            .into_iter()
            .enumerate()
            .map(|(pos, idx)| {
                let item = &self.items[idx];
                RankedItem {
                    rank: pos + 1,
                    name: item.name.clone(),
                    rating: item.rating,
                    rd: item.rd,
                    match_count: item.match_count,
                    manual_rank: item.manual_rank,
                }
            })
            .collect()
    }

    /// Assign manual ranks 1..=n in the given order. Items not listed lose any
    /// previous manual rank. Rating state is untouched.
    pub fn apply_manual_order<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        let mut indices = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let idx = self.index_of(name).ok_or_else(|| {
                EngineError::InvalidDecision(format!("unknown item \"{name}\" in manual order"))
            })?;
            if indices.contains(&idx) {
                return Err(EngineError::InvalidDecision(format!(
                    "item \"{name}\" appears twice in manual order"
                )));
            }
            indices.push(idx);
        }

        self.clear_manual_order();
        for (pos, idx) in indices.into_iter().enumerate() {
            self.items[idx].manual_rank = Some(pos as u32 + 1);
        }
        Ok(())
    }

    /// Return every item to its initial state, keeping the catalogue.
    pub(crate) fn reset(&mut self, initial_rating: f64, initial_rd: f64) {
        for item in &mut self.items {
            *item = Item::with_rating(std::mem::take(&mut item.name), initial_rating, initial_rd);
        }
    }

    pub fn clear_manual_order(&mut self) {
        for item in &mut self.items {
            item.manual_rank = None;
        }
    }

    pub fn has_manual_order(&self) -> bool {
        self.items.iter().any(|i| i.manual_rank.is_some())
    }
}

fn compare_rating_desc(a: &Item, b: &Item) -> Ordering {
    b.rating.partial_cmp(&a.rating).unwrap_or(Ordering::Equal)
}
