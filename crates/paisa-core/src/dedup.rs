//! Processed-id tracking for the detection loop

use std::collections::HashSet;

use crate::models::Transaction;

/// Ids the detection loop has already committed
///
/// Keeps insertion order for persistence and a hash index for lookups. Only
/// grows; the whole set is cleared when consent is revoked.
#[derive(Debug, Clone, Default)]
pub struct ProcessedIds {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl ProcessedIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// Record an id; returns false if it was already present
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.seen.contains(&id) {
            return false;
        }
        self.seen.insert(id.clone());
        self.order.push(id);
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.seen.clear();
    }

    /// Ids in the order they were recorded
    pub fn as_slice(&self) -> &[String] {
        &self.order
    }
}

impl FromIterator<String> for ProcessedIds {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut ids = Self::new();
        for id in iter {
            ids.insert(id);
        }
        ids
    }
}

/// Drop candidates whose id has already been processed
pub fn filter_new(candidates: Vec<Transaction>, processed: &ProcessedIds) -> Vec<Transaction> {
    candidates
        .into_iter()
        .filter(|tx| !processed.contains(&tx.id))
        .collect()
}
