// Word signals
// Per-word category frequency distributions and their persisted encoding

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Category identifier (SQLite rowid of the category)
pub type CategoryId = i64;

/// Sparse category -> count distribution for a single word
///
/// Zero counts are never stored, so an absent category and a zero count are
/// indistinguishable and an empty distribution means "no evidence".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<CategoryId, u64>",
    into = "BTreeMap<CategoryId, u64>"
)]
pub struct CategoryCounts {
    counts: BTreeMap<CategoryId, u64>,
}

impl CategoryCounts {
    /// Create an empty distribution
    pub fn new() -> Self {
        Self::default()
    }

    /// Count for a category (0 if absent)
    pub fn get(&self, category: CategoryId) -> u64 {
        self.counts.get(&category).copied().unwrap_or(0)
    }

    /// Set the count for a category, removing the entry when it is zero
    pub fn set(&mut self, category: CategoryId, count: u64) {
        if count == 0 {
            self.counts.remove(&category);
        } else {
            self.counts.insert(category, count);
        }
    }

    /// Add one observation for a category and return the new count
    pub fn increment(&mut self, category: CategoryId) -> u64 {
        let count = self.counts.entry(category).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Sum of all counts
    pub fn total(&self) -> u64 {
        self.counts.values().fold(0u64, |acc, c| acc.saturating_add(*c))
    }

    /// Iterate entries in ascending category order
    pub fn iter(&self) -> impl Iterator<Item = (CategoryId, u64)> + '_ {
        self.counts.iter().map(|(id, count)| (*id, *count))
    }

    /// Encode as a compact JSON object, e.g. `{"1":5,"2":1}`
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode a stored record, rejecting malformed input
    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Decode a stored record, treating malformed input as an empty distribution
    pub fn decode_or_empty(word: &str, raw: &str) -> Self {
        match Self::decode(raw) {
            Ok(counts) => counts,
            Err(e) => {
                log::warn!(
                    "Ignoring unreadable signal for '{}' ({}): {:?}",
                    word,
                    e,
                    raw
                );
                Self::new()
            }
        }
    }
}

impl From<BTreeMap<CategoryId, u64>> for CategoryCounts {
    fn from(counts: BTreeMap<CategoryId, u64>) -> Self {
        counts.into_iter().collect()
    }
}

impl From<CategoryCounts> for BTreeMap<CategoryId, u64> {
    fn from(counts: CategoryCounts) -> Self {
        counts.counts
    }
}

impl FromIterator<(CategoryId, u64)> for CategoryCounts {
    fn from_iter<I: IntoIterator<Item = (CategoryId, u64)>>(iter: I) -> Self {
        let mut counts = CategoryCounts::new();
        for (category, count) in iter {
            counts.set(category, count);
        }
        counts
    }
}

/// A word together with its category distribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordSignal {
    pub word: String,
    pub category_counts: CategoryCounts,
}

impl WordSignal {
    pub fn new(word: impl Into<String>, category_counts: CategoryCounts) -> Self {
        WordSignal {
            word: word.into(),
            category_counts,
        }
    }
}
