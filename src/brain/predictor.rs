// Category predictor
// Sums ln(count + smoothing) per category over the distinct tokens of the text

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::brain::signal::{CategoryCounts, CategoryId};
use crate::brain::store::{SignalStore, StoreResult};
use crate::brain::tokenizer::{distinct, tokenize_with};
use crate::config::BrainConfig;

/// Aggregate score for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category_id: CategoryId,

    /// Sum of log contributions from every token with evidence
    pub score: f64,

    /// Number of distinct tokens that contributed
    pub supporting_tokens: usize,
}

/// Stored evidence for a single distinct token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenEvidence {
    pub token: String,
    pub counts: CategoryCounts,
}

/// Full scoring result for a text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scoring {
    /// Every distinct token, including those with no evidence
    pub evidence: Vec<TokenEvidence>,

    /// Categories with evidence, best first; equal scores ordered by ascending id
    pub ranking: Vec<CategoryScore>,
}

impl Scoring {
    /// Winning category, if any category received a contribution
    pub fn best(&self) -> Option<CategoryId> {
        self.ranking.first().map(|s| s.category_id)
    }
}

pub struct Predictor {
    store: Arc<dyn SignalStore>,
    config: BrainConfig,
}

impl Predictor {
    pub fn new(store: Arc<dyn SignalStore>, config: BrainConfig) -> Self {
        Predictor { store, config }
    }

    /// Best category for `text`, or None without evidence
    pub fn predict(&self, text: &str) -> StoreResult<Option<CategoryId>> {
        Ok(self.score(text)?.best())
    }

    /// Score every category with evidence for `text`
    pub fn score(&self, text: &str) -> StoreResult<Scoring> {
        let tokens = tokenize_with(text, self.config.min_token_len);

        let mut evidence = Vec::new();
        for token in distinct(&tokens) {
            evidence.push(TokenEvidence {
                token: token.to_string(),
                counts: self.store.get(token)?,
            });
        }

        let ranking = rank(&evidence, self.config.smoothing);
        Ok(Scoring { evidence, ranking })
    }
}

/// Contribution of one observed count
pub fn contribution(count: u64, smoothing: f64) -> f64 {
    (count as f64 + smoothing).ln()
}

/// Aggregate token evidence into a ranking
///
/// Scores accumulate in token order then category order, so identical
/// evidence always produces identical floating point sums.
pub fn rank(evidence: &[TokenEvidence], smoothing: f64) -> Vec<CategoryScore> {
    let mut totals: BTreeMap<CategoryId, (f64, usize)> = BTreeMap::new();

    for item in evidence {
        for (category, count) in item.counts.iter() {
            let entry = totals.entry(category).or_insert((0.0, 0));
            entry.0 += contribution(count, smoothing);
            entry.1 += 1;
        }
    }

    let mut ranking: Vec<CategoryScore> = totals
        .into_iter()
        .map(|(category_id, (score, supporting_tokens))| CategoryScore {
            category_id,
            score,
            supporting_tokens,
        })
        .collect();

    // Stable sort keeps ascending id order among equal scores
    ranking.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranking
}
