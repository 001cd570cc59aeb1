// Explainability module
// Turns a scoring into a human-readable account of why a category was suggested

use serde::{Deserialize, Serialize};

use crate::brain::predictor::{contribution, CategoryScore, Scoring};
use crate::brain::signal::CategoryId;

/// How one token pushed the ranking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenContribution {
    pub token: String,

    /// (category, log contribution) pairs, ascending category id
    pub contributions: Vec<(CategoryId, f64)>,
}

/// A prediction together with the evidence behind it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    /// Suggested category, if any token carried evidence
    pub category_id: Option<CategoryId>,

    /// Every category with evidence, best first
    pub ranking: Vec<CategoryScore>,

    /// Per-token breakdown, in text order
    pub tokens: Vec<TokenContribution>,

    pub reasoning: String,
}

impl Prediction {
    /// Build an explanation from a scoring
    pub fn from_scoring(scoring: Scoring, smoothing: f64) -> Self {
        let tokens: Vec<TokenContribution> = scoring
            .evidence
            .iter()
            .map(|item| TokenContribution {
                token: item.token.clone(),
                contributions: item
                    .counts
                    .iter()
                    .map(|(category, count)| (category, contribution(count, smoothing)))
                    .collect(),
            })
            .collect();

        let reasoning = describe(&tokens, &scoring.ranking);

        Prediction {
            category_id: scoring.best(),
            ranking: scoring.ranking,
            tokens,
            reasoning,
        }
    }
}

fn describe(tokens: &[TokenContribution], ranking: &[CategoryScore]) -> String {
    if tokens.is_empty() {
        return "No words long enough to judge.".to_string();
    }

    let (known, unknown): (Vec<_>, Vec<_>) =
        tokens.iter().partition(|t| !t.contributions.is_empty());

    let Some(best) = ranking.first() else {
        return format!("None of {} word(s) has been seen before.", unknown.len());
    };

    let mut parts = vec![format!(
        "Suggested category {} with score {:.3} from {} word(s).",
        best.category_id, best.score, best.supporting_tokens
    )];

    let winners: Vec<&str> = known
        .iter()
        .filter(|t| t.contributions.iter().any(|(c, _)| *c == best.category_id))
        .map(|t| t.token.as_str())
        .collect();
    if !winners.is_empty() {
        parts.push(format!("Supporting words: {}.", winners.join(", ")));
    }

    if let Some(runner_up) = ranking.get(1) {
        if runner_up.score == best.score {
            parts.push(format!(
                "Tied with category {}; lower id wins.",
                runner_up.category_id
            ));
        } else {
            parts.push(format!(
                "Runner-up category {} scored {:.3}.",
                runner_up.category_id, runner_up.score
            ));
        }
    }

    if !unknown.is_empty() {
        parts.push(format!("{} word(s) had no history.", unknown.len()));
    }

    parts.join(" ")
}
