// Brain facade
// The only entry point collaborators use: train on saved notes, suggest for drafts

use std::sync::Arc;
use thiserror::Error;

use crate::brain::explainability::Prediction;
use crate::brain::predictor::Predictor;
use crate::brain::signal::{CategoryId, WordSignal};
use crate::brain::store::{SignalStore, StoreError};
use crate::brain::trainer::Trainer;
use crate::config::BrainConfig;

/// Errors surfaced to brain callers
#[derive(Debug, Error)]
pub enum BrainError {
    #[error("Signal store error: {0}")]
    Store(#[from] StoreError),

    #[error("Background task failed: {0}")]
    Background(String),
}

pub type BrainResult<T> = Result<T, BrainError>;

/// Incrementally trained category suggester
///
/// Cheap to clone; clones share the same store. The store handle is passed
/// in at construction, so every brain is explicit about where its state
/// lives.
#[derive(Clone)]
pub struct Brain {
    inner: Arc<BrainInner>,
}

struct BrainInner {
    store: Arc<dyn SignalStore>,
    trainer: Trainer,
    predictor: Predictor,
    config: BrainConfig,
}

impl Brain {
    /// Create a brain with the default configuration
    pub fn new(store: Arc<dyn SignalStore>) -> Self {
        Self::with_config(store, BrainConfig::default())
    }

    /// Create a brain with custom tokenizer and scoring parameters
    pub fn with_config(store: Arc<dyn SignalStore>, config: BrainConfig) -> Self {
        let trainer = Trainer::new(Arc::clone(&store), config.min_token_len);
        let predictor = Predictor::new(Arc::clone(&store), config.clone());
        Brain {
            inner: Arc::new(BrainInner {
                store,
                trainer,
                predictor,
                config,
            }),
        }
    }

    pub fn config(&self) -> &BrainConfig {
        &self.inner.config
    }

    /// Learn that `text` belongs to `category`
    ///
    /// Storage failures are returned so the caller may retry; tokens written
    /// before the failure keep their increments.
    pub fn train(&self, text: &str, category: CategoryId) -> BrainResult<()> {
        let applied = self.inner.trainer.train(text, category)?;
        log::debug!("Trained category {} on {} token(s)", category, applied);
        Ok(())
    }

    /// Suggest a category for `text`
    ///
    /// Never fails: missing evidence and storage errors both yield None.
    pub fn predict(&self, text: &str) -> Option<CategoryId> {
        match self.inner.predictor.predict(text) {
            Ok(category) => category,
            Err(e) => {
                log::warn!("Prediction unavailable: {}", e);
                None
            }
        }
    }

    /// Suggest a category and explain the ranking behind it
    pub fn explain(&self, text: &str) -> BrainResult<Prediction> {
        let scoring = self.inner.predictor.score(text)?;
        Ok(Prediction::from_scoring(scoring, self.inner.config.smoothing))
    }

    /// Replace every stored signal (restore path only)
    pub fn replace_all(&self, signals: &[WordSignal]) -> BrainResult<()> {
        self.inner.store.replace_all(signals)?;
        Ok(())
    }

    /// Forget everything the brain has learned
    pub fn reset(&self) -> BrainResult<()> {
        self.inner.store.clear()?;
        log::info!("Brain reset");
        Ok(())
    }

    /// Snapshot of all stored signals, ordered by word
    pub fn signals(&self) -> BrainResult<Vec<WordSignal>> {
        Ok(self.inner.store.all()?)
    }

    /// Number of distinct words with evidence
    pub fn word_count(&self) -> BrainResult<usize> {
        Ok(self.inner.store.len()?)
    }

    // ==================== ASYNC ====================

    /// `train` on tokio's blocking pool
    pub async fn train_async(&self, text: String, category: CategoryId) -> BrainResult<()> {
        let brain = self.clone();
        tokio::task::spawn_blocking(move || brain.train(&text, category))
            .await
            .map_err(|e| BrainError::Background(e.to_string()))?
    }

    /// `predict` on tokio's blocking pool; a failed task yields None
    pub async fn predict_async(&self, text: String) -> Option<CategoryId> {
        let brain = self.clone();
        match tokio::task::spawn_blocking(move || brain.predict(&text)).await {
            Ok(category) => category,
            Err(e) => {
                log::warn!("Prediction task failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::signal::CategoryCounts;
    use crate::brain::store::{MemorySignalStore, SqliteSignalStore, StoreResult};
    use crate::state::{DbConnection, DbError};

    fn memory_brain() -> Brain {
        Brain::new(Arc::new(MemorySignalStore::new()))
    }

    fn sqlite_brain() -> Brain {
        let db = DbConnection::open_in_memory().unwrap();
        Brain::new(Arc::new(SqliteSignalStore::new(db)))
    }

    #[test]
    fn test_training_recall() {
        for brain in [memory_brain(), sqlite_brain()] {
            let text = "Plan the garden beds for spring";
            brain.train(text, 7).unwrap();
            assert_eq!(brain.predict(text), Some(7));
        }
    }

    #[test]
    fn test_no_evidence_returns_none() {
        let brain = sqlite_brain();
        assert_eq!(brain.predict("hi"), None);
        assert_eq!(brain.predict("unseen_word_xyz"), None);
        assert_eq!(brain.predict(""), None);
    }

    #[test]
    fn test_scenario_tie_is_deterministic() {
        let brain = sqlite_brain();
        brain.train("buy groceries today", 1).unwrap();
        brain.train("write report today", 2).unwrap();

        for _ in 0..20 {
            assert_eq!(brain.predict("today"), Some(1));
        }
    }

    #[test]
    fn test_scenario_repeated_training() {
        let brain = sqlite_brain();
        for _ in 0..3 {
            brain.train("urgent project deadline", 5).unwrap();
        }
        assert_eq!(brain.predict("urgent deadline"), Some(5));
    }

    #[test]
    fn test_explain_matches_predict() {
        let brain = memory_brain();
        brain.train("quarterly budget review", 3).unwrap();
        brain.train("budget groceries", 4).unwrap();

        let explanation = brain.explain("budget review").unwrap();
        assert_eq!(explanation.category_id, brain.predict("budget review"));
        assert_eq!(explanation.category_id, Some(3));
        assert_eq!(explanation.tokens.len(), 2);
    }

    #[test]
    fn test_reset_and_replace() {
        let brain = sqlite_brain();
        brain.train("garden spring", 1).unwrap();
        assert_eq!(brain.word_count().unwrap(), 2);

        let restored = vec![WordSignal::new(
            "invoice",
            [(9, 2)].into_iter().collect::<CategoryCounts>(),
        )];
        brain.replace_all(&restored).unwrap();
        assert_eq!(brain.signals().unwrap(), restored);
        assert_eq!(brain.predict("garden"), None);
        assert_eq!(brain.predict("invoice"), Some(9));

        brain.reset().unwrap();
        assert_eq!(brain.word_count().unwrap(), 0);
    }

    /// Store whose every operation fails
    struct BrokenStore;

    fn broken() -> StoreError {
        StoreError::Db(DbError::InitFailed("database is locked".to_string()))
    }

    impl SignalStore for BrokenStore {
        fn get(&self, _: &str) -> StoreResult<CategoryCounts> {
            Err(broken())
        }
        fn put(&self, _: &str, _: &CategoryCounts) -> StoreResult<()> {
            Err(broken())
        }
        fn increment(&self, _: &str, _: CategoryId) -> StoreResult<u64> {
            Err(broken())
        }
        fn replace_all(&self, _: &[WordSignal]) -> StoreResult<()> {
            Err(broken())
        }
        fn all(&self) -> StoreResult<Vec<WordSignal>> {
            Err(broken())
        }
        fn len(&self) -> StoreResult<usize> {
            Err(broken())
        }
    }

    #[test]
    fn test_failing_store_degrades() {
        let brain = Brain::new(Arc::new(BrokenStore));
        assert_eq!(brain.predict("anything here"), None);
        assert!(matches!(
            brain.train("anything here", 1),
            Err(BrainError::Store(_))
        ));
        // Nothing to write means nothing to fail
        assert!(brain.train("hi", 1).is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_async_training_loses_nothing() {
        const TASKS: usize = 64;
        let brain = sqlite_brain();

        let handles: Vec<_> = (0..TASKS)
            .map(|_| {
                let brain = brain.clone();
                tokio::spawn(async move { brain.train_async("deadline".to_string(), 3).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let signals = brain.signals().unwrap();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].category_counts.get(3), TASKS as u64);
        assert_eq!(brain.predict_async("deadline".to_string()).await, Some(3));
    }
}
