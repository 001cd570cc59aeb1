// Brain module
// Word signal store, online trainer and log-count predictor behind one facade

pub mod explainability;
pub mod facade;
pub mod predictor;
pub mod signal;
pub mod store;
pub mod tokenizer;
pub mod trainer;

pub use explainability::{Prediction, TokenContribution};
pub use facade::{Brain, BrainError, BrainResult};
pub use predictor::{CategoryScore, Predictor, Scoring, TokenEvidence};
pub use signal::{CategoryCounts, CategoryId, WordSignal};
pub use store::{MemorySignalStore, SignalStore, SqliteSignalStore, StoreError, StoreResult};
pub use tokenizer::tokenize;
pub use trainer::Trainer;
