// Online trainer
// Adds one observation per token occurrence to the signal store

use std::sync::Arc;

use crate::brain::signal::CategoryId;
use crate::brain::store::{SignalStore, StoreResult};
use crate::brain::tokenizer::tokenize_with;

pub struct Trainer {
    store: Arc<dyn SignalStore>,
    min_token_len: usize,
}

impl Trainer {
    pub fn new(store: Arc<dyn SignalStore>, min_token_len: usize) -> Self {
        Trainer {
            store,
            min_token_len,
        }
    }

    /// Train `category` on every token of `text`
    ///
    /// Repeated tokens count once per occurrence. Tokens are applied one at a
    /// time; if the store fails partway the error is returned and the
    /// increments already written stay in place. Returns the number of
    /// increments applied.
    pub fn train(&self, text: &str, category: CategoryId) -> StoreResult<usize> {
        let tokens = tokenize_with(text, self.min_token_len);

        for (applied, token) in tokens.iter().enumerate() {
            match self.store.increment(token, category) {
                Ok(count) => log::debug!("'{}' -> category {} ({})", token, category, count),
                Err(e) => {
                    log::warn!(
                        "Training stopped at '{}' after {} of {} tokens: {}",
                        token,
                        applied,
                        tokens.len(),
                        e
                    );
                    return Err(e);
                }
            }
        }

        Ok(tokens.len())
    }
}
