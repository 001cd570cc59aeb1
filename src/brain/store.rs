// Word signal store
// Persistent per-word category counts with an atomic increment primitive

use rusqlite::{params, Connection, TransactionBehavior};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use thiserror::Error;

use crate::brain::signal::{CategoryCounts, CategoryId, WordSignal};
use crate::state::{DbConnection, DbError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Db(#[from] DbError),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Keyed storage of one category distribution per word
///
/// `put` is a whole-value overwrite. Training must go through `increment`,
/// which implementations make atomic per word so concurrent trainings never
/// lose a count.
pub trait SignalStore: Send + Sync {
    /// Current distribution for `word`; empty if the word was never trained
    fn get(&self, word: &str) -> StoreResult<CategoryCounts>;

    /// Replace the stored distribution; an empty distribution removes the word
    fn put(&self, word: &str, counts: &CategoryCounts) -> StoreResult<()>;

    /// Add one observation of `category` for `word` and return the new count
    fn increment(&self, word: &str, category: CategoryId) -> StoreResult<u64>;

    /// Wipe the store and load `signals` in its place
    fn replace_all(&self, signals: &[WordSignal]) -> StoreResult<()>;

    /// All stored signals ordered by word
    fn all(&self) -> StoreResult<Vec<WordSignal>>;

    /// Number of stored words
    fn len(&self) -> StoreResult<usize>;

    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Remove every signal
    fn clear(&self) -> StoreResult<()> {
        self.replace_all(&[])
    }
}

// ==================== SQLITE STORE ====================

/// Signal store backed by the `brain_signals` table
#[derive(Clone)]
pub struct SqliteSignalStore {
    db: DbConnection,
}

impl SqliteSignalStore {
    pub fn new(db: DbConnection) -> Self {
        SqliteSignalStore { db }
    }
}

fn load_counts(conn: &Connection, word: &str) -> StoreResult<CategoryCounts> {
    let result = conn.query_row(
        "SELECT category_scores FROM brain_signals WHERE word = ?1",
        [word],
        |row| row.get::<_, String>(0),
    );

    match result {
        Ok(raw) => Ok(CategoryCounts::decode_or_empty(word, &raw)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(CategoryCounts::new()),
        Err(e) => Err(e.into()),
    }
}

fn write_counts(conn: &Connection, word: &str, counts: &CategoryCounts) -> StoreResult<()> {
    if counts.is_empty() {
        conn.execute("DELETE FROM brain_signals WHERE word = ?1", [word])?;
    } else {
        conn.execute(
            "INSERT INTO brain_signals (word, category_scores) VALUES (?1, ?2)
             ON CONFLICT(word) DO UPDATE SET category_scores = excluded.category_scores",
            params![word, counts.encode()?],
        )?;
    }
    Ok(())
}

impl SignalStore for SqliteSignalStore {
    fn get(&self, word: &str) -> StoreResult<CategoryCounts> {
        let conn = self.db.lock();
        load_counts(&conn, word)
    }

    fn put(&self, word: &str, counts: &CategoryCounts) -> StoreResult<()> {
        let conn = self.db.lock();
        write_counts(&conn, word, counts)
    }

    fn increment(&self, word: &str, category: CategoryId) -> StoreResult<u64> {
        // Connection lock + immediate transaction make the read-modify-write
        // atomic, also against other connections to the same file
        let mut conn = self.db.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut counts = load_counts(&tx, word)?;
        let updated = counts.increment(category);
        write_counts(&tx, word, &counts)?;

        tx.commit()?;
        Ok(updated)
    }

    fn replace_all(&self, signals: &[WordSignal]) -> StoreResult<()> {
        let mut conn = self.db.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute("DELETE FROM brain_signals", [])?;
        for signal in signals {
            write_counts(&tx, &signal.word, &signal.category_counts)?;
        }

        tx.commit()?;
        log::info!("Replaced brain signals ({} words)", signals.len());
        Ok(())
    }

    fn all(&self) -> StoreResult<Vec<WordSignal>> {
        let conn = self.db.lock();
        let mut stmt =
            conn.prepare("SELECT word, category_scores FROM brain_signals ORDER BY word")?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .map(|(word, raw)| {
                let counts = CategoryCounts::decode_or_empty(&word, &raw);
                WordSignal::new(word, counts)
            })
            .filter(|signal| !signal.category_counts.is_empty())
            .collect())
    }

    // Counts the same rows `all` returns, so unreadable records are skipped
    fn len(&self) -> StoreResult<usize> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare("SELECT category_scores FROM brain_signals")?;

        let mut count = 0;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let raw: String = row.get(0)?;
            if CategoryCounts::decode(&raw).is_ok_and(|counts| !counts.is_empty()) {
                count += 1;
            }
        }
        Ok(count)
    }
}

// ==================== MEMORY STORE ====================

/// Ephemeral signal store, used when no database is wanted
#[derive(Default)]
pub struct MemorySignalStore {
    signals: RwLock<HashMap<String, CategoryCounts>>,
}

impl MemorySignalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SignalStore for MemorySignalStore {
    fn get(&self, word: &str) -> StoreResult<CategoryCounts> {
        let signals = self.signals.read().unwrap_or_else(PoisonError::into_inner);
        Ok(signals.get(word).cloned().unwrap_or_default())
    }

    fn put(&self, word: &str, counts: &CategoryCounts) -> StoreResult<()> {
        let mut signals = self.signals.write().unwrap_or_else(PoisonError::into_inner);
        if counts.is_empty() {
            signals.remove(word);
        } else {
            signals.insert(word.to_string(), counts.clone());
        }
        Ok(())
    }

    fn increment(&self, word: &str, category: CategoryId) -> StoreResult<u64> {
        let mut signals = self.signals.write().unwrap_or_else(PoisonError::into_inner);
        Ok(signals
            .entry(word.to_string())
            .or_default()
            .increment(category))
    }

    fn replace_all(&self, replacement: &[WordSignal]) -> StoreResult<()> {
        let mut signals = self.signals.write().unwrap_or_else(PoisonError::into_inner);
        signals.clear();
        for signal in replacement {
            if !signal.category_counts.is_empty() {
                signals.insert(signal.word.clone(), signal.category_counts.clone());
            }
        }
        Ok(())
    }

    fn all(&self) -> StoreResult<Vec<WordSignal>> {
        let signals = self.signals.read().unwrap_or_else(PoisonError::into_inner);
        let mut all: Vec<WordSignal> = signals
            .iter()
            .map(|(word, counts)| WordSignal::new(word.clone(), counts.clone()))
            .collect();
        all.sort_by(|a, b| a.word.cmp(&b.word));
        Ok(all)
    }

    fn len(&self) -> StoreResult<usize> {
        let signals = self.signals.read().unwrap_or_else(PoisonError::into_inner);
        Ok(signals.len())
    }
}
