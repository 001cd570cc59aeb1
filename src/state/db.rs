// SQLite database setup and migrations
use chrono::Utc;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;

use super::storage::StorageError;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Database initialization failed: {0}")]
    InitFailed(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Latest schema version
pub const SCHEMA_VERSION: i32 = 2;

/// How long a connection waits on another process's write lock
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// Thread-safe database connection wrapper
// Every statement runs under this single lock, which also serializes brain updates
pub struct DbConnection {
    conn: Arc<Mutex<Connection>>,
}

impl DbConnection {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Open an in-memory database with all migrations applied
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        prepare(&conn)?;
        Ok(Self::new(conn))
    }

    // A panic while holding the lock drops any open transaction, which rolls it
    // back, so the connection is still consistent after poisoning
    pub fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clone for DbConnection {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
        }
    }
}

/// Open (or create) the database file at `db_path`
pub fn init_db(db_path: &Path) -> DbResult<DbConnection> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(db_path)?;
    prepare(&conn).map_err(|e| DbError::InitFailed(format!("{}: {}", db_path.display(), e)))?;

    log::info!("Opened database at {}", db_path.display());
    Ok(DbConnection::new(conn))
}

fn prepare(conn: &Connection) -> DbResult<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    // Take the write lock up front so concurrent opens of a fresh file
    // apply each migration exactly once
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    run_migrations(&tx)?;
    tx.commit()?;
    Ok(())
}

fn run_migrations(conn: &Connection) -> DbResult<()> {
    // Create migrations table if it doesn't exist
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // Get current version
    let current_version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    // Apply migrations
    if current_version < 1 {
        migration_v1(conn)?;
        record_version(conn, 1)?;
    }
    if current_version < 2 {
        migration_v2(conn)?;
        record_version(conn, 2)?;
    }

    Ok(())
}

fn record_version(conn: &Connection, version: i32) -> DbResult<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version) VALUES (?1)",
        [version],
    )?;
    log::debug!("Applied schema migration v{}", version);
    Ok(())
}

fn migration_v1(conn: &Connection) -> DbResult<()> {
    // Categories ("gravity wells")
    conn.execute(
        "CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            color_hex INTEGER NOT NULL,
            x_pos REAL NOT NULL,
            y_pos REAL NOT NULL
        )",
        [],
    )?;

    // Notes
    conn.execute(
        "CREATE TABLE IF NOT EXISTS notes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL DEFAULT '',
            content TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            category_id INTEGER,
            deadline TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_notes_category_id ON notes(category_id)",
        [],
    )?;

    // Welcome notes for a brand new jar
    let now = Utc::now().to_rfc3339();
    for content in [
        "Welcome to the Void 🌌",
        "Tap notification to Capture ⚡",
        "Drag me! I obey physics ⚛️",
    ] {
        conn.execute(
            "INSERT INTO notes (title, content, timestamp, category_id, deadline)
             VALUES ('', ?1, ?2, NULL, NULL)",
            [content, now.as_str()],
        )?;
    }

    Ok(())
}

fn migration_v2(conn: &Connection) -> DbResult<()> {
    // Brain word signals: one row per word, JSON category -> count map
    conn.execute(
        "CREATE TABLE IF NOT EXISTS brain_signals (
            word TEXT PRIMARY KEY NOT NULL,
            category_scores TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_db_init() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        // Verify tables exist
        let table_count: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('categories', 'notes', 'brain_signals')",
                [],
                |row| row.get(0),
            )
            .unwrap();

        assert_eq!(table_count, 3);

        let version: i32 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        // Welcome notes are only seeded once
        let notes: i32 = conn
            .query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))
            .unwrap();
        assert_eq!(notes, 3);
    }

    #[test]
    fn test_init_db_creates_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("jar.db");

        let db = init_db(&path).unwrap();
        assert!(path.exists());

        let count: i32 = db
            .lock()
            .query_row("SELECT COUNT(*) FROM brain_signals", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_concurrent_opens_migrate_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("jar.db");

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| init_db(&path).unwrap());
            }
        });

        let db = init_db(&path).unwrap();
        let conn = db.lock();
        let notes: i32 = conn
            .query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))
            .unwrap();
        let versions: i32 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(notes, 3);
        assert_eq!(versions, SCHEMA_VERSION);
    }
}
