// Idea repository
// Note and category persistence, brain training on save, backup export/import

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::brain::{Brain, BrainError, CategoryId, SqliteSignalStore};
use crate::config::AppConfig;
use crate::state::models::BACKUP_VERSION;
use crate::state::{
    self, queries, storage, BackupData, Category, DbConnection, DbError, NewCategory, NewNote,
    Note, NoteWithCategory, StorageError,
};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Db(#[from] DbError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Brain error: {0}")]
    Brain(#[from] BrainError),
    #[error("Invalid backup: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Backup is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("{0} not found")]
    NotFound(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Saved backup file
#[derive(Debug, Clone, serde::Serialize)]
pub struct BackupFile {
    pub path: PathBuf,
    pub sha256: String,
    pub notes: usize,
    pub categories: usize,
    pub words: usize,
}

/// Entry point for everything the app does with notes
#[derive(Clone)]
pub struct IdeaRepository {
    db: DbConnection,
    brain: Brain,
    backup_dir: PathBuf,
}

impl IdeaRepository {
    pub fn new(db: DbConnection, brain: Brain, backup_dir: PathBuf) -> Self {
        IdeaRepository {
            db,
            brain,
            backup_dir,
        }
    }

    /// Open the jar described by `config`, with the brain stored in the same database
    pub fn open(config: &AppConfig) -> RepositoryResult<Self> {
        let db = state::init_db(&config.database_path())?;
        let store = Arc::new(SqliteSignalStore::new(db.clone()));
        let brain = Brain::with_config(store, config.brain.clone());
        Ok(Self::new(db, brain, config.backup_dir()))
    }

    pub fn brain(&self) -> &Brain {
        &self.brain
    }

    // ==================== NOTES ====================

    /// Save a new note; notes saved with a category train the brain
    ///
    /// A training failure is logged and never fails the save.
    pub fn insert_note(&self, input: NewNote) -> RepositoryResult<Note> {
        let note = state::create_note(&self.db, input)?;

        if let Some(category_id) = note.category_id {
            if let Err(e) = self.brain.train(&note.brain_text(), category_id) {
                log::warn!("Note {} saved but brain training failed: {}", note.id, e);
            }
        }

        Ok(note)
    }

    /// Update a note in place
    ///
    /// The brain is not retrained: it only ever learns from the category a
    /// note was created with.
    pub fn update_note(&self, note: &Note) -> RepositoryResult<()> {
        if !state::update_note(&self.db, note)? {
            return Err(RepositoryError::NotFound(format!("Note {}", note.id)));
        }
        Ok(())
    }

    pub fn delete_note(&self, id: i64) -> RepositoryResult<()> {
        if !state::delete_note(&self.db, id)? {
            return Err(RepositoryError::NotFound(format!("Note {}", id)));
        }
        Ok(())
    }

    pub fn get_note(&self, id: i64) -> RepositoryResult<Option<Note>> {
        Ok(state::get_note(&self.db, id)?)
    }

    pub fn list_notes(&self) -> RepositoryResult<Vec<NoteWithCategory>> {
        Ok(state::list_notes(&self.db)?)
    }

    /// Category suggestion for a draft note
    pub fn suggest_category(&self, title: &str, content: &str) -> Option<CategoryId> {
        self.brain.predict(&state::models::brain_text(title, content))
    }

    // ==================== CATEGORIES ====================

    pub fn create_category(&self, input: NewCategory) -> RepositoryResult<Category> {
        Ok(state::create_category(&self.db, input)?)
    }

    pub fn get_category(&self, id: CategoryId) -> RepositoryResult<Option<Category>> {
        Ok(state::get_category(&self.db, id)?)
    }

    pub fn list_categories(&self) -> RepositoryResult<Vec<Category>> {
        Ok(state::list_categories(&self.db)?)
    }

    pub fn update_category(&self, category: &Category) -> RepositoryResult<()> {
        if !state::update_category(&self.db, category)? {
            return Err(RepositoryError::NotFound(format!("Category {}", category.id)));
        }
        Ok(())
    }

    /// Delete a category; its notes become uncategorized
    /// Brain signals that mention it are left alone
    pub fn delete_category(&self, id: CategoryId) -> RepositoryResult<()> {
        if !state::delete_category(&self.db, id)? {
            return Err(RepositoryError::NotFound(format!("Category {}", id)));
        }
        Ok(())
    }

    // ==================== BACKUP ====================

    /// Snapshot of categories, notes and brain signals
    pub fn export_backup(&self) -> RepositoryResult<BackupData> {
        Ok(BackupData {
            version: BACKUP_VERSION,
            categories: state::list_categories(&self.db)?,
            notes: queries::all_notes(&self.db)?,
            brain_signals: self.brain.signals()?,
        })
    }

    /// Write a timestamped backup file into the backup directory
    pub fn export_to_file(&self) -> RepositoryResult<BackupFile> {
        let backup = self.export_backup()?;
        let json = serde_json::to_vec_pretty(&backup)?;
        let filename = storage::backup_file_name(Utc::now());

        let (path, sha256) = storage::store_backup(&self.backup_dir, &filename, &json)?;
        log::info!("Exported backup to {} ({})", path.display(), sha256);

        Ok(BackupFile {
            path,
            sha256,
            notes: backup.notes.len(),
            categories: backup.categories.len(),
            words: backup.brain_signals.len(),
        })
    }

    /// Replace the whole jar with a backup
    ///
    /// The brain is replaced wholesale by the backup's signals, then notes and
    /// categories are wiped and reloaded with their original ids. Version 1
    /// backups have no signals, which leaves the brain empty. If reloading the
    /// notes fails the previous signals are put back, so the jar is either
    /// fully restored or left as it was.
    pub fn import_backup(&self, json: &str) -> RepositoryResult<BackupData> {
        let backup: BackupData = serde_json::from_str(json)?;

        let previous = self.brain.signals()?;
        self.brain.replace_all(&backup.brain_signals)?;

        if let Err(e) =
            queries::replace_notes_and_categories(&self.db, &backup.categories, &backup.notes)
        {
            if let Err(rollback) = self.brain.replace_all(&previous) {
                log::error!("Failed to restore brain after aborted import: {}", rollback);
            }
            return Err(e.into());
        }

        log::info!(
            "Imported backup v{}: {} categories, {} notes, {} words",
            backup.version,
            backup.categories.len(),
            backup.notes.len(),
            backup.brain_signals.len()
        );
        Ok(backup)
    }

    pub fn import_from_file(&self, path: &Path) -> RepositoryResult<BackupData> {
        let json = String::from_utf8(storage::read_file(path)?)?;
        self.import_backup(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::MemorySignalStore;
    use tempfile::tempdir;

    fn repository(dir: &Path) -> IdeaRepository {
        let db = DbConnection::open_in_memory().unwrap();
        let brain = Brain::new(Arc::new(SqliteSignalStore::new(db.clone())));
        IdeaRepository::new(db, brain, dir.join("backups"))
    }

    fn category(repo: &IdeaRepository, name: &str) -> Category {
        repo.create_category(NewCategory {
            name: name.to_string(),
            color_hex: 0xFFFF0000,
            x_pos: 0.3,
            y_pos: 0.7,
        })
        .unwrap()
    }

    fn note(title: &str, content: &str, category_id: Option<CategoryId>) -> NewNote {
        NewNote {
            title: title.to_string(),
            content: content.to_string(),
            category_id,
            deadline: None,
        }
    }

    #[test]
    fn test_insert_with_category_trains() {
        let dir = tempdir().unwrap();
        let repo = repository(dir.path());
        let errands = category(&repo, "Errands");

        repo.insert_note(note("Groceries", "milk eggs bread", Some(errands.id)))
            .unwrap();

        assert_eq!(repo.suggest_category("", "need more eggs"), Some(errands.id));
        assert_eq!(repo.suggest_category("Groceries", ""), Some(errands.id));
    }

    #[test]
    fn test_insert_without_category_does_not_train() {
        let dir = tempdir().unwrap();
        let repo = repository(dir.path());

        repo.insert_note(note("Groceries", "milk eggs bread", None))
            .unwrap();
        assert_eq!(repo.brain().word_count().unwrap(), 0);
    }

    #[test]
    fn test_editing_category_does_not_retrain() {
        let dir = tempdir().unwrap();
        let repo = repository(dir.path());
        let work = category(&repo, "Work");
        let home = category(&repo, "Home");

        let mut saved = repo
            .insert_note(note("Paint fence", "weekend chore", Some(work.id)))
            .unwrap();
        let before = repo.brain().signals().unwrap();

        saved.category_id = Some(home.id);
        repo.update_note(&saved).unwrap();

        assert_eq!(repo.brain().signals().unwrap(), before);
        assert_eq!(repo.suggest_category("Paint fence", ""), Some(work.id));
        assert_eq!(repo.get_note(saved.id).unwrap().unwrap().category_id, Some(home.id));
    }

    #[test]
    fn test_missing_rows_are_not_found() {
        let dir = tempdir().unwrap();
        let repo = repository(dir.path());

        assert!(matches!(repo.delete_note(999), Err(RepositoryError::NotFound(_))));
        assert!(matches!(repo.delete_category(999), Err(RepositoryError::NotFound(_))));
    }

    #[test]
    fn test_backup_round_trip_restores_brain() {
        let dir = tempdir().unwrap();
        let source = repository(dir.path());
        let ideas = category(&source, "Ideas");
        source
            .insert_note(note("Startup", "pitch deck investors", Some(ideas.id)))
            .unwrap();

        let file = source.export_to_file().unwrap();
        assert!(file.path.starts_with(dir.path().join("backups")));
        assert_eq!(file.categories, 1);
        assert_eq!(file.notes, 4);
        assert_eq!(file.words, 4);

        let target = repository(dir.path());
        let stale = category(&target, "Stale");
        target
            .insert_note(note("Old", "forgotten things", Some(stale.id)))
            .unwrap();

        target.import_from_file(&file.path).unwrap();

        assert_eq!(target.list_categories().unwrap(), vec![ideas.clone()]);
        assert_eq!(target.list_notes().unwrap().len(), 4);
        assert_eq!(target.suggest_category("", "investors"), Some(ideas.id));
        assert_eq!(target.suggest_category("", "forgotten things"), None);
    }

    #[test]
    fn test_version_one_backup_empties_brain() {
        let dir = tempdir().unwrap();
        let repo = repository(dir.path());
        let work = category(&repo, "Work");
        repo.insert_note(note("Report", "quarterly numbers", Some(work.id)))
            .unwrap();

        let json = r#"{"categories": [], "notes": []}"#;
        let backup = repo.import_backup(json).unwrap();

        assert_eq!(backup.version, 1);
        assert!(repo.list_notes().unwrap().is_empty());
        assert_eq!(repo.brain().word_count().unwrap(), 0);
    }

    #[test]
    fn test_malformed_backup_changes_nothing() {
        let dir = tempdir().unwrap();
        let repo = repository(dir.path());

        assert!(matches!(
            repo.import_backup("{not json"),
            Err(RepositoryError::Json(_))
        ));
        assert_eq!(repo.list_notes().unwrap().len(), 3);
    }

    #[test]
    fn test_failed_import_keeps_notes_and_brain() {
        let dir = tempdir().unwrap();
        let repo = repository(dir.path());
        let travel = category(&repo, "Travel");
        repo.insert_note(note("Lisbon", "flights hotel booking", Some(travel.id)))
            .unwrap();

        let notes_before = repo.list_notes().unwrap();
        let signals_before = repo.brain().signals().unwrap();

        // Two notes sharing an id cannot both be reloaded
        let mut backup = repo.export_backup().unwrap();
        backup.brain_signals.clear();
        backup.notes.push(backup.notes[0].clone());
        let json = serde_json::to_string(&backup).unwrap();

        assert!(matches!(repo.import_backup(&json), Err(RepositoryError::Db(_))));
        assert_eq!(repo.list_notes().unwrap(), notes_before);
        assert_eq!(repo.brain().signals().unwrap(), signals_before);
        assert_eq!(repo.suggest_category("", "hotel"), Some(travel.id));
    }

    #[test]
    fn test_import_rejects_invalid_utf8() {
        let dir = tempdir().unwrap();
        let repo = repository(dir.path());
        let path = dir.path().join("broken.json");
        std::fs::write(&path, b"{\"categories\": [], \"notes\": [\xff]}").unwrap();

        assert!(matches!(
            repo.import_from_file(&path),
            Err(RepositoryError::Utf8(_))
        ));
        assert_eq!(repo.list_notes().unwrap().len(), 3);
    }

    #[test]
    fn test_works_with_memory_brain() {
        let dir = tempdir().unwrap();
        let db = DbConnection::open_in_memory().unwrap();
        let brain = Brain::new(Arc::new(MemorySignalStore::new()));
        let repo = IdeaRepository::new(db, brain, dir.path().to_path_buf());
        let music = category(&repo, "Music");

        repo.insert_note(note("Guitar", "practice scales", Some(music.id)))
            .unwrap();
        assert_eq!(repo.suggest_category("scales", ""), Some(music.id));
    }
}
