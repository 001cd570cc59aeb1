// State management module
// Handles SQLite persistence and file system operations

pub mod db;
pub mod models;
pub mod queries;
pub mod storage;

pub use db::{init_db, DbConnection, DbError, DbResult};
pub use models::{BackupData, Category, NewCategory, NewNote, Note, NoteWithCategory};
pub use queries::{
    create_category, create_note, delete_category, delete_note, get_category, get_note,
    list_categories, list_notes, update_category, update_note,
};
pub use storage::{StorageError, StorageResult};
