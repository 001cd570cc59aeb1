// Data models for IdeaJar state management
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::brain::{CategoryId, WordSignal};

/// A "gravity well" notes can be dropped into
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    /// ARGB colour
    pub color_hex: i64,
    /// Relative position on the canvas [0.0, 1.0]
    pub x_pos: f32,
    pub y_pos: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub color_hex: i64,
    pub x_pos: f32,
    pub y_pos: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub category_id: Option<CategoryId>,
    pub deadline: Option<DateTime<Utc>>,
}

impl Note {
    /// Text the brain sees for this note
    pub fn brain_text(&self) -> String {
        brain_text(&self.title, &self.content)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub category_id: Option<CategoryId>,
    pub deadline: Option<DateTime<Utc>>,
}

impl NewNote {
    pub fn brain_text(&self) -> String {
        brain_text(&self.title, &self.content)
    }
}

/// Title and body joined the way both training and suggestion read them
pub fn brain_text(title: &str, content: &str) -> String {
    format!("{} {}", title, content)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteWithCategory {
    pub note: Note,
    pub category: Option<Category>,
}

/// Backup format version written by this build
pub const BACKUP_VERSION: u32 = 2;

/// Full jar snapshot
/// Version 1 backups carry no brain signals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupData {
    #[serde(default = "default_backup_version")]
    pub version: u32,
    pub categories: Vec<Category>,
    pub notes: Vec<Note>,
    #[serde(default)]
    pub brain_signals: Vec<WordSignal>,
}

fn default_backup_version() -> u32 {
    1
}
