// Command line arguments
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// IdeaJar - capture ideas, let the brain file them
#[derive(Parser, Debug, Clone)]
#[command(name = "ideajar")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Capture ideas and let the brain suggest where they belong")]
pub struct IdeaJarArgs {
    /// Data directory (database, backups, config.json)
    #[arg(long, env = "IDEAJAR_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Verbosity level (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl IdeaJarArgs {
    /// Effective verbosity: 0 quiet, 1 normal, 2+ more detail
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n.saturating_add(1),
            }
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Manage categories
    #[command(subcommand)]
    Category(CategoryCommand),

    /// Manage notes
    #[command(subcommand)]
    Note(NoteCommand),

    /// Suggest a category for some text
    Suggest(TextArgs),

    /// Explain the suggestion for some text
    Explain(TextArgs),

    /// Train the brain directly
    Train(TrainArgs),

    /// Inspect or reset the brain
    #[command(subcommand)]
    Brain(BrainCommand),

    /// Export or import backups
    #[command(subcommand)]
    Backup(BackupCommand),
}

#[derive(Subcommand, Debug, Clone)]
pub enum CategoryCommand {
    /// Create a category
    Add(CategoryInput),
    /// List categories
    List,
    /// Edit a category
    Edit(CategoryEditArgs),
    /// Delete a category (its notes become uncategorized)
    Delete(IdArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CategoryInput {
    #[arg(long)]
    pub name: String,

    /// ARGB colour, e.g. 4294901760
    #[arg(long, default_value_t = 0xFF88_88FF)]
    pub color: i64,

    #[arg(long, default_value_t = 0.5)]
    pub x: f32,

    #[arg(long, default_value_t = 0.5)]
    pub y: f32,
}

#[derive(Args, Debug, Clone)]
pub struct CategoryEditArgs {
    #[arg(long)]
    pub id: i64,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub color: Option<i64>,
    #[arg(long)]
    pub x: Option<f32>,
    #[arg(long)]
    pub y: Option<f32>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum NoteCommand {
    /// Save a new note; without --category the brain's suggestion is reported
    Add(NoteInput),
    /// List notes, newest first
    List,
    /// Show one note
    Show(IdArgs),
    /// Edit a note (does not retrain the brain)
    Edit(NoteEditArgs),
    /// Delete a note
    Delete(IdArgs),
}

#[derive(Args, Debug, Clone)]
pub struct NoteInput {
    #[arg(long, default_value = "")]
    pub title: String,

    #[arg(long)]
    pub content: String,

    #[arg(long)]
    pub category: Option<i64>,

    /// RFC 3339 deadline, e.g. 2030-01-01T09:00:00Z
    #[arg(long)]
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Args, Debug, Clone)]
pub struct NoteEditArgs {
    #[arg(long)]
    pub id: i64,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub content: Option<String>,
    #[arg(long)]
    pub category: Option<i64>,
    /// Remove the category
    #[arg(long, conflicts_with = "category")]
    pub uncategorize: bool,
    #[arg(long)]
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Args, Debug, Clone)]
pub struct IdArgs {
    pub id: i64,
}

#[derive(Args, Debug, Clone)]
pub struct TextArgs {
    /// Text to classify
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,
}

impl TextArgs {
    pub fn joined(&self) -> String {
        self.text.join(" ")
    }
}

#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    #[arg(long)]
    pub category: i64,

    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum BrainCommand {
    /// Word and category counts
    Stats,
    /// Every stored word signal
    Dump,
    /// Forget everything learned
    Reset,
}

#[derive(Subcommand, Debug, Clone)]
pub enum BackupCommand {
    /// Write a timestamped backup into the backup directory
    Export,
    /// Replace the jar with a backup file
    Import {
        file: PathBuf,
    },
}
