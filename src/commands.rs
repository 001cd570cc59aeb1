// CLI command handlers
use serde::Serialize;
use serde_json::{json, Value};

use crate::cli::{
    BackupCommand, BrainCommand, CategoryCommand, CategoryEditArgs, Command, NoteCommand,
    NoteEditArgs, NoteInput, TrainArgs,
};
use crate::repository::IdeaRepository;
use crate::state::{NewCategory, NewNote};

#[derive(Debug, Serialize)]
pub struct CommandError {
    message: String,
}

impl CommandError {
    pub fn new(message: impl Into<String>) -> Self {
        CommandError {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl<E: std::fmt::Display> From<E> for CommandError {
    fn from(error: E) -> Self {
        CommandError {
            message: error.to_string(),
        }
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

fn to_value<T: Serialize>(value: T) -> CommandResult<Value> {
    serde_json::to_value(value).map_err(CommandError::from)
}

/// Run a parsed command against the jar and return its JSON output
pub fn execute(repo: &IdeaRepository, command: Command) -> CommandResult<Value> {
    match command {
        Command::Category(cmd) => category_command(repo, cmd),
        Command::Note(cmd) => note_command(repo, cmd),
        Command::Suggest(text) => suggest(repo, &text.joined()),
        Command::Explain(text) => to_value(repo.brain().explain(&text.joined())?),
        Command::Train(args) => train(repo, args),
        Command::Brain(cmd) => brain_command(repo, cmd),
        Command::Backup(cmd) => backup_command(repo, cmd),
    }
}

// ==================== CATEGORY COMMANDS ====================

fn category_command(repo: &IdeaRepository, cmd: CategoryCommand) -> CommandResult<Value> {
    match cmd {
        CategoryCommand::Add(input) => {
            let category = repo.create_category(NewCategory {
                name: input.name,
                color_hex: input.color,
                x_pos: input.x,
                y_pos: input.y,
            })?;
            log::info!("Created category {} ({})", category.id, category.name);
            to_value(category)
        }
        CategoryCommand::List => to_value(repo.list_categories()?),
        CategoryCommand::Edit(args) => edit_category(repo, args),
        CategoryCommand::Delete(args) => {
            repo.delete_category(args.id)?;
            Ok(json!({ "deleted": args.id }))
        }
    }
}

fn edit_category(repo: &IdeaRepository, args: CategoryEditArgs) -> CommandResult<Value> {
    let mut category = repo
        .get_category(args.id)?
        .ok_or_else(|| CommandError::new(format!("Category {} not found", args.id)))?;

    if let Some(name) = args.name {
        category.name = name;
    }
    if let Some(color) = args.color {
        category.color_hex = color;
    }
    if let Some(x) = args.x {
        category.x_pos = x;
    }
    if let Some(y) = args.y {
        category.y_pos = y;
    }

    repo.update_category(&category)?;
    to_value(category)
}

// ==================== NOTE COMMANDS ====================

fn note_command(repo: &IdeaRepository, cmd: NoteCommand) -> CommandResult<Value> {
    match cmd {
        NoteCommand::Add(input) => add_note(repo, input),
        NoteCommand::List => to_value(repo.list_notes()?),
        NoteCommand::Show(args) => {
            let note = repo
                .get_note(args.id)?
                .ok_or_else(|| CommandError::new(format!("Note {} not found", args.id)))?;
            to_value(note)
        }
        NoteCommand::Edit(args) => edit_note(repo, args),
        NoteCommand::Delete(args) => {
            repo.delete_note(args.id)?;
            Ok(json!({ "deleted": args.id }))
        }
    }
}

fn add_note(repo: &IdeaRepository, input: NoteInput) -> CommandResult<Value> {
    if let Some(category_id) = input.category {
        if repo.get_category(category_id)?.is_none() {
            return Err(CommandError::new(format!(
                "Category {} not found",
                category_id
            )));
        }
    }

    // Mirrors the capture screen: only uncategorized drafts get a suggestion
    let suggestion = match input.category {
        Some(_) => None,
        None => repo.suggest_category(&input.title, &input.content),
    };

    let note = repo.insert_note(NewNote {
        title: input.title,
        content: input.content,
        category_id: input.category,
        deadline: input.deadline,
    })?;

    Ok(json!({ "note": note, "suggested_category": suggestion }))
}

fn edit_note(repo: &IdeaRepository, args: NoteEditArgs) -> CommandResult<Value> {
    let mut note = repo
        .get_note(args.id)?
        .ok_or_else(|| CommandError::new(format!("Note {} not found", args.id)))?;

    if let Some(title) = args.title {
        note.title = title;
    }
    if let Some(content) = args.content {
        note.content = content;
    }
    if args.uncategorize {
        note.category_id = None;
    } else if let Some(category) = args.category {
        note.category_id = Some(category);
    }
    if let Some(deadline) = args.deadline {
        note.deadline = Some(deadline);
    }

    repo.update_note(&note)?;
    to_value(note)
}

// ==================== BRAIN COMMANDS ====================

fn suggest(repo: &IdeaRepository, text: &str) -> CommandResult<Value> {
    let category_id = repo.brain().predict(text);
    let category = match category_id {
        Some(id) => repo.get_category(id)?,
        None => None,
    };
    Ok(json!({ "category_id": category_id, "category": category }))
}

fn train(repo: &IdeaRepository, args: TrainArgs) -> CommandResult<Value> {
    let text = args.text.join(" ");
    repo.brain().train(&text, args.category)?;
    Ok(json!({ "trained": args.category, "words": repo.brain().word_count()? }))
}

fn brain_command(repo: &IdeaRepository, cmd: BrainCommand) -> CommandResult<Value> {
    let brain = repo.brain();
    match cmd {
        BrainCommand::Stats => {
            let signals = brain.signals()?;
            let observations: u64 = signals.iter().map(|s| s.category_counts.total()).sum();
            let mut categories: Vec<i64> = signals
                .iter()
                .flat_map(|s| s.category_counts.iter().map(|(id, _)| id))
                .collect();
            categories.sort_unstable();
            categories.dedup();

            Ok(json!({
                "words": signals.len(),
                "observations": observations,
                "categories": categories,
            }))
        }
        BrainCommand::Dump => to_value(brain.signals()?),
        BrainCommand::Reset => {
            brain.reset()?;
            Ok(json!({ "reset": true }))
        }
    }
}

// ==================== BACKUP COMMANDS ====================

fn backup_command(repo: &IdeaRepository, cmd: BackupCommand) -> CommandResult<Value> {
    match cmd {
        BackupCommand::Export => to_value(repo.export_to_file()?),
        BackupCommand::Import { file } => {
            let backup = repo.import_from_file(&file)?;
            Ok(json!({
                "version": backup.version,
                "categories": backup.categories.len(),
                "notes": backup.notes.len(),
                "words": backup.brain_signals.len(),
            }))
        }
    }
}
