// Database CRUD operations
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row, TransactionBehavior};

use super::db::{DbConnection, DbResult};
use super::models::{Category, NewCategory, NewNote, Note, NoteWithCategory};
use crate::brain::CategoryId;

fn parse_time(idx: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn note_from_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    Ok(Note {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        timestamp: parse_time(3, row.get(3)?)?,
        category_id: row.get(4)?,
        deadline: row
            .get::<_, Option<String>>(5)?
            .map(|raw| parse_time(5, raw))
            .transpose()?,
    })
}

fn category_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(offset)?,
        name: row.get(offset + 1)?,
        color_hex: row.get(offset + 2)?,
        x_pos: row.get(offset + 3)?,
        y_pos: row.get(offset + 4)?,
    })
}

// ==================== CATEGORY QUERIES ====================

/// Create a new category
pub fn create_category(db: &DbConnection, input: NewCategory) -> DbResult<Category> {
    let conn = db.lock();
    conn.execute(
        "INSERT INTO categories (name, color_hex, x_pos, y_pos) VALUES (?1, ?2, ?3, ?4)",
        params![input.name, input.color_hex, input.x_pos, input.y_pos],
    )?;

    Ok(Category {
        id: conn.last_insert_rowid(),
        name: input.name,
        color_hex: input.color_hex,
        x_pos: input.x_pos,
        y_pos: input.y_pos,
    })
}

/// Get a category by ID
pub fn get_category(db: &DbConnection, id: CategoryId) -> DbResult<Option<Category>> {
    let conn = db.lock();
    let result = conn.query_row(
        "SELECT id, name, color_hex, x_pos, y_pos FROM categories WHERE id = ?1",
        [id],
        |row| category_from_row(row, 0),
    );

    match result {
        Ok(category) => Ok(Some(category)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// List all categories
pub fn list_categories(db: &DbConnection) -> DbResult<Vec<Category>> {
    let conn = db.lock();
    let mut stmt =
        conn.prepare("SELECT id, name, color_hex, x_pos, y_pos FROM categories ORDER BY id")?;

    let categories = stmt
        .query_map([], |row| category_from_row(row, 0))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(categories)
}

/// Update a category; returns false if it does not exist
pub fn update_category(db: &DbConnection, category: &Category) -> DbResult<bool> {
    let conn = db.lock();
    let changed = conn.execute(
        "UPDATE categories SET name = ?1, color_hex = ?2, x_pos = ?3, y_pos = ?4 WHERE id = ?5",
        params![
            category.name,
            category.color_hex,
            category.x_pos,
            category.y_pos,
            category.id,
        ],
    )?;
    Ok(changed > 0)
}

/// Delete a category and detach its notes; returns false if it did not exist
pub fn delete_category(db: &DbConnection, id: CategoryId) -> DbResult<bool> {
    let mut conn = db.lock();
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    tx.execute(
        "UPDATE notes SET category_id = NULL WHERE category_id = ?1",
        [id],
    )?;
    let deleted = tx.execute("DELETE FROM categories WHERE id = ?1", [id])?;

    tx.commit()?;
    Ok(deleted > 0)
}

// ==================== NOTE QUERIES ====================

/// Create a new note
pub fn create_note(db: &DbConnection, input: NewNote) -> DbResult<Note> {
    let timestamp = Utc::now();

    let conn = db.lock();
    conn.execute(
        "INSERT INTO notes (title, content, timestamp, category_id, deadline)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            input.title,
            input.content,
            timestamp.to_rfc3339(),
            input.category_id,
            input.deadline.map(|d| d.to_rfc3339()),
        ],
    )?;

    Ok(Note {
        id: conn.last_insert_rowid(),
        title: input.title,
        content: input.content,
        timestamp,
        category_id: input.category_id,
        deadline: input.deadline,
    })
}

/// Get a note by ID
pub fn get_note(db: &DbConnection, id: i64) -> DbResult<Option<Note>> {
    let conn = db.lock();
    let result = conn.query_row(
        "SELECT id, title, content, timestamp, category_id, deadline FROM notes WHERE id = ?1",
        [id],
        note_from_row,
    );

    match result {
        Ok(note) => Ok(Some(note)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// List all notes, newest first, with their categories
pub fn list_notes(db: &DbConnection) -> DbResult<Vec<NoteWithCategory>> {
    let conn = db.lock();
    let mut stmt = conn.prepare(
        "SELECT n.id, n.title, n.content, n.timestamp, n.category_id, n.deadline,
                c.id, c.name, c.color_hex, c.x_pos, c.y_pos
         FROM notes n
         LEFT JOIN categories c ON n.category_id = c.id
         ORDER BY n.id DESC",
    )?;

    let notes = stmt
        .query_map([], |row| {
            let category = match row.get::<_, Option<CategoryId>>(6)? {
                Some(_) => Some(category_from_row(row, 6)?),
                None => None,
            };
            Ok(NoteWithCategory {
                note: note_from_row(row)?,
                category,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(notes)
}

/// All notes in id order (for backups)
pub fn all_notes(db: &DbConnection) -> DbResult<Vec<Note>> {
    let conn = db.lock();
    let mut stmt = conn.prepare(
        "SELECT id, title, content, timestamp, category_id, deadline FROM notes ORDER BY id",
    )?;

    let notes = stmt
        .query_map([], note_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(notes)
}

/// Update a note's fields; returns false if it does not exist
pub fn update_note(db: &DbConnection, note: &Note) -> DbResult<bool> {
    let conn = db.lock();
    let changed = conn.execute(
        "UPDATE notes SET title = ?1, content = ?2, timestamp = ?3, category_id = ?4, deadline = ?5
         WHERE id = ?6",
        params![
            note.title,
            note.content,
            note.timestamp.to_rfc3339(),
            note.category_id,
            note.deadline.map(|d| d.to_rfc3339()),
            note.id,
        ],
    )?;
    Ok(changed > 0)
}

/// Delete a note; returns false if it did not exist
pub fn delete_note(db: &DbConnection, id: i64) -> DbResult<bool> {
    let conn = db.lock();
    let deleted = conn.execute("DELETE FROM notes WHERE id = ?1", [id])?;
    Ok(deleted > 0)
}

// ==================== BULK QUERIES ====================

fn insert_rows(conn: &Connection, categories: &[Category], notes: &[Note]) -> DbResult<()> {
    for category in categories {
        conn.execute(
            "INSERT OR REPLACE INTO categories (id, name, color_hex, x_pos, y_pos)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                category.id,
                category.name,
                category.color_hex,
                category.x_pos,
                category.y_pos,
            ],
        )?;
    }

    for note in notes {
        conn.execute(
            "INSERT INTO notes (id, title, content, timestamp, category_id, deadline)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                note.id,
                note.title,
                note.content,
                note.timestamp.to_rfc3339(),
                note.category_id,
                note.deadline.map(|d| d.to_rfc3339()),
            ],
        )?;
    }

    Ok(())
}

/// Wipe notes and categories and load the given rows, keeping their ids
pub fn replace_notes_and_categories(
    db: &DbConnection,
    categories: &[Category],
    notes: &[Note],
) -> DbResult<()> {
    let mut conn = db.lock();
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    tx.execute("DELETE FROM notes", [])?;
    tx.execute("DELETE FROM categories", [])?;
    insert_rows(&tx, categories, notes)?;

    tx.commit()?;
    Ok(())
}
