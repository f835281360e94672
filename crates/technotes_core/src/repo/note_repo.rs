//! Note repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Store notes and their owner reference.
//! - Answer folded-title and by-owner lookups with identity fields only.
//!
//! # Invariants
//! - `title_key` is always `fold_key(title)`; titles are unique per owner
//!   under that key (`idx_notes_owner_title_key`).
//! - `user_uuid` must reference an existing user (foreign key, RESTRICT).
//! - List order is `created_at ASC, uuid ASC`.

use crate::collation::fold_key;
use crate::model::note::{Note, NoteId};
use crate::model::user::UserId;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::support::{bool_to_int, ensure_table, parse_flag, parse_uuid};
use rusqlite::{params, Connection, Row};

const NOTE_COLUMNS: &[&str] = &[
    "uuid",
    "user_uuid",
    "title",
    "title_key",
    "text",
    "completed",
    "created_at",
    "updated_at",
];

const NOTE_SELECT_SQL: &str = "SELECT
    uuid,
    user_uuid,
    title,
    text,
    completed,
    created_at,
    updated_at
FROM notes";

/// Identity of a note matched by a title or owner lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteMatch {
    pub id: NoteId,
    pub user: UserId,
}

/// Repository interface for the notes collection.
pub trait NoteRepository {
    /// Lists every note in creation order.
    fn list_notes(&self) -> RepoResult<Vec<Note>>;
    /// Point lookup by id.
    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>>;
    /// Case/accent-insensitive title lookup among `owner`'s notes, in one query.
    fn find_note_by_title(&self, owner: UserId, title: &str) -> RepoResult<Option<NoteMatch>>;
    /// All notes referencing `owner`.
    fn find_notes_by_user(&self, owner: UserId) -> RepoResult<Vec<NoteMatch>>;
    /// Inserts a new note and returns its id.
    fn insert_note(&self, note: &Note) -> RepoResult<NoteId>;
    /// Overwrites every mutable field of an existing note.
    fn save_note(&self, note: &Note) -> RepoResult<()>;
    /// Removes one note.
    fn delete_note(&self, id: NoteId) -> RepoResult<()>;
}

/// SQLite-backed note repository.
#[derive(Debug, Clone, Copy)]
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table(conn, "notes", NOTE_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn list_notes(&self) -> RepoResult<Vec<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} ORDER BY created_at ASC, uuid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        Ok(notes)
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_note_row(row)?));
        }
        Ok(None)
    }

    fn find_note_by_title(&self, owner: UserId, title: &str) -> RepoResult<Option<NoteMatch>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, user_uuid
             FROM notes
             WHERE user_uuid = ?1
               AND title_key = ?2
             LIMIT 1;",
        )?;
        let mut rows = stmt.query(params![owner.to_string(), fold_key(title)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_match_row(row)?));
        }
        Ok(None)
    }

    fn find_notes_by_user(&self, owner: UserId) -> RepoResult<Vec<NoteMatch>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, user_uuid
             FROM notes
             WHERE user_uuid = ?1
             ORDER BY created_at ASC, uuid ASC;",
        )?;
        let mut rows = stmt.query([owner.to_string()])?;
        let mut matches = Vec::new();
        while let Some(row) = rows.next()? {
            matches.push(parse_match_row(row)?);
        }
        Ok(matches)
    }

    fn insert_note(&self, note: &Note) -> RepoResult<NoteId> {
        note.validate()?;

        self.conn.execute(
            "INSERT INTO notes (
                uuid,
                user_uuid,
                title,
                title_key,
                text,
                completed,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                note.id.to_string(),
                note.user.to_string(),
                note.title.as_str(),
                fold_key(&note.title),
                note.text.as_str(),
                bool_to_int(note.completed),
                note.created_at,
                note.updated_at,
            ],
        )?;

        Ok(note.id)
    }

    fn save_note(&self, note: &Note) -> RepoResult<()> {
        note.validate()?;

        let changed = self.conn.execute(
            "UPDATE notes
             SET
                user_uuid = ?1,
                title = ?2,
                title_key = ?3,
                text = ?4,
                completed = ?5,
                updated_at = ?6
             WHERE uuid = ?7;",
            params![
                note.user.to_string(),
                note.title.as_str(),
                fold_key(&note.title),
                note.text.as_str(),
                bool_to_int(note.completed),
                note.updated_at,
                note.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(note.id));
        }
        Ok(())
    }

    fn delete_note(&self, id: NoteId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM notes WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let note = Note {
        id: parse_uuid(&row.get::<_, String>("uuid")?, "notes.uuid")?,
        user: parse_uuid(&row.get::<_, String>("user_uuid")?, "notes.user_uuid")?,
        title: row.get("title")?,
        text: row.get("text")?,
        completed: parse_flag(row.get("completed")?, "notes.completed")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    note.validate()?;
    Ok(note)
}

fn parse_match_row(row: &Row<'_>) -> RepoResult<NoteMatch> {
    Ok(NoteMatch {
        id: parse_uuid(&row.get::<_, String>("uuid")?, "notes.uuid")?,
        user: parse_uuid(&row.get::<_, String>("user_uuid")?, "notes.user_uuid")?,
    })
}
