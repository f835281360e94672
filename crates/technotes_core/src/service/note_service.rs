//! Note lifecycle service.
//!
//! # Responsibility
//! - Create, update, list and delete notes.
//! - Keep titles unique per owner and owners valid on every write.
//! - Gate deletion on the completed state.
//!
//! # Invariants
//! - Title uniqueness is scoped per owner, on create and on update alike.
//! - Create and update both require the owner to exist.
//! - `incomplete --complete--> completed --delete--> removed`; only the
//!   completed state may be removed.

use crate::model::note::{Note, NoteId};
use crate::model::user::UserId;
use crate::repo::note_repo::NoteRepository;
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoError;
use crate::service::error::{
    ConflictReason, EntityKind, LifecycleError, LifecycleResult, MissingEntity,
};
use crate::service::input::{require_body, require_flag, require_id, require_text};
use crate::service::user_service::UserService;
use log::info;
use serde::{Deserialize, Serialize};

/// Request to create a note.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateNoteRequest {
    pub user: Option<String>,
    pub title: Option<String>,
    pub text: Option<String>,
}

/// Full-field note update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateNoteRequest {
    #[serde(alias = "_id")]
    pub id: Option<String>,
    pub user: Option<String>,
    pub title: Option<String>,
    pub text: Option<String>,
    pub completed: Option<bool>,
}

/// Request to delete a note.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeleteNoteRequest {
    #[serde(alias = "_id")]
    pub id: Option<String>,
}

/// Note with its owner's username resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteListing {
    #[serde(flatten)]
    pub note: Note,
    /// `None` when the owner no longer resolves.
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdatedNote {
    pub id: NoteId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletedNote {
    pub id: NoteId,
    pub title: String,
}

/// Note lifecycle manager.
pub struct NoteService<N: NoteRepository, U: UserRepository> {
    notes: N,
    owners: UserService<U, N>,
}

impl<N: NoteRepository, U: UserRepository> NoteService<N, U> {
    /// Creates a service over the notes store; owners resolve through the
    /// user lifecycle manager.
    pub fn new(notes: N, owners: UserService<U, N>) -> Self {
        Self { notes, owners }
    }

    /// Lists all notes with their owner's username attached.
    ///
    /// An owner that fails to resolve yields `username: None` instead of
    /// failing the whole listing.
    ///
    /// # Errors
    /// - `Empty` when no note exists.
    pub fn list_notes(&self) -> LifecycleResult<Vec<NoteListing>> {
        let notes = self.notes.list_notes()?;
        if notes.is_empty() {
            return Err(LifecycleError::Empty(EntityKind::Note));
        }

        notes
            .into_iter()
            .map(|note| {
                let username = self.owners.get_user(note.user)?.map(|owner| owner.username);
                Ok(NoteListing { note, username })
            })
            .collect()
    }

    /// Creates an incomplete note for an existing owner.
    ///
    /// # Contract
    /// - `user`, `title` and `text` are required.
    /// - Fails `NotFound` when the owner does not exist.
    /// - Fails `Conflict` when the owner already has a folded-equal title;
    ///   other owners may reuse it.
    pub fn create_note(&self, request: &CreateNoteRequest) -> LifecycleResult<NoteId> {
        let owner = require_id(request.user.as_deref(), "user")?;
        let title = require_text(request.title.as_deref(), "title")?;
        let text = require_body(request.text.as_deref(), "text")?;

        self.ensure_owner(owner)?;
        if self.notes.find_note_by_title(owner, &title)?.is_some() {
            return Err(duplicate_title(title));
        }

        let note = Note::new(owner, title, text);
        self.notes
            .insert_note(&note)
            .map_err(|err| write_error(err, &note))?;

        info!(
            "event=note_create module=note status=ok note_id={} user_id={owner}",
            note.id
        );
        Ok(note.id)
    }

    /// Overwrites owner, title, text and completion of an existing note.
    ///
    /// # Contract
    /// - `id`, `user`, `title`, `text` and `completed` are required.
    /// - Fails `NotFound` for a missing note, then for a missing owner.
    /// - Fails `Conflict` when another note of the target owner has a
    ///   folded-equal title; keeping the note's own title is allowed.
    pub fn update_note(&self, request: &UpdateNoteRequest) -> LifecycleResult<UpdatedNote> {
        let id = require_id(request.id.as_deref(), "id")?;
        let owner = require_id(request.user.as_deref(), "user")?;
        let title = require_text(request.title.as_deref(), "title")?;
        let text = require_body(request.text.as_deref(), "text")?;
        let completed = require_flag(request.completed, "completed")?;

        let mut note = self
            .notes
            .get_note(id)?
            .ok_or(LifecycleError::NotFound(MissingEntity::Note(id)))?;
        self.ensure_owner(owner)?;

        if let Some(existing) = self.notes.find_note_by_title(owner, &title)? {
            if existing.id != id {
                return Err(duplicate_title(title));
            }
        }

        note.user = owner;
        note.title = title;
        note.text = text;
        note.completed = completed;
        note.touch();
        self.notes
            .save_note(&note)
            .map_err(|err| write_error(err, &note))?;

        info!(
            "event=note_update module=note status=ok note_id={id} user_id={owner} completed={completed}"
        );
        Ok(UpdatedNote {
            id,
            title: note.title,
        })
    }

    /// Deletes a completed note.
    ///
    /// # Errors
    /// - `NotFound` when the note does not exist.
    /// - `Conflict` when the note is not completed.
    pub fn delete_note(&self, request: &DeleteNoteRequest) -> LifecycleResult<DeletedNote> {
        let id = require_id(request.id.as_deref(), "id")?;

        let note = self
            .notes
            .get_note(id)?
            .ok_or(LifecycleError::NotFound(MissingEntity::Note(id)))?;
        if !note.is_deletable() {
            return Err(LifecycleError::Conflict(ConflictReason::NoteNotCompleted(id)));
        }

        self.notes.delete_note(id).map_err(|err| match err {
            RepoError::NotFound(_) => LifecycleError::NotFound(MissingEntity::Note(id)),
            other => other.into(),
        })?;

        info!("event=note_delete module=note status=ok note_id={id}");
        Ok(DeletedNote {
            id,
            title: note.title,
        })
    }

    fn ensure_owner(&self, id: UserId) -> LifecycleResult<()> {
        match self.owners.get_user(id)? {
            Some(_) => Ok(()),
            None => Err(LifecycleError::NotFound(MissingEntity::Owner(id))),
        }
    }
}

fn duplicate_title(title: String) -> LifecycleError {
    LifecycleError::Conflict(ConflictReason::DuplicateTitle(title))
}

/// Translates store constraint failures on note writes.
fn write_error(err: RepoError, note: &Note) -> LifecycleError {
    match err {
        RepoError::UniqueViolation(_) => duplicate_title(note.title.clone()),
        RepoError::ForeignKeyViolation(_) => {
            LifecycleError::NotFound(MissingEntity::Owner(note.user))
        }
        RepoError::NotFound(id) => LifecycleError::NotFound(MissingEntity::Note(id)),
        other => other.into(),
    }
}
