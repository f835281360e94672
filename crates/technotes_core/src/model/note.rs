//! Note domain model.
//!
//! # Responsibility
//! - Define the stored note record owned by one user.
//! - Expose the completion state that gates deletion.
//!
//! # Invariants
//! - New notes start incomplete.
//! - `user` always names exactly one owner.

use crate::model::now_epoch_ms;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type NoteId = Uuid;

/// Record-local validation failures for notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    NilId,
    NilOwner,
    BlankTitle,
    BlankText,
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "note id must not be nil"),
            Self::NilOwner => write!(f, "note owner must not be nil"),
            Self::BlankTitle => write!(f, "note title must not be blank"),
            Self::BlankText => write!(f, "note text must not be blank"),
        }
    }
}

impl Error for NoteValidationError {}

/// Stored note record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    /// Owning user id.
    pub user: UserId,
    pub title: String,
    pub text: String,
    pub completed: bool,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds.
    pub updated_at: i64,
}

impl Note {
    /// Creates an incomplete note with a generated id.
    pub fn new(user: UserId, title: impl Into<String>, text: impl Into<String>) -> Self {
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            user,
            title: title.into(),
            text: text.into(),
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Bumps `updated_at` to the current clock.
    pub fn touch(&mut self) {
        self.updated_at = now_epoch_ms().max(self.updated_at);
    }

    /// Only completed notes may be removed.
    pub fn is_deletable(&self) -> bool {
        self.completed
    }

    /// Checks record-local invariants.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.id.is_nil() {
            return Err(NoteValidationError::NilId);
        }
        if self.user.is_nil() {
            return Err(NoteValidationError::NilOwner);
        }
        if self.title.trim().is_empty() {
            return Err(NoteValidationError::BlankTitle);
        }
        if self.text.trim().is_empty() {
            return Err(NoteValidationError::BlankText);
        }
        Ok(())
    }
}
