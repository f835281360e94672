//! Failure taxonomy returned by the lifecycle services.
//!
//! Every failure is a typed value; the transport layer maps
//! [`LifecycleError::kind`] to its own status codes and uses `Display` for the
//! reply message.

use crate::credential::CredentialError;
use crate::model::note::NoteId;
use crate::model::user::UserId;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Flat classification of [`LifecycleError`] for transport mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller error; not retryable.
    InvalidInput,
    /// Caller must change the request or the object state first.
    Conflict,
    NotFound,
    /// Well-formed listing that matched nothing.
    Empty,
    /// Store collaborator failed; surfaced as-is, never retried here.
    StoreUnavailable,
    /// Credential backend failure.
    Internal,
}

/// Why a request field was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// Field absent or blank.
    Missing(&'static str),
    /// Identifier field that is not a UUID.
    MalformedId { field: &'static str, value: String },
    /// Role tag outside the closed role set.
    UnknownRole(String),
}

impl Display for InputError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(field) => write!(f, "field `{field}` is required"),
            Self::MalformedId { field, value } => {
                write!(f, "field `{field}` is not a valid id: `{value}`")
            }
            Self::UnknownRole(role) => write!(f, "unknown role `{role}`"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictReason {
    DuplicateUsername(String),
    DuplicateTitle(String),
    /// Refuse-not-cascade: the user still owns notes.
    UserHasNotes(UserId),
    /// State gate: only completed notes may be deleted.
    NoteNotCompleted(NoteId),
}

impl Display for ConflictReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateUsername(username) => write!(f, "username `{username}` already exists"),
            Self::DuplicateTitle(title) => write!(f, "note title `{title}` already exists"),
            Self::UserHasNotes(id) => write!(f, "user {id} has dependent notes"),
            Self::NoteNotCompleted(id) => write!(f, "note {id} is not completed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingEntity {
    User(UserId),
    Note(NoteId),
    /// Owner referenced by a note request.
    Owner(UserId),
}

impl Display for MissingEntity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User(id) => write!(f, "user not found: {id}"),
            Self::Note(id) => write!(f, "note not found: {id}"),
            Self::Owner(id) => write!(f, "note owner not found: {id}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Note,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => f.write_str("users"),
            Self::Note => f.write_str("notes"),
        }
    }
}

/// Error returned by every lifecycle operation.
#[derive(Debug)]
pub enum LifecycleError {
    InvalidInput(InputError),
    Conflict(ConflictReason),
    NotFound(MissingEntity),
    Empty(EntityKind),
    StoreUnavailable(RepoError),
    Credential(CredentialError),
}

impl LifecycleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Empty(_) => ErrorKind::Empty,
            Self::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
            Self::Credential(_) => ErrorKind::Internal,
        }
    }
}

impl Display for LifecycleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(err) => write!(f, "invalid input: {err}"),
            Self::Conflict(reason) => write!(f, "conflict: {reason}"),
            Self::NotFound(missing) => write!(f, "{missing}"),
            Self::Empty(kind) => write!(f, "no {kind} found"),
            Self::StoreUnavailable(err) => write!(f, "store unavailable: {err}"),
            Self::Credential(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LifecycleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StoreUnavailable(err) => Some(err),
            Self::Credential(err) => Some(err),
            _ => None,
        }
    }
}

impl From<InputError> for LifecycleError {
    fn from(value: InputError) -> Self {
        Self::InvalidInput(value)
    }
}

impl From<RepoError> for LifecycleError {
    fn from(value: RepoError) -> Self {
        Self::StoreUnavailable(value)
    }
}

impl From<CredentialError> for LifecycleError {
    fn from(value: CredentialError) -> Self {
        Self::Credential(value)
    }
}
