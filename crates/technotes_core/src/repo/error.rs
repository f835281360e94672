//! Repository error type shared by the users and notes stores.

use crate::db::DbError;
use crate::model::note::NoteValidationError;
use crate::model::user::UserValidationError;
use rusqlite::ffi;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

const FOREIGN_KEY_FAILED: &str = "FOREIGN KEY constraint failed";

/// Store-level failure for user/note persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    InvalidUser(UserValidationError),
    InvalidNote(NoteValidationError),
    Db(DbError),
    /// Write or delete touched zero rows.
    NotFound(Uuid),
    /// A unique index rejected the write.
    UniqueViolation(String),
    /// A foreign key rejected the write or delete.
    ForeignKeyViolation(String),
    InvalidData(String),
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUser(err) => write!(f, "{err}"),
            Self::InvalidNote(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::UniqueViolation(details) => write!(f, "unique constraint violated: {details}"),
            Self::ForeignKeyViolation(details) => {
                write!(f, "foreign key constraint violated: {details}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidUser(err) => Some(err),
            Self::InvalidNote(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<UserValidationError> for RepoError {
    fn from(value: UserValidationError) -> Self {
        Self::InvalidUser(value)
    }
}

impl From<NoteValidationError> for RepoError {
    fn from(value: NoteValidationError) -> Self {
        Self::InvalidNote(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, message) = &value {
            let details = message.clone().unwrap_or_else(|| failure.to_string());
            match failure.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    return Self::UniqueViolation(details);
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => return Self::ForeignKeyViolation(details),
                // `ON DELETE RESTRICT` reports through the trigger code.
                ffi::SQLITE_CONSTRAINT_TRIGGER if details.contains(FOREIGN_KEY_FAILED) => {
                    return Self::ForeignKeyViolation(details);
                }
                _ => {}
            }
        }
        Self::Db(DbError::Sqlite(value))
    }
}
