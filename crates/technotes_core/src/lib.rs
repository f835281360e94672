//! Core consistency layer for the tech-notes backend.
//! This crate is the single source of truth for user/note invariants.

pub mod collation;
pub mod config;
pub mod credential;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::CoreConfig;
pub use credential::{CredentialError, CredentialHasher, DEFAULT_PASSWORD_COST};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::note::{Note, NoteId, NoteValidationError};
pub use model::user::{Role, User, UserId, UserProfile, UserValidationError, DEFAULT_ROLES};
pub use repo::note_repo::{NoteMatch, NoteRepository, SqliteNoteRepository};
pub use repo::user_repo::{SqliteUserRepository, UserMatch, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::error::{
    ConflictReason, EntityKind, ErrorKind, InputError, LifecycleError, LifecycleResult,
    MissingEntity,
};
pub use service::note_service::{
    CreateNoteRequest, DeleteNoteRequest, DeletedNote, NoteListing, NoteService, UpdateNoteRequest,
    UpdatedNote,
};
pub use service::user_service::{
    CreateUserRequest, CreatedUser, DeleteUserRequest, DeletedUser, UpdateUserRequest, UserService,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
