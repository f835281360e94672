//! Repository layer: the document store adapter for users and notes.
//!
//! # Responsibility
//! - Define per-collection data access contracts used by lifecycle services.
//! - Isolate SQLite query details from business orchestration.
//!
//! # Invariants
//! - Repository writes enforce model `validate()` before persistence.
//! - Constraint violations surface as `RepoError::UniqueViolation` /
//!   `RepoError::ForeignKeyViolation`, never as opaque DB errors.
//! - Zero-row updates/deletes surface as `RepoError::NotFound`.

mod error;
pub mod note_repo;
mod support;
pub mod user_repo;

pub use error::{RepoError, RepoResult};
