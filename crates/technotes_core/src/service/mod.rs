//! Lifecycle services enforcing cross-entity consistency.
//!
//! # Responsibility
//! - Turn plain operation requests into validated store mutations.
//! - Keep users and notes mutually valid: unique names, valid owners,
//!   refuse-not-cascade deletes and completed-before-delete notes.
//! - Return typed outcomes; logging failures is the caller's job.

pub mod error;
mod input;
pub mod note_service;
pub mod user_service;
