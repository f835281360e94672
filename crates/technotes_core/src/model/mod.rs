//! Domain model for users and the notes they own.
//!
//! # Responsibility
//! - Define the two entity kinds stored by core and their local validation.
//! - Keep credential hashes out of every serialized shape.
//!
//! # Invariants
//! - Every entity is identified by a stable, non-nil UUID.
//! - A note references exactly one owning user by id.

use std::time::{SystemTime, UNIX_EPOCH};

pub mod note;
pub mod user;

/// Current wall clock in epoch milliseconds.
///
/// Clocks before the unix epoch collapse to `0`.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
