//! User domain model.
//!
//! # Responsibility
//! - Define the stored user record, its role set and public profile shape.
//! - Validate record-local invariants before persistence.
//!
//! # Invariants
//! - `roles` is never empty; `DEFAULT_ROLES` applies when none are supplied.
//! - `password_hash` is never serialized and never printed by `Debug`.

use crate::model::now_epoch_ms;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use uuid::Uuid;

pub type UserId = Uuid;

/// Closed set of role tags a user may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    Employee,
    Manager,
    Admin,
}

/// Role set assigned when a create request carries no roles.
pub const DEFAULT_ROLES: &[Role] = &[Role::Employee];

impl Role {
    /// Stable storage/wire tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Employee => "Employee",
            Self::Manager => "Manager",
            Self::Admin => "Admin",
        }
    }

    /// Parses a role tag, ignoring case and surrounding whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "employee" => Some(Self::Employee),
            "manager" => Some(Self::Manager),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record-local validation failures for users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    NilId,
    BlankUsername,
    EmptyRoles,
    MissingPasswordHash,
}

impl Display for UserValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "user id must not be nil"),
            Self::BlankUsername => write!(f, "username must not be blank"),
            Self::EmptyRoles => write!(f, "user must hold at least one role"),
            Self::MissingPasswordHash => write!(f, "user password hash must not be empty"),
        }
    }
}

impl Error for UserValidationError {}

/// Stored user record.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub roles: Vec<Role>,
    pub active: bool,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds.
    pub updated_at: i64,
}

impl User {
    /// Creates an active user with a generated id.
    ///
    /// An empty `roles` input falls back to `DEFAULT_ROLES`; duplicates are
    /// collapsed and the set is kept sorted.
    pub fn new(username: impl Into<String>, password_hash: String, roles: Vec<Role>) -> Self {
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            password_hash,
            roles: normalize_roles(roles),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Bumps `updated_at` to the current clock.
    pub fn touch(&mut self) {
        self.updated_at = now_epoch_ms().max(self.updated_at);
    }

    /// Returns the hash-free view of this user.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            roles: self.roles.clone(),
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Checks record-local invariants.
    pub fn validate(&self) -> Result<(), UserValidationError> {
        if self.id.is_nil() {
            return Err(UserValidationError::NilId);
        }
        if self.username.trim().is_empty() {
            return Err(UserValidationError::BlankUsername);
        }
        if self.roles.is_empty() {
            return Err(UserValidationError::EmptyRoles);
        }
        if self.password_hash.is_empty() {
            return Err(UserValidationError::MissingPasswordHash);
        }
        Ok(())
    }
}

impl Debug for User {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("roles", &self.roles)
            .field("active", &self.active)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// User fields safe to hand to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub roles: Vec<Role>,
    pub active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Sorts and deduplicates roles, substituting the default set when empty.
pub fn normalize_roles(mut roles: Vec<Role>) -> Vec<Role> {
    roles.sort_unstable();
    roles.dedup();
    if roles.is_empty() {
        DEFAULT_ROLES.to_vec()
    } else {
        roles
    }
}
