//! User lifecycle service.
//!
//! # Responsibility
//! - Create, update, list and delete users.
//! - Own username uniqueness, role defaults and credential hashing.
//! - Refuse to delete users that still own notes.
//!
//! # Invariants
//! - At most one user exists per folded username; the lookup here gives the
//!   friendly error, the unique index closes the concurrent-create window.
//! - A user referenced by any note is never removed (no cascade).
//! - Plaintext passwords never leave this module except into the hasher.

use crate::credential::CredentialHasher;
use crate::model::user::{normalize_roles, User, UserId, UserProfile};
use crate::repo::note_repo::NoteRepository;
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoError;
use crate::service::error::{
    ConflictReason, EntityKind, InputError, LifecycleError, LifecycleResult, MissingEntity,
};
use crate::service::input::{
    parse_roles, require_flag, require_id, require_secret, require_text,
};
use log::info;
use serde::{Deserialize, Serialize};

/// Request to create a user.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateUserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    /// Absent or empty means `DEFAULT_ROLES`.
    pub roles: Option<Vec<String>>,
}

/// Full-field user update; only `password` may be omitted.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateUserRequest {
    #[serde(alias = "_id")]
    pub id: Option<String>,
    pub username: Option<String>,
    pub roles: Option<Vec<String>>,
    pub active: Option<bool>,
    /// Re-hashed when present and non-empty; the stored hash is kept otherwise.
    pub password: Option<String>,
}

/// Request to delete a user.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeleteUserRequest {
    #[serde(alias = "_id")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedUser {
    pub id: UserId,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletedUser {
    pub id: UserId,
    pub username: String,
}

/// User lifecycle manager.
#[derive(Clone)]
pub struct UserService<U: UserRepository, N: NoteRepository> {
    users: U,
    notes: N,
    hasher: CredentialHasher,
}

impl<U: UserRepository, N: NoteRepository> UserService<U, N> {
    /// Creates a service over the users store, the notes store (for the
    /// dependent-notes check) and a credential hasher.
    pub fn new(users: U, notes: N, hasher: CredentialHasher) -> Self {
        Self {
            users,
            notes,
            hasher,
        }
    }

    /// Lists all users without credential hashes.
    ///
    /// # Errors
    /// - `Empty` when no user exists.
    pub fn list_users(&self) -> LifecycleResult<Vec<UserProfile>> {
        let users = self.users.list_users()?;
        if users.is_empty() {
            return Err(LifecycleError::Empty(EntityKind::User));
        }
        Ok(users)
    }

    /// Lookup by id; the note manager resolves owners through this.
    pub fn get_user(&self, id: UserId) -> LifecycleResult<Option<UserProfile>> {
        Ok(self.users.get_user(id)?.map(|user| user.profile()))
    }

    /// Creates a user with a hashed password.
    ///
    /// # Contract
    /// - `username` and `password` are required.
    /// - Fails `Conflict` when the folded username is taken.
    /// - Absent/empty `roles` assigns `DEFAULT_ROLES`; unknown tags fail
    ///   `InvalidInput`.
    pub fn create_user(&self, request: &CreateUserRequest) -> LifecycleResult<CreatedUser> {
        let username = require_text(request.username.as_deref(), "username")?;
        let password = require_secret(request.password.as_deref(), "password")?;
        let roles = parse_roles(request.roles.as_deref().unwrap_or_default())?;

        if self.users.find_user_by_username(&username)?.is_some() {
            return Err(duplicate_username(username));
        }

        let password_hash = self.hasher.hash(&password)?;
        let user = User::new(username, password_hash, roles);
        self.users
            .insert_user(&user)
            .map_err(|err| match err {
                RepoError::UniqueViolation(_) => duplicate_username(user.username.clone()),
                other => other.into(),
            })?;

        info!(
            "event=user_create module=user status=ok user_id={} roles={}",
            user.id,
            user.roles.len()
        );
        Ok(CreatedUser {
            id: user.id,
            username: user.username,
        })
    }

    /// Overwrites username, roles and active flag; optionally rotates the password.
    ///
    /// # Contract
    /// - `id`, `username`, non-empty `roles` and `active` are required.
    /// - Renaming to a username folded-equal to the user's own is allowed.
    /// - Fails `Conflict` when another user holds the folded username.
    pub fn update_user(&self, request: &UpdateUserRequest) -> LifecycleResult<UserId> {
        let id = require_id(request.id.as_deref(), "id")?;
        let username = require_text(request.username.as_deref(), "username")?;
        let roles = match request.roles.as_deref() {
            Some(tags) if !tags.is_empty() => parse_roles(tags)?,
            _ => return Err(InputError::Missing("roles").into()),
        };
        let active = require_flag(request.active, "active")?;

        let mut user = self
            .users
            .get_user(id)?
            .ok_or(LifecycleError::NotFound(MissingEntity::User(id)))?;

        if let Some(existing) = self.users.find_user_by_username(&username)? {
            if existing.id != id {
                return Err(duplicate_username(username));
            }
        }

        user.username = username;
        user.roles = normalize_roles(roles);
        user.active = active;
        let rotated = match request.password.as_deref() {
            Some(password) if !password.is_empty() => {
                user.password_hash = self.hasher.hash(password)?;
                true
            }
            _ => false,
        };
        user.touch();

        self.users.save_user(&user).map_err(|err| match err {
            RepoError::UniqueViolation(_) => duplicate_username(user.username.clone()),
            RepoError::NotFound(_) => LifecycleError::NotFound(MissingEntity::User(id)),
            other => other.into(),
        })?;

        info!("event=user_update module=user status=ok user_id={id} password_rotated={rotated}");
        Ok(id)
    }

    /// Deletes a user that owns no notes.
    ///
    /// # Contract
    /// - The dependent-notes check runs before the existence check.
    /// - Notes are never cascaded; the caller must delete them first.
    pub fn delete_user(&self, request: &DeleteUserRequest) -> LifecycleResult<DeletedUser> {
        let id = require_id(request.id.as_deref(), "id")?;

        if !self.notes.find_notes_by_user(id)?.is_empty() {
            return Err(LifecycleError::Conflict(ConflictReason::UserHasNotes(id)));
        }

        let user = self
            .users
            .get_user(id)?
            .ok_or(LifecycleError::NotFound(MissingEntity::User(id)))?;

        self.users.delete_user(id).map_err(|err| match err {
            RepoError::ForeignKeyViolation(_) => {
                LifecycleError::Conflict(ConflictReason::UserHasNotes(id))
            }
            RepoError::NotFound(_) => LifecycleError::NotFound(MissingEntity::User(id)),
            other => other.into(),
        })?;

        info!("event=user_delete module=user status=ok user_id={id}");
        Ok(DeletedUser {
            id,
            username: user.username,
        })
    }
}

fn duplicate_username(username: String) -> LifecycleError {
    LifecycleError::Conflict(ConflictReason::DuplicateUsername(username))
}
