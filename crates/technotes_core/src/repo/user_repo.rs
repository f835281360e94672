//! User repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Store user records, their role sets and credential hashes.
//! - Answer folded-username lookups with identity fields only.
//!
//! # Invariants
//! - `username_key` is always `fold_key(username)`; the unique index on it is
//!   the last line of defence against duplicate usernames.
//! - List reads never select `password_hash`.
//! - Write paths call `User::validate()` before SQL mutations.

use crate::collation::fold_key;
use crate::model::user::{Role, User, UserId, UserProfile};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::support::{bool_to_int, ensure_table, parse_flag, parse_uuid};
use rusqlite::{params, Connection, Row};

const USER_COLUMNS: &[&str] = &[
    "uuid",
    "username",
    "username_key",
    "password_hash",
    "roles",
    "active",
    "created_at",
    "updated_at",
];
const ROLE_SEPARATOR: &str = ",";

/// Identity of a user matched by a folded-username lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserMatch {
    pub id: UserId,
}

/// Repository interface for the users collection.
pub trait UserRepository {
    /// Lists every user without credential hashes, ordered by folded username.
    fn list_users(&self) -> RepoResult<Vec<UserProfile>>;
    /// Point lookup by id.
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Case/accent-insensitive lookup by username in one query.
    fn find_user_by_username(&self, username: &str) -> RepoResult<Option<UserMatch>>;
    /// Inserts a new user and returns its id.
    fn insert_user(&self, user: &User) -> RepoResult<UserId>;
    /// Overwrites every mutable field of an existing user.
    fn save_user(&self, user: &User) -> RepoResult<()>;
    /// Removes one user.
    fn delete_user(&self, id: UserId) -> RepoResult<()>;
}

/// SQLite-backed user repository.
#[derive(Debug, Clone, Copy)]
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `MissingRequiredTable`/`MissingRequiredColumn` when the connection has
    ///   not been bootstrapped through `db::open_db*`.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table(conn, "users", USER_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn list_users(&self) -> RepoResult<Vec<UserProfile>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, username, roles, active, created_at, updated_at
             FROM users
             ORDER BY username_key ASC, uuid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(UserProfile {
                id: parse_uuid(&row.get::<_, String>("uuid")?, "users.uuid")?,
                username: row.get("username")?,
                roles: parse_roles(&row.get::<_, String>("roles")?)?,
                active: parse_flag(row.get("active")?, "users.active")?,
                created_at: row.get("created_at")?,
                updated_at: row.get("updated_at")?,
            });
        }
        Ok(users)
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, username, password_hash, roles, active, created_at, updated_at
             FROM users
             WHERE uuid = ?1;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn find_user_by_username(&self, username: &str) -> RepoResult<Option<UserMatch>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid
             FROM users
             WHERE username_key = ?1
             LIMIT 1;",
        )?;
        let mut rows = stmt.query([fold_key(username)])?;
        if let Some(row) = rows.next()? {
            let id = parse_uuid(&row.get::<_, String>("uuid")?, "users.uuid")?;
            return Ok(Some(UserMatch { id }));
        }
        Ok(None)
    }

    fn insert_user(&self, user: &User) -> RepoResult<UserId> {
        user.validate()?;

        self.conn.execute(
            "INSERT INTO users (
                uuid,
                username,
                username_key,
                password_hash,
                roles,
                active,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                user.id.to_string(),
                user.username.as_str(),
                fold_key(&user.username),
                user.password_hash.as_str(),
                roles_to_db(&user.roles),
                bool_to_int(user.active),
                user.created_at,
                user.updated_at,
            ],
        )?;

        Ok(user.id)
    }

    fn save_user(&self, user: &User) -> RepoResult<()> {
        user.validate()?;

        let changed = self.conn.execute(
            "UPDATE users
             SET
                username = ?1,
                username_key = ?2,
                password_hash = ?3,
                roles = ?4,
                active = ?5,
                updated_at = ?6
             WHERE uuid = ?7;",
            params![
                user.username.as_str(),
                fold_key(&user.username),
                user.password_hash.as_str(),
                roles_to_db(&user.roles),
                bool_to_int(user.active),
                user.updated_at,
                user.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(user.id));
        }
        Ok(())
    }

    fn delete_user(&self, id: UserId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM users WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let user = User {
        id: parse_uuid(&row.get::<_, String>("uuid")?, "users.uuid")?,
        username: row.get("username")?,
        password_hash: row.get("password_hash")?,
        roles: parse_roles(&row.get::<_, String>("roles")?)?,
        active: parse_flag(row.get("active")?, "users.active")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    user.validate()?;
    Ok(user)
}

fn roles_to_db(roles: &[Role]) -> String {
    roles
        .iter()
        .map(|role| role.as_str())
        .collect::<Vec<_>>()
        .join(ROLE_SEPARATOR)
}

fn parse_roles(value: &str) -> RepoResult<Vec<Role>> {
    value
        .split(ROLE_SEPARATOR)
        .map(|tag| {
            Role::parse(tag).ok_or_else(|| {
                RepoError::InvalidData(format!("invalid role `{tag}` in users.roles"))
            })
        })
        .collect()
}
