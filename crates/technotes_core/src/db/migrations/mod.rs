//! SQLite migration registry and executor.
//!
//! # Responsibility
//! - Register schema migrations in strictly increasing order.
//! - Apply pending migrations atomically.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//! - After migration, every stored `*_key` equals `fold_key` of its text.

use crate::collation::fold_key;
use crate::db::{DbError, DbResult};
use rusqlite::{params, Connection};

#[derive(Clone, Copy)]
enum Step {
    Sql(&'static str),
    /// Data rewrite that needs Rust-side logic.
    Native(fn(&Connection) -> rusqlite::Result<()>),
}

#[derive(Clone, Copy)]
struct Migration {
    version: u32,
    step: Step,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        step: Step::Sql(include_str!("0001_users_notes.sql")),
    },
    Migration {
        version: 2,
        step: Step::Native(refold_keys),
    },
];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies all pending migrations on the provided connection.
///
/// A rekey step that makes two existing rows collide under the new folding
/// fails with the unique-index error and leaves the schema untouched.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS
        .iter()
        .filter(|migration| migration.version > current_version)
    {
        match migration.step {
            Step::Sql(sql) => tx.execute_batch(sql)?,
            Step::Native(apply) => apply(&tx)?,
        }
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
    }
    tx.commit()?;

    Ok(())
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Recomputes `users.username_key` and `notes.title_key` with the current
/// folding rule.
///
/// Keys are first parked on a per-row placeholder so rows swapping keys
/// never trip the unique indexes mid-rewrite.
fn refold_keys(conn: &Connection) -> rusqlite::Result<()> {
    refold_table(conn, "users", "username", "username_key")?;
    refold_table(conn, "notes", "title", "title_key")
}

fn refold_table(
    conn: &Connection,
    table: &str,
    text_column: &str,
    key_column: &str,
) -> rusqlite::Result<()> {
    let mut select = conn.prepare(&format!("SELECT uuid, {text_column} FROM {table};"))?;
    let rows = select
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    conn.execute(
        &format!("UPDATE {table} SET {key_column} = 'refold:' || uuid;"),
        [],
    )?;

    let mut update = conn.prepare(&format!(
        "UPDATE {table} SET {key_column} = ?1 WHERE uuid = ?2;"
    ))?;
    for (uuid, text) in rows {
        update.execute(params![fold_key(&text), uuid])?;
    }
    Ok(())
}
