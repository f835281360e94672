//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `technotes_core` linkage, configuration and store bootstrap.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `technotes_cli [config.toml]`

use log::info;
use std::path::PathBuf;
use std::process::ExitCode;
use technotes_core::db::migrations::latest_version;
use technotes_core::db::{open_db, open_db_in_memory};
use technotes_core::{
    init_logging, CoreConfig, NoteRepository, SqliteNoteRepository, SqliteUserRepository,
    UserRepository,
};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("technotes_cli error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = CoreConfig::load(config_path.as_deref()).map_err(|err| err.to_string())?;
    if let Some(log_dir) = config.log_dir.as_deref() {
        init_logging(&config.log_level, log_dir)?;
    }
    let hasher = config.credential_hasher().map_err(|err| err.to_string())?;

    let conn = if config.is_in_memory() {
        open_db_in_memory()
    } else {
        open_db(&config.database_path)
    }
    .map_err(|err| err.to_string())?;

    let users = SqliteUserRepository::try_new(&conn).map_err(|err| err.to_string())?;
    let notes = SqliteNoteRepository::try_new(&conn).map_err(|err| err.to_string())?;
    let user_count = users.list_users().map_err(|err| err.to_string())?.len();
    let note_count = notes.list_notes().map_err(|err| err.to_string())?.len();

    info!("event=cli_probe module=cli status=ok users={user_count} notes={note_count}");
    println!("technotes_core ping={}", technotes_core::ping());
    println!("technotes_core version={}", technotes_core::core_version());
    println!("schema_version={}", latest_version());
    println!("password_cost={}", hasher.cost());
    println!("users={user_count} notes={note_count}");
    Ok(())
}
