//! Runtime configuration for embedding processes.
//!
//! # Responsibility
//! - Resolve store location, logging and hashing settings from defaults, an
//!   optional TOML file and `TECHNOTES_*` environment variables (in that
//!   precedence order, later wins).
//!
//! # Invariants
//! - Loading never touches the database or the logger.

use crate::credential::{CredentialError, CredentialHasher, DEFAULT_PASSWORD_COST};
use crate::logging::default_log_level;
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::Path;

const ENV_PREFIX: &str = "TECHNOTES";
const DEFAULT_DATABASE_PATH: &str = "technotes.sqlite3";

/// Resolved core settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CoreConfig {
    /// SQLite file path; `:memory:` selects an in-memory store.
    pub database_path: String,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute log directory; logging stays off when unset.
    pub log_dir: Option<String>,
    /// bcrypt work factor.
    pub password_cost: u32,
}

impl CoreConfig {
    /// Loads settings, reading `file` when given and present.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("database_path", DEFAULT_DATABASE_PATH)?
            .set_default("log_level", default_log_level())?
            .set_default("password_cost", i64::from(DEFAULT_PASSWORD_COST))?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }

        builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Whether `database_path` selects an in-memory store.
    pub fn is_in_memory(&self) -> bool {
        self.database_path == ":memory:"
    }

    /// Builds the credential hasher for the configured cost.
    pub fn credential_hasher(&self) -> Result<CredentialHasher, CredentialError> {
        CredentialHasher::new(self.password_cost)
    }
}
