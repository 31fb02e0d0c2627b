//! SQLite storage for constructor areas, groups and holders.
//!
//! # Responsibility
//! - Open constructor databases, creating the parent directory of a file
//!   database when it is missing.
//! - Bring the schema to the latest migration before anything else runs.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`.
//! - A database written by a newer binary is refused, never downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure while opening or migrating a constructor database.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// Database directory could not be created.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Migration `version` failed and was rolled back with every later one.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// Connection is open but its schema is not the constructor schema.
    SchemaMismatch(String),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Io { path, .. } => {
                write!(f, "cannot create database directory {}", path.display())
            }
            Self::Migration { version, .. } => write!(f, "migration {version} failed"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "constructor schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::SchemaMismatch(message) => write!(f, "unexpected database schema: {message}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::Migration { source: err, .. } => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::UnsupportedSchemaVersion { .. } | Self::SchemaMismatch(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
