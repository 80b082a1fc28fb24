//! Field notes store: connection setup and schema versioning.
//!
//! # Responsibility
//! - Open the one SQLite file holding culture events, people, lexicon
//!   entries and linguistic texts, with foreign keys enforced.
//! - Bring that file to the schema this build expects.
//!
//! # Invariants
//! - `PRAGMA user_version` equals the last applied migration.
//! - A store written by a newer build is refused, never downgraded.
//! - Repositories only see a connection after migration succeeded.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure while opening or upgrading the field notes store.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// A migration script failed and the whole upgrade was rolled back.
    Migration {
        version: u32,
        name: &'static str,
        source: rusqlite::Error,
    },
    /// The store's schema is ahead of this build.
    SchemaTooNew { found: u32, supported: u32 },
}

impl DbError {
    /// Whether the store must be opened by a newer build.
    pub fn needs_newer_build(&self) -> bool {
        matches!(self, Self::SchemaTooNew { .. })
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "field notes store error: {err}"),
            Self::Migration {
                version,
                name,
                source,
            } => write!(f, "schema upgrade {version} ({name}) failed: {source}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "field notes store is at schema {found}; this build understands up to {supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::Migration { source: err, .. } => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
