//! Core logic for field-data documentation records.
//! Cross-references record fields by title and highlights transcriptions
//! against the project lexicon.

pub mod config;
pub mod db;
pub mod lexicon;
pub mod linker;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod text;

pub use config::{EngineSettings, SettingsError};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use lexicon::{
    highlight_lexicon, Accuracy, HighlightReport, HighlightStyle, HighlightedToken, Highlighter,
    Lexicon, TokenStatus,
};
pub use linker::{rewrite_cross_references, CrossReferenceMode, CrossReferencer, RewriteReport};
pub use logging::{init_logging, logging_status, LogLevel, LoggingError};
pub use model::lexicon::{Conjugation, LexiconEntry, PhraseEntry, VerbEntry, WordEntry};
pub use model::record::{Record, RecordDraft, RecordId, RecordKind, TextRecord};
pub use model::reference::ReferenceCandidate;
pub use repo::lexicon_repo::{LexiconRepository, LexiconSource, SqliteLexiconRepository};
pub use repo::record_repo::{
    CandidateSource, RecordRepository, RepoError, RepoResult, SqliteCandidateSource,
    SqliteRecordRepository,
};
pub use repo::text_repo::{SqliteTextRepository, TextRepository};
pub use service::lexicon_service::{GlossedEntry, LexiconService, LexiconServiceError};
pub use service::record_service::{RecordService, RecordServiceError};
pub use service::text_service::{TextService, TextServiceError};
pub use text::{AllowListSanitizer, HtmlSanitizer};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
