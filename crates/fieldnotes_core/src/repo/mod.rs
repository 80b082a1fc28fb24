//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for records, texts and
//!   the lexicon.
//! - Expose the read-only snapshots (`CandidateSource`, `LexiconSource`)
//!   that the engines consume.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, `DuplicateSlug`) in
//!   addition to DB transport errors.

pub mod lexicon_repo;
pub mod record_repo;
pub mod text_repo;
