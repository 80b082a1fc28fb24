//! Domain model for field records and the engines' read models.
//!
//! # Responsibility
//! - Define persisted record shapes (culture events, people, texts).
//! - Define the read-only snapshots consumed by the rewriting engines.
//!
//! # Invariants
//! - Every persisted record is identified by a stable integer `RecordId`.
//! - Record slugs are derived with `text::slugify` and unique per kind.
//! - Engine read models are rebuilt per call and never persisted.

pub mod lexicon;
pub mod record;
pub mod reference;
