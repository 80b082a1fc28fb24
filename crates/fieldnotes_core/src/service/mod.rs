//! Service layer for use-case orchestration.
//!
//! # Responsibility
//! - Coordinate validation, sanitization, the rendering engines and
//!   repository writes for each save.
//!
//! # Invariants
//! - Services depend on repository traits, not concrete SQLite types.
//! - Rendered fields are always derived from the stored source field.

pub mod lexicon_service;
pub mod record_service;
pub mod text_service;
