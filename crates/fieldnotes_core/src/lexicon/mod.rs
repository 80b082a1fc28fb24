//! Lexicon snapshot and orthography highlighting.
//!
//! # Responsibility
//! - Index dictionary entries for per-token lookup.
//! - Classify and render every word of an orthographic transcription.
//! - Report spelling accuracy for the transcription.
//!
//! # Invariants
//! - Parenthesised annotations are never spell-checked or counted.
//! - Words take precedence over phrases, phrases over verbs.
//! - The snapshot is read-only for the duration of a call.

pub mod highlight;
pub mod snapshot;

pub use highlight::{
    highlight_lexicon, Accuracy, HighlightReport, HighlightStyle, HighlightedToken, Highlighter,
    TokenStatus,
};
pub use snapshot::Lexicon;
