//! Cross-reference rewriting for free-text record fields.
//!
//! # Responsibility
//! - Turn mentions of other records into anchors pointing at their slugs.
//! - Keep the choice between automatic and brace-only linking per call.
//!
//! # Invariants
//! - Input is sanitized HTML; output adds only engine-generated anchors.
//! - Rewriting its own output with the same candidates is a no-op.
//!
//! # See also
//! - `text::html` for the sanitizer that must run first.

pub mod cross_ref;

pub use cross_ref::{
    rewrite_cross_references, CrossReferenceMode, CrossReferencer, RewriteReport,
};
