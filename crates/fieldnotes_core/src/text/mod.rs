//! Shared text-scanning helpers for the rewriting engines.
//!
//! # Responsibility
//! - Derive URL-safe record keys from titles (`slugify`).
//! - Track byte spans that must never be rewritten (anchors, tags).
//! - Escape and sanitize HTML fragments before/after rewriting.
//!
//! # Invariants
//! - Helpers are pure and allocation-bounded by their input.
//! - Offsets are byte offsets into UTF-8 strings and always fall on char
//!   boundaries.

pub mod html;
pub mod slug;
pub mod span;
pub mod view;

pub use html::{escape_html, to_plain_text, AllowListSanitizer, HtmlSanitizer};
pub use slug::slugify;
pub use span::{anchor_spans, protected_spans, tag_spans, TextSpan};
pub use view::DecodedView;
