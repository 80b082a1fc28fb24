//! Protected byte spans inside an HTML fragment.
//!
//! # Invariants
//! - A span covering a complete `<a ...>...</a>` element protects the label
//!   as well as the tags, so anchors are never nested.
//! - Every other tag protects only its own angle-bracket range.

use once_cell::sync::Lazy;
use regex::Regex;

static ANCHOR_ELEMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<a\b[^>]*>.*?</a\s*>").expect("valid anchor regex"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^<>]*>").expect("valid tag regex"));

/// Immutable half-open `[start, end)` byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
}

impl TextSpan {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start must not exceed end");
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns whether both spans share at least one byte.
    pub fn overlaps(&self, other: &TextSpan) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Returns whether `self` overlaps any span in `spans`.
    pub fn overlaps_any(&self, spans: &[TextSpan]) -> bool {
        spans.iter().any(|span| self.overlaps(span))
    }
}

/// Spans of complete anchor elements, in source order.
pub fn anchor_spans(html: &str) -> Vec<TextSpan> {
    ANCHOR_ELEMENT_RE
        .find_iter(html)
        .map(|m| TextSpan::new(m.start(), m.end()))
        .collect()
}

/// Spans of every tag's angle-bracket range, in source order.
pub fn tag_spans(html: &str) -> Vec<TextSpan> {
    TAG_RE
        .find_iter(html)
        .map(|m| TextSpan::new(m.start(), m.end()))
        .collect()
}

/// Collects spans that rewriting must leave untouched.
///
/// Result is sorted by start offset. Tag spans already covered by an anchor
/// element are not repeated.
pub fn protected_spans(html: &str) -> Vec<TextSpan> {
    let anchors = anchor_spans(html);
    let mut spans = anchors.clone();
    spans.extend(
        tag_spans(html)
            .into_iter()
            .filter(|span| !span.overlaps_any(&anchors)),
    );

    spans.sort();
    spans
}
