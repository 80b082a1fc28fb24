//! Reader-visible view of an HTML fragment.
//!
//! # Invariants
//! - Every char of the view maps back to a non-empty source span: an
//!   entity, a whole tag, or the char itself.
//! - Tags appear as one `TAG_PLACEHOLDER` each, so matches never cross
//!   markup.
//! - Source spans are contiguous and increasing.

use crate::text::html::decode_entity;
use crate::text::span::{tag_spans, TextSpan};

/// Stand-in for one tag inside the view. Neither alphanumeric nor whitespace.
pub const TAG_PLACEHOLDER: char = '\u{FFFC}';

/// Entity-decoded text with offsets back into the source HTML.
#[derive(Debug, Clone, Default)]
pub struct DecodedView {
    text: String,
    /// Byte offset of each view char inside `text`.
    char_starts: Vec<usize>,
    /// Source range each view char was decoded from.
    sources: Vec<TextSpan>,
}

impl DecodedView {
    pub fn new(html: &str) -> Self {
        let mut view = Self {
            text: String::with_capacity(html.len()),
            ..Self::default()
        };
        let mut tags = tag_spans(html).into_iter().peekable();
        let mut pos = 0;

        while pos < html.len() {
            if let Some(tag) = tags.next_if(|tag| tag.start == pos) {
                view.push(TAG_PLACEHOLDER, tag);
                pos = tag.end;
                continue;
            }
            let rest = &html[pos..];
            let entity = rest
                .starts_with('&')
                .then(|| decode_entity(rest))
                .flatten();
            if let Some((decoded, len)) = entity {
                view.push(decoded, TextSpan::new(pos, pos + len));
                pos += len;
                continue;
            }
            let Some(ch) = rest.chars().next() else {
                break;
            };
            view.push(ch, TextSpan::new(pos, pos + ch.len_utf8()));
            pos += ch.len_utf8();
        }

        view
    }

    fn push(&mut self, ch: char, source: TextSpan) {
        self.char_starts.push(self.text.len());
        self.sources.push(source);
        self.text.push(ch);
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Maps the view byte range `[start, end)` back to the source.
    ///
    /// Returns `None` for empty ranges or offsets that are not char starts.
    pub fn source_span(&self, start: usize, end: usize) -> Option<TextSpan> {
        let first = self.char_starts.binary_search(&start).ok()?;
        let after_last = if end == self.text.len() {
            self.sources.len()
        } else {
            self.char_starts.binary_search(&end).ok()?
        };
        if after_last <= first {
            return None;
        }
        Some(TextSpan::new(
            self.sources[first].start,
            self.sources[after_last - 1].end,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::{DecodedView, TAG_PLACEHOLDER};
    use crate::text::span::TextSpan;

    #[test]
    fn entities_and_tags_collapse_to_single_chars() {
        let view = DecodedView::new("<p>Maria&#39;s&nbsp;Feast</p>");
        assert_eq!(
            view.text(),
            format!("{TAG_PLACEHOLDER}Maria's\u{a0}Feast{TAG_PLACEHOLDER}")
        );
    }

    #[test]
    fn view_ranges_map_back_to_source_bytes() {
        let html = "x Reef&nbsp;Fishing y";
        let view = DecodedView::new(html);
        let start = view.text().find("Reef").unwrap();
        let end = view.text().find(" y").unwrap();

        let span = view.source_span(start, end).unwrap();
        assert_eq!(&html[span.start..span.end], "Reef&nbsp;Fishing");
        assert_eq!(span, TextSpan::new(2, 19));
    }

    #[test]
    fn bare_ampersands_stay_literal() {
        let view = DecodedView::new("Fish & Chips &copy;");
        assert_eq!(view.text(), "Fish & Chips &copy;");
        assert_eq!(view.source_span(0, 0), None);
    }
}
