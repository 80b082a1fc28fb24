//! Orthography highlighter.
//!
//! # Responsibility
//! - Split a transcription into words, annotations and other text in one
//!   left-to-right pass.
//! - Classify each distinct word once against the lexicon snapshot.
//! - Rebuild the transcription as HTML and compute spelling accuracy.
//!
//! # Invariants
//! - Words are maximal runs of alphabetic characters; digits and
//!   punctuation never form words.
//! - `(...)` annotations are copied through escaped; an unclosed `(` runs to
//!   the end of the text.
//! - Output contains no markup besides the generated spans and anchors.

use crate::lexicon::snapshot::Lexicon;
use crate::text::escape_html;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Verification state of one word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStatus {
    /// Not in the lexicon. Rendered as an unlinked span.
    Unverified,
    /// In the lexicon but not yet reviewed. Still linked so reviewers can
    /// open the entry.
    VerifiedNoLink,
    /// In the lexicon and reviewed.
    VerifiedWithLink,
}

/// One word occurrence and its classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightedToken {
    /// Word as written in the transcription.
    pub word: String,
    pub status: TokenStatus,
    pub link: Option<String>,
}

/// Share of words that are reviewed lexicon entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accuracy {
    /// The text contained no countable words.
    NoData,
    /// Rounded percentage in `0..=100`.
    Percent(u8),
}

impl Accuracy {
    pub fn from_counts(known_words: usize, total_words: usize) -> Self {
        if total_words == 0 {
            return Self::NoData;
        }
        let ratio = known_words.min(total_words) as f64 / total_words as f64;
        Self::Percent((ratio * 100.0).round() as u8)
    }

    pub fn percent(self) -> Option<u8> {
        match self {
            Self::NoData => None,
            Self::Percent(value) => Some(value),
        }
    }
}

impl Display for Accuracy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoData => write!(f, "no data"),
            Self::Percent(value) => write!(f, "{value}%"),
        }
    }
}

/// CSS classes applied to highlighted words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightStyle {
    pub unverified_class: String,
    pub unchecked_class: String,
    pub verified_class: String,
}

impl Default for HighlightStyle {
    fn default() -> Self {
        Self {
            unverified_class: "lexicon-unverified".to_string(),
            unchecked_class: "lexicon-unchecked".to_string(),
            verified_class: "lexicon-verified".to_string(),
        }
    }
}

impl HighlightStyle {
    fn class_for(&self, status: TokenStatus) -> &str {
        match status {
            TokenStatus::Unverified => &self.unverified_class,
            TokenStatus::VerifiedNoLink => &self.unchecked_class,
            TokenStatus::VerifiedWithLink => &self.verified_class,
        }
    }
}

/// Result of highlighting one transcription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightReport {
    pub html: String,
    /// Every word occurrence in text order.
    pub tokens: Vec<HighlightedToken>,
    /// Occurrences classified `VerifiedWithLink`.
    pub known_words: usize,
    pub total_words: usize,
    pub accuracy: Accuracy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'t> {
    Text(&'t str),
    Annotation(&'t str),
    Word(&'t str),
}

/// Highlighter bound to one lexicon snapshot.
pub struct Highlighter<'lex> {
    lexicon: &'lex Lexicon,
    style: HighlightStyle,
}

impl<'lex> Highlighter<'lex> {
    pub fn new(lexicon: &'lex Lexicon) -> Self {
        Self::with_style(lexicon, HighlightStyle::default())
    }

    pub fn with_style(lexicon: &'lex Lexicon, style: HighlightStyle) -> Self {
        Self { lexicon, style }
    }

    /// Highlights one transcription.
    pub fn highlight(&self, text: &str) -> HighlightReport {
        let started_at = Instant::now();
        let segments = split_segments(text);

        let mut classified: HashMap<String, (TokenStatus, Option<String>)> = HashMap::new();
        for segment in &segments {
            if let Segment::Word(word) = segment {
                classified
                    .entry(word.to_lowercase())
                    .or_insert_with_key(|token| self.classify(token));
            }
        }

        let mut html = String::with_capacity(text.len() * 2);
        let mut tokens = Vec::new();
        for segment in segments {
            match segment {
                Segment::Text(value) | Segment::Annotation(value) => {
                    html.push_str(&escape_html(value));
                }
                Segment::Word(word) => {
                    let (status, link) = classified
                        .get(&word.to_lowercase())
                        .cloned()
                        .unwrap_or((TokenStatus::Unverified, None));
                    html.push_str(&self.render_word(word, status, link.as_deref()));
                    tokens.push(HighlightedToken {
                        word: word.to_string(),
                        status,
                        link,
                    });
                }
            }
        }

        let known_words = tokens
            .iter()
            .filter(|token| token.status == TokenStatus::VerifiedWithLink)
            .count();
        let total_words = tokens.len();
        let accuracy = Accuracy::from_counts(known_words, total_words);

        debug!(
            "event=lexicon_highlight module=lexicon status=ok distinct_words={} total_words={} known_words={} accuracy={} duration_us={}",
            classified.len(),
            total_words,
            known_words,
            accuracy,
            started_at.elapsed().as_micros()
        );

        HighlightReport {
            html,
            tokens,
            known_words,
            total_words,
            accuracy,
        }
    }

    fn classify(&self, token: &str) -> (TokenStatus, Option<String>) {
        match self.lexicon.lookup(token) {
            None => (TokenStatus::Unverified, None),
            Some(found) if found.checked => (TokenStatus::VerifiedWithLink, Some(found.link)),
            Some(found) => (TokenStatus::VerifiedNoLink, Some(found.link)),
        }
    }

    fn render_word(&self, word: &str, status: TokenStatus, link: Option<&str>) -> String {
        let class = escape_html(self.style.class_for(status));
        let word = escape_html(word);
        match link {
            Some(link) => format!(
                r#"<a class="{class}" href="{}">{word}</a>"#,
                escape_html(link)
            ),
            None => format!(r#"<span class="{class}">{word}</span>"#),
        }
    }
}

/// Highlights `orthographic_text` with the default style.
pub fn highlight_lexicon(orthographic_text: &str, lexicon: &Lexicon) -> HighlightReport {
    Highlighter::new(lexicon).highlight(orthographic_text)
}

fn split_segments(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut pos = 0;
    let mut plain_start = 0;

    while let Some(ch) = text[pos..].chars().next() {
        if ch == '(' {
            push_text(&mut segments, &text[plain_start..pos]);
            let end = text[pos..]
                .find(')')
                .map_or(text.len(), |offset| pos + offset + 1);
            segments.push(Segment::Annotation(&text[pos..end]));
            pos = end;
            plain_start = end;
        } else if ch.is_alphabetic() {
            push_text(&mut segments, &text[plain_start..pos]);
            let end = text[pos..]
                .char_indices()
                .find(|(_, c)| !c.is_alphabetic())
                .map_or(text.len(), |(offset, _)| pos + offset);
            segments.push(Segment::Word(&text[pos..end]));
            pos = end;
            plain_start = end;
        } else {
            pos += ch.len_utf8();
        }
    }
    push_text(&mut segments, &text[plain_start..]);

    segments
}

fn push_text<'t>(segments: &mut Vec<Segment<'t>>, value: &'t str) {
    if !value.is_empty() {
        segments.push(Segment::Text(value));
    }
}
