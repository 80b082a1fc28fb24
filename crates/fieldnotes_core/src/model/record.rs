//! Persisted field records.
//!
//! # Responsibility
//! - Define the record shapes whose free-text fields get cross-referenced
//!   (culture events, people) or highlighted (texts).
//!
//! # Invariants
//! - `slug == slugify(title)` at the time of the last save.
//! - `body_html` is derived output; `body` is the source of truth.
//! - `links` lists target ids in first-mention order without duplicates.

use crate::lexicon::Accuracy;
use crate::text::slugify;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable store identifier of any field record.
pub type RecordId = i64;

/// Record families that own a cross-referenced free-text field.
///
/// Links are resolved within the same family: culture event descriptions
/// point at other culture events, person family fields at other people.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    CultureEvent,
    Person,
}

impl RecordKind {
    /// Stable string id used in storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CultureEvent => "culture_event",
            Self::Person => "person",
        }
    }

    /// Parses the storage string id.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "culture_event" => Some(Self::CultureEvent),
            "person" => Some(Self::Person),
            _ => None,
        }
    }
}

impl Display for RecordKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Culture event or person with its rendered free-text field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub kind: RecordKind,
    /// CE title or person name.
    pub title: String,
    pub slug: String,
    /// CE description or person family field, sanitized on save.
    pub body: String,
    /// `body` after sanitization and cross-referencing.
    pub body_html: String,
    /// Update timestamp in epoch milliseconds.
    pub updated_at: i64,
    /// Outgoing links discovered on the last save.
    pub links: Vec<RecordId>,
}

/// Validated input for creating or updating a culture event or person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDraft {
    pub kind: RecordKind,
    /// Trimmed title.
    pub title: String,
    /// `slugify(title)`, never empty.
    pub slug: String,
    /// Sanitized free-text field.
    pub body: String,
}

impl RecordDraft {
    /// Trims the title and derives its slug.
    ///
    /// # Errors
    /// - `EmptyTitle` for blank titles.
    /// - `UnaddressableTitle` when the title has no alphanumeric content.
    pub fn new(
        kind: RecordKind,
        title: &str,
        body: impl Into<String>,
    ) -> Result<Self, RecordValidationError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(RecordValidationError::EmptyTitle);
        }
        let slug = slugify(title);
        if slug.is_empty() {
            return Err(RecordValidationError::UnaddressableTitle(title.to_string()));
        }
        Ok(Self {
            kind,
            title: title.to_string(),
            slug,
            body: body.into(),
        })
    }
}

/// Linguistic text with its lexicon-highlighted orthography.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRecord {
    pub id: RecordId,
    pub title: String,
    /// Orthographic transcription as entered.
    pub orthography: String,
    /// Highlighted rendering from the last save.
    pub orthography_html: String,
    pub accuracy: Accuracy,
    pub updated_at: i64,
}

/// Validation errors for record input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordValidationError {
    /// Title is empty after trimming.
    EmptyTitle,
    /// Title produces an empty slug (punctuation only).
    UnaddressableTitle(String),
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title cannot be empty"),
            Self::UnaddressableTitle(title) => {
                write!(f, "title `{title}` does not produce a usable slug")
            }
        }
    }
}

impl Error for RecordValidationError {}

#[cfg(test)]
mod tests {
    use super::{RecordDraft, RecordKind, RecordValidationError};

    #[test]
    fn draft_trims_title_and_derives_slug() {
        let draft = RecordDraft::new(RecordKind::CultureEvent, "  Reef Fishing ", "body")
            .expect("valid title");
        assert_eq!(draft.title, "Reef Fishing");
        assert_eq!(draft.slug, "reef-fishing");
    }

    #[test]
    fn draft_rejects_blank_and_punctuation_titles() {
        assert_eq!(
            RecordDraft::new(RecordKind::Person, "   ", ""),
            Err(RecordValidationError::EmptyTitle)
        );
        assert_eq!(
            RecordDraft::new(RecordKind::Person, "?!", ""),
            Err(RecordValidationError::UnaddressableTitle("?!".to_string()))
        );
    }

    #[test]
    fn record_kind_roundtrips_storage_ids() {
        for kind in [RecordKind::CultureEvent, RecordKind::Person] {
            assert_eq!(RecordKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(RecordKind::parse("village"), None);
    }
}
