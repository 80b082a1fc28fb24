//! Linguistic text save path.
//!
//! # Responsibility
//! - Highlight a transcription against the current lexicon snapshot.
//! - Persist the rendering together with its accuracy.
//!
//! # Invariants
//! - One lexicon snapshot is used per save (or per bulk rehighlight).
//! - The orthography is stored verbatim; only the rendering is derived.

use crate::lexicon::{HighlightReport, HighlightStyle, Highlighter, Lexicon};
use crate::model::record::{RecordId, TextRecord};
use crate::repo::lexicon_repo::LexiconSource;
use crate::repo::record_repo::RepoError;
use crate::repo::text_repo::{TextRepository, TextWrite};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum TextServiceError {
    EmptyTitle,
    TextNotFound(RecordId),
    Repo(RepoError),
    InconsistentState(&'static str),
}

impl Display for TextServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "text title cannot be empty"),
            Self::TextNotFound(id) => write!(f, "text not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent text state: {details}"),
        }
    }
}

impl Error for TextServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TextServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity: "text", id } => Self::TextNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Text facade over a text store and a lexicon source.
pub struct TextService<T: TextRepository, L: LexiconSource> {
    texts: T,
    lexicon: L,
    style: HighlightStyle,
}

impl<T: TextRepository, L: LexiconSource> TextService<T, L> {
    pub fn new(texts: T, lexicon: L, style: HighlightStyle) -> Self {
        Self {
            texts,
            lexicon,
            style,
        }
    }

    /// Creates a text and stores its highlighted rendering.
    pub fn save_text(
        &self,
        title: &str,
        orthography: &str,
    ) -> Result<TextRecord, TextServiceError> {
        let title = normalize_title(title)?;
        let lexicon = self.lexicon.load_lexicon()?;
        let report = self.highlight(&lexicon, orthography);

        let id = self.texts.insert_text(&TextWrite {
            title,
            orthography,
            orthography_html: &report.html,
            accuracy: report.accuracy,
        })?;
        log_save("create", id, &report);

        self.texts
            .get_text(id)?
            .ok_or(TextServiceError::InconsistentState(
                "created text not found in read-back",
            ))
    }

    /// Replaces a text's title and orthography and re-renders it.
    pub fn update_text(
        &self,
        id: RecordId,
        title: &str,
        orthography: &str,
    ) -> Result<TextRecord, TextServiceError> {
        let title = normalize_title(title)?;
        let lexicon = self.lexicon.load_lexicon()?;
        let report = self.highlight(&lexicon, orthography);

        self.texts.update_text(
            id,
            &TextWrite {
                title,
                orthography,
                orthography_html: &report.html,
                accuracy: report.accuracy,
            },
        )?;
        log_save("update", id, &report);

        self.texts
            .get_text(id)?
            .ok_or(TextServiceError::InconsistentState(
                "updated text not found in read-back",
            ))
    }

    pub fn get_text(&self, id: RecordId) -> Result<Option<TextRecord>, TextServiceError> {
        Ok(self.texts.get_text(id)?)
    }

    /// Re-renders every stored text after the lexicon changed.
    ///
    /// Returns the number of texts whose rendering or accuracy changed.
    pub fn rehighlight_all(&self) -> Result<usize, TextServiceError> {
        let lexicon = self.lexicon.load_lexicon()?;
        let mut changed = 0;
        for text in self.texts.list_texts()? {
            let report = self.highlight(&lexicon, &text.orthography);
            if report.html == text.orthography_html && report.accuracy == text.accuracy {
                continue;
            }
            self.texts.update_text(
                text.id,
                &TextWrite {
                    title: &text.title,
                    orthography: &text.orthography,
                    orthography_html: &report.html,
                    accuracy: report.accuracy,
                },
            )?;
            changed += 1;
        }
        info!(
            "event=text_rehighlight module=service status=ok lexicon_entries={} changed={}",
            lexicon.len(),
            changed
        );
        Ok(changed)
    }

    fn highlight(&self, lexicon: &Lexicon, orthography: &str) -> HighlightReport {
        Highlighter::with_style(lexicon, self.style.clone()).highlight(orthography)
    }
}

fn normalize_title(title: &str) -> Result<&str, TextServiceError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(TextServiceError::EmptyTitle);
    }
    Ok(title)
}

fn log_save(action: &str, id: RecordId, report: &HighlightReport) {
    info!(
        "event=text_save module=service status=ok action={} id={} total_words={} known_words={} accuracy={}",
        action, id, report.total_words, report.known_words, report.accuracy
    );
}
