//! Lexicon entry save path.
//!
//! # Responsibility
//! - Store dictionary entries with a sanitized gloss.
//! - Cross-reference the gloss against culture event titles and persist
//!   the rendering next to the entry.
//!
//! # Invariants
//! - The gloss kept in the entry payload is the sanitized source; only
//!   `gloss_html` carries engine anchors.
//! - Candidates are loaded after the entry write, once per save.

use crate::config::EngineSettings;
use crate::linker::CrossReferencer;
use crate::model::lexicon::LexiconEntry;
use crate::model::record::{RecordId, RecordKind};
use crate::repo::lexicon_repo::LexiconRepository;
use crate::repo::record_repo::{CandidateSource, RepoError};
use crate::text::{AllowListSanitizer, HtmlSanitizer};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum LexiconServiceError {
    EmptyHeadword,
    EntryNotFound(RecordId),
    Repo(RepoError),
    InconsistentState(&'static str),
}

impl Display for LexiconServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyHeadword => write!(f, "lexicon headword cannot be empty"),
            Self::EntryNotFound(id) => write!(f, "lexicon entry not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => {
                write!(f, "inconsistent lexicon state: {details}")
            }
        }
    }
}

impl Error for LexiconServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for LexiconServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: "lexicon_entry",
                id,
            } => Self::EntryNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Stored entry together with its rendered gloss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlossedEntry {
    pub id: RecordId,
    pub entry: LexiconEntry,
    pub gloss_html: String,
    /// Culture events linked from the gloss, in first-mention order.
    pub linked_record_ids: Vec<RecordId>,
}

/// Lexicon facade over an entry store and a culture event candidate source.
pub struct LexiconService<
    L: LexiconRepository,
    C: CandidateSource,
    S: HtmlSanitizer = AllowListSanitizer,
> {
    entries: L,
    candidates: C,
    sanitizer: S,
    settings: EngineSettings,
}

impl<L: LexiconRepository, C: CandidateSource> LexiconService<L, C> {
    pub fn new(entries: L, candidates: C, settings: EngineSettings) -> Self {
        Self::with_sanitizer(entries, candidates, AllowListSanitizer::default(), settings)
    }
}

impl<L: LexiconRepository, C: CandidateSource, S: HtmlSanitizer> LexiconService<L, C, S> {
    pub fn with_sanitizer(entries: L, candidates: C, sanitizer: S, settings: EngineSettings) -> Self {
        Self {
            entries,
            candidates,
            sanitizer,
            settings,
        }
    }

    /// Adds an entry and renders its gloss.
    pub fn save_entry(&self, entry: LexiconEntry) -> Result<GlossedEntry, LexiconServiceError> {
        let entry = self.prepare(entry)?;
        let id = self.entries.add_entry(&entry)?;
        self.render_and_read_back("create", id)
    }

    /// Replaces an entry and re-renders its gloss.
    pub fn replace_entry(
        &self,
        id: RecordId,
        entry: LexiconEntry,
    ) -> Result<GlossedEntry, LexiconServiceError> {
        let entry = self.prepare(entry)?;
        self.entries.replace_entry(id, &entry)?;
        self.render_and_read_back("update", id)
    }

    pub fn get_entry(&self, id: RecordId) -> Result<Option<GlossedEntry>, LexiconServiceError> {
        let Some(entry) = self.entries.get_entry(id)? else {
            return Ok(None);
        };
        let gloss_html = self.entries.get_gloss_html(id)?.unwrap_or_default();
        let linked_record_ids = self.referencer()?.linked_record_ids(&gloss_html);
        Ok(Some(GlossedEntry {
            id,
            entry,
            gloss_html,
            linked_record_ids,
        }))
    }

    fn referencer(&self) -> Result<CrossReferencer, LexiconServiceError> {
        Ok(CrossReferencer::new(
            self.candidates.load_candidates(RecordKind::CultureEvent)?,
        ))
    }

    fn prepare(&self, mut entry: LexiconEntry) -> Result<LexiconEntry, LexiconServiceError> {
        if entry.headword().trim().is_empty() {
            return Err(LexiconServiceError::EmptyHeadword);
        }
        let gloss = self.sanitizer.sanitize(entry.gloss());
        entry.set_gloss(gloss);
        Ok(entry)
    }

    fn render_and_read_back(
        &self,
        action: &str,
        id: RecordId,
    ) -> Result<GlossedEntry, LexiconServiceError> {
        let entry = self
            .entries
            .get_entry(id)?
            .ok_or(LexiconServiceError::InconsistentState(
                "saved lexicon entry not found in read-back",
            ))?;

        let referencer = self.referencer()?;
        let mode = self.settings.cross_reference_mode;
        let report = referencer.rewrite(entry.gloss(), mode);
        self.entries.set_gloss_html(id, &report.html)?;

        let gloss_html = self.entries.get_gloss_html(id)?.ok_or(
            LexiconServiceError::InconsistentState("lexicon gloss not found in read-back"),
        )?;
        if gloss_html != report.html {
            return Err(LexiconServiceError::InconsistentState(
                "stored gloss differs from rendering",
            ));
        }

        info!(
            "event=lexicon_save module=service status=ok action={} id={} kind={:?} mode={} links={} ambiguous={}",
            action,
            id,
            entry.class(),
            mode,
            report.linked_record_ids.len(),
            report.skipped_ambiguous.len()
        );

        Ok(GlossedEntry {
            id,
            entry,
            gloss_html,
            linked_record_ids: report.linked_record_ids,
        })
    }
}
