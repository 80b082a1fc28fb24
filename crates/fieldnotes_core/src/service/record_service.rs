//! Culture event / person save path.
//!
//! # Responsibility
//! - Validate titles, sanitize the free-text field and persist the source.
//! - Cross-reference the sanitized field against a fresh candidate snapshot
//!   and store the rendered HTML plus outgoing links.
//!
//! # Invariants
//! - The candidate snapshot is loaded after the write, so a record can link
//!   to itself and a renamed record is addressed by its new title.
//! - `body_html` is never fed back into the rewriter; every render starts
//!   from the sanitized `body`.
//! - Cross-reference mode comes from `EngineSettings` passed at construction.

use crate::config::EngineSettings;
use crate::linker::{CrossReferenceMode, CrossReferencer, RewriteReport};
use crate::model::record::{Record, RecordDraft, RecordId, RecordKind, RecordValidationError};
use crate::repo::record_repo::{RecordRepository, RepoError};
use crate::text::{AllowListSanitizer, HtmlSanitizer};
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for record save use-cases.
#[derive(Debug)]
pub enum RecordServiceError {
    Validation(RecordValidationError),
    /// Another record of the same kind already owns the slug.
    DuplicateSlug {
        kind: RecordKind,
        slug: String,
    },
    NotFound {
        kind: RecordKind,
        id: RecordId,
    },
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for RecordServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicateSlug { kind, slug } => {
                write!(f, "{kind} with slug `{slug}` already exists")
            }
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent record state: {details}"),
        }
    }
}

impl Error for RecordServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RecordValidationError> for RecordServiceError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for RecordServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::DuplicateSlug { kind, slug } => Self::DuplicateSlug { kind, slug },
            RepoError::NotFound { entity, id } => match RecordKind::parse(entity) {
                Some(kind) => Self::NotFound { kind, id },
                None => Self::Repo(RepoError::NotFound { entity, id }),
            },
            other => Self::Repo(other),
        }
    }
}

pub type RecordServiceResult<T> = Result<T, RecordServiceError>;

/// Save-path facade over a record repository.
pub struct RecordService<R: RecordRepository, S: HtmlSanitizer = AllowListSanitizer> {
    repo: R,
    sanitizer: S,
    settings: EngineSettings,
}

impl<R: RecordRepository> RecordService<R> {
    /// Creates a service with the default allow-list sanitizer.
    pub fn new(repo: R, settings: EngineSettings) -> Self {
        Self::with_sanitizer(repo, AllowListSanitizer::default(), settings)
    }
}

impl<R: RecordRepository, S: HtmlSanitizer> RecordService<R, S> {
    pub fn with_sanitizer(repo: R, sanitizer: S, settings: EngineSettings) -> Self {
        Self {
            repo,
            sanitizer,
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Creates a culture event and renders its description.
    pub fn save_culture_event(
        &mut self,
        title: &str,
        description: &str,
    ) -> RecordServiceResult<Record> {
        self.create(RecordKind::CultureEvent, title, description)
    }

    /// Replaces a culture event's title and description and re-renders it.
    pub fn update_culture_event(
        &mut self,
        id: RecordId,
        title: &str,
        description: &str,
    ) -> RecordServiceResult<Record> {
        self.update(RecordKind::CultureEvent, id, title, description)
    }

    /// Creates a person and renders their family field.
    pub fn save_person(&mut self, name: &str, family: &str) -> RecordServiceResult<Record> {
        self.create(RecordKind::Person, name, family)
    }

    pub fn update_person(
        &mut self,
        id: RecordId,
        name: &str,
        family: &str,
    ) -> RecordServiceResult<Record> {
        self.update(RecordKind::Person, id, name, family)
    }

    pub fn get_record(&self, kind: RecordKind, id: RecordId) -> RecordServiceResult<Option<Record>> {
        Ok(self.repo.get_record(kind, id)?)
    }

    pub fn list_records(&self, kind: RecordKind) -> RecordServiceResult<Vec<Record>> {
        Ok(self.repo.list_records(kind)?)
    }

    /// Re-renders every record of `kind` against the current candidate set.
    ///
    /// Needed after a rename or a new record, since existing fields only pick
    /// up new titles when they are rendered again. Returns the number of
    /// records whose rendered field changed.
    pub fn refresh_cross_references(&mut self, kind: RecordKind) -> RecordServiceResult<usize> {
        let referencer = CrossReferencer::new(self.repo.load_candidates(kind)?);
        let mode = self.settings.cross_reference_mode;
        let mut changed = 0;
        for record in self.repo.list_records(kind)? {
            let report = referencer.rewrite(&record.body, mode);
            if report.html == record.body_html && report.linked_record_ids == record.links {
                continue;
            }
            self.store_rendering(kind, record.id, &report)?;
            changed += 1;
        }
        info!(
            "event=record_refresh module=service status=ok kind={} mode={} changed={}",
            kind, mode, changed
        );
        Ok(changed)
    }

    fn create(&mut self, kind: RecordKind, title: &str, body: &str) -> RecordServiceResult<Record> {
        let draft = RecordDraft::new(kind, title, self.sanitizer.sanitize(body))?;
        if self.repo.find_by_slug(kind, &draft.slug)?.is_some() {
            return Err(RecordServiceError::DuplicateSlug {
                kind,
                slug: draft.slug,
            });
        }

        let id = self.repo.insert_record(&draft)?;
        let report = self.render(kind, &draft.body)?;
        self.store_rendering(kind, id, &report)?;
        log_save("create", kind, id, self.settings.cross_reference_mode, &report);

        self.repo
            .get_record(kind, id)?
            .ok_or(RecordServiceError::InconsistentState(
                "created record not found in read-back",
            ))
    }

    fn update(
        &mut self,
        kind: RecordKind,
        id: RecordId,
        title: &str,
        body: &str,
    ) -> RecordServiceResult<Record> {
        let draft = RecordDraft::new(kind, title, self.sanitizer.sanitize(body))?;
        if let Some(owner) = self.repo.find_by_slug(kind, &draft.slug)? {
            if owner.id != id {
                return Err(RecordServiceError::DuplicateSlug {
                    kind,
                    slug: draft.slug,
                });
            }
        }

        self.repo.update_record(id, &draft)?;
        let report = self.render(kind, &draft.body)?;
        self.store_rendering(kind, id, &report)?;
        log_save("update", kind, id, self.settings.cross_reference_mode, &report);

        self.repo
            .get_record(kind, id)?
            .ok_or(RecordServiceError::InconsistentState(
                "updated record not found in read-back",
            ))
    }

    fn render(&self, kind: RecordKind, body: &str) -> RecordServiceResult<RewriteReport> {
        let candidates = self.repo.load_candidates(kind)?;
        let referencer = CrossReferencer::new(candidates);
        let report = referencer.rewrite(body, self.settings.cross_reference_mode);
        for key in &report.skipped_ambiguous {
            debug!(
                "event=xref_ambiguous module=service status=skipped kind={} key={}",
                kind, key
            );
        }
        Ok(report)
    }

    fn store_rendering(
        &mut self,
        kind: RecordKind,
        id: RecordId,
        report: &RewriteReport,
    ) -> RecordServiceResult<()> {
        self.repo.set_body_html(kind, id, &report.html)?;
        self.repo
            .replace_links(kind, id, &report.linked_record_ids)?;
        Ok(())
    }
}

fn log_save(
    action: &str,
    kind: RecordKind,
    id: RecordId,
    mode: CrossReferenceMode,
    report: &RewriteReport,
) {
    info!(
        "event=record_save module=service status=ok action={} kind={} id={} mode={} links={} ambiguous={}",
        action,
        kind,
        id,
        mode,
        report.linked_record_ids.len(),
        report.skipped_ambiguous.len()
    );
}
