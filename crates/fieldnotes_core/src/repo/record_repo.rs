//! Culture event / person repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist records whose free-text field gets cross-referenced.
//! - Serve the `ReferenceCandidate` snapshot the rewriter searches.
//! - Own outgoing-link replacement with atomic semantics.
//!
//! # Invariants
//! - Slugs are unique per record kind; collisions surface as
//!   `RepoError::DuplicateSlug`.
//! - `replace_links` swaps the whole link set in a single transaction.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::record::{
    Record, RecordDraft, RecordId, RecordKind, RecordValidationError,
};
use crate::model::reference::ReferenceCandidate;
use rusqlite::{params, Connection, ErrorCode, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for record persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(RecordValidationError),
    Db(DbError),
    NotFound {
        entity: &'static str,
        id: RecordId,
    },
    DuplicateSlug {
        kind: RecordKind,
        slug: String,
    },
    InvalidData(String),
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::DuplicateSlug { kind, slug } => {
                write!(f, "{kind} with slug `{slug}` already exists")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RecordValidationError> for RepoError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Read access to the addressable records of one kind.
///
/// The rewriter treats the returned snapshot as immutable for one call.
pub trait CandidateSource {
    fn load_candidates(&self, kind: RecordKind) -> RepoResult<Vec<ReferenceCandidate>>;
}

/// Repository interface for culture events and people.
pub trait RecordRepository: CandidateSource {
    /// Inserts a record with an empty rendered field and returns its id.
    fn insert_record(&self, draft: &RecordDraft) -> RepoResult<RecordId>;
    /// Replaces title, slug and source field of an existing record.
    fn update_record(&self, id: RecordId, draft: &RecordDraft) -> RepoResult<()>;
    /// Stores the rendered field.
    fn set_body_html(&self, kind: RecordKind, id: RecordId, html: &str) -> RepoResult<()>;
    fn get_record(&self, kind: RecordKind, id: RecordId) -> RepoResult<Option<Record>>;
    fn find_by_slug(&self, kind: RecordKind, slug: &str) -> RepoResult<Option<Record>>;
    /// Lists records of one kind ordered by id.
    fn list_records(&self, kind: RecordKind) -> RepoResult<Vec<Record>>;
    /// Replaces all outgoing links of one record in one transaction.
    fn replace_links(
        &mut self,
        kind: RecordKind,
        id: RecordId,
        targets: &[RecordId],
    ) -> RepoResult<()>;
}

/// Column layout of one record kind.
struct RecordTable {
    table: &'static str,
    title: &'static str,
    body: &'static str,
    body_html: &'static str,
}

fn record_table(kind: RecordKind) -> RecordTable {
    match kind {
        RecordKind::CultureEvent => RecordTable {
            table: "culture_events",
            title: "title",
            body: "description",
            body_html: "description_html",
        },
        RecordKind::Person => RecordTable {
            table: "people",
            title: "name",
            body: "family",
            body_html: "family_html",
        },
    }
}

fn select_sql(kind: RecordKind) -> String {
    let layout = record_table(kind);
    format!(
        "SELECT
            id,
            {title} AS title,
            slug,
            {body} AS body,
            {body_html} AS body_html,
            updated_at
         FROM {table}",
        title = layout.title,
        body = layout.body,
        body_html = layout.body_html,
        table = layout.table,
    )
}

/// SQLite-backed record repository.
pub struct SqliteRecordRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteRecordRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        for table in ["culture_events", "people", "record_links"] {
            if !table_exists(conn, table)? {
                return Err(RepoError::MissingRequiredTable(table));
            }
        }
        Ok(Self { conn })
    }

    fn parse_record(&self, kind: RecordKind, row: &Row<'_>) -> RepoResult<Record> {
        let id: RecordId = row.get("id")?;
        let title: String = row.get("title")?;
        if title.trim().is_empty() {
            return Err(RepoError::InvalidData(format!(
                "empty title for {kind} {id}"
            )));
        }
        Ok(Record {
            id,
            kind,
            title,
            slug: row.get("slug")?,
            body: row.get("body")?,
            body_html: row.get("body_html")?,
            updated_at: row.get("updated_at")?,
            links: load_links(self.conn, kind, id)?,
        })
    }

    fn query_one(
        &self,
        kind: RecordKind,
        filter: &str,
        value: &dyn rusqlite::ToSql,
    ) -> RepoResult<Option<Record>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE {filter};", select_sql(kind)))?;
        let mut rows = stmt.query([value])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(self.parse_record(kind, row)?));
        }
        Ok(None)
    }
}

impl CandidateSource for SqliteRecordRepository<'_> {
    fn load_candidates(&self, kind: RecordKind) -> RepoResult<Vec<ReferenceCandidate>> {
        query_candidates(self.conn, kind)
    }
}

/// Read-only candidate snapshot over a shared connection.
///
/// For callers that rewrite other tables' fields and never write records.
pub struct SqliteCandidateSource<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCandidateSource<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        for table in ["culture_events", "people"] {
            if !table_exists(conn, table)? {
                return Err(RepoError::MissingRequiredTable(table));
            }
        }
        Ok(Self { conn })
    }
}

impl CandidateSource for SqliteCandidateSource<'_> {
    fn load_candidates(&self, kind: RecordKind) -> RepoResult<Vec<ReferenceCandidate>> {
        query_candidates(self.conn, kind)
    }
}

fn query_candidates(conn: &Connection, kind: RecordKind) -> RepoResult<Vec<ReferenceCandidate>> {
    let layout = record_table(kind);
    let mut stmt = conn.prepare(&format!(
        "SELECT id, {title} AS title, slug FROM {table} ORDER BY id ASC;",
        title = layout.title,
        table = layout.table,
    ))?;
    let mut rows = stmt.query([])?;
    let mut candidates = Vec::new();
    while let Some(row) = rows.next()? {
        let id: RecordId = row.get("id")?;
        let title: String = row.get("title")?;
        let slug: String = row.get("slug")?;
        candidates.push(ReferenceCandidate::with_key(id, title, slug));
    }
    Ok(candidates)
}

impl RecordRepository for SqliteRecordRepository<'_> {
    fn insert_record(&self, draft: &RecordDraft) -> RepoResult<RecordId> {
        let layout = record_table(draft.kind);
        self.conn
            .execute(
                &format!(
                    "INSERT INTO {table} ({title}, slug, {body}) VALUES (?1, ?2, ?3);",
                    table = layout.table,
                    title = layout.title,
                    body = layout.body,
                ),
                params![draft.title, draft.slug, draft.body],
            )
            .map_err(|err| map_slug_conflict(err, draft))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_record(&self, id: RecordId, draft: &RecordDraft) -> RepoResult<()> {
        let layout = record_table(draft.kind);
        let changed = self
            .conn
            .execute(
                &format!(
                    "UPDATE {table}
                     SET
                        {title} = ?2,
                        slug = ?3,
                        {body} = ?4,
                        updated_at = (strftime('%s', 'now') * 1000)
                     WHERE id = ?1;",
                    table = layout.table,
                    title = layout.title,
                    body = layout.body,
                ),
                params![id, draft.title, draft.slug, draft.body],
            )
            .map_err(|err| map_slug_conflict(err, draft))?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: draft.kind.as_str(),
                id,
            });
        }
        Ok(())
    }

    fn set_body_html(&self, kind: RecordKind, id: RecordId, html: &str) -> RepoResult<()> {
        let layout = record_table(kind);
        let changed = self.conn.execute(
            &format!(
                "UPDATE {table} SET {body_html} = ?2 WHERE id = ?1;",
                table = layout.table,
                body_html = layout.body_html,
            ),
            params![id, html],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: kind.as_str(),
                id,
            });
        }
        Ok(())
    }

    fn get_record(&self, kind: RecordKind, id: RecordId) -> RepoResult<Option<Record>> {
        self.query_one(kind, "id = ?1", &id)
    }

    fn find_by_slug(&self, kind: RecordKind, slug: &str) -> RepoResult<Option<Record>> {
        self.query_one(kind, "slug = ?1", &slug)
    }

    fn list_records(&self, kind: RecordKind) -> RepoResult<Vec<Record>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY id ASC;", select_sql(kind)))?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(self.parse_record(kind, row)?);
        }
        Ok(records)
    }

    fn replace_links(
        &mut self,
        kind: RecordKind,
        id: RecordId,
        targets: &[RecordId],
    ) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !record_exists_in_tx(&tx, kind, id)? {
            return Err(RepoError::NotFound {
                entity: kind.as_str(),
                id,
            });
        }

        tx.execute(
            "DELETE FROM record_links WHERE source_kind = ?1 AND source_id = ?2;",
            params![kind.as_str(), id],
        )?;
        for (position, target) in targets.iter().enumerate() {
            tx.execute(
                "INSERT OR IGNORE INTO record_links (source_kind, source_id, target_id, position)
                 VALUES (?1, ?2, ?3, ?4);",
                params![kind.as_str(), id, target, position as i64],
            )?;
        }

        tx.commit()?;
        Ok(())
    }
}

fn map_slug_conflict(err: rusqlite::Error, draft: &RecordDraft) -> RepoError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            RepoError::DuplicateSlug {
                kind: draft.kind,
                slug: draft.slug.clone(),
            }
        }
        _ => RepoError::from(err),
    }
}

fn load_links(conn: &Connection, kind: RecordKind, id: RecordId) -> RepoResult<Vec<RecordId>> {
    let mut stmt = conn.prepare(
        "SELECT target_id
         FROM record_links
         WHERE source_kind = ?1 AND source_id = ?2
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query(params![kind.as_str(), id])?;
    let mut links = Vec::new();
    while let Some(row) = rows.next()? {
        links.push(row.get(0)?);
    }
    Ok(links)
}

fn record_exists_in_tx(tx: &Transaction<'_>, kind: RecordKind, id: RecordId) -> RepoResult<bool> {
    let table = record_table(kind).table;
    let exists: i64 = tx.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1);"),
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub(crate) fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
