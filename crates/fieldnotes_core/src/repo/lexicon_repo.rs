//! Lexicon repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist dictionary entries as tagged JSON payloads.
//! - Serve the immutable `Lexicon` snapshot used by the highlighter.
//!
//! # Invariants
//! - The `kind` column always agrees with the payload's `kind` tag.
//! - Snapshot order is insertion order, so the earliest entry owns a
//!   duplicated form.
//! - `gloss_html` is derived; replacing an entry clears it until the
//!   caller stores a fresh rendering.

use crate::lexicon::Lexicon;
use crate::model::lexicon::{EntryClass, LexiconEntry};
use crate::model::record::RecordId;
use crate::repo::record_repo::{table_exists, RepoError, RepoResult};
use log::debug;
use rusqlite::{params, Connection, Row};

/// Read access to the current dictionary.
pub trait LexiconSource {
    fn load_lexicon(&self) -> RepoResult<Lexicon>;
}

/// Repository interface for dictionary entries.
pub trait LexiconRepository: LexiconSource {
    fn add_entry(&self, entry: &LexiconEntry) -> RepoResult<RecordId>;
    fn replace_entry(&self, id: RecordId, entry: &LexiconEntry) -> RepoResult<()>;
    fn get_entry(&self, id: RecordId) -> RepoResult<Option<LexiconEntry>>;
    /// Lists entries in insertion order.
    fn list_entries(&self) -> RepoResult<Vec<(RecordId, LexiconEntry)>>;
    fn delete_entry(&self, id: RecordId) -> RepoResult<()>;
    /// Stores the cross-referenced rendering of an entry's gloss.
    fn set_gloss_html(&self, id: RecordId, html: &str) -> RepoResult<()>;
    fn get_gloss_html(&self, id: RecordId) -> RepoResult<Option<String>>;
}

/// SQLite-backed lexicon repository.
pub struct SqliteLexiconRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLexiconRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        if !table_exists(conn, "lexicon_entries")? {
            return Err(RepoError::MissingRequiredTable("lexicon_entries"));
        }
        Ok(Self { conn })
    }
}

impl LexiconSource for SqliteLexiconRepository<'_> {
    fn load_lexicon(&self) -> RepoResult<Lexicon> {
        let entries: Vec<LexiconEntry> = self
            .list_entries()?
            .into_iter()
            .map(|(_, entry)| entry)
            .collect();
        debug!(
            "event=lexicon_snapshot module=repo status=ok entries={}",
            entries.len()
        );
        Ok(Lexicon::new(entries))
    }
}

impl LexiconRepository for SqliteLexiconRepository<'_> {
    fn add_entry(&self, entry: &LexiconEntry) -> RepoResult<RecordId> {
        let payload = encode_entry(entry)?;
        self.conn.execute(
            "INSERT INTO lexicon_entries (kind, headword, payload) VALUES (?1, ?2, ?3);",
            params![class_to_db(entry.class()), entry.headword(), payload],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn replace_entry(&self, id: RecordId, entry: &LexiconEntry) -> RepoResult<()> {
        let payload = encode_entry(entry)?;
        let changed = self.conn.execute(
            "UPDATE lexicon_entries
             SET
                kind = ?2,
                headword = ?3,
                payload = ?4,
                gloss_html = '',
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id, class_to_db(entry.class()), entry.headword(), payload],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "lexicon_entry",
                id,
            });
        }
        Ok(())
    }

    fn get_entry(&self, id: RecordId) -> RepoResult<Option<LexiconEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, kind, payload FROM lexicon_entries WHERE id = ?1;")?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_entry_row(row)?.1));
        }
        Ok(None)
    }

    fn list_entries(&self) -> RepoResult<Vec<(RecordId, LexiconEntry)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, kind, payload FROM lexicon_entries ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }
        Ok(entries)
    }

    fn delete_entry(&self, id: RecordId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM lexicon_entries WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(Self::not_found(id));
        }
        Ok(())
    }

    fn set_gloss_html(&self, id: RecordId, html: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE lexicon_entries SET gloss_html = ?2 WHERE id = ?1;",
            params![id, html],
        )?;
        if changed == 0 {
            return Err(Self::not_found(id));
        }
        Ok(())
    }

    fn get_gloss_html(&self, id: RecordId) -> RepoResult<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT gloss_html FROM lexicon_entries WHERE id = ?1;")?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(row.get(0)?));
        }
        Ok(None)
    }
}

impl SqliteLexiconRepository<'_> {
    fn not_found(id: RecordId) -> RepoError {
        RepoError::NotFound {
            entity: "lexicon_entry",
            id,
        }
    }
}

fn encode_entry(entry: &LexiconEntry) -> RepoResult<String> {
    serde_json::to_string(entry)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode lexicon entry: {err}")))
}

fn parse_entry_row(row: &Row<'_>) -> RepoResult<(RecordId, LexiconEntry)> {
    let id: RecordId = row.get("id")?;
    let kind_text: String = row.get("kind")?;
    let payload: String = row.get("payload")?;

    let entry: LexiconEntry = serde_json::from_str(&payload).map_err(|err| {
        RepoError::InvalidData(format!(
            "invalid payload in lexicon_entries.payload for id {id}: {err}"
        ))
    })?;
    if class_to_db(entry.class()) != kind_text {
        return Err(RepoError::InvalidData(format!(
            "lexicon entry {id} stored as `{kind_text}` but payload is `{}`",
            class_to_db(entry.class())
        )));
    }
    Ok((id, entry))
}

fn class_to_db(class: EntryClass) -> &'static str {
    match class {
        EntryClass::Word => "word",
        EntryClass::Verb => "verb",
        EntryClass::Phrase => "phrase",
    }
}
