//! Linguistic text repository.
//!
//! # Invariants
//! - `accuracy_percent` is `NULL` exactly when accuracy is `NoData`.
//! - Stored percentages stay within `0..=100`.

use crate::lexicon::Accuracy;
use crate::model::record::{RecordId, TextRecord};
use crate::repo::record_repo::{table_exists, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const TEXT_SELECT_SQL: &str = "SELECT
    id,
    title,
    orthography,
    orthography_html,
    accuracy_percent,
    updated_at
FROM texts";

/// Rendered fields written alongside a text's source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextWrite<'a> {
    pub title: &'a str,
    pub orthography: &'a str,
    pub orthography_html: &'a str,
    pub accuracy: Accuracy,
}

/// Repository interface for linguistic texts.
pub trait TextRepository {
    fn insert_text(&self, text: &TextWrite<'_>) -> RepoResult<RecordId>;
    fn update_text(&self, id: RecordId, text: &TextWrite<'_>) -> RepoResult<()>;
    fn get_text(&self, id: RecordId) -> RepoResult<Option<TextRecord>>;
    fn list_texts(&self) -> RepoResult<Vec<TextRecord>>;
}

/// SQLite-backed text repository.
pub struct SqliteTextRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTextRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        if !table_exists(conn, "texts")? {
            return Err(RepoError::MissingRequiredTable("texts"));
        }
        Ok(Self { conn })
    }
}

impl TextRepository for SqliteTextRepository<'_> {
    fn insert_text(&self, text: &TextWrite<'_>) -> RepoResult<RecordId> {
        self.conn.execute(
            "INSERT INTO texts (title, orthography, orthography_html, accuracy_percent)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                text.title,
                text.orthography,
                text.orthography_html,
                accuracy_to_db(text.accuracy),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_text(&self, id: RecordId, text: &TextWrite<'_>) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE texts
             SET
                title = ?2,
                orthography = ?3,
                orthography_html = ?4,
                accuracy_percent = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                id,
                text.title,
                text.orthography,
                text.orthography_html,
                accuracy_to_db(text.accuracy),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "text", id });
        }
        Ok(())
    }

    fn get_text(&self, id: RecordId) -> RepoResult<Option<TextRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TEXT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_text_row(row)?));
        }
        Ok(None)
    }

    fn list_texts(&self) -> RepoResult<Vec<TextRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TEXT_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut texts = Vec::new();
        while let Some(row) = rows.next()? {
            texts.push(parse_text_row(row)?);
        }
        Ok(texts)
    }
}

fn parse_text_row(row: &Row<'_>) -> RepoResult<TextRecord> {
    let id: RecordId = row.get("id")?;
    let accuracy = match row.get::<_, Option<i64>>("accuracy_percent")? {
        None => Accuracy::NoData,
        Some(value) => u8::try_from(value)
            .ok()
            .filter(|percent| *percent <= 100)
            .map(Accuracy::Percent)
            .ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "invalid accuracy `{value}` in texts.accuracy_percent for id {id}"
                ))
            })?,
    };

    Ok(TextRecord {
        id,
        title: row.get("title")?,
        orthography: row.get("orthography")?,
        orthography_html: row.get("orthography_html")?,
        accuracy,
        updated_at: row.get("updated_at")?,
    })
}

fn accuracy_to_db(accuracy: Accuracy) -> Option<i64> {
    accuracy.percent().map(i64::from)
}
