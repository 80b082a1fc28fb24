use fieldnotes_core::db::migrations::latest_version;
use fieldnotes_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

const TABLES: [&str; 5] = [
    "culture_events",
    "people",
    "record_links",
    "lexicon_entries",
    "texts",
];

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in TABLES {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn reopening_a_file_database_keeps_schema_and_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fieldnotes.db");

    let conn_first = open_db(&path).unwrap();
    conn_first
        .execute(
            "INSERT INTO culture_events (title, slug) VALUES ('Reef Fishing', 'reef-fishing');",
            [],
        )
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let count: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM culture_events;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    assert!(err.needs_newer_build());
    assert!(err.to_string().contains("schema 999"));
    match err {
        DbError::SchemaTooNew { found, supported } => {
            assert_eq!(found, 999);
            assert_eq!(supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn slugs_are_unique_per_record_table_only() {
    let conn = open_db_in_memory().unwrap();

    conn.execute(
        "INSERT INTO culture_events (title, slug) VALUES ('Harvest', 'harvest');",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO people (name, slug) VALUES ('Harvest', 'harvest');",
        [],
    )
    .unwrap();
    let duplicate = conn.execute(
        "INSERT INTO culture_events (title, slug) VALUES ('harvest', 'harvest');",
        [],
    );
    assert!(duplicate.is_err());
}

#[test]
fn text_accuracy_is_range_checked() {
    let conn = open_db_in_memory().unwrap();

    let out_of_range = conn.execute(
        "INSERT INTO texts (title, orthography, accuracy_percent) VALUES ('t', 'o', 101);",
        [],
    );
    assert!(out_of_range.is_err());
}

#[test]
fn lexicon_entries_default_to_an_empty_gloss() {
    let conn = open_db_in_memory().unwrap();

    conn.execute(
        "INSERT INTO lexicon_entries (kind, headword, payload) VALUES ('word', 'tama', '{}');",
        [],
    )
    .unwrap();
    let gloss_html: String = conn
        .query_row("SELECT gloss_html FROM lexicon_entries;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(gloss_html, "");
    assert_eq!(latest_version(), 3);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
