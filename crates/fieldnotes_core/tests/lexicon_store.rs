use fieldnotes_core::db::open_db_in_memory;
use fieldnotes_core::{
    Conjugation, LexiconEntry, LexiconRepository, LexiconSource, PhraseEntry, RepoError,
    SqliteLexiconRepository, TokenStatus, VerbEntry, WordEntry,
};
use rusqlite::params;

fn verb() -> LexiconEntry {
    LexiconEntry::Verb(VerbEntry {
        infinitive: "kai".to_string(),
        conjugations: vec![Conjugation {
            slot: "1sg".to_string(),
            form: "kaia".to_string(),
            checked: false,
        }],
        spelling_variations: Vec::new(),
        detail_url: "/lexicon/kai".to_string(),
        gloss: String::new(),
    })
}

#[test]
fn entries_roundtrip_in_insertion_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLexiconRepository::try_new(&conn).unwrap();
    let phrase = LexiconEntry::Phrase(PhraseEntry {
        text: "malo".to_string(),
        checked: true,
        detail_url: "/phrases/malo".to_string(),
        gloss: String::new(),
    });

    let verb_id = repo.add_entry(&verb()).unwrap();
    let phrase_id = repo.add_entry(&phrase).unwrap();

    let listed = repo.list_entries().unwrap();
    assert_eq!(listed, vec![(verb_id, verb()), (phrase_id, phrase.clone())]);
    assert_eq!(repo.get_entry(phrase_id).unwrap(), Some(phrase));

    let headword: String = conn
        .query_row(
            "SELECT headword FROM lexicon_entries WHERE id = ?1;",
            [verb_id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(headword, "kai");
}

#[test]
fn replacing_and_deleting_entries_updates_the_snapshot() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLexiconRepository::try_new(&conn).unwrap();
    let id = repo.add_entry(&verb()).unwrap();

    let found = repo.load_lexicon().unwrap().lookup("KAIA").unwrap();
    assert!(!found.checked);
    assert_eq!(found.link, "/lexicon/kai#1sg");

    let replacement = LexiconEntry::Word(WordEntry {
        canonical_form: "kaia".to_string(),
        spelling_variations: Vec::new(),
        checked: true,
        detail_url: "/lexicon/kaia".to_string(),
        gloss: String::new(),
    });
    repo.replace_entry(id, &replacement).unwrap();
    let report = fieldnotes_core::highlight_lexicon("kaia", &repo.load_lexicon().unwrap());
    assert_eq!(report.tokens[0].status, TokenStatus::VerifiedWithLink);

    repo.delete_entry(id).unwrap();
    assert!(repo.load_lexicon().unwrap().is_empty());
    assert!(matches!(
        repo.delete_entry(id).unwrap_err(),
        RepoError::NotFound { id: missing, .. } if missing == id
    ));
}

#[test]
fn corrupt_payloads_are_reported() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO lexicon_entries (kind, headword, payload) VALUES (?1, ?2, ?3);",
        params!["word", "tama", "{not json"],
    )
    .unwrap();
    let repo = SqliteLexiconRepository::try_new(&conn).unwrap();

    assert!(matches!(
        repo.load_lexicon().unwrap_err(),
        RepoError::InvalidData(_)
    ));
}

#[test]
fn kind_column_must_agree_with_payload() {
    let conn = open_db_in_memory().unwrap();
    let payload = serde_json::to_string(&verb()).unwrap();
    conn.execute(
        "INSERT INTO lexicon_entries (kind, headword, payload) VALUES ('word', 'kai', ?1);",
        [payload],
    )
    .unwrap();
    let repo = SqliteLexiconRepository::try_new(&conn).unwrap();

    let err = repo.list_entries().unwrap_err();
    assert!(err.to_string().contains("stored as `word`"));
}

#[test]
fn repository_requires_migrated_schema() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    assert!(matches!(
        SqliteLexiconRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("lexicon_entries"))
    ));
}
