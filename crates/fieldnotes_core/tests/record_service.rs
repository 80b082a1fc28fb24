use fieldnotes_core::db::open_db_in_memory;
use fieldnotes_core::model::record::RecordValidationError;
use fieldnotes_core::{
    CrossReferenceMode, EngineSettings, RecordKind, RecordService, RecordServiceError,
    SqliteRecordRepository,
};

fn manual_settings() -> EngineSettings {
    EngineSettings {
        cross_reference_mode: CrossReferenceMode::Manual,
        ..EngineSettings::default()
    }
}

#[test]
fn culture_event_can_link_to_itself() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteRecordRepository::try_new(&mut conn).unwrap();
    let mut service = RecordService::new(repo, EngineSettings::default());

    let saved = service
        .save_culture_event("Reef Fishing", "Reef Fishing happens at dawn.")
        .unwrap();

    assert_eq!(saved.slug, "reef-fishing");
    assert_eq!(
        saved.body_html,
        r#"<a href="reef-fishing">Reef Fishing</a> happens at dawn."#
    );
    assert_eq!(saved.links, vec![saved.id]);
}

#[test]
fn description_links_to_previously_saved_events() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteRecordRepository::try_new(&mut conn).unwrap();
    let mut service = RecordService::new(repo, EngineSettings::default());

    let reef = service
        .save_culture_event("Reef Fishing", "Done at dawn.")
        .unwrap();
    let nets = service
        .save_culture_event("Net Mending", "Nets are mended after reef fishing.")
        .unwrap();

    assert_eq!(
        nets.body_html,
        r#"Nets are mended after <a href="reef-fishing">Reef Fishing</a>."#
    );
    assert_eq!(nets.body, "Nets are mended after reef fishing.");
    assert_eq!(nets.links, vec![reef.id]);
}

#[test]
fn user_markup_is_sanitized_before_linking() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteRecordRepository::try_new(&mut conn).unwrap();
    let mut service = RecordService::new(repo, EngineSettings::default());

    let saved = service
        .save_culture_event(
            "Reef Fishing",
            r#"<p><a href="http://example.com">Reef Fishing</a><script>alert(1)</script></p>"#,
        )
        .unwrap();

    assert!(!saved.body_html.contains("example.com"));
    assert!(!saved.body_html.contains("alert"));
    assert_eq!(
        saved.body_html,
        r#"<p><a href="reef-fishing">Reef Fishing</a></p>"#
    );
}

#[test]
fn manual_mode_links_only_braced_references() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteRecordRepository::try_new(&mut conn).unwrap();
    let mut service = RecordService::new(repo, manual_settings());

    let reef = service
        .save_culture_event("Reef Fishing", "Done at dawn.")
        .unwrap();
    let nets = service
        .save_culture_event("Net Mending", "After Reef Fishing, see {reef fishing}.")
        .unwrap();

    assert_eq!(
        nets.body_html,
        r#"After Reef Fishing, see <a href="reef-fishing">Reef Fishing</a>."#
    );
    assert_eq!(nets.links, vec![reef.id]);
}

#[test]
fn duplicate_and_blank_titles_are_rejected() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteRecordRepository::try_new(&mut conn).unwrap();
    let mut service = RecordService::new(repo, EngineSettings::default());

    service.save_culture_event("Reef Fishing", "").unwrap();

    let duplicate = service
        .save_culture_event("reef  fishing!", "")
        .unwrap_err();
    assert!(matches!(
        duplicate,
        RecordServiceError::DuplicateSlug {
            kind: RecordKind::CultureEvent,
            ref slug,
        } if slug == "reef-fishing"
    ));

    let blank = service.save_culture_event("   ", "").unwrap_err();
    assert!(matches!(
        blank,
        RecordServiceError::Validation(RecordValidationError::EmptyTitle)
    ));
}

#[test]
fn updating_unknown_record_returns_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteRecordRepository::try_new(&mut conn).unwrap();
    let mut service = RecordService::new(repo, EngineSettings::default());

    let err = service
        .update_culture_event(404, "Reef Fishing", "")
        .unwrap_err();
    assert!(matches!(
        err,
        RecordServiceError::NotFound {
            kind: RecordKind::CultureEvent,
            id: 404
        }
    ));
}

#[test]
fn rename_is_picked_up_by_refresh() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteRecordRepository::try_new(&mut conn).unwrap();
    let mut service = RecordService::new(repo, EngineSettings::default());

    let reef = service
        .save_culture_event("Reef Fishing", "Done at dawn.")
        .unwrap();
    let nets = service
        .save_culture_event("Net Mending", "Follows Reef Fishing.")
        .unwrap();
    assert_eq!(nets.links, vec![reef.id]);

    let renamed = service
        .update_culture_event(reef.id, "Reef Diving", "Done at dawn.")
        .unwrap();
    assert_eq!(renamed.slug, "reef-diving");

    let changed = service
        .refresh_cross_references(RecordKind::CultureEvent)
        .unwrap();
    assert_eq!(changed, 1);

    let nets = service
        .get_record(RecordKind::CultureEvent, nets.id)
        .unwrap()
        .unwrap();
    assert_eq!(nets.body_html, "Follows Reef Fishing.");
    assert!(nets.links.is_empty());
}

#[test]
fn people_link_only_to_people() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteRecordRepository::try_new(&mut conn).unwrap();
    let mut service = RecordService::new(repo, EngineSettings::default());

    service
        .save_culture_event("Harvest", "Yearly.")
        .unwrap();
    let mother = service.save_person("Maria Tui", "").unwrap();
    let child = service
        .save_person("Ana Tui", "Daughter of Maria Tui, born at Harvest.")
        .unwrap();

    assert_eq!(
        child.body_html,
        r#"Daughter of <a href="maria-tui">Maria Tui</a>, born at Harvest."#
    );
    assert_eq!(child.links, vec![mother.id]);
    assert_eq!(service.list_records(RecordKind::Person).unwrap().len(), 2);
}
