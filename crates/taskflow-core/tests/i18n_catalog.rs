use taskflow_core::i18n::{Locale, MessageCatalog, definition_label_key, step_label_key};

#[test]
fn lookups_fall_back_to_the_default_locale_then_the_supplied_default() {
    let mut catalog = MessageCatalog::new();
    let english = Locale::default();
    let german = Locale::new("de");
    catalog.insert(&english, "process.ord.name", "Order handling");
    catalog.insert(&german, "process.inv.name", "Rechnung");

    assert_eq!(
        catalog.message_or(&german, "process.inv.name", "fallback"),
        "Rechnung"
    );
    assert_eq!(
        catalog.message_or(&german, "process.ord.name", "fallback"),
        "Order handling"
    );
    assert_eq!(
        catalog.message_or(&german, "process.unknown.name", "fallback"),
        "fallback"
    );
}

#[test]
fn label_keys_follow_the_process_naming_scheme() {
    assert_eq!(definition_label_key("ord"), "process.ord.name");
    assert_eq!(step_label_key("ord", "review"), "process.ord.step.review");
}

#[test]
fn label_matching_is_case_insensitive_and_scoped_to_definitions() {
    let mut catalog = MessageCatalog::new();
    let german = Locale::new("de");
    catalog.insert(&german, "process.ord.name", "Bestellung");
    catalog.insert(&german, "process.ord.step.review", "Bestellung pruefen");
    catalog.insert(&german, "process.inv.name", "Rechnung");

    let matched = catalog.definitions_with_label_matching(&german, "BESTELL");
    assert_eq!(matched, vec!["ord".to_string()]);

    assert!(
        catalog
            .definitions_with_label_matching(&german, "zzz")
            .is_empty()
    );
}

#[test]
fn json_bundles_populate_one_locale() {
    let mut catalog = MessageCatalog::new();
    let english = Locale::default();
    catalog
        .load_json_bundle(
            &english,
            r#"{"process.ord.name": "Order handling", "process.ord.step.ship": "Ship order"}"#,
        )
        .unwrap();

    assert_eq!(
        catalog.message_or(&english, "process.ord.step.ship", "fallback"),
        "Ship order"
    );
    assert!(catalog.load_json_bundle(&english, "not json").is_err());
}
