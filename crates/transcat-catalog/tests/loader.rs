use chrono::Utc;
use transcat_catalog::{SqliteCatalog, TranslationLoader};
use transcat_core::config::TableNames;
use transcat_core::source::SourceKind;

fn seeded() -> SqliteCatalog {
    let catalog = SqliteCatalog::open_in_memory(TableNames::default()).unwrap();
    let now = Utc::now();

    let failed = catalog
        .insert_source(SourceKind::Grouped, None, "auth.failed", "en", now)
        .unwrap();
    let throttle = catalog
        .insert_source(SourceKind::Grouped, None, "auth.throttle", "en", now)
        .unwrap();
    let other = catalog
        .insert_source(SourceKind::Grouped, None, "authx.other", "en", now)
        .unwrap();
    let vendor = catalog
        .insert_source(SourceKind::Grouped, Some("courier"), "auth.vendor", "en", now)
        .unwrap();
    let welcome = catalog
        .insert_source(SourceKind::Text, None, "Welcome", "en", now)
        .unwrap();

    catalog
        .insert_message(SourceKind::Grouped, failed, "de", "Anmeldung fehlgeschlagen")
        .unwrap();
    catalog
        .insert_message(SourceKind::Grouped, throttle, "de", "Zu viele Versuche")
        .unwrap();
    catalog
        .insert_message(SourceKind::Grouped, other, "de", "Andere")
        .unwrap();
    catalog
        .insert_message(SourceKind::Grouped, vendor, "de", "Anbieter")
        .unwrap();
    catalog
        .insert_message(SourceKind::Grouped, failed, "fr", "Échec")
        .unwrap();
    catalog
        .insert_message(SourceKind::Text, welcome, "de", "Willkommen")
        .unwrap();
    catalog
}

#[test]
fn source_locale_loads_empty() {
    let catalog = seeded();
    let loader = TranslationLoader::new(&catalog, "en");
    assert!(loader.load("en", "auth", None).unwrap().is_empty());
    assert!(loader.load("en", "*", Some("*")).unwrap().is_empty());
}

#[test]
fn grouped_keys_are_stripped_and_filtered_by_locale() {
    let catalog = seeded();
    let loader = TranslationLoader::new(&catalog, "en");
    let de = loader.load("de", "auth", None).unwrap();
    assert_eq!(de.len(), 3);
    assert_eq!(de["failed"], "Anmeldung fehlgeschlagen");
    assert_eq!(de["throttle"], "Zu viele Versuche");
    assert_eq!(de["vendor"], "Anbieter");
    assert!(!de.contains_key("other"));

    let fr = loader.load("fr", "auth", None).unwrap();
    assert_eq!(fr.len(), 1);
    assert_eq!(fr["failed"], "Échec");
}

#[test]
fn namespace_filters_grouped_rows() {
    let catalog = seeded();
    let loader = TranslationLoader::new(&catalog, "en");
    let courier = loader.load("de", "auth", Some("courier")).unwrap();
    assert_eq!(courier.len(), 1);
    assert_eq!(courier["vendor"], "Anbieter");

    // A lone namespace wildcard means no namespace filter.
    let all = loader.load("de", "auth", Some("*")).unwrap();
    assert_eq!(all.len(), 3);
}

#[test]
fn wildcard_pair_selects_text_sources() {
    let catalog = seeded();
    let loader = TranslationLoader::new(&catalog, "en");
    let text = loader.load("de", "*", Some("*")).unwrap();
    assert_eq!(text.len(), 1);
    assert_eq!(text["Welcome"], "Willkommen");
}

#[test]
fn like_metacharacters_in_group_are_literal() {
    let catalog = seeded();
    let loader = TranslationLoader::new(&catalog, "en");
    assert!(loader.load("de", "aut_", None).unwrap().is_empty());
    assert!(loader.load("de", "%", None).unwrap().is_empty());
}

#[test]
fn later_message_wins_for_duplicate_key() {
    let catalog = seeded();
    let id = catalog
        .find(SourceKind::Grouped, "auth.failed")
        .unwrap()
        .unwrap()
        .id;
    catalog
        .insert_message(SourceKind::Grouped, id, "de", "Neuer Text")
        .unwrap();
    let loader = TranslationLoader::new(&catalog, "en");
    assert_eq!(loader.load("de", "auth", None).unwrap()["failed"], "Neuer Text");
}
