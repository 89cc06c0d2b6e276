//! Integration tests for transcat-cli functionality.
//! Tests the library calls the CLI commands are built from.

use std::fs;
use std::path::Path;

use transcat_catalog::{SqliteCatalog, TranslationLoader};
use transcat_core::config::TranscatConfig;
use transcat_core::source::{MissingPolicy, SourceKind};
use transcat_scan::ScanOrchestrator;

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn open(root: &Path, config: &TranscatConfig) -> SqliteCatalog {
    let db = config.database_path(root);
    fs::create_dir_all(db.parent().unwrap()).unwrap();
    SqliteCatalog::open(&db, config.tables.clone()).unwrap()
}

#[test]
fn test_parse_with_project_config() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    write(
        root,
        ".transcat/config.toml",
        r#"
source_locale = "en"
parse_roots = ["src"]
mark_missing = true

[tables]
source_grouped = "lt_grouped"
source_text = "lt_text"
translations = "lt_messages"

[[functions]]
name = "t"
kind = "text"

[[functions]]
name = "tg"
argument = 1
kind = "grouped"
"#,
    );
    write(
        root,
        "src/page.php",
        "<?php echo t('Hello'); echo tg($domain, 'menu.home'); echo __('ignored');",
    );
    write(root, "other/skip.php", "<?php echo t('Not scanned');");

    let config = TranscatConfig::load(root).unwrap();
    let roots = config.resolve_roots(root, &[]);
    let catalog = open(root, &config);
    let summary = ScanOrchestrator::from_config(&catalog, &config)
        .unwrap()
        .run(&roots, config.missing_policy(None, None))
        .unwrap();

    assert_eq!(summary.files_scanned, 1);
    assert_eq!(summary.inserted, 2);
    assert_eq!(summary.policy, MissingPolicy::Mark);
    assert!(catalog.find(SourceKind::Text, "Hello").unwrap().is_some());
    assert!(catalog.find(SourceKind::Grouped, "menu.home").unwrap().is_some());
    assert!(catalog.find(SourceKind::Text, "ignored").unwrap().is_none());
    assert!(root.join(".transcat/catalog.db").exists());
}

#[test]
fn test_root_override_and_flag_precedence() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    write(root, "modules/a.php", "<?php __('From module');");

    let config = TranscatConfig::load(root).unwrap();
    let roots = config.resolve_roots(root, &["modules".into()]);
    assert_eq!(roots, vec![root.join("modules")]);
    assert_eq!(
        config.missing_policy(Some(true), Some(true)),
        MissingPolicy::Delete
    );

    let catalog = open(root, &config);
    let mut scan = ScanOrchestrator::from_config(&catalog, &config).unwrap();
    let first = scan.run(&roots, MissingPolicy::Delete).unwrap();
    assert_eq!(first.inserted, 1);
    let second = scan.run(&roots, MissingPolicy::Delete).unwrap();
    assert_eq!(second.inserted + second.renewed + second.missing_acted, 0);
}

#[test]
fn test_load_after_parse() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    write(
        root,
        "resources/views/auth.blade.php",
        "{{ trans('auth.failed') }} {{ __('Log in') }}",
    );

    let config = TranscatConfig::load(root).unwrap();
    let catalog = open(root, &config);
    ScanOrchestrator::from_config(&catalog, &config)
        .unwrap()
        .run(&config.resolve_roots(root, &[]), MissingPolicy::Mark)
        .unwrap();

    let failed = catalog
        .find(SourceKind::Grouped, "auth.failed")
        .unwrap()
        .unwrap();
    catalog
        .insert_message(SourceKind::Grouped, failed.id, "de", "Fehlgeschlagen")
        .unwrap();
    let login = catalog.find(SourceKind::Text, "Log in").unwrap().unwrap();
    catalog
        .insert_message(SourceKind::Text, login.id, "de", "Anmelden")
        .unwrap();

    let loader = TranslationLoader::new(&catalog, config.source_locale.clone());
    let grouped = loader.load("de", "auth", None).unwrap();
    assert_eq!(
        serde_json::to_value(&grouped).unwrap(),
        serde_json::json!({ "failed": "Fehlgeschlagen" })
    );
    let text = loader.load("de", "*", Some("*")).unwrap();
    assert_eq!(text["Log in"], "Anmelden");
    assert!(loader.load("en", "auth", None).unwrap().is_empty());
}

#[test]
fn test_invalid_config_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    write(
        tmp.path(),
        ".transcat/config.toml",
        "[tables]\nsource_text = \"drop table\"\n",
    );
    assert!(TranscatConfig::load(tmp.path()).is_err());
}
