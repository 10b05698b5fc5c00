//! Export/import of the whole rule and group set.

mod common;

use std::fs;

use common::{TestContext, chrome, firefox, group};
use linkroute::RouteError;
use linkroute::bundle::{
    BUNDLE_FORMAT_VERSION, ExportBundle, export_to, read_bundle, validate_bundle_file,
};
use linkroute::config::{AppSettings, UrlRule, builtin_templates};
use linkroute::store::{RuleStore, YamlFile};

fn populated() -> TestContext {
    let ctx = TestContext::on_disk();
    ctx.router
        .add_rule(UrlRule::new("example.org", chrome("Personal")), false)
        .unwrap();
    ctx.router
        .add_group(group("Work", &["*.corp.com"], chrome("Work")), false)
        .unwrap();
    let mut settings = ctx.router.settings();
    settings.default_browser_name = "Firefox".to_string();
    settings.default_browser_path = "/usr/bin/firefox".to_string();
    ctx.router.save_settings(settings).unwrap();
    ctx
}

#[test]
fn test_export_then_import_reproduces_everything() {
    let source = populated();
    let file = source.dir.path().join("export.json");
    let summary = source.router.export_to(&file).unwrap();
    assert_eq!(summary.rule_count, 1);
    assert_eq!(summary.group_count, builtin_templates().len() + 1);
    assert_eq!(summary.built_in_group_count, builtin_templates().len());

    let target = TestContext::on_disk();
    let report = target.router.import_from(&file).unwrap();
    assert!(!report.sync.changed());

    assert_eq!(*target.router.rules().list(), *source.router.rules().list());
    assert_eq!(*target.router.groups().list(), *source.router.groups().list());
    assert_eq!(target.router.settings(), source.router.settings());

    let reopened = target.reopen();
    assert_eq!(reopened.find_match("https://wiki.corp.com").profile_name(), "Work");
}

#[test]
fn test_import_backs_up_current_data_first() {
    let source = populated();
    let file = source.dir.path().join("export.json");
    source.router.export_to(&file).unwrap();

    let target = TestContext::on_disk();
    target
        .router
        .add_rule(UrlRule::new("mine.net", firefox()), false)
        .unwrap();

    let report = target.router.import_from(&file).unwrap();
    assert!(report.backup_path.starts_with(target.paths().backups_dir()));

    let backup = read_bundle(&report.backup_path).unwrap();
    assert_eq!(backup.rules.len(), 1);
    assert_eq!(backup.rules[0].pattern, "mine.net");
    assert!(target.router.rules().find_by_pattern("mine.net").is_none());
}

#[test]
fn test_invalid_bundle_changes_nothing() {
    let source = populated();
    let file = source.dir.path().join("export.json");
    source.router.export_to(&file).unwrap();

    let mut bundle = read_bundle(&file).unwrap();
    bundle.format_version = BUNDLE_FORMAT_VERSION + 1;
    fs::write(&file, serde_json::to_string(&bundle).unwrap()).unwrap();

    let target = TestContext::on_disk();
    target
        .router
        .add_rule(UrlRule::new("mine.net", firefox()), false)
        .unwrap();

    assert!(matches!(target.router.import_from(&file), Err(RouteError::Bundle(_))));
    assert_eq!(target.router.rules().len(), 1);
    assert!(!target.paths().backups_dir().exists());
}

#[test]
fn test_bundle_with_bad_pattern_is_rejected() {
    let source = populated();
    let file = source.dir.path().join("export.json");
    source.router.export_to(&file).unwrap();

    let mut bundle = read_bundle(&file).unwrap();
    bundle.rules[0].pattern = "exa mple.org".to_string();
    fs::write(&file, serde_json::to_string(&bundle).unwrap()).unwrap();

    match validate_bundle_file(&file) {
        Err(RouteError::Bundle(message)) => assert!(message.contains("invalid character")),
        other => panic!("expected bundle error, got {other:?}"),
    }
}

#[test]
fn test_import_without_built_in_groups_recreates_them() {
    let source = TestContext::in_memory();
    source
        .router
        .add_rule(UrlRule::new("example.org", firefox()), false)
        .unwrap();
    let file = source.dir.path().join("export.json");
    source.router.export_to(&file).unwrap();

    let target = TestContext::on_disk();
    let report = target.router.import_from(&file).unwrap();

    assert_eq!(report.sync.created.len(), builtin_templates().len());
    assert_eq!(target.router.rules().len(), 1);
    assert_eq!(target.router.groups().len(), builtin_templates().len());
}

#[test]
fn test_imported_patterns_are_normalized() {
    let target = TestContext::on_disk();
    let file = target.dir.path().join("hand-written.json");
    let bundle = ExportBundle::new(
        AppSettings::default(),
        vec![UrlRule::new("HTTPS://www.Example.ORG/", firefox())],
        vec![group("Work", &[" *.Corp.COM "], chrome("Work"))],
    );
    export_to(&file, &bundle).unwrap();

    target.router.import_from(&file).unwrap();
    assert_eq!(target.router.rules().list()[0].pattern, "example.org");
    assert_eq!(
        target.router.groups().find_by_name("work").unwrap().url_patterns,
        vec!["*.corp.com"]
    );

    let checked = target.router.validator().validate_pattern("example.org", None);
    assert!(!checked.warnings.is_empty());
    assert!(matches!(
        target
            .router
            .add_rule(UrlRule::new("example.org", chrome("Other")), false),
        Err(RouteError::Conflict(_))
    ));
    assert_eq!(target.reopen().rules().list()[0].pattern, "example.org");
}

#[test]
fn test_failed_settings_save_restores_previous_data() {
    let source = populated();
    let file = source.dir.path().join("export.json");
    source.router.export_to(&file).unwrap();

    let target = TestContext::on_disk();
    target
        .router
        .add_rule(UrlRule::new("mine.net", firefox()), false)
        .unwrap();
    let rules_before = target.router.rules().list();
    let groups_before = target.router.groups().list();

    // A directory where the settings file should be makes the save fail.
    let settings_file = target.paths().settings_file();
    let _ = fs::remove_file(&settings_file);
    fs::create_dir(&settings_file).unwrap();

    assert!(target.router.import_from(&file).is_err());
    assert_eq!(target.router.rules().list(), rules_before);
    assert_eq!(target.router.groups().list(), groups_before);
    assert_eq!(target.router.settings(), AppSettings::default());

    let on_disk = RuleStore::new(YamlFile::new(target.paths().rules_file()));
    on_disk.load_from_persistence().unwrap();
    assert_eq!(on_disk.list(), rules_before);
}
