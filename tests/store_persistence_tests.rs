//! Rule/group persistence: round trips, rollback and corrupt-file handling.

mod common;

use std::fs;
use std::sync::Arc;

use common::{TestContext, chrome, firefox, group};
use linkroute::config::{AppSettings, ConfigPaths, GroupBehavior, UrlGroup, UrlRule};
use linkroute::store::{GroupStore, MemoryPersistence, RuleStore};
use linkroute::{EntityKind, LinkRouter, MatchType, RouteError, StoreError};
use uuid::Uuid;

#[test]
fn test_rules_survive_a_restart() {
    let ctx = TestContext::on_disk();
    let id = ctx
        .router
        .add_rule(UrlRule::new("Example.org/Docs/", chrome("Docs")), false)
        .unwrap();

    let reopened = ctx.reopen();
    let rule = reopened.rules().get(&id).unwrap();
    assert_eq!(rule.pattern, "example.org/docs");
    assert_eq!(rule.profile, chrome("Docs"));
    assert!(rule.created_at.is_some());
    assert_eq!(reopened.find_match("https://example.org/docs/x").profile_name(), "Docs");
}

#[test]
fn test_update_keeps_position_and_created_at() {
    let ctx = TestContext::in_memory();
    let first = ctx.router.add_rule(UrlRule::new("a.com", chrome("A")), false).unwrap();
    ctx.router.add_rule(UrlRule::new("b.com", chrome("B")), false).unwrap();
    let created_at = ctx.router.rules().get(&first).unwrap().created_at;

    let mut edited = UrlRule::with_id(first, "c.com", firefox());
    edited.created_at = None;
    ctx.router.update_rule(edited, false).unwrap();

    let rules = ctx.router.rules().list();
    assert_eq!(rules[0].id, first);
    assert_eq!(rules[0].pattern, "c.com");
    assert_eq!(rules[0].created_at, created_at);
}

#[test]
fn test_unknown_ids_are_not_found() {
    let ctx = TestContext::in_memory();
    let missing = Uuid::new_v4();

    assert!(matches!(
        ctx.router.delete_rule(&missing),
        Err(RouteError::NotFound { kind: EntityKind::Rule, .. })
    ));
    assert!(matches!(
        ctx.router.update_group(group("Nope", &["x.com"], firefox()), false),
        Err(RouteError::NotFound { kind: EntityKind::Group, .. })
    ));
}

#[test]
fn test_failed_save_rolls_back_memory() {
    let persistence = Arc::new(MemoryPersistence::<UrlRule>::new());
    let store = RuleStore::new(Arc::clone(&persistence));
    store.add(UrlRule::new("a.com", firefox())).unwrap();

    persistence.set_fail_saves(true);
    let result = store.add(UrlRule::new("b.com", firefox()));

    assert!(matches!(result, Err(RouteError::Persistence(_))));
    assert_eq!(store.len(), 1);
    assert_eq!(persistence.persisted().len(), 1);
}

#[test]
fn test_empty_rules_file_is_corrupt_not_empty() {
    let dir = tempfile::tempdir().unwrap();
    let paths = ConfigPaths::new(dir.path());
    fs::write(paths.rules_file(), "   \n").unwrap();

    assert!(matches!(
        LinkRouter::open(paths),
        Err(RouteError::Persistence(StoreError::Corrupt { .. }))
    ));
}

#[test]
fn test_duplicate_ids_in_file_are_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let paths = ConfigPaths::new(dir.path());
    let id = Uuid::new_v4();
    let rules = vec![
        UrlRule::with_id(id, "a.com", firefox()),
        UrlRule::with_id(id, "b.com", firefox()),
    ];
    fs::write(paths.rules_file(), serde_yaml_ng::to_string(&rules).unwrap()).unwrap();

    assert!(matches!(
        LinkRouter::open(paths),
        Err(RouteError::Persistence(StoreError::Corrupt { .. }))
    ));
}

#[test]
fn test_corrupt_file_falls_back_to_backup() {
    let ctx = TestContext::on_disk();
    let kept = ctx.router.add_rule(UrlRule::new("a.com", firefox()), false).unwrap();
    // The second save copies the first version to rules.yaml.bak.
    ctx.router.add_rule(UrlRule::new("b.com", firefox()), false).unwrap();
    fs::write(ctx.paths().rules_file(), "- {{ not: [valid").unwrap();

    let reopened = ctx.reopen();
    let rules = reopened.rules().list();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].id, kept);
}

#[test]
fn test_backup_fallback_can_be_disabled() {
    let ctx = TestContext::on_disk();
    let mut settings = ctx.router.settings();
    settings.use_backup_on_load_failure = false;
    ctx.router.save_settings(settings).unwrap();

    ctx.router.add_rule(UrlRule::new("a.com", firefox()), false).unwrap();
    ctx.router.add_rule(UrlRule::new("b.com", firefox()), false).unwrap();
    fs::write(ctx.paths().rules_file(), "garbage: [").unwrap();

    assert!(matches!(
        LinkRouter::open(ctx.paths()),
        Err(RouteError::Persistence(StoreError::Corrupt { .. }))
    ));
}

#[test]
fn test_corrupt_file_without_backup_is_an_error() {
    let ctx = TestContext::on_disk();
    ctx.router.add_rule(UrlRule::new("a.com", firefox()), false).unwrap();
    fs::write(ctx.paths().rules_file(), "garbage: [").unwrap();

    assert!(matches!(
        LinkRouter::open(ctx.paths()),
        Err(RouteError::Persistence(StoreError::Corrupt { .. }))
    ));
}

#[test]
fn test_built_in_flag_cannot_be_edited_away() {
    let ctx = TestContext::on_disk();
    let mut developer = ctx.router.groups().find_by_name("developer tools").unwrap();
    developer.is_built_in = false;
    developer.template_snapshot.clear();
    developer = developer.profiles(vec![chrome("Dev")]);
    ctx.router.update_group(developer.clone(), false).unwrap();

    let stored = ctx.reopen().groups().get(&developer.id).unwrap();
    assert!(stored.is_built_in);
    assert!(!stored.template_snapshot.is_empty());
    assert_eq!(stored.default_profile(), Some(chrome("Dev")));
}

#[test]
fn test_group_names_are_unique_ignoring_case() {
    let ctx = TestContext::in_memory();
    ctx.router.add_group(group("Work", &["a.com"], firefox()), false).unwrap();

    match ctx.router.add_group(group("  work ", &["b.com"], firefox()), true) {
        Err(RouteError::Validation(result)) => assert!(!result.is_valid()),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn test_every_group_field_survives_a_restart() {
    let ctx = TestContext::on_disk();
    let work = UrlGroup::new("Work")
        .description("Company services")
        .url_patterns(["*.google.com", "corp.example.com"])
        .profiles(vec![chrome("Work"), chrome("Personal")])
        .pattern_override("mail.google.com", firefox())
        .clipboard_notifications(false);
    let id = ctx.router.add_group(work, true).unwrap();
    let saved = ctx.router.groups().get(&id).unwrap();

    let stored = ctx.reopen().groups().get(&id).unwrap();
    assert_eq!(stored, saved);
    assert_eq!(stored.description, "Company services");
    assert_eq!(stored.url_patterns, vec!["*.google.com", "corp.example.com"]);
    assert_eq!(stored.profiles, vec![chrome("Work"), chrome("Personal")]);
    assert_eq!(stored.behavior, GroupBehavior::ShowProfilePicker);
    assert_eq!(stored.override_for("mail.google.com").unwrap().profile, firefox());
    assert!(!stored.clipboard_notifications_enabled);
    assert_eq!(stored.default_profile_name, "Work");
}

#[test]
fn test_group_update_without_profiles_is_rejected() {
    let ctx = TestContext::in_memory();
    let id = ctx
        .router
        .add_group(group("Work", &["corp.com"], chrome("Old")), false)
        .unwrap();

    let mut edited = ctx.router.groups().get(&id).unwrap();
    edited.profiles.clear();
    assert!(matches!(
        ctx.router.update_group(edited.clone(), true),
        Err(RouteError::Validation(_))
    ));
    assert_eq!(ctx.router.find_match("https://corp.com").profile_name(), "Old");

    // Straight to the store, bypassing validation: the mirror fields go too.
    ctx.router.groups().update(edited).unwrap();
    let stored = ctx.router.groups().get(&id).unwrap();
    assert!(stored.default_profile_name.is_empty());
    assert!(stored.effective_profiles().is_empty());
    assert!(!ctx.router.find_match("https://corp.com").is_match());
}

#[test]
fn test_move_pattern_to_rule() {
    let ctx = TestContext::in_memory();
    let id = ctx
        .router
        .add_group(group("Work", &["corp.com", "docs.example.com"], chrome("Work")), false)
        .unwrap();

    let rule_id = ctx
        .router
        .move_pattern_to_rule(&id, "Docs.Example.com", firefox())
        .unwrap();

    assert_eq!(ctx.router.groups().get(&id).unwrap().url_patterns, vec!["corp.com"]);
    assert_eq!(ctx.router.rules().get(&rule_id).unwrap().pattern, "docs.example.com");
    let result = ctx.router.find_match("https://docs.example.com/guide");
    assert_eq!(result.match_type(), MatchType::IndividualRule);
    assert_eq!(result.browser_name(), "Firefox");

    assert!(matches!(
        ctx.router.move_pattern_to_rule(&id, "elsewhere.com", firefox()),
        Err(RouteError::Validation(_))
    ));
    assert_eq!(ctx.router.rules().len(), 1);
}

#[test]
fn test_move_pattern_to_rule_restores_group_when_rule_save_fails() {
    let dir = tempfile::tempdir().unwrap();
    let rule_memory = Arc::new(MemoryPersistence::<UrlRule>::new());
    let router = LinkRouter::from_parts(
        ConfigPaths::new(dir.path()),
        Arc::new(RuleStore::new(Arc::clone(&rule_memory))),
        Arc::new(GroupStore::new(MemoryPersistence::new())),
        AppSettings::default(),
    );
    let google = UrlGroup::new("Google")
        .url_patterns(["*.google.com", "google.example.com"])
        .profiles(vec![chrome("Personal")])
        .pattern_override("mail.google.com", chrome("Work"));
    let id = router.add_group(google, false).unwrap();
    let before = router.groups().get(&id).unwrap();

    rule_memory.set_fail_saves(true);
    assert!(matches!(
        router.move_pattern_to_rule(&id, "*.google.com", firefox()),
        Err(RouteError::Persistence(StoreError::Simulated))
    ));

    assert_eq!(router.groups().get(&id).unwrap(), before);
    assert!(router.rules().is_empty());
    assert_eq!(router.find_match("https://mail.google.com").profile_name(), "Work");
}
