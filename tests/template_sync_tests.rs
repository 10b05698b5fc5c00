//! Built-in template synchronization across restarts.

mod common;

use std::fs;

use common::{TestContext, chrome};
use linkroute::config::UrlRule;
use linkroute::config::templates::DEVELOPER_TOOLS_ID;
use linkroute::config::{backup_path_for, builtin_templates};
use linkroute::templates::restorable_count;

#[test]
fn test_first_start_creates_built_in_groups_on_disk() {
    let ctx = TestContext::on_disk();
    let groups = ctx.router.groups().list();

    assert_eq!(groups.len(), builtin_templates().len());
    assert!(groups.iter().all(|g| g.is_built_in));
    assert!(ctx.paths().groups_file().exists());
}

#[test]
fn test_restart_does_not_rewrite_groups() {
    let ctx = TestContext::on_disk();
    let before = fs::read_to_string(ctx.paths().groups_file()).unwrap();

    let reopened = ctx.reopen();
    let report = reopened.ensure_built_in_groups_exist().unwrap();

    assert!(!report.changed());
    assert_eq!(fs::read_to_string(ctx.paths().groups_file()).unwrap(), before);
    // Only the first start ever saved, so no backup copy exists.
    assert!(!backup_path_for(&ctx.paths().groups_file()).exists());
}

#[test]
fn test_deleted_built_in_group_comes_back_on_restart() {
    let ctx = TestContext::on_disk();
    let removed = ctx.router.delete_group(&DEVELOPER_TOOLS_ID).unwrap();
    assert!(removed.is_built_in);
    assert!(ctx.router.groups().get(&DEVELOPER_TOOLS_ID).is_none());

    let reopened = ctx.reopen();
    let restored = reopened.groups().get(&DEVELOPER_TOOLS_ID).unwrap();
    assert_eq!(restored.url_patterns, removed.template_snapshot);
}

#[test]
fn test_removed_template_pattern_stays_removed_until_restored() {
    let ctx = TestContext::on_disk();
    ctx.router
        .groups()
        .remove_pattern(&DEVELOPER_TOOLS_ID, "gitlab.com")
        .unwrap();

    let reopened = ctx.reopen();
    let group = reopened.groups().get(&DEVELOPER_TOOLS_ID).unwrap();
    assert!(!group.url_patterns.iter().any(|p| p == "gitlab.com"));
    assert_eq!(restorable_count(&group), 1);

    let restored = reopened.restore_template_patterns(&DEVELOPER_TOOLS_ID).unwrap();
    assert_eq!(restored, vec!["gitlab.com"]);
    let group = reopened.groups().get(&DEVELOPER_TOOLS_ID).unwrap();
    assert_eq!(restorable_count(&group), 0);
    assert_eq!(group.url_patterns.last().map(String::as_str), Some("gitlab.com"));
}

#[test]
fn test_restore_skips_patterns_now_owned_by_a_rule() {
    let ctx = TestContext::on_disk();
    let groups = ctx.router.groups();
    groups.remove_pattern(&DEVELOPER_TOOLS_ID, "gitlab.com").unwrap();
    groups.remove_pattern(&DEVELOPER_TOOLS_ID, "crates.io").unwrap();
    ctx.router
        .add_rule(UrlRule::new("crates.io", chrome("Rust")), false)
        .unwrap();

    let restored = ctx.router.restore_template_patterns(&DEVELOPER_TOOLS_ID).unwrap();
    assert_eq!(restored, vec!["gitlab.com"]);
    assert_eq!(ctx.router.find_match("https://crates.io").profile_name(), "Rust");
}

#[test]
fn test_existing_rule_blocks_template_pattern_on_first_sync() {
    let ctx = TestContext::in_memory();
    ctx.router
        .add_rule(UrlRule::new("github.com", chrome("Personal")), false)
        .unwrap();

    let report = ctx.router.ensure_built_in_groups_exist().unwrap();
    assert_eq!(report.created.len(), builtin_templates().len());
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].pattern, "github.com");

    let developer = ctx.router.groups().get(&DEVELOPER_TOOLS_ID).unwrap();
    assert!(!developer.url_patterns.iter().any(|p| p == "github.com"));
    assert_eq!(ctx.router.find_match("https://github.com").profile_name(), "Personal");

    assert!(!ctx.router.ensure_built_in_groups_exist().unwrap().changed());
}
