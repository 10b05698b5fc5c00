//! Resolver precedence, tie-breaking and determinism.

mod common;

use common::{TestContext, chrome, firefox, group};
use linkroute::config::UrlRule;
use linkroute::{MatchResult, MatchType, ProfileResolution, RouteError};

#[test]
fn test_empty_stores_never_match() {
    let ctx = TestContext::in_memory();
    assert_eq!(ctx.router.find_match("https://github.com"), MatchResult::NoMatch);
}

#[test]
fn test_malformed_input_is_no_match() {
    let ctx = TestContext::in_memory();
    ctx.router
        .add_rule(UrlRule::new("*.example.com", firefox()), false)
        .unwrap();

    for input in ["", "   ", "not a url at all", "http://", "mailto:someone@example.com", "::::"] {
        assert_eq!(ctx.router.find_match(input), MatchResult::NoMatch, "input {input:?}");
    }
}

#[test]
fn test_rules_outrank_more_specific_groups() {
    let ctx = TestContext::in_memory();
    ctx.router
        .add_rule(UrlRule::new("github.com", chrome("Personal")), false)
        .unwrap();
    ctx.router
        .add_group(group("Work", &["github.com/work-org"], chrome("Work")), false)
        .unwrap();

    let result = ctx.router.find_match("https://github.com/work-org/repo");
    assert_eq!(result.match_type(), MatchType::IndividualRule);
    assert_eq!(result.profile_name(), "Personal");
}

#[test]
fn test_exact_host_beats_wildcard_regardless_of_order() {
    let ctx = TestContext::in_memory();
    ctx.router
        .add_rule(UrlRule::new("*.example.com", chrome("Wildcard")), false)
        .unwrap();
    ctx.router
        .add_rule(UrlRule::new("mail.example.com", chrome("Mail")), false)
        .unwrap();

    assert_eq!(ctx.router.find_match("https://mail.example.com/inbox").profile_name(), "Mail");
    assert_eq!(ctx.router.find_match("https://docs.example.com").profile_name(), "Wildcard");
    assert_eq!(ctx.router.find_match("https://example.com").profile_name(), "Wildcard");
    assert_eq!(ctx.router.find_match("https://a.b.example.com").profile_name(), "Wildcard");
    assert!(!ctx.router.find_match("https://notexample.com").is_match());
}

#[test]
fn test_path_pattern_beats_bare_host() {
    let ctx = TestContext::in_memory();
    ctx.router
        .add_rule(UrlRule::new("example.com", chrome("Site")), false)
        .unwrap();
    ctx.router
        .add_rule(UrlRule::new("example.com/docs", chrome("Docs")), false)
        .unwrap();

    assert_eq!(ctx.router.find_match("https://example.com/docs/intro").profile_name(), "Docs");
    assert_eq!(ctx.router.find_match("https://example.com/docs").profile_name(), "Docs");
    assert_eq!(ctx.router.find_match("https://example.com/docsearch").profile_name(), "Site");
}

#[test]
fn test_url_and_pattern_normalization() {
    let ctx = TestContext::in_memory();
    ctx.router
        .add_rule(UrlRule::new("  HTTPS://WWW.GitHub.com/ ", chrome("Dev")), false)
        .unwrap();

    assert_eq!(ctx.router.rules().list()[0].pattern, "github.com");
    for url in ["https://WWW.GITHUB.COM/", "github.com", "http://github.com:8080/x?q=1#top"] {
        assert_eq!(ctx.router.find_match(url).profile_name(), "Dev", "url {url:?}");
    }
}

#[test]
fn test_find_match_is_deterministic() {
    let ctx = TestContext::in_memory();
    ctx.router
        .add_group(group("A", &["*.shared.com"], chrome("A")), false)
        .unwrap();
    ctx.router
        .add_group(group("B", &["*.shared.com/app"], chrome("B")), true)
        .unwrap();

    let first = ctx.router.find_match("https://x.shared.com/app/page");
    for _ in 0..100 {
        assert_eq!(ctx.router.find_match("https://x.shared.com/app/page"), first);
    }
    assert_eq!(first.rule_or_group_name(), "B");
}

#[test]
fn test_group_tie_goes_to_earlier_group() {
    let ctx = TestContext::in_memory();
    ctx.router
        .add_group(group("First", &["*.corp.com"], chrome("First")), false)
        .unwrap();

    let second = group("Second", &["*.corp.com"], chrome("Second"));
    assert!(matches!(
        ctx.router.add_group(second.clone(), false),
        Err(RouteError::Conflict(_))
    ));
    ctx.router.add_group(second, true).unwrap();

    assert_eq!(ctx.router.find_match("https://wiki.corp.com").rule_or_group_name(), "First");
}

#[test]
fn test_group_override_routes_to_its_own_profile() {
    let ctx = TestContext::in_memory();
    let work = group("Work", &["*.corp.com"], chrome("Work")).pattern_override("admin.corp.com", firefox());
    let id = ctx.router.add_group(work, false).unwrap();

    match ctx.router.find_match("https://admin.corp.com/users") {
        MatchResult::GroupOverride { group, pattern, profile } => {
            assert_eq!(group.id, id);
            assert_eq!(pattern, "admin.corp.com");
            assert_eq!(profile, firefox());
        }
        other => panic!("expected override, got {other:?}"),
    }

    let plain = ctx.router.find_match("https://wiki.corp.com");
    assert_eq!(plain.match_type(), MatchType::UrlGroup);
    assert_eq!(plain.profile_name(), "Work");
}

#[test]
fn test_override_must_refine_a_group_pattern() {
    let ctx = TestContext::in_memory();
    let work = group("Work", &["*.corp.com"], chrome("Work")).pattern_override("other.com", firefox());
    assert!(matches!(ctx.router.add_group(work, true), Err(RouteError::Validation(_))));
    assert!(ctx.router.groups().is_empty());
}

#[test]
fn test_picker_group_requires_acknowledgement_and_lists_candidates() {
    let ctx = TestContext::in_memory();
    let picker = linkroute::config::UrlGroup::new("Socials")
        .url_patterns(["reddit.com"])
        .profiles(vec![chrome("A"), chrome("B")]);

    assert!(matches!(
        ctx.router.add_group(picker.clone(), false),
        Err(RouteError::Conflict(_))
    ));
    ctx.router.add_group(picker, true).unwrap();

    let result = ctx.router.find_match("https://reddit.com/r/rust");
    assert!(result.requires_picker());
    match &result {
        MatchResult::UrlGroup {
            profile: ProfileResolution::PickerRequired { candidates },
            ..
        } => assert_eq!(candidates.len(), 2),
        other => panic!("expected picker, got {other:?}"),
    }
    assert_eq!(result.resolve_non_interactive(), Some(&chrome("A")));
}

#[test]
fn test_built_in_groups_without_profiles_do_not_match() {
    let ctx = TestContext::on_disk();
    assert!(!ctx.router.groups().is_empty());
    assert_eq!(ctx.router.find_match("https://github.com"), MatchResult::NoMatch);
}

#[test]
fn test_rule_on_built_in_pattern_needs_acknowledgement() {
    let ctx = TestContext::on_disk();
    let rule = UrlRule::new("github.com", chrome("Dev"));

    match ctx.router.add_rule(rule.clone(), false) {
        Err(RouteError::Conflict(result)) => assert!(result.summary().contains("Developer Tools")),
        other => panic!("expected conflict, got {other:?}"),
    }
    ctx.router.add_rule(rule, true).unwrap();
    assert_eq!(ctx.router.find_match("https://github.com").profile_name(), "Dev");
}

#[test]
fn test_disable_clipboard_notifications_for_match() {
    let ctx = TestContext::in_memory();
    ctx.router
        .add_rule(UrlRule::new("github.com", chrome("Dev")), false)
        .unwrap();
    assert!(ctx.router.should_notify_clipboard("https://github.com").is_none());

    let mut settings = ctx.router.settings();
    settings.clipboard_monitoring.enabled = true;
    ctx.router.save_settings(settings).unwrap();

    assert!(ctx.router.should_notify_clipboard("https://github.com").is_some());
    let result = ctx.router.find_match("https://github.com");
    assert!(ctx.router.disable_clipboard_notifications(&result).unwrap());

    assert!(!ctx.router.find_match("https://github.com").clipboard_notifications_enabled());
    assert!(ctx.router.should_notify_clipboard("https://github.com").is_none());
    assert!(!ctx.router.disable_clipboard_notifications(&MatchResult::NoMatch).unwrap());
}
