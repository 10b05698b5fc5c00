//! URL to browser-profile resolution.
//!
//! Resolution order:
//! 1. Rules. The most specific matching rule wins; rules always outrank
//!    groups regardless of specificity.
//! 2. Group patterns and group overrides, ranked together by specificity,
//!    then by group order in the store, then by pattern order in the group.
//! 3. `NoMatch`.

mod result;

use std::sync::Arc;

use linkroute_config::{GroupBehavior, UrlGroup};

use crate::pattern::{NormalizedUrl, Specificity, matches_normalized, normalize_url, specificity};
use crate::store::{GroupStore, RuleStore};
pub use result::{LaunchPlan, MatchResult, MatchType, ProfileResolution};

/// The winning group candidate while scanning
struct GroupHit<'a> {
    group: &'a UrlGroup,
    pattern: &'a str,
    override_index: Option<usize>,
    rank: Specificity,
}

/// Resolves URLs against snapshots of the rule and group stores
#[derive(Clone)]
pub struct MatchResolver {
    rules: Arc<RuleStore>,
    groups: Arc<GroupStore>,
}

impl MatchResolver {
    pub fn new(rules: Arc<RuleStore>, groups: Arc<GroupStore>) -> Self {
        Self { rules, groups }
    }

    /// Find the routing decision for `url`.
    ///
    /// Total and deterministic: malformed input yields `NoMatch`.
    pub fn find_match(&self, url: &str) -> MatchResult {
        let normalized = normalize_url(url);
        if normalized.is_empty() {
            crate::debug_log!("MATCH", "{:?} has no matchable host", url);
            return MatchResult::NoMatch;
        }

        if let Some(result) = self.match_rules(&normalized) {
            return result;
        }
        if let Some(result) = self.match_groups(&normalized) {
            return result;
        }

        crate::debug_log!("MATCH", "{:?} matched nothing", url);
        MatchResult::NoMatch
    }

    fn match_rules(&self, url: &NormalizedUrl) -> Option<MatchResult> {
        let rules = self.rules.list();
        let mut best: Option<(Specificity, usize)> = None;

        for (index, rule) in rules.iter().enumerate() {
            if !matches_normalized(&rule.pattern, url) {
                continue;
            }
            let rank = specificity(&rule.pattern);
            crate::debug_trace!("MATCH", "rule '{}' matches with {:?}", rule.pattern, rank);
            // Strictly greater only: earlier rules win ties.
            if best.is_none_or(|(best_rank, _)| rank > best_rank) {
                best = Some((rank, index));
            }
        }

        let (_, index) = best?;
        let rule = rules[index].clone();
        crate::debug_log!("MATCH", "{}{} -> rule '{}'", url.host, url.path, rule.pattern);
        Some(MatchResult::IndividualRule { rule })
    }

    fn match_groups(&self, url: &NormalizedUrl) -> Option<MatchResult> {
        let groups = self.groups.list();
        let mut best: Option<GroupHit<'_>> = None;

        for group in groups.iter() {
            let has_profile = !group.effective_profiles().is_empty();

            let own = group
                .url_patterns
                .iter()
                .filter(|_| has_profile)
                .map(|p| (p.as_str(), None));
            let overrides = group
                .pattern_overrides
                .iter()
                .enumerate()
                .filter(|(_, o)| !o.profile.is_empty())
                .map(|(i, o)| (o.pattern.as_str(), Some(i)));

            for (pattern, override_index) in own.chain(overrides) {
                if !matches_normalized(pattern, url) {
                    continue;
                }
                let rank = specificity(pattern);
                crate::debug_trace!(
                    "MATCH",
                    "group '{}' pattern '{}' matches with {:?}",
                    group.name,
                    pattern,
                    rank
                );
                if best.as_ref().is_none_or(|hit| rank > hit.rank) {
                    best = Some(GroupHit {
                        group,
                        pattern,
                        override_index,
                        rank,
                    });
                }
            }
        }

        let hit = best?;
        crate::debug_log!(
            "MATCH",
            "{}{} -> group '{}' via '{}'",
            url.host,
            url.path,
            hit.group.name,
            hit.pattern
        );
        Self::group_result(&hit)
    }

    fn group_result(hit: &GroupHit<'_>) -> Option<MatchResult> {
        let group = hit.group;
        let profiles = group.effective_profiles();

        if let Some(index) = hit.override_index {
            let profile = group.pattern_overrides[index].profile.clone();
            if profiles.first() != Some(&profile) {
                return Some(MatchResult::GroupOverride {
                    group: group.clone(),
                    pattern: hit.pattern.to_string(),
                    profile,
                });
            }
        }

        let profile = if profiles.len() > 1 && group.behavior == GroupBehavior::ShowProfilePicker {
            ProfileResolution::PickerRequired {
                candidates: profiles,
            }
        } else {
            ProfileResolution::Resolved(profiles.into_iter().next()?)
        };
        Some(MatchResult::UrlGroup {
            group: group.clone(),
            pattern: hit.pattern.to_string(),
            profile,
        })
    }
}
