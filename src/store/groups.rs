use std::collections::HashSet;

use linkroute_config::{BrowserProfile, GroupId, UrlGroup};

use super::GroupStore;
use crate::error::{EntityKind, RouteError};
use crate::pattern::{normalize_pattern, refines};
use crate::templates;
use crate::validation::{EntityRef, IssueCode, ValidationResult, ValidationService, WarningPolicy};

/// Normalize names and patterns, drop duplicates, re-derive behavior and the
/// legacy single-profile fields.
pub(super) fn canonicalize_group(group: &mut UrlGroup) {
    group.name = group.name.trim().to_string();

    let mut seen = HashSet::new();
    group.url_patterns = group
        .url_patterns
        .iter()
        .map(|p| normalize_pattern(p))
        .filter(|p| !p.is_empty() && seen.insert(p.clone()))
        .collect();

    let mut seen_overrides = HashSet::new();
    let mut overrides = std::mem::take(&mut group.pattern_overrides);
    for o in &mut overrides {
        o.pattern = normalize_pattern(&o.pattern);
    }
    overrides.retain(|o| {
        !o.pattern.is_empty()
            && !group.url_patterns.contains(&o.pattern)
            && seen_overrides.insert(o.pattern.clone())
    });
    group.pattern_overrides = overrides;

    group.normalize_behavior();
    group.sync_legacy_fields();
}

impl GroupStore {
    /// Find the group holding this normalized pattern (as a pattern or override)
    pub fn find_by_pattern(&self, pattern: &str) -> Option<UrlGroup> {
        self.list().iter().find(|g| g.owns_pattern(pattern)).cloned()
    }

    /// Find a group by name, ignoring case
    pub fn find_by_name(&self, name: &str) -> Option<UrlGroup> {
        let name = name.trim().to_lowercase();
        self.list()
            .iter()
            .find(|g| g.name.to_lowercase() == name)
            .cloned()
    }

    /// Add one pattern to a group.
    ///
    /// Any conflict warning blocks: a pattern owned elsewhere is never added
    /// this way. Returns the normalized pattern that was stored.
    pub fn add_pattern(
        &self,
        group_id: &GroupId,
        pattern: &str,
        validator: &ValidationService,
    ) -> Result<String, RouteError> {
        let group = self
            .get(group_id)
            .ok_or_else(|| RouteError::not_found(EntityKind::Group, *group_id))?;

        let mut result = validator.validate_pattern(pattern, Some(EntityRef::Group(*group_id)));
        if let Some(normalized) = result.normalized_value.clone()
            && group.owns_pattern(&normalized)
        {
            result.error(
                IssueCode::DuplicateInGroup,
                format!("'{normalized}' is already in group '{}'", group.name),
            );
        }
        let normalized = result.into_outcome(WarningPolicy::Block)?;

        // Re-checked under the write lock: another writer may have added it.
        self.modify(group_id, |g| {
            if g.owns_pattern(&normalized) {
                let mut duplicate = ValidationResult::default();
                duplicate.error(
                    IssueCode::DuplicateInGroup,
                    format!("'{normalized}' is already in group '{}'", g.name),
                );
                return Err(RouteError::Validation(duplicate));
            }
            g.url_patterns.push(normalized.clone());
            Ok(())
        })?;
        log::info!("Added pattern '{}' to group '{}'", normalized, group.name);
        Ok(normalized)
    }

    /// Remove a pattern from a group, together with any override it no
    /// longer covers. Returns whether the pattern was present.
    pub fn remove_pattern(&self, group_id: &GroupId, pattern: &str) -> Result<bool, RouteError> {
        let normalized = normalize_pattern(pattern);
        self.modify(group_id, |g| {
            let before = g.url_patterns.len() + g.pattern_overrides.len();
            g.url_patterns.retain(|p| *p != normalized);
            g.pattern_overrides.retain(|o| o.pattern != normalized);
            let patterns = &g.url_patterns;
            g.pattern_overrides
                .retain(|o| patterns.iter().any(|p| refines(&o.pattern, p)));
            Ok(before != g.url_patterns.len() + g.pattern_overrides.len())
        })
    }

    /// Route one narrower pattern of a group to a different profile
    pub fn set_pattern_override(
        &self,
        group_id: &GroupId,
        pattern: &str,
        profile: BrowserProfile,
        validator: &ValidationService,
    ) -> Result<String, RouteError> {
        let group = self
            .get(group_id)
            .ok_or_else(|| RouteError::not_found(EntityKind::Group, *group_id))?;
        let normalized = validator
            .validate_override(&group, pattern, &profile)
            .into_outcome(WarningPolicy::Block)?;

        self.modify(group_id, |g| {
            match g.pattern_overrides.iter_mut().find(|o| o.pattern == normalized) {
                Some(existing) => existing.profile = profile,
                None => g.pattern_overrides.push(linkroute_config::PatternOverride {
                    pattern: normalized.clone(),
                    profile,
                }),
            }
            Ok(())
        })?;
        Ok(normalized)
    }

    /// Drop the override for a pattern. Returns whether one existed.
    pub fn remove_pattern_override(
        &self,
        group_id: &GroupId,
        pattern: &str,
    ) -> Result<bool, RouteError> {
        let normalized = normalize_pattern(pattern);
        self.modify(group_id, |g| {
            let before = g.pattern_overrides.len();
            g.pattern_overrides.retain(|o| o.pattern != normalized);
            Ok(before != g.pattern_overrides.len())
        })
    }

    /// Template patterns the user removed from a built-in group
    pub fn restorable_patterns(&self, group_id: &GroupId) -> Result<Vec<String>, RouteError> {
        let group = self
            .get(group_id)
            .ok_or_else(|| RouteError::not_found(EntityKind::Group, *group_id))?;
        Ok(templates::restorable_patterns(&group))
    }

    /// Re-add every restorable template pattern not owned by anything else.
    ///
    /// Returns the patterns that were restored.
    pub fn restore_template_patterns(
        &self,
        group_id: &GroupId,
        validator: &ValidationService,
    ) -> Result<Vec<String>, RouteError> {
        let restorable = self.restorable_patterns(group_id)?;
        let restored: Vec<String> = restorable
            .into_iter()
            .filter(|p| match validator.find_owner(p, Some(EntityRef::Group(*group_id))) {
                Some(owner) => {
                    log::warn!("Not restoring '{}': already used by {}", p, owner);
                    false
                }
                None => true,
            })
            .collect();
        if restored.is_empty() {
            return Ok(restored);
        }

        self.modify(group_id, |g| {
            for pattern in &restored {
                if !g.owns_pattern(pattern) {
                    g.url_patterns.push(pattern.clone());
                }
            }
            Ok(())
        })?;
        log::info!("Restored {} template patterns", restored.len());
        Ok(restored)
    }

    /// Toggle clipboard notifications for one group
    pub fn set_clipboard_notifications(
        &self,
        id: &GroupId,
        enabled: bool,
    ) -> Result<(), RouteError> {
        self.modify(id, |group| {
            group.clipboard_notifications_enabled = enabled;
            Ok(())
        })
    }
}
