//! Keeps built-in groups in sync with the templates shipped in this release.
//!
//! Runs once at startup, before any match is served. New template patterns
//! reach existing installs; patterns the user deleted are only offered for
//! restore; custom groups are never touched.

pub mod merge;

use std::sync::Arc;

use linkroute_config::{BuiltInTemplate, UrlGroup, builtin_templates};

use crate::error::RouteError;
use crate::store::GroupStore;
use crate::validation::{EntityRef, ValidationService};
pub use merge::{MergeOutcome, PatternMerge, merge_patterns, merge_template};

/// A template pattern left out because something else already owns it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPattern {
    pub group: String,
    pub pattern: String,
    pub owner: String,
}

/// What one synchronization pass changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Names of built-in groups created from scratch
    pub created: Vec<String>,
    /// Names of existing built-in groups that were modified
    pub updated: Vec<String>,
    /// Total patterns appended to existing groups
    pub patterns_added: usize,
    /// Template patterns not added due to a conflict
    pub skipped: Vec<SkippedPattern>,
}

impl SyncReport {
    pub fn changed(&self) -> bool {
        !self.created.is_empty() || !self.updated.is_empty()
    }
}

/// Template patterns missing from a built-in group (user deletions)
pub fn restorable_patterns(group: &UrlGroup) -> Vec<String> {
    if !group.is_built_in {
        return Vec::new();
    }
    group
        .template_snapshot
        .iter()
        .filter(|p| !group.url_patterns.contains(p))
        .cloned()
        .collect()
}

/// Number of patterns a "restore defaults" action would bring back
pub fn restorable_count(group: &UrlGroup) -> usize {
    restorable_patterns(group).len()
}

/// Reconciles built-in templates with the group store
pub struct TemplateSynchronizer {
    groups: Arc<GroupStore>,
    validator: ValidationService,
    templates: Vec<BuiltInTemplate>,
}

impl TemplateSynchronizer {
    /// Synchronize against the templates shipped with this release
    pub fn new(groups: Arc<GroupStore>, validator: ValidationService) -> Self {
        Self::with_templates(groups, validator, builtin_templates())
    }

    /// Synchronize against an explicit template set
    pub fn with_templates(
        groups: Arc<GroupStore>,
        validator: ValidationService,
        templates: Vec<BuiltInTemplate>,
    ) -> Self {
        Self {
            groups,
            validator,
            templates,
        }
    }

    pub fn templates(&self) -> &[BuiltInTemplate] {
        &self.templates
    }

    /// Create missing built-in groups and merge template changes into the
    /// existing ones. Persists once, and only if something changed, so a
    /// second call right after the first is a no-op.
    pub fn ensure_built_in_groups_exist(&self) -> Result<SyncReport, RouteError> {
        let mut next: Vec<UrlGroup> = self.groups.list().to_vec();
        let mut report = SyncReport::default();

        for template in &self.templates {
            let index = next.iter().position(|g| g.id == template.id);
            let Some(mut outcome) = merge_template(template, index.map(|i| &next[i])) else {
                log::warn!(
                    "Group id {} of template '{}' belongs to a custom group, leaving it alone",
                    template.id,
                    template.name
                );
                continue;
            };

            let (kept, conflicting): (Vec<String>, Vec<String>) = outcome
                .added
                .iter()
                .cloned()
                .partition(|p| self.owner_of(p, template, &next).is_none());
            for pattern in conflicting {
                let owner = self.owner_of(&pattern, template, &next).unwrap_or_default();
                log::warn!(
                    "Template pattern '{}' of '{}' is already used by {}, skipping",
                    pattern,
                    outcome.group.name,
                    owner
                );
                outcome.group.url_patterns.retain(|p| *p != pattern);
                report.skipped.push(SkippedPattern {
                    group: outcome.group.name.clone(),
                    pattern,
                    owner,
                });
            }
            outcome.added = kept;

            crate::debug_log!(
                "TEMPLATE",
                "'{}': created={} added={:?} restorable={:?}",
                template.name,
                outcome.created,
                outcome.added,
                outcome.restorable
            );

            match index {
                None => {
                    report.created.push(outcome.group.name.clone());
                    next.push(outcome.group);
                }
                Some(i) if outcome.changed() => {
                    report.patterns_added += outcome.added.len();
                    report.updated.push(outcome.group.name.clone());
                    next[i] = outcome.group;
                }
                Some(_) => {}
            }
        }

        if report.changed() {
            self.groups.replace_all(next)?;
            log::info!(
                "Template sync: {} groups created, {} updated, {} patterns added, {} skipped",
                report.created.len(),
                report.updated.len(),
                report.patterns_added,
                report.skipped.len()
            );
        } else {
            crate::debug_info!("TEMPLATE", "Built-in groups already in sync");
        }
        Ok(report)
    }

    /// Who, other than the template's own group, owns `pattern`
    fn owner_of(&self, pattern: &str, template: &BuiltInTemplate, pending: &[UrlGroup]) -> Option<String> {
        if let Some(owner) = self
            .validator
            .find_owner(pattern, Some(EntityRef::Group(template.id)))
        {
            return Some(owner.to_string());
        }
        pending
            .iter()
            .find(|g| g.id != template.id && g.owns_pattern(pattern))
            .map(|g| format!("group '{}'", g.name))
    }
}
