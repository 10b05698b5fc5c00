//! Three-way merge of a built-in template into a persisted group.
//!
//! Inputs are the current template, the template as it looked the last time
//! this install synced (the group's `template_snapshot`), and the patterns
//! currently persisted. The output never drops a user pattern and never
//! re-adds a pattern the user deleted.

use linkroute_config::{BuiltInTemplate, UrlGroup};

/// Result of merging one template's pattern list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternMerge {
    /// The group's new pattern list
    pub patterns: Vec<String>,
    /// Template patterns new since the previous snapshot, appended to `patterns`
    pub added: Vec<String>,
    /// Template patterns absent from `patterns` (deleted by the user)
    pub restorable: Vec<String>,
}

/// Merge pattern lists.
///
/// An empty `previous_snapshot` means the group predates snapshots; the
/// current template is taken as the previous one, so nothing is added.
pub fn merge_patterns(
    template: &[String],
    previous_snapshot: &[String],
    persisted: &[String],
) -> PatternMerge {
    let previous = if previous_snapshot.is_empty() {
        template
    } else {
        previous_snapshot
    };

    let mut patterns = persisted.to_vec();
    let mut added = Vec::new();
    for pattern in template {
        if !previous.contains(pattern) && !patterns.contains(pattern) {
            patterns.push(pattern.clone());
            added.push(pattern.clone());
        }
    }

    let restorable = template
        .iter()
        .filter(|p| !patterns.contains(p))
        .cloned()
        .collect();

    PatternMerge {
        patterns,
        added,
        restorable,
    }
}

/// What the synchronizer should do with one template
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// The group as it should be persisted
    pub group: UrlGroup,
    /// No group with the template id existed
    pub created: bool,
    /// Patterns appended to an existing group
    pub added: Vec<String>,
    /// Template patterns the user may restore
    pub restorable: Vec<String>,
    /// The stored snapshot differs from the current template
    pub snapshot_changed: bool,
}

impl MergeOutcome {
    pub fn changed(&self) -> bool {
        self.created || !self.added.is_empty() || self.snapshot_changed
    }
}

/// Reconcile one template with the group persisted under its id.
///
/// Returns `None` when that id belongs to a group that is not built-in;
/// such groups are never touched.
pub fn merge_template(
    template: &BuiltInTemplate,
    persisted: Option<&UrlGroup>,
) -> Option<MergeOutcome> {
    let Some(existing) = persisted else {
        return Some(MergeOutcome {
            group: template.instantiate(),
            created: true,
            added: template.patterns.clone(),
            restorable: Vec::new(),
            snapshot_changed: true,
        });
    };
    if !existing.is_built_in {
        return None;
    }

    let merge = merge_patterns(
        &template.patterns,
        &existing.template_snapshot,
        &existing.url_patterns,
    );
    let snapshot_changed = existing.template_snapshot != template.patterns;

    let mut group = existing.clone();
    group.url_patterns = merge.patterns;
    group.template_snapshot = template.patterns.clone();

    Some(MergeOutcome {
        group,
        created: false,
        added: merge.added,
        restorable: merge.restorable,
        snapshot_changed,
    })
}
