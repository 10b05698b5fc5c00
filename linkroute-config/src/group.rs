//! URL groups: many patterns sharing one routing behavior.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::browser::BrowserProfile;

/// Unique identifier for a group
pub type GroupId = Uuid;

/// How a matched group picks its launch target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBehavior {
    /// Open with the group's single (first) profile
    #[default]
    UseDefault,
    /// Let the caller choose among the group's profiles
    ShowProfilePicker,
}

impl GroupBehavior {
    /// Returns all variants of `GroupBehavior`
    pub fn variants() -> &'static [GroupBehavior] {
        &[GroupBehavior::UseDefault, GroupBehavior::ShowProfilePicker]
    }

    /// Returns a human-readable display name for this variant
    pub fn display_name(&self) -> &'static str {
        match self {
            GroupBehavior::UseDefault => "Use Default",
            GroupBehavior::ShowProfilePicker => "Show Profile Picker",
        }
    }
}

/// A group-scoped exception routing one narrower pattern to another profile.
///
/// The override pattern is a strict refinement of one of the group's own
/// patterns, e.g. `mail.google.com` inside a group holding `*.google.com`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternOverride {
    /// Normalized pattern the override applies to
    pub pattern: String,

    /// Launch target used instead of the group default
    pub profile: BrowserProfile,
}

/// A named bundle of URL patterns routed to one or more browser profiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlGroup {
    /// Unique identifier (fixed for built-in groups, random otherwise)
    pub id: GroupId,

    /// Display name, unique among groups (case-insensitive)
    pub name: String,

    /// Free-form description shown in settings
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Shipped with the product; its patterns are kept in sync with the template
    #[serde(default)]
    pub is_built_in: bool,

    /// Ordered, duplicate-free list of normalized patterns
    #[serde(default)]
    pub url_patterns: Vec<String>,

    /// Launch targets; more than one forces `ShowProfilePicker`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profiles: Vec<BrowserProfile>,

    /// How a match on this group picks its profile
    #[serde(default)]
    pub behavior: GroupBehavior,

    /// Per-pattern exceptions routed to a different profile
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pattern_overrides: Vec<PatternOverride>,

    /// Whether the clipboard watcher should offer this group
    #[serde(default = "crate::defaults::bool_true")]
    pub clipboard_notifications_enabled: bool,

    /// Template patterns as last seen by the synchronizer (built-in groups only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub template_snapshot: Vec<String>,

    // Legacy single-profile fields, mirrored from `profiles[0]` so older
    // readers of the groups file keep working.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default_browser_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default_browser_path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default_browser_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default_profile_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default_profile_path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default_profile_arguments: String,
}

impl UrlGroup {
    /// Create a new custom group with a fresh id
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name)
    }

    /// Create a group with a specific ID (for built-in templates and tests)
    pub fn with_id(id: GroupId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            is_built_in: false,
            url_patterns: Vec::new(),
            profiles: Vec::new(),
            behavior: GroupBehavior::UseDefault,
            pattern_overrides: Vec::new(),
            clipboard_notifications_enabled: true,
            template_snapshot: Vec::new(),
            default_browser_name: String::new(),
            default_browser_path: String::new(),
            default_browser_type: String::new(),
            default_profile_name: String::new(),
            default_profile_path: String::new(),
            default_profile_arguments: String::new(),
        }
    }

    /// Builder method to set the description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder method to set the URL patterns
    pub fn url_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.url_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method to set the profiles; behavior and legacy fields follow
    pub fn profiles(mut self, profiles: Vec<BrowserProfile>) -> Self {
        self.profiles = profiles;
        self.normalize_behavior();
        self.sync_legacy_fields();
        self
    }

    /// Builder method to add a per-pattern override
    pub fn pattern_override(mut self, pattern: impl Into<String>, profile: BrowserProfile) -> Self {
        self.pattern_overrides.push(PatternOverride {
            pattern: pattern.into(),
            profile,
        });
        self
    }

    /// Builder method to toggle clipboard notifications
    pub fn clipboard_notifications(mut self, enabled: bool) -> Self {
        self.clipboard_notifications_enabled = enabled;
        self
    }

    /// Profiles the group can route to.
    ///
    /// Falls back to the legacy `default_*` fields when `profiles` is empty,
    /// which is how groups saved by older versions carry their target. Stores
    /// migrate such groups on load, so the fallback only matters for values
    /// deserialized directly.
    pub fn effective_profiles(&self) -> Vec<BrowserProfile> {
        if !self.profiles.is_empty() {
            return self.profiles.clone();
        }
        let legacy = self.legacy_profile();
        if legacy.is_empty() {
            Vec::new()
        } else {
            vec![legacy]
        }
    }

    /// Move a target held only in the legacy fields into `profiles`.
    ///
    /// Returns true when the group was upgraded.
    pub fn migrate_legacy_profile(&mut self) -> bool {
        if !self.profiles.is_empty() {
            return false;
        }
        let legacy = self.legacy_profile();
        if legacy.is_empty() {
            return false;
        }
        self.profiles.push(legacy);
        true
    }

    /// The profile used when the group resolves without a picker
    pub fn default_profile(&self) -> Option<BrowserProfile> {
        self.effective_profiles().into_iter().next()
    }

    /// Launch target described by the legacy single-profile fields
    pub fn legacy_profile(&self) -> BrowserProfile {
        BrowserProfile {
            browser_name: self.default_browser_name.clone(),
            browser_path: self.default_browser_path.clone(),
            browser_type: self.default_browser_type.clone(),
            profile_name: self.default_profile_name.clone(),
            profile_path: self.default_profile_path.clone(),
            profile_arguments: self.default_profile_arguments.clone(),
        }
    }

    /// Mirror `profiles[0]` into the legacy single-profile fields, clearing
    /// them when the group has no profiles
    pub fn sync_legacy_fields(&mut self) {
        let first = self.profiles.first().cloned().unwrap_or_default();
        self.default_browser_name = first.browser_name;
        self.default_browser_path = first.browser_path;
        self.default_browser_type = first.browser_type;
        self.default_profile_name = first.profile_name;
        self.default_profile_path = first.profile_path;
        self.default_profile_arguments = first.profile_arguments;
    }

    /// Derive behavior from the profile count: more than one forces the picker
    pub fn normalize_behavior(&mut self) {
        self.behavior = if self.profiles.len() > 1 {
            GroupBehavior::ShowProfilePicker
        } else {
            GroupBehavior::UseDefault
        };
    }

    /// Look up the override recorded for a pattern
    pub fn override_for(&self, pattern: &str) -> Option<&PatternOverride> {
        self.pattern_overrides.iter().find(|o| o.pattern == pattern)
    }

    /// True if the pattern is one of the group's own patterns or overrides
    pub fn owns_pattern(&self, pattern: &str) -> bool {
        self.url_patterns.iter().any(|p| p == pattern) || self.override_for(pattern).is_some()
    }
}
