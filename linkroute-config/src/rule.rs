//! Individually defined URL rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::browser::BrowserProfile;

/// Unique identifier for a rule
pub type RuleId = Uuid;

/// A single pattern mapped to exactly one browser profile.
///
/// Rules always outrank groups when both match a URL, since they are the
/// most explicit statement of user intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlRule {
    /// Unique identifier, stable across updates
    pub id: RuleId,

    /// Normalized domain/path pattern (e.g. "github.com", "*.corp.example.com")
    pub pattern: String,

    /// Launch target; persisted as flat `browser_*` / `profile_*` fields
    #[serde(flatten)]
    pub profile: BrowserProfile,

    /// Whether the clipboard watcher should offer this rule when a matching URL is copied
    #[serde(default = "crate::defaults::bool_true")]
    pub clipboard_notifications_enabled: bool,

    /// When the rule was first stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl UrlRule {
    /// Create a new rule with a fresh id
    pub fn new(pattern: impl Into<String>, profile: BrowserProfile) -> Self {
        Self::with_id(Uuid::new_v4(), pattern, profile)
    }

    /// Create a rule with a specific ID (for testing or deserialization)
    pub fn with_id(id: RuleId, pattern: impl Into<String>, profile: BrowserProfile) -> Self {
        Self {
            id,
            pattern: pattern.into(),
            profile,
            clipboard_notifications_enabled: true,
            created_at: None,
        }
    }

    /// Builder method to toggle clipboard notifications
    pub fn clipboard_notifications(mut self, enabled: bool) -> Self {
        self.clipboard_notifications_enabled = enabled;
        self
    }

    /// Replace the launch target wholesale
    pub fn set_profile(&mut self, profile: BrowserProfile) {
        self.profile = profile;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_fields_are_flattened() {
        let rule = UrlRule::new(
            "github.com",
            BrowserProfile::new("Chrome", "/usr/bin/chrome").profile_name("Dev"),
        );
        let yaml = serde_yaml_ng::to_string(&rule).expect("serialize");
        assert!(yaml.contains("browser_path: /usr/bin/chrome"));
        assert!(yaml.contains("profile_name: Dev"));
        assert!(!yaml.contains("profile:\n"));
    }

    #[test]
    fn test_clipboard_notifications_default_to_enabled() {
        let yaml = "id: 6f1c3c86-1f43-4a55-9a52-3e0f0e6b1a01\npattern: example.com\n";
        let rule: UrlRule = serde_yaml_ng::from_str(yaml).expect("deserialize");
        assert!(rule.clipboard_notifications_enabled);
        assert!(rule.profile.is_empty());
    }
}
