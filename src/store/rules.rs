use linkroute_config::{RuleId, UrlRule};

use super::RuleStore;
use crate::error::RouteError;

impl RuleStore {
    /// Find the rule owning exactly this normalized pattern
    pub fn find_by_pattern(&self, pattern: &str) -> Option<UrlRule> {
        self.list().iter().find(|r| r.pattern == pattern).cloned()
    }

    /// Toggle clipboard notifications for one rule
    pub fn set_clipboard_notifications(&self, id: &RuleId, enabled: bool) -> Result<(), RouteError> {
        self.modify(id, |rule| {
            rule.clipboard_notifications_enabled = enabled;
            Ok(())
        })
    }
}
