//! Default value functions for configuration.
//!
//! Free functions used as `#[serde(default = "crate::defaults::...")]`
//! attributes on persisted fields, plus the file names used inside the
//! config directory.

// ── Primitive helpers ──────────────────────────────────────────────────────

pub fn bool_false() -> bool {
    false
}

pub fn bool_true() -> bool {
    true
}

// ── File names ─────────────────────────────────────────────────────────────

pub const RULES_FILE: &str = "rules.yaml";
pub const GROUPS_FILE: &str = "groups.yaml";
pub const SETTINGS_FILE: &str = "settings.yaml";
pub const BACKUPS_DIR: &str = "backups";

/// Environment variable that relocates the whole config directory
pub const CONFIG_DIR_ENV: &str = "LINKROUTE_CONFIG_DIR";
