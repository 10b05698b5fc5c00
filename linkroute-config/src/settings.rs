//! Application settings persisted next to the rule and group files.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::persistence::write_atomic;

/// Clipboard watcher settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClipboardMonitoring {
    /// Whether copied URLs are checked against the rules at all
    #[serde(default = "crate::defaults::bool_false")]
    pub enabled: bool,

    /// Monitoring is suspended until this instant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause_until: Option<DateTime<Utc>>,
}

impl ClipboardMonitoring {
    /// True while a pause deadline lies in the future
    pub fn is_paused(&self, now: DateTime<Utc>) -> bool {
        self.pause_until.is_some_and(|until| until > now)
    }

    /// Enabled and not currently paused
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.enabled && !self.is_paused(now)
    }
}

/// Application-wide settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Browser used when no rule or group matches (empty = system default)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default_browser_name: String,

    /// Executable used when no rule or group matches (empty = system default)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default_browser_path: String,

    /// Clipboard watcher configuration
    #[serde(default)]
    pub clipboard_monitoring: ClipboardMonitoring,

    /// Load the last-known-good `.bak` copy when a store file is corrupt
    #[serde(default = "crate::defaults::bool_true")]
    pub use_backup_on_load_failure: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_browser_name: String::new(),
            default_browser_path: String::new(),
            clipboard_monitoring: ClipboardMonitoring::default(),
            use_backup_on_load_failure: true,
        }
    }
}

impl AppSettings {
    /// Load settings from a file, returning defaults when it does not exist
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::info!("Settings file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        // Settings have no backup copy; an empty file loads defaults.
        if contents.trim().is_empty() {
            log::error!(
                "Settings file {:?} is empty; using defaults until settings are saved again",
                path
            );
            return Ok(Self::default());
        }

        let settings: AppSettings =
            serde_yaml_ng::from_str(&contents).map_err(|e| ConfigError::parse(path, e))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings atomically
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;
        let yaml = serde_yaml_ng::to_string(self).map_err(|e| ConfigError::parse(path, e))?;
        write_atomic(path, yaml.as_bytes()).map_err(|e| ConfigError::io(path, e))?;
        log::info!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Check field values that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_browser_path.trim() != self.default_browser_path {
            return Err(ConfigError::Validation(
                "default_browser_path has leading or trailing whitespace".to_string(),
            ));
        }
        Ok(())
    }
}
