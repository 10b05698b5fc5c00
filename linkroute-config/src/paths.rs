//! Config directory resolution.
//!
//! Everything lives in one directory (XDG convention on every platform
//! except Windows):
//!
//! - `rules.yaml`: individual rules
//! - `groups.yaml`: URL groups, including built-in ones
//! - `settings.yaml`: application settings
//! - `backups/`: automatic backups written before an import

use std::path::{Path, PathBuf};

use crate::defaults;

/// Resolved locations of every persisted file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    root: PathBuf,
}

impl ConfigPaths {
    /// Use an explicit config directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the directory from `LINKROUTE_CONFIG_DIR` or the platform default
    pub fn resolve() -> Self {
        match std::env::var_os(defaults::CONFIG_DIR_ENV) {
            Some(dir) if !dir.is_empty() => {
                log::info!("Using config directory from {}", defaults::CONFIG_DIR_ENV);
                Self::new(dir)
            }
            _ => Self::new(default_config_dir()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn rules_file(&self) -> PathBuf {
        self.root.join(defaults::RULES_FILE)
    }

    pub fn groups_file(&self) -> PathBuf {
        self.root.join(defaults::GROUPS_FILE)
    }

    pub fn settings_file(&self) -> PathBuf {
        self.root.join(defaults::SETTINGS_FILE)
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.root.join(defaults::BACKUPS_DIR)
    }
}

/// Platform default config directory (`~/.config/linkroute` outside Windows)
pub fn default_config_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("linkroute")
        } else {
            PathBuf::from(".")
        }
    }
    #[cfg(not(target_os = "windows"))]
    {
        if let Some(home_dir) = dirs::home_dir() {
            home_dir.join(".config").join("linkroute")
        } else {
            PathBuf::from(".")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_live_under_root() {
        let paths = ConfigPaths::new("/tmp/lr");
        assert_eq!(paths.rules_file(), PathBuf::from("/tmp/lr/rules.yaml"));
        assert_eq!(paths.groups_file(), PathBuf::from("/tmp/lr/groups.yaml"));
        assert_eq!(paths.settings_file(), PathBuf::from("/tmp/lr/settings.yaml"));
        assert_eq!(paths.backups_dir(), PathBuf::from("/tmp/lr/backups"));
    }
}
