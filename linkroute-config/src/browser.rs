//! Browser launch targets.
//!
//! A `BrowserProfile` names one concrete browser executable plus the
//! profile (and extra command-line arguments) it should be started with.

use serde::{Deserialize, Serialize};

/// One concrete launch target: a browser executable and a profile inside it.
///
/// Profiles are immutable values once attached to a rule or group; editing a
/// rule replaces its profile wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BrowserProfile {
    /// Human-readable browser name (e.g. "Google Chrome")
    #[serde(default)]
    pub browser_name: String,

    /// Absolute path to the browser executable
    #[serde(default)]
    pub browser_path: String,

    /// Browser family used to pick argument conventions (e.g. "chrome", "firefox")
    #[serde(default)]
    pub browser_type: String,

    /// Display name of the browser profile (e.g. "Work")
    #[serde(default)]
    pub profile_name: String,

    /// Profile directory or identifier inside the browser's user data
    #[serde(default)]
    pub profile_path: String,

    /// Extra arguments passed before the URL (e.g. `--profile-directory="Profile 1"`)
    #[serde(default)]
    pub profile_arguments: String,
}

impl BrowserProfile {
    /// Create a profile for the given browser executable
    pub fn new(browser_name: impl Into<String>, browser_path: impl Into<String>) -> Self {
        Self {
            browser_name: browser_name.into(),
            browser_path: browser_path.into(),
            ..Self::default()
        }
    }

    /// Builder method to set the browser family
    pub fn browser_type(mut self, browser_type: impl Into<String>) -> Self {
        self.browser_type = browser_type.into();
        self
    }

    /// Builder method to set the profile name
    pub fn profile_name(mut self, name: impl Into<String>) -> Self {
        self.profile_name = name.into();
        self
    }

    /// Builder method to set the profile path
    pub fn profile_path(mut self, path: impl Into<String>) -> Self {
        self.profile_path = path.into();
        self
    }

    /// Builder method to set extra launch arguments
    pub fn profile_arguments(mut self, args: impl Into<String>) -> Self {
        self.profile_arguments = args.into();
        self
    }

    /// True when the profile cannot launch anything (no executable configured)
    pub fn is_empty(&self) -> bool {
        self.browser_path.trim().is_empty()
    }

    /// Label shown to the user, e.g. "Google Chrome - Work"
    pub fn display_name(&self) -> String {
        match (self.browser_name.is_empty(), self.profile_name.is_empty()) {
            (false, false) => format!("{} - {}", self.browser_name, self.profile_name),
            (false, true) => self.browser_name.clone(),
            (true, false) => self.profile_name.clone(),
            (true, true) => self.browser_path.clone(),
        }
    }
}
