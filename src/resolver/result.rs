//! The outcome of resolving one URL.

use std::fmt;

use linkroute_config::{AppSettings, BrowserProfile, UrlGroup, UrlRule};

/// Discriminant of a `MatchResult`, for display and serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchType {
    NoMatch,
    IndividualRule,
    UrlGroup,
    GroupOverride,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::NoMatch => "no_match",
            MatchType::IndividualRule => "individual_rule",
            MatchType::UrlGroup => "url_group",
            MatchType::GroupOverride => "group_override",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a matched group's launch target was decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileResolution {
    /// Exactly one profile applies
    Resolved(BrowserProfile),
    /// The group shows a picker; the caller must choose among `candidates`
    PickerRequired { candidates: Vec<BrowserProfile> },
}

/// Result of `MatchResolver::find_match`. Built per query, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    NoMatch,
    IndividualRule {
        rule: UrlRule,
    },
    UrlGroup {
        group: UrlGroup,
        pattern: String,
        profile: ProfileResolution,
    },
    GroupOverride {
        group: UrlGroup,
        pattern: String,
        profile: BrowserProfile,
    },
}

/// What the process-launch collaborator should run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchPlan {
    /// Start the matched browser with its profile arguments
    Browser { program: String, args: Vec<String> },
    /// Nothing usable matched; start the browser configured in settings
    DefaultBrowser { program: String, args: Vec<String> },
    /// Hand the URL to the platform's default handler
    SystemDefault { url: String },
}

impl MatchResult {
    pub fn match_type(&self) -> MatchType {
        match self {
            MatchResult::NoMatch => MatchType::NoMatch,
            MatchResult::IndividualRule { .. } => MatchType::IndividualRule,
            MatchResult::UrlGroup { .. } => MatchType::UrlGroup,
            MatchResult::GroupOverride { .. } => MatchType::GroupOverride,
        }
    }

    pub fn is_match(&self) -> bool {
        !matches!(self, MatchResult::NoMatch)
    }

    /// True when a group match left the profile for the caller to pick
    pub fn requires_picker(&self) -> bool {
        matches!(
            self,
            MatchResult::UrlGroup {
                profile: ProfileResolution::PickerRequired { .. },
                ..
            }
        )
    }

    /// Every profile the caller may launch; more than one means a picker
    pub fn candidate_profiles(&self) -> &[BrowserProfile] {
        match self {
            MatchResult::NoMatch => &[],
            MatchResult::IndividualRule { rule } => std::slice::from_ref(&rule.profile),
            MatchResult::UrlGroup { profile, .. } => match profile {
                ProfileResolution::Resolved(p) => std::slice::from_ref(p),
                ProfileResolution::PickerRequired { candidates } => candidates.as_slice(),
            },
            MatchResult::GroupOverride { profile, .. } => std::slice::from_ref(profile),
        }
    }

    /// The profile to launch when nobody can be asked.
    ///
    /// A picker group falls back to its first profile.
    pub fn resolve_non_interactive(&self) -> Option<&BrowserProfile> {
        self.candidate_profiles().first()
    }

    pub fn browser_path(&self) -> &str {
        self.resolve_non_interactive()
            .map(|p| p.browser_path.as_str())
            .unwrap_or("")
    }

    pub fn profile_arguments(&self) -> &str {
        self.resolve_non_interactive()
            .map(|p| p.profile_arguments.as_str())
            .unwrap_or("")
    }

    pub fn browser_name(&self) -> &str {
        self.resolve_non_interactive()
            .map(|p| p.browser_name.as_str())
            .unwrap_or("")
    }

    pub fn profile_name(&self) -> &str {
        self.resolve_non_interactive()
            .map(|p| p.profile_name.as_str())
            .unwrap_or("")
    }

    /// Rule pattern or group name, for notifications
    pub fn rule_or_group_name(&self) -> &str {
        match self {
            MatchResult::NoMatch => "",
            MatchResult::IndividualRule { rule } => rule.pattern.as_str(),
            MatchResult::UrlGroup { group, .. } | MatchResult::GroupOverride { group, .. } => {
                group.name.as_str()
            }
        }
    }

    /// The stored pattern that matched
    pub fn matched_pattern(&self) -> Option<&str> {
        match self {
            MatchResult::NoMatch => None,
            MatchResult::IndividualRule { rule } => Some(rule.pattern.as_str()),
            MatchResult::UrlGroup { pattern, .. } | MatchResult::GroupOverride { pattern, .. } => {
                Some(pattern.as_str())
            }
        }
    }

    /// Whether the clipboard watcher may announce this match
    pub fn clipboard_notifications_enabled(&self) -> bool {
        match self {
            MatchResult::NoMatch => false,
            MatchResult::IndividualRule { rule } => rule.clipboard_notifications_enabled,
            MatchResult::UrlGroup { group, .. } | MatchResult::GroupOverride { group, .. } => {
                group.clipboard_notifications_enabled
            }
        }
    }

    /// Decide what to run for `url`. Nothing is spawned here.
    ///
    /// Profile arguments go first, the URL is always the last argument.
    pub fn launch_plan(&self, url: &str, settings: &AppSettings) -> LaunchPlan {
        if let Some(profile) = self.resolve_non_interactive().filter(|p| !p.is_empty()) {
            let mut args = split_arguments(&profile.profile_arguments);
            args.push(url.to_string());
            return LaunchPlan::Browser {
                program: profile.browser_path.clone(),
                args,
            };
        }

        if !settings.default_browser_path.trim().is_empty() {
            return LaunchPlan::DefaultBrowser {
                program: settings.default_browser_path.clone(),
                args: vec![url.to_string()],
            };
        }

        LaunchPlan::SystemDefault {
            url: url.to_string(),
        }
    }
}

/// Split stored profile arguments the way a shell would
fn split_arguments(arguments: &str) -> Vec<String> {
    match shell_words::split(arguments) {
        Ok(args) => args,
        Err(e) => {
            log::warn!(
                "Could not parse profile arguments {:?} ({}), splitting on whitespace",
                arguments,
                e
            );
            arguments.split_whitespace().map(str::to_string).collect()
        }
    }
}
