//! Pattern, rule and group validation.
//!
//! Validation never mutates anything. It reports blocking errors (bad syntax,
//! duplicate names, missing profiles) separately from conflict warnings
//! (pattern already used elsewhere) so each caller can apply its own
//! `WarningPolicy`.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use linkroute_config::{BrowserProfile, GroupId, RuleId, UrlGroup};

use crate::error::RouteError;
use crate::pattern::{normalize_pattern, refines, split_pattern};
use crate::store::{GroupStore, RuleStore};

/// Longest host a DNS name can have
const MAX_HOST_LEN: usize = 253;

/// Characters allowed in the path part besides ASCII alphanumerics
const PATH_PUNCTUATION: &str = "-._~/%!$&'()+,;=:@";

/// The entity being edited, excluded from conflict checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Rule(RuleId),
    Group(GroupId),
}

/// Machine-readable reason for a validation issue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueCode {
    Empty,
    InvalidCharacter,
    MisplacedWildcard,
    EmptyLabel,
    QueryOrFragment,
    TooLong,
    DuplicateInList,
    DuplicateInGroup,
    NotInGroup,
    ConflictsWithRule,
    ConflictsWithGroup,
    ConflictsWithOverride,
    NameRequired,
    DuplicateName,
    ProfileRequired,
    ProfileMissingPath,
    PickerBehavior,
    NotARefinement,
}

/// One error or warning with a human-readable message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub code: IssueCode,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// How conflict warnings are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningPolicy {
    /// Any warning stops the action (adding one pattern inside a group)
    Block,
    /// Warnings were shown and the user chose to proceed (full rule/group save)
    Acknowledge,
}

/// Outcome of a validation call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    /// Canonical form callers must store instead of the raw input
    pub normalized_value: Option<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Whether the action must stop under `policy`
    pub fn blocks(&self, policy: WarningPolicy) -> bool {
        match policy {
            WarningPolicy::Block => !self.is_valid() || self.has_warnings(),
            WarningPolicy::Acknowledge => !self.is_valid(),
        }
    }

    pub fn error(&mut self, code: IssueCode, message: impl Into<String>) {
        self.errors.push(ValidationIssue {
            code,
            message: message.into(),
        });
    }

    pub fn warning(&mut self, code: IssueCode, message: impl Into<String>) {
        self.warnings.push(ValidationIssue {
            code,
            message: message.into(),
        });
    }

    fn absorb(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// All messages joined for display, errors first
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .chain(&self.warnings)
            .map(|issue| issue.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Turn the result into the normalized value or the matching error
    pub fn into_outcome(self, policy: WarningPolicy) -> Result<String, RouteError> {
        if !self.is_valid() {
            return Err(RouteError::Validation(self));
        }
        if self.blocks(policy) {
            return Err(RouteError::Conflict(self));
        }
        Ok(self.normalized_value.unwrap_or_default())
    }
}

/// Who already owns a pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternOwner {
    Rule { id: RuleId, label: String },
    Group { id: GroupId, name: String },
    GroupOverride { id: GroupId, name: String },
}

impl fmt::Display for PatternOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternOwner::Rule { label, .. } => write!(f, "rule ({label})"),
            PatternOwner::Group { name, .. } => write!(f, "group '{name}'"),
            PatternOwner::GroupOverride { name, .. } => write!(f, "an override in group '{name}'"),
        }
    }
}

/// Syntax-only check of an already-normalized pattern
pub fn check_pattern_syntax(normalized: &str) -> Vec<ValidationIssue> {
    let mut result = ValidationResult::default();
    if normalized.is_empty() {
        result.error(IssueCode::Empty, "Pattern cannot be empty");
        return result.errors;
    }
    if normalized.contains(['?', '#']) {
        result.error(
            IssueCode::QueryOrFragment,
            format!("'{normalized}' must not contain a query string or fragment"),
        );
    }

    let (host, path) = split_pattern(normalized);
    let base = host.strip_prefix("*.").unwrap_or(host);

    if base.contains('*') || path.contains('*') {
        result.error(
            IssueCode::MisplacedWildcard,
            format!("'{normalized}': a wildcard is only allowed as a leading '*.'"),
        );
    }
    if base.len() > MAX_HOST_LEN {
        result.error(
            IssueCode::TooLong,
            format!("Host part of '{normalized}' exceeds {MAX_HOST_LEN} characters"),
        );
    }
    if base.is_empty() || base.split('.').any(str::is_empty) {
        result.error(
            IssueCode::EmptyLabel,
            format!("'{normalized}' has an empty domain label"),
        );
    }

    let bad_host = base
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(*c, '.' | '-' | '_' | '*')));
    let bad_path = path.chars().find(|c| {
        !(c.is_ascii_alphanumeric() || PATH_PUNCTUATION.contains(*c) || matches!(*c, '?' | '#' | '*'))
    });
    if let Some(c) = bad_host.or(bad_path) {
        result.error(
            IssueCode::InvalidCharacter,
            format!("'{normalized}' contains invalid character '{c}'"),
        );
    }
    result.errors
}

/// Validates candidate rules and groups against both stores
#[derive(Clone)]
pub struct ValidationService {
    rules: Arc<RuleStore>,
    groups: Arc<GroupStore>,
}

impl ValidationService {
    pub fn new(rules: Arc<RuleStore>, groups: Arc<GroupStore>) -> Self {
        Self { rules, groups }
    }

    /// Check syntax and look for other owners of the pattern
    pub fn validate_pattern(&self, pattern: &str, exclude: Option<EntityRef>) -> ValidationResult {
        let normalized = normalize_pattern(pattern);
        let mut result = ValidationResult {
            errors: check_pattern_syntax(&normalized),
            ..ValidationResult::default()
        };

        if result.is_valid()
            && let Some(owner) = self.find_owner(&normalized, exclude)
        {
            let code = match owner {
                PatternOwner::Rule { .. } => IssueCode::ConflictsWithRule,
                PatternOwner::Group { .. } => IssueCode::ConflictsWithGroup,
                PatternOwner::GroupOverride { .. } => IssueCode::ConflictsWithOverride,
            };
            result.warning(code, format!("'{normalized}' is already used by {owner}"));
        }

        crate::debug_log!(
            "VALIDATE",
            "Pattern {:?} -> {:?}: {} errors, {} warnings",
            pattern,
            normalized,
            result.errors.len(),
            result.warnings.len()
        );
        result.normalized_value = Some(normalized);
        result
    }

    /// Validate a full rule save
    pub fn validate_rule(
        &self,
        pattern: &str,
        profile: &BrowserProfile,
        exclude_rule: Option<RuleId>,
    ) -> ValidationResult {
        let mut result = self.validate_pattern(pattern, exclude_rule.map(EntityRef::Rule));
        if profile.is_empty() {
            result.error(IssueCode::ProfileMissingPath, "A browser must be selected");
        }
        result
    }

    /// Validate a full group save; `normalized_value` is the trimmed name
    pub fn validate_group(
        &self,
        name: &str,
        patterns: &[String],
        profiles: &[BrowserProfile],
        exclude_group: Option<GroupId>,
    ) -> ValidationResult {
        let mut result = ValidationResult::default();
        let name = name.trim();

        if name.is_empty() {
            result.error(IssueCode::NameRequired, "Group name is required");
        } else if let Some(existing) = self.groups.find_by_name(name)
            && Some(existing.id) != exclude_group
        {
            result.error(
                IssueCode::DuplicateName,
                format!("A group named '{}' already exists", existing.name),
            );
        }

        let mut seen = HashSet::new();
        for pattern in patterns {
            let checked = self.validate_pattern(pattern, exclude_group.map(EntityRef::Group));
            if let Some(normalized) = &checked.normalized_value
                && !normalized.is_empty()
                && !seen.insert(normalized.clone())
            {
                result.error(
                    IssueCode::DuplicateInList,
                    format!("'{normalized}' appears more than once"),
                );
            }
            result.absorb(checked);
        }

        if profiles.is_empty() {
            result.error(IssueCode::ProfileRequired, "At least one browser profile is required");
        }
        for profile in profiles.iter().filter(|p| p.is_empty()) {
            result.error(
                IssueCode::ProfileMissingPath,
                format!("Profile '{}' has no browser path", profile.display_name()),
            );
        }
        if profiles.len() > 1 {
            result.warning(
                IssueCode::PickerBehavior,
                format!(
                    "{} profiles selected: a profile picker will be shown for matching links",
                    profiles.len()
                ),
            );
        }

        result.normalized_value = Some(name.to_string());
        result
    }

    /// Validate an override pattern for `group`
    pub fn validate_override(
        &self,
        group: &UrlGroup,
        pattern: &str,
        profile: &BrowserProfile,
    ) -> ValidationResult {
        let mut result = self.validate_pattern(pattern, Some(EntityRef::Group(group.id)));
        let normalized = result.normalized_value.clone().unwrap_or_default();

        if result.is_valid() && !group.url_patterns.iter().any(|p| refines(&normalized, p)) {
            result.error(
                IssueCode::NotARefinement,
                format!(
                    "'{normalized}' must be a narrower form of one of the patterns in '{}'",
                    group.name
                ),
            );
        }
        if profile.is_empty() {
            result.error(IssueCode::ProfileMissingPath, "A browser must be selected");
        }
        result
    }

    /// Find the entity other than `exclude` that owns `normalized`
    pub fn find_owner(&self, normalized: &str, exclude: Option<EntityRef>) -> Option<PatternOwner> {
        let rules = self.rules.list();
        let rule_owner = rules
            .iter()
            .filter(|r| exclude != Some(EntityRef::Rule(r.id)))
            .find(|r| r.pattern == normalized)
            .map(|r| PatternOwner::Rule {
                id: r.id,
                label: r.profile.display_name(),
            });
        if rule_owner.is_some() {
            return rule_owner;
        }

        let groups = self.groups.list();
        for group in groups
            .iter()
            .filter(|g| exclude != Some(EntityRef::Group(g.id)))
        {
            if group.url_patterns.iter().any(|p| p == normalized) {
                return Some(PatternOwner::Group {
                    id: group.id,
                    name: group.name.clone(),
                });
            }
            if group.override_for(normalized).is_some() {
                return Some(PatternOwner::GroupOverride {
                    id: group.id,
                    name: group.name.clone(),
                });
            }
        }
        None
    }
}
