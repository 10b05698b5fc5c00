//! Export/import bundles: the whole rule/group universe plus settings in
//! one JSON file.
//!
//! A bundle is validated as a whole before it may replace current data.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use linkroute_config::{AppSettings, UrlGroup, UrlRule, write_atomic};
use serde::{Deserialize, Serialize};

use crate::error::RouteError;
use crate::pattern::normalize_pattern;
use crate::validation::check_pattern_syntax;

/// Bundle layout version written by this build
pub const BUNDLE_FORMAT_VERSION: u32 = 1;

/// Everything needed to reproduce a setup on another machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportBundle {
    pub format_version: u32,
    /// Version of the application that wrote the bundle
    #[serde(default)]
    pub app_version: String,
    pub exported_at: DateTime<Utc>,
    #[serde(default)]
    pub settings: AppSettings,
    #[serde(default)]
    pub rules: Vec<UrlRule>,
    #[serde(default)]
    pub groups: Vec<UrlGroup>,
}

/// Shown to the user before an import replaces anything
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleSummary {
    pub app_version: String,
    pub exported_at: DateTime<Utc>,
    pub rule_count: usize,
    pub group_count: usize,
    pub built_in_group_count: usize,
    /// Non-blocking oddities, e.g. a pattern owned twice
    pub warnings: Vec<String>,
}

impl fmt::Display for BundleSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rules, {} groups ({} built-in), exported {} by version {}",
            self.rule_count,
            self.group_count,
            self.built_in_group_count,
            self.exported_at.format("%Y-%m-%d %H:%M UTC"),
            if self.app_version.is_empty() { "unknown" } else { self.app_version.as_str() }
        )
    }
}

impl ExportBundle {
    /// Snapshot the given state, stamped now
    pub fn new(settings: AppSettings, rules: Vec<UrlRule>, groups: Vec<UrlGroup>) -> Self {
        Self {
            format_version: BUNDLE_FORMAT_VERSION,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            settings,
            rules,
            groups,
        }
    }

    /// Check the bundle's shape. Errors block the import; warnings do not.
    pub fn validate(&self) -> Result<BundleSummary, RouteError> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if self.format_version == 0 || self.format_version > BUNDLE_FORMAT_VERSION {
            errors.push(format!(
                "unsupported format version {} (this build reads up to {})",
                self.format_version, BUNDLE_FORMAT_VERSION
            ));
        }
        if let Err(e) = self.settings.validate() {
            errors.push(e.to_string());
        }

        let mut rule_ids = HashSet::new();
        let mut owned = HashSet::new();
        for rule in &self.rules {
            if !rule_ids.insert(rule.id) {
                errors.push(format!("duplicate rule id {}", rule.id));
            }
            check_pattern(&rule.pattern, "rule", &mut errors, &mut warnings, &mut owned);
        }

        let mut group_ids = HashSet::new();
        let mut group_names = HashSet::new();
        for group in &self.groups {
            if !group_ids.insert(group.id) {
                errors.push(format!("duplicate group id {}", group.id));
            }
            let name = group.name.trim().to_lowercase();
            if name.is_empty() {
                errors.push(format!("group {} has no name", group.id));
            } else if !group_names.insert(name) {
                errors.push(format!("duplicate group name '{}'", group.name));
            }
            let context = format!("group '{}'", group.name);
            for pattern in &group.url_patterns {
                check_pattern(pattern, &context, &mut errors, &mut warnings, &mut owned);
            }
            for o in &group.pattern_overrides {
                check_pattern(&o.pattern, &context, &mut errors, &mut warnings, &mut owned);
            }
        }

        if !errors.is_empty() {
            return Err(RouteError::Bundle(errors.join("; ")));
        }

        Ok(BundleSummary {
            app_version: self.app_version.clone(),
            exported_at: self.exported_at,
            rule_count: self.rules.len(),
            group_count: self.groups.len(),
            built_in_group_count: self.groups.iter().filter(|g| g.is_built_in).count(),
            warnings,
        })
    }
}

fn check_pattern(
    pattern: &str,
    context: &str,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
    owned: &mut HashSet<String>,
) {
    let normalized = normalize_pattern(pattern);
    for issue in check_pattern_syntax(&normalized) {
        errors.push(format!("{context}: {issue}"));
    }
    if !normalized.is_empty() && !owned.insert(normalized.clone()) {
        warnings.push(format!("{context}: '{normalized}' is used more than once"));
    }
}

/// Write a bundle as pretty JSON, atomically
pub fn export_to(path: &Path, bundle: &ExportBundle) -> Result<(), RouteError> {
    let json = serde_json::to_string_pretty(bundle)
        .map_err(|e| RouteError::Bundle(format!("failed to serialize bundle: {e}")))?;
    write_atomic(path, json.as_bytes())
        .map_err(|e| RouteError::Bundle(format!("failed to write {}: {e}", path.display())))?;
    log::info!(
        "Exported {} rules and {} groups to {:?}",
        bundle.rules.len(),
        bundle.groups.len(),
        path
    );
    Ok(())
}

/// Parse a bundle without validating it
pub fn read_bundle(path: &Path) -> Result<ExportBundle, RouteError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| RouteError::Bundle(format!("failed to read {}: {e}", path.display())))?;
    serde_json::from_str(&contents)
        .map_err(|e| RouteError::Bundle(format!("{} is not a valid bundle: {e}", path.display())))
}

/// Parse and validate a bundle file before offering it for import
pub fn validate_bundle_file(path: &Path) -> Result<(BundleSummary, ExportBundle), RouteError> {
    let bundle = read_bundle(path)?;
    let summary = bundle.validate()?;
    Ok((summary, bundle))
}

/// Where the automatic pre-import backup goes
pub fn backup_path(backups_dir: &Path, now: DateTime<Utc>) -> PathBuf {
    backups_dir.join(format!("linkroute-backup-{}.json", now.format("%Y%m%d-%H%M%S")))
}
