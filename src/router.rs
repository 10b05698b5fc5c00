//! `LinkRouter`: the object built once at startup that owns the stores and
//! wires the resolver, validator and template synchronizer to them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use linkroute_config::{
    AppSettings, BrowserProfile, ConfigPaths, GroupId, RuleId, UrlGroup, UrlRule,
};
use parking_lot::{Mutex, RwLock};

use crate::bundle::{self, BundleSummary, ExportBundle};
use crate::pattern::normalize_pattern;
use crate::error::{EntityKind, RouteError};
use crate::resolver::{MatchResolver, MatchResult};
use crate::store::{Entity, GroupStore, RuleStore, Store, YamlFile};
use crate::templates::{SyncReport, TemplateSynchronizer};
use crate::validation::{EntityRef, IssueCode, ValidationResult, ValidationService, WarningPolicy};

/// Outcome of a successful import
#[derive(Debug, Clone)]
pub struct ImportReport {
    pub summary: BundleSummary,
    /// Where the previous data was saved before being replaced
    pub backup_path: PathBuf,
    pub sync: SyncReport,
}

pub struct LinkRouter {
    paths: ConfigPaths,
    rules: Arc<RuleStore>,
    groups: Arc<GroupStore>,
    validator: ValidationService,
    resolver: MatchResolver,
    synchronizer: TemplateSynchronizer,
    settings: RwLock<AppSettings>,
    /// Held from validation through commit so two edits cannot both pass
    /// the same conflict check
    edit_lock: Mutex<()>,
}

impl LinkRouter {
    /// Load everything from `paths` and bring built-in groups up to date.
    ///
    /// A corrupt store file falls back to its `.bak` copy when the settings
    /// allow it; otherwise the load error is returned.
    pub fn open(paths: ConfigPaths) -> Result<Self, RouteError> {
        log::info!("Opening config directory {:?}", paths.root());
        let settings = AppSettings::load_from(&paths.settings_file())?;

        let rules = Arc::new(RuleStore::new(YamlFile::new(paths.rules_file())));
        let groups = Arc::new(GroupStore::new(YamlFile::new(paths.groups_file())));
        load_with_fallback(&rules, settings.use_backup_on_load_failure)?;
        load_with_fallback(&groups, settings.use_backup_on_load_failure)?;

        let router = Self::from_parts(paths, rules, groups, settings);
        router.ensure_built_in_groups_exist()?;
        Ok(router)
    }

    /// Assemble a router around already-loaded stores. Does not sync templates.
    pub fn from_parts(
        paths: ConfigPaths,
        rules: Arc<RuleStore>,
        groups: Arc<GroupStore>,
        settings: AppSettings,
    ) -> Self {
        let validator = ValidationService::new(Arc::clone(&rules), Arc::clone(&groups));
        let resolver = MatchResolver::new(Arc::clone(&rules), Arc::clone(&groups));
        let synchronizer = TemplateSynchronizer::new(Arc::clone(&groups), validator.clone());
        Self {
            paths,
            rules,
            groups,
            validator,
            resolver,
            synchronizer,
            settings: RwLock::new(settings),
            edit_lock: Mutex::new(()),
        }
    }

    /// Replace the template set (tests and tooling)
    pub fn with_synchronizer(mut self, synchronizer: TemplateSynchronizer) -> Self {
        self.synchronizer = synchronizer;
        self
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn rules(&self) -> &Arc<RuleStore> {
        &self.rules
    }

    pub fn groups(&self) -> &Arc<GroupStore> {
        &self.groups
    }

    pub fn validator(&self) -> &ValidationService {
        &self.validator
    }

    pub fn resolver(&self) -> &MatchResolver {
        &self.resolver
    }

    pub fn ensure_built_in_groups_exist(&self) -> Result<SyncReport, RouteError> {
        let _edit = self.edit_lock.lock();
        self.synchronizer.ensure_built_in_groups_exist()
    }

    pub fn find_match(&self, url: &str) -> MatchResult {
        self.resolver.find_match(url)
    }

    // ------------------------------------------------------------------
    // Rules
    // ------------------------------------------------------------------

    /// Validate and add a rule. Conflict warnings need `acknowledge_warnings`.
    pub fn add_rule(&self, rule: UrlRule, acknowledge_warnings: bool) -> Result<RuleId, RouteError> {
        let _edit = self.edit_lock.lock();
        self.validator
            .validate_rule(&rule.pattern, &rule.profile, None)
            .into_outcome(policy(acknowledge_warnings))?;
        self.rules.add(rule)
    }

    pub fn update_rule(&self, rule: UrlRule, acknowledge_warnings: bool) -> Result<(), RouteError> {
        let _edit = self.edit_lock.lock();
        self.validator
            .validate_rule(&rule.pattern, &rule.profile, Some(rule.id))
            .into_outcome(policy(acknowledge_warnings))?;
        self.rules.update(rule)
    }

    pub fn delete_rule(&self, id: &RuleId) -> Result<UrlRule, RouteError> {
        let _edit = self.edit_lock.lock();
        self.rules.delete(id)
    }

    // ------------------------------------------------------------------
    // Groups
    // ------------------------------------------------------------------

    /// Validate and add a group. Conflict and picker warnings need
    /// `acknowledge_warnings`.
    pub fn add_group(&self, group: UrlGroup, acknowledge_warnings: bool) -> Result<GroupId, RouteError> {
        let _edit = self.edit_lock.lock();
        self.validate_group(&group, None)
            .into_outcome(policy(acknowledge_warnings))?;
        self.groups.add(group)
    }

    pub fn update_group(&self, group: UrlGroup, acknowledge_warnings: bool) -> Result<(), RouteError> {
        let _edit = self.edit_lock.lock();
        self.validate_group(&group, Some(group.id))
            .into_outcome(policy(acknowledge_warnings))?;
        self.groups.update(group)
    }

    pub fn delete_group(&self, id: &GroupId) -> Result<UrlGroup, RouteError> {
        let _edit = self.edit_lock.lock();
        let removed = self.groups.delete(id)?;
        if removed.is_built_in {
            log::info!(
                "Deleted built-in group '{}'; it is recreated on the next start",
                removed.name
            );
        }
        Ok(removed)
    }

    /// Add one pattern to a group; any conflict blocks
    pub fn add_pattern_to_group(&self, group_id: &GroupId, pattern: &str) -> Result<String, RouteError> {
        let _edit = self.edit_lock.lock();
        self.groups.add_pattern(group_id, pattern, &self.validator)
    }

    pub fn restore_template_patterns(&self, group_id: &GroupId) -> Result<Vec<String>, RouteError> {
        let _edit = self.edit_lock.lock();
        self.groups.restore_template_patterns(group_id, &self.validator)
    }

    /// Take one pattern out of a group and give it its own rule.
    ///
    /// If the rule cannot be saved the group is put back as it was.
    pub fn move_pattern_to_rule(
        &self,
        group_id: &GroupId,
        pattern: &str,
        profile: BrowserProfile,
    ) -> Result<RuleId, RouteError> {
        let _edit = self.edit_lock.lock();
        let original = self
            .groups
            .get(group_id)
            .ok_or_else(|| RouteError::not_found(EntityKind::Group, *group_id))?;

        let normalized = normalize_pattern(pattern);
        let mut result = self
            .validator
            .validate_pattern(&normalized, Some(EntityRef::Group(*group_id)));
        if !original.url_patterns.contains(&normalized) {
            result.error(
                IssueCode::NotInGroup,
                format!("'{normalized}' is not a pattern of group '{}'", original.name),
            );
        }
        if profile.is_empty() {
            result.error(IssueCode::ProfileMissingPath, "A browser must be selected");
        }
        result.into_outcome(WarningPolicy::Block)?;

        self.groups.remove_pattern(group_id, &normalized)?;
        match self.rules.add(UrlRule::new(normalized.clone(), profile)) {
            Ok(id) => {
                log::info!("Moved '{}' from group '{}' to a rule", normalized, original.name);
                Ok(id)
            }
            Err(e) => {
                log::error!("Could not add rule for '{}', restoring group: {}", normalized, e);
                self.groups.modify(group_id, |g| {
                    *g = original;
                    Ok(())
                })?;
                Err(e)
            }
        }
    }

    fn validate_group(&self, group: &UrlGroup, exclude: Option<GroupId>) -> ValidationResult {
        let mut result = self.validator.validate_group(
            &group.name,
            &group.url_patterns,
            &group.profiles,
            exclude,
        );
        for o in &group.pattern_overrides {
            let mut checked = self.validator.validate_override(group, &o.pattern, &o.profile);
            result.errors.append(&mut checked.errors);
            result.warnings.append(&mut checked.warnings);
        }
        result
    }

    /// "Don't show again" for the rule or group behind a clipboard match.
    ///
    /// Returns false when the match has nothing to switch off.
    pub fn disable_clipboard_notifications(&self, result: &MatchResult) -> Result<bool, RouteError> {
        match result {
            MatchResult::NoMatch => Ok(false),
            MatchResult::IndividualRule { rule } => {
                self.rules.set_clipboard_notifications(&rule.id, false)?;
                Ok(true)
            }
            MatchResult::UrlGroup { group, .. } | MatchResult::GroupOverride { group, .. } => {
                self.groups.set_clipboard_notifications(&group.id, false)?;
                Ok(true)
            }
        }
    }

    /// Whether the clipboard watcher should announce `url` right now
    pub fn should_notify_clipboard(&self, url: &str) -> Option<MatchResult> {
        if !self.settings.read().clipboard_monitoring.is_active(Utc::now()) {
            return None;
        }
        let result = self.find_match(url);
        result.clipboard_notifications_enabled().then_some(result)
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    pub fn settings(&self) -> AppSettings {
        self.settings.read().clone()
    }

    /// Persist and apply new settings
    pub fn save_settings(&self, settings: AppSettings) -> Result<(), RouteError> {
        let mut current = self.settings.write();
        settings.save_to(&self.paths.settings_file())?;
        *current = settings;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Export / import
    // ------------------------------------------------------------------

    /// Snapshot of everything, as it would be exported
    pub fn snapshot(&self) -> ExportBundle {
        ExportBundle::new(
            self.settings(),
            self.rules.list().to_vec(),
            self.groups.list().to_vec(),
        )
    }

    pub fn export_to(&self, path: &Path) -> Result<BundleSummary, RouteError> {
        let bundle = self.snapshot();
        bundle::export_to(path, &bundle)?;
        bundle.validate()
    }

    /// Replace rules, groups and settings with a validated bundle.
    ///
    /// The current data is exported to the backups directory first; if that
    /// backup cannot be written nothing is replaced. If any later step fails
    /// the previous rules, groups and settings are put back.
    pub fn import_from(&self, path: &Path) -> Result<ImportReport, RouteError> {
        let (summary, incoming) = bundle::validate_bundle_file(path)?;
        let _edit = self.edit_lock.lock();

        let previous = self.snapshot();
        let backup_path = bundle::backup_path(&self.paths.backups_dir(), Utc::now());
        bundle::export_to(&backup_path, &previous)?;
        log::info!("Backed up current data to {:?} before import", backup_path);

        let sync = match self.apply_import(incoming) {
            Ok(sync) => sync,
            Err(e) => {
                log::error!("Import failed, restoring previous data: {}", e);
                self.restore_previous(previous);
                return Err(e);
            }
        };

        log::info!("Imported {}", summary);
        Ok(ImportReport {
            summary,
            backup_path,
            sync,
        })
    }

    fn apply_import(&self, incoming: ExportBundle) -> Result<SyncReport, RouteError> {
        self.rules.replace_all(incoming.rules)?;
        self.groups.replace_all(incoming.groups)?;
        self.save_settings(incoming.settings)?;
        self.synchronizer.ensure_built_in_groups_exist()
    }

    /// Best-effort rollback of a failed import
    fn restore_previous(&self, previous: ExportBundle) {
        if let Err(e) = self.rules.replace_all(previous.rules) {
            log::error!("Could not restore previous rules: {}", e);
        }
        if let Err(e) = self.groups.replace_all(previous.groups) {
            log::error!("Could not restore previous groups: {}", e);
        }
        let settings_changed = *self.settings.read() != previous.settings;
        if settings_changed && let Err(e) = self.save_settings(previous.settings) {
            log::error!("Could not restore previous settings: {}", e);
        }
    }
}

fn policy(acknowledge_warnings: bool) -> WarningPolicy {
    if acknowledge_warnings {
        WarningPolicy::Acknowledge
    } else {
        WarningPolicy::Block
    }
}

/// Load a store, falling back to its backup copy if allowed
fn load_with_fallback<T: Entity>(store: &Store<T>, use_backup: bool) -> Result<usize, RouteError> {
    match store.load_from_persistence() {
        Ok(count) => Ok(count),
        Err(e) if use_backup => {
            log::error!("Failed to load {}: {}. Trying backup", T::COLLECTION, e);
            crate::debug_error!("STORE", "Load of {} failed: {}", T::COLLECTION, e);
            store.load_backup().map_err(|backup_err| {
                log::error!("Backup for {} unusable: {}", T::COLLECTION, backup_err);
                e
            })
        }
        Err(e) => Err(e),
    }
}
