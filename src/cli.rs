//! Command-line interface for linkroute.
//!
//! Argument parsing plus the subcommands that drive a `LinkRouter`.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{BrowserProfile, ConfigPaths, UrlGroup, UrlRule};
use crate::error::RouteError;
use crate::pattern::normalize_pattern;
use crate::resolver::{LaunchPlan, MatchResult};
use crate::router::LinkRouter;
use crate::templates::restorable_count;

/// linkroute - Route every link to the right browser and profile
#[derive(Parser)]
#[command(name = "linkroute")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config directory (defaults to LINKROUTE_CONFIG_DIR or ~/.config/linkroute)
    #[arg(long, value_name = "DIR", global = true)]
    pub config_dir: Option<PathBuf>,

    /// Log level: 0=off, 1=error, 2=info, 3=debug, 4=trace
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<u8>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show which browser profile a URL would open in
    Resolve {
        url: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Bring built-in groups up to date with their templates
    Sync,

    /// Check a pattern without saving anything
    Validate { pattern: String },

    /// Manage individual rules
    Rules {
        #[command(subcommand)]
        action: RuleCommands,
    },

    /// Manage URL groups
    Groups {
        #[command(subcommand)]
        action: GroupCommands,
    },

    /// Export rules, groups and settings to a JSON bundle
    Export { file: PathBuf },

    /// Replace rules, groups and settings with a JSON bundle
    Import {
        file: PathBuf,

        /// Only validate the bundle and print its summary
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the config file locations
    Paths,
}

#[derive(Subcommand)]
pub enum RuleCommands {
    /// List rules in store order
    List,

    /// Add a rule
    Add {
        pattern: String,

        /// Browser display name
        #[arg(long)]
        browser: String,

        /// Browser executable
        #[arg(long, value_name = "PATH")]
        browser_path: String,

        /// Profile display name
        #[arg(long, default_value = "")]
        profile: String,

        /// Extra launch arguments selecting the profile
        #[arg(long, value_name = "ARGS", default_value = "", allow_hyphen_values = true)]
        args: String,

        /// Save despite conflict warnings
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Delete a rule by id or pattern
    Delete { rule: String },
}

#[derive(Subcommand)]
pub enum GroupCommands {
    /// List groups in store order
    List,

    /// Re-add template patterns removed from a built-in group
    Restore { group: String },
}

/// Runtime options passed from CLI to the router
#[derive(Debug, Default)]
pub struct RuntimeOptions {
    /// Explicit config directory
    pub config_dir: Option<PathBuf>,
    /// Log level override from `--log-level`
    pub log_level: Option<u8>,
    pub command: Option<CommandKind>,
}

/// Parsed subcommand, detached from clap so it can be built in tests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    Resolve { url: String, json: bool },
    Sync,
    Validate { pattern: String },
    ListRules,
    AddRule { rule: RuleArgs, acknowledge: bool },
    DeleteRule { rule: String },
    ListGroups,
    RestoreGroup { group: String },
    Export { file: PathBuf },
    Import { file: PathBuf, dry_run: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleArgs {
    pub pattern: String,
    pub browser: String,
    pub browser_path: String,
    pub profile: String,
    pub args: String,
}

/// Result of CLI processing
pub enum CliResult {
    /// Continue with router startup
    Continue(RuntimeOptions),
    /// Exit with the given code (subcommand completed)
    Exit(i32),
}

/// Process CLI arguments and handle subcommands that need no router
pub fn process_cli() -> CliResult {
    let cli = Cli::parse();

    let command = match cli.command {
        Some(Commands::Paths) => {
            print_paths(&config_paths(cli.config_dir.as_ref()));
            return CliResult::Exit(0);
        }
        Some(command) => command.into_kind(),
        None => None,
    };

    CliResult::Continue(RuntimeOptions {
        config_dir: cli.config_dir,
        log_level: cli.log_level,
        command,
    })
}

impl Commands {
    fn into_kind(self) -> Option<CommandKind> {
        let kind = match self {
            Commands::Resolve { url, json } => CommandKind::Resolve { url, json },
            Commands::Sync => CommandKind::Sync,
            Commands::Validate { pattern } => CommandKind::Validate { pattern },
            Commands::Rules { action } => match action {
                RuleCommands::List => CommandKind::ListRules,
                RuleCommands::Add {
                    pattern,
                    browser,
                    browser_path,
                    profile,
                    args,
                    yes,
                } => CommandKind::AddRule {
                    rule: RuleArgs {
                        pattern,
                        browser,
                        browser_path,
                        profile,
                        args,
                    },
                    acknowledge: yes,
                },
                RuleCommands::Delete { rule } => CommandKind::DeleteRule { rule },
            },
            Commands::Groups { action } => match action {
                GroupCommands::List => CommandKind::ListGroups,
                GroupCommands::Restore { group } => CommandKind::RestoreGroup { group },
            },
            Commands::Export { file } => CommandKind::Export { file },
            Commands::Import { file, dry_run } => CommandKind::Import { file, dry_run },
            Commands::Paths => return None,
        };
        Some(kind)
    }
}

fn config_paths(config_dir: Option<&PathBuf>) -> ConfigPaths {
    match config_dir {
        Some(dir) => ConfigPaths::new(dir),
        None => ConfigPaths::resolve(),
    }
}

fn print_paths(paths: &ConfigPaths) {
    println!("Config directory: {}", paths.root().display());
    println!("  rules:    {}", paths.rules_file().display());
    println!("  groups:   {}", paths.groups_file().display());
    println!("  settings: {}", paths.settings_file().display());
    println!("  backups:  {}", paths.backups_dir().display());
    println!("Debug log: {}", crate::debug::log_file_path().display());
}

/// Open the router and run the requested command, returning the exit code
pub fn run(options: RuntimeOptions) -> Result<i32> {
    let paths = config_paths(options.config_dir.as_ref());
    let router = LinkRouter::open(paths.clone())
        .with_context(|| format!("Failed to load configuration from {}", paths.root().display()))?;

    match options.command {
        None => {
            println!(
                "{} rules, {} groups loaded from {}",
                router.rules().len(),
                router.groups().len(),
                paths.root().display()
            );
            println!("Run `linkroute --help` for commands.");
            Ok(0)
        }
        Some(command) => run_command(&router, command),
    }
}

/// Execute one command against an open router
pub fn run_command(router: &LinkRouter, command: CommandKind) -> Result<i32> {
    match command {
        CommandKind::Resolve { url, json } => {
            let result = router.find_match(&url);
            if json {
                println!("{}", serde_json::to_string_pretty(&match_json(router, &url, &result))?);
            } else {
                print_match(router, &url, &result);
            }
            Ok(if result.is_match() { 0 } else { 1 })
        }
        CommandKind::Sync => {
            let report = router.ensure_built_in_groups_exist()?;
            println!(
                "{} created, {} updated, {} patterns added",
                report.created.len(),
                report.updated.len(),
                report.patterns_added
            );
            for skipped in &report.skipped {
                println!(
                    "  skipped '{}' in '{}': already used by {}",
                    skipped.pattern, skipped.group, skipped.owner
                );
            }
            Ok(0)
        }
        CommandKind::Validate { pattern } => {
            let result = router.validator().validate_pattern(&pattern, None);
            println!(
                "Normalized: {}",
                result.normalized_value.as_deref().unwrap_or_default()
            );
            for issue in &result.errors {
                println!("  error: {issue}");
            }
            for issue in &result.warnings {
                println!("  warning: {issue}");
            }
            Ok(if result.is_valid() { 0 } else { 1 })
        }
        CommandKind::ListRules => {
            for rule in router.rules().list().iter() {
                println!(
                    "{}  {:<32} -> {}",
                    rule.id,
                    rule.pattern,
                    rule.profile.display_name()
                );
            }
            Ok(0)
        }
        CommandKind::AddRule { rule, acknowledge } => {
            let profile = BrowserProfile::new(rule.browser, rule.browser_path)
                .profile_name(rule.profile)
                .profile_arguments(rule.args);
            match router.add_rule(UrlRule::new(rule.pattern, profile), acknowledge) {
                Ok(id) => {
                    println!("Added rule {id}");
                    Ok(0)
                }
                Err(RouteError::Conflict(result)) => {
                    eprintln!("Not saved: {}", result.summary());
                    eprintln!("Re-run with --yes to save anyway.");
                    Ok(2)
                }
                Err(e) => Err(e.into()),
            }
        }
        CommandKind::DeleteRule { rule } => {
            let id = match uuid::Uuid::parse_str(&rule) {
                Ok(id) => id,
                Err(_) => match router.rules().find_by_pattern(&normalize_pattern(&rule)) {
                    Some(found) => found.id,
                    None => bail!("No rule matches '{rule}'"),
                },
            };
            let removed = router.delete_rule(&id)?;
            println!("Deleted rule '{}'", removed.pattern);
            Ok(0)
        }
        CommandKind::ListGroups => {
            for group in router.groups().list().iter() {
                print_group(group);
            }
            Ok(0)
        }
        CommandKind::RestoreGroup { group } => {
            let found = find_group(router, &group)?;
            let restored = router.restore_template_patterns(&found.id)?;
            if restored.is_empty() {
                println!("Nothing to restore in '{}'", found.name);
            } else {
                println!("Restored {} patterns in '{}':", restored.len(), found.name);
                for pattern in restored {
                    println!("  {pattern}");
                }
            }
            Ok(0)
        }
        CommandKind::Export { file } => {
            let summary = router.export_to(&file)?;
            println!("Exported {} to {}", summary, file.display());
            Ok(0)
        }
        CommandKind::Import { file, dry_run } => {
            if dry_run {
                let (summary, _) = crate::bundle::validate_bundle_file(&file)?;
                println!("{summary}");
                for warning in &summary.warnings {
                    println!("  warning: {warning}");
                }
                return Ok(0);
            }
            let report = router.import_from(&file)?;
            println!("Imported {}", report.summary);
            println!("Previous data saved to {}", report.backup_path.display());
            Ok(0)
        }
    }
}

fn find_group(router: &LinkRouter, key: &str) -> Result<UrlGroup> {
    let found = match uuid::Uuid::parse_str(key) {
        Ok(id) => router.groups().get(&id),
        Err(_) => router.groups().find_by_name(key),
    };
    found.with_context(|| format!("No group matches '{key}'"))
}

fn print_group(group: &UrlGroup) {
    let marker = if group.is_built_in { " (built-in)" } else { "" };
    println!("{}  {}{}", group.id, group.name, marker);
    let profiles = group.effective_profiles();
    if profiles.is_empty() {
        println!("    no profile assigned, group is inactive");
    }
    for profile in &profiles {
        println!("    -> {}", profile.display_name());
    }
    for pattern in &group.url_patterns {
        println!("    {pattern}");
    }
    for o in &group.pattern_overrides {
        println!("    {} -> {}", o.pattern, o.profile.display_name());
    }
    let restorable = restorable_count(group);
    if restorable > 0 {
        println!("    {restorable} template patterns can be restored");
    }
}

fn print_match(router: &LinkRouter, url: &str, result: &MatchResult) {
    if !result.is_match() {
        println!("{url}: no match");
    } else {
        println!(
            "{url}: {} '{}' via '{}'",
            result.match_type(),
            result.rule_or_group_name(),
            result.matched_pattern().unwrap_or_default()
        );
        if result.requires_picker() {
            println!("  profile picker with:");
            for profile in result.candidate_profiles() {
                println!("    {}", profile.display_name());
            }
        }
    }
    match result.launch_plan(url, &router.settings()) {
        LaunchPlan::Browser { program, args } | LaunchPlan::DefaultBrowser { program, args } => {
            println!("  launch: {} {}", program, shell_words::join(&args));
        }
        LaunchPlan::SystemDefault { .. } => println!("  launch: system default handler"),
    }
}

fn match_json(router: &LinkRouter, url: &str, result: &MatchResult) -> serde_json::Value {
    let launch = match result.launch_plan(url, &router.settings()) {
        LaunchPlan::Browser { program, args } => {
            serde_json::json!({ "kind": "browser", "program": program, "args": args })
        }
        LaunchPlan::DefaultBrowser { program, args } => {
            serde_json::json!({ "kind": "default_browser", "program": program, "args": args })
        }
        LaunchPlan::SystemDefault { .. } => serde_json::json!({ "kind": "system_default" }),
    };
    let candidates: Vec<_> = result.candidate_profiles().iter().map(|p| p.display_name()).collect();
    serde_json::json!({
        "url": url,
        "match_type": result.match_type().as_str(),
        "name": result.rule_or_group_name(),
        "pattern": result.matched_pattern(),
        "browser_name": result.browser_name(),
        "browser_path": result.browser_path(),
        "profile_name": result.profile_name(),
        "profile_arguments": result.profile_arguments(),
        "requires_picker": result.requires_picker(),
        "candidates": candidates,
        "launch": launch,
    })
}
