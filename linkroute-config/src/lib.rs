//! Data model and configuration for the linkroute URL routing engine.
//!
//! This crate is a pure data/config crate. It provides:
//!
//! - Browser profiles, individual rules and URL groups
//! - The built-in group templates shipped with each release
//! - Application settings and their YAML persistence
//! - Config directory resolution and atomic file writes

pub mod browser;
pub mod defaults;
pub mod error;
pub mod group;
pub mod paths;
pub mod persistence;
pub mod rule;
pub mod settings;
pub mod templates;

// Re-export main types for convenience
pub use browser::BrowserProfile;
pub use error::ConfigError;
pub use group::{GroupBehavior, GroupId, PatternOverride, UrlGroup};
pub use paths::{ConfigPaths, default_config_dir};
pub use persistence::{backup_path_for, write_atomic};
pub use rule::{RuleId, UrlRule};
pub use settings::{AppSettings, ClipboardMonitoring};
pub use templates::{BuiltInTemplate, builtin_templates, find_template};
