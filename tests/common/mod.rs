//! Shared integration test helpers for linkroute.
//!
//! Include this module at the top of each test file that needs it:
//!
//! ```ignore
//! mod common;
//! use common::{TestContext, chrome};
//! ```
//!
//! The `#[allow(dead_code)]` attribute suppresses warnings when only a subset
//! of helpers are used per file.

#![allow(dead_code)]

use std::sync::Arc;

use linkroute::LinkRouter;
use linkroute::config::{AppSettings, BrowserProfile, ConfigPaths, UrlGroup};
use linkroute::store::{GroupStore, MemoryPersistence, RuleStore};
use tempfile::TempDir;

/// A Chrome profile selected with `--profile-directory`
pub fn chrome(profile: &str) -> BrowserProfile {
    BrowserProfile::new("Chrome", "/usr/bin/google-chrome")
        .browser_type("chrome")
        .profile_name(profile)
        .profile_arguments(format!("--profile-directory=\"{profile}\""))
}

/// Firefox without a profile selector
pub fn firefox() -> BrowserProfile {
    BrowserProfile::new("Firefox", "/usr/bin/firefox").browser_type("firefox")
}

/// A custom group routed to a single profile
pub fn group(name: &str, patterns: &[&str], profile: BrowserProfile) -> UrlGroup {
    UrlGroup::new(name)
        .url_patterns(patterns.iter().copied())
        .profiles(vec![profile])
}

/// A router over a temp config directory.
///
/// The `TempDir` must be kept alive for the duration of the test.
pub struct TestContext {
    pub dir: TempDir,
    pub router: LinkRouter,
}

impl TestContext {
    /// Router over in-memory stores with no built-in groups
    pub fn in_memory() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let router = LinkRouter::from_parts(
            ConfigPaths::new(dir.path()),
            Arc::new(RuleStore::new(MemoryPersistence::new())),
            Arc::new(GroupStore::new(MemoryPersistence::new())),
            AppSettings::default(),
        );
        Self { dir, router }
    }

    /// Router opened from a fresh config directory, built-in groups included
    pub fn on_disk() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let router = LinkRouter::open(ConfigPaths::new(dir.path())).expect("Failed to open router");
        Self { dir, router }
    }

    pub fn paths(&self) -> ConfigPaths {
        ConfigPaths::new(self.dir.path())
    }

    /// Open a second router over the same directory, as a restart would
    pub fn reopen(&self) -> LinkRouter {
        LinkRouter::open(self.paths()).expect("Failed to reopen router")
    }
}
