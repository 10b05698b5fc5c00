//! Typed error types for linkroute.
//!
//! Every failure the engine can report is a variant here so callers (the CLI,
//! a settings UI, the clipboard watcher) can match on it instead of parsing
//! `anyhow` strings. Malformed URLs have no variant: they resolve to
//! `MatchResult::NoMatch`.

use std::fmt;
use std::path::PathBuf;

use linkroute_config::ConfigError;
use thiserror::Error;
use uuid::Uuid;

use crate::validation::ValidationResult;

/// Which collection an id refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Rule,
    Group,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Rule => write!(f, "rule"),
            EntityKind::Group => write!(f, "group"),
        }
    }
}

/// Failures of the load/save contract behind each store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store file exists but could not be read.
    #[error("Failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store file (or its backup) could not be written.
    #[error("Failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was read but its content cannot be trusted.
    ///
    /// Never downgraded to an empty store; the caller decides whether to
    /// fall back to the backup copy.
    #[error("Store file '{}' is corrupt: {details}", path.display())]
    Corrupt { path: PathBuf, details: String },

    /// No last-known-good copy exists to fall back to.
    #[error("No backup available at '{}'", path.display())]
    NoBackup { path: PathBuf },

    /// The in-memory collection could not be serialized.
    #[error("Failed to serialize {what}: {details}")]
    Serialize { what: &'static str, details: String },

    /// Injected failure from `MemoryPersistence`.
    #[error("Simulated persistence failure")]
    Simulated,
}

/// Top-level error type for the routing engine.
#[derive(Debug, Error)]
pub enum RouteError {
    // -----------------------------------------------------------------------
    // Validation outcomes
    // -----------------------------------------------------------------------
    /// Syntax error, duplicate name or missing field. Nothing was changed.
    #[error("Validation failed: {}", .0.summary())]
    Validation(ValidationResult),

    /// Only warnings were raised, but the policy in force does not allow
    /// proceeding past them. Nothing was changed.
    #[error("Pattern conflict: {}", .0.summary())]
    Conflict(ValidationResult),

    // -----------------------------------------------------------------------
    // Store errors
    // -----------------------------------------------------------------------
    /// Update or delete referenced an id the store does not hold.
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: Uuid },

    /// Load or save failed; in-memory state was rolled back.
    #[error(transparent)]
    Persistence(#[from] StoreError),

    // -----------------------------------------------------------------------
    // Settings and bundles
    // -----------------------------------------------------------------------
    /// Settings could not be loaded or saved.
    #[error("Settings error: {0}")]
    Config(#[from] ConfigError),

    /// An export bundle failed to read, parse or validate.
    #[error("Bundle error: {0}")]
    Bundle(String),
}

impl RouteError {
    pub(crate) fn not_found(kind: EntityKind, id: Uuid) -> Self {
        RouteError::NotFound { kind, id }
    }
}
