//! Typed error variants for the linkroute-config crate.
//!
//! Provides structured error types for settings I/O and validation so
//! library consumers can match on specific failure modes.

use std::fmt;
use std::path::PathBuf;

/// Errors that can occur when loading or saving settings.
///
/// These errors are produced by `AppSettings::load_from` and
/// `AppSettings::save_to`, as well as by any helper that reads or writes
/// YAML state files in the config directory.
///
/// # Example
///
/// ```rust,no_run
/// use linkroute_config::ConfigError;
///
/// fn describe(e: &ConfigError) {
///     match e {
///         ConfigError::Io { path, source } => eprintln!("I/O error on {path:?}: {source}"),
///         ConfigError::Parse { path, source } => eprintln!("YAML parse error in {path:?}: {source}"),
///         ConfigError::Validation(msg) => eprintln!("Validation: {msg}"),
///     }
/// }
/// ```
#[derive(Debug)]
pub enum ConfigError {
    /// An I/O error occurred reading or writing a settings file.
    Io {
        /// File that was being read or written.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A settings file contained YAML that could not be parsed or produced.
    Parse {
        /// File that was being parsed.
        path: PathBuf,
        /// Underlying YAML error.
        source: serde_yaml_ng::Error,
    },

    /// A field value failed semantic validation.
    ///
    /// The inner string describes which field is invalid and why.
    Validation(String),
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, source: serde_yaml_ng::Error) -> Self {
        ConfigError::Parse {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "I/O error on settings file {}: {source}", path.display())
            }
            ConfigError::Parse { path, source } => {
                write!(f, "YAML parse error in {}: {source}", path.display())
            }
            ConfigError::Validation(msg) => write!(f, "Settings validation error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::Validation(_) => None,
        }
    }
}
