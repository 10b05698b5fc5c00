//! Debug logging infrastructure for linkroute.
//!
//! Controlled by the `DEBUG_LEVEL` environment variable:
//! - 0 or unset: No debugging
//! - 1: Errors only
//! - 2: Info level (store loads/saves, template sync)
//! - 3: Debug level (validation and match decisions)
//! - 4: Trace level (every pattern evaluated)
//!
//! All output goes to `linkroute_debug.log` in the system temp directory so
//! that callers piping CLI output (e.g. `linkroute resolve --json`) never see
//! log lines on stdout.
//!
//! `init_log_bridge` additionally routes records from the `log` facade into
//! the same file, mirroring them to stderr when `RUST_LOG` is set.

use parking_lot::Mutex;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

/// Debug level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DebugLevel {
    Off = 0,
    Error = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl DebugLevel {
    fn from_env() -> Self {
        match std::env::var("DEBUG_LEVEL") {
            Ok(val) => Self::from_number(val.trim()),
            Err(_) => DebugLevel::Off,
        }
    }

    fn from_number(val: &str) -> Self {
        match val.parse::<u8>() {
            Ok(1) => DebugLevel::Error,
            Ok(2) => DebugLevel::Info,
            Ok(3) => DebugLevel::Debug,
            Ok(4) => DebugLevel::Trace,
            _ => DebugLevel::Off,
        }
    }

    fn from_log_level(level: log::Level) -> Self {
        match level {
            log::Level::Error | log::Level::Warn => DebugLevel::Error,
            log::Level::Info => DebugLevel::Info,
            log::Level::Debug => DebugLevel::Debug,
            log::Level::Trace => DebugLevel::Trace,
        }
    }

    fn to_level_filter(self) -> log::LevelFilter {
        match self {
            DebugLevel::Off => log::LevelFilter::Off,
            DebugLevel::Error => log::LevelFilter::Warn,
            DebugLevel::Info => log::LevelFilter::Info,
            DebugLevel::Debug => log::LevelFilter::Debug,
            DebugLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Global debug logger
struct DebugLogger {
    level: DebugLevel,
    file: Option<std::fs::File>,
    mirror_stderr: bool,
}

impl DebugLogger {
    fn new() -> Self {
        let mut logger = DebugLogger {
            level: DebugLevel::from_env(),
            file: None,
            mirror_stderr: std::env::var_os("RUST_LOG").is_some(),
        };
        if logger.level != DebugLevel::Off {
            logger.open_file();
        }
        logger
    }

    fn open_file(&mut self) {
        if self.file.is_some() {
            return;
        }
        let log_path = log_file_path();
        match OpenOptions::new()
            .write(true)
            .truncate(true)
            .create(true)
            .open(&log_path)
        {
            Ok(f) => {
                self.file = Some(f);
                let level = self.level;
                self.write_raw(&format!(
                    "\n{}\nlinkroute debug session started at {} (level={:?})\n{}\n",
                    "=".repeat(80),
                    get_timestamp(),
                    level,
                    "=".repeat(80)
                ));
            }
            Err(_e) => {
                // Silently fail if the log file can't be opened; logging must
                // never make a routing decision fail.
            }
        }
    }

    fn write_raw(&mut self, msg: &str) {
        if let Some(ref mut file) = self.file {
            let _ = file.write_all(msg.as_bytes());
            let _ = file.flush();
        }
    }

    fn log(&mut self, level: DebugLevel, category: &str, msg: &str) {
        if level > self.level {
            return;
        }
        let level_str = match level {
            DebugLevel::Error => "ERROR",
            DebugLevel::Info => "INFO ",
            DebugLevel::Debug => "DEBUG",
            DebugLevel::Trace => "TRACE",
            DebugLevel::Off => return,
        };
        let line = format!(
            "[{}] [{}] [{}] {}\n",
            get_timestamp(),
            level_str,
            category,
            msg
        );
        self.write_raw(&line);
        if self.mirror_stderr {
            eprint!("{line}");
        }
    }
}

static LOGGER: OnceLock<Mutex<DebugLogger>> = OnceLock::new();

fn get_logger() -> &'static Mutex<DebugLogger> {
    LOGGER.get_or_init(|| Mutex::new(DebugLogger::new()))
}

fn get_timestamp() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}.{:06}", now.as_secs(), now.subsec_micros())
}

/// Location of the debug log file
pub fn log_file_path() -> std::path::PathBuf {
    std::env::temp_dir().join("linkroute_debug.log")
}

/// Check if debugging is enabled at given level
pub fn is_enabled(level: DebugLevel) -> bool {
    let logger = get_logger().lock();
    level <= logger.level
}

/// Log a message at specified level
pub fn log(level: DebugLevel, category: &str, msg: &str) {
    let mut logger = get_logger().lock();
    logger.log(level, category, msg);
}

/// Log formatted message
pub fn logf(level: DebugLevel, category: &str, args: fmt::Arguments) {
    if is_enabled(level) {
        log(level, category, &format!("{}", args));
    }
}

/// Bridges the `log` facade into the debug log file
struct LogBridge;

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        is_enabled(DebugLevel::from_log_level(metadata.level()))
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let category = record.target().rsplit("::").next().unwrap_or("linkroute");
        log(
            DebugLevel::from_log_level(record.level()),
            category,
            &record.args().to_string(),
        );
    }

    fn flush(&self) {}
}

static BRIDGE: LogBridge = LogBridge;

/// Install the `log` bridge.
///
/// `override_level` (from `--log-level`) takes precedence over `DEBUG_LEVEL`.
/// Calling this more than once is harmless; only the first call installs the
/// bridge.
pub fn init_log_bridge(override_level: Option<u8>) {
    {
        let mut logger = get_logger().lock();
        if let Some(level) = override_level {
            logger.level = DebugLevel::from_number(&level.to_string());
        }
        if logger.level != DebugLevel::Off {
            logger.open_file();
        }
        log::set_max_level(logger.level.to_level_filter());
    }
    let _ = log::set_logger(&BRIDGE);
}

// Convenience macros for logging
#[macro_export]
macro_rules! debug_error {
    ($category:expr, $($arg:tt)*) => {
        $crate::debug::logf($crate::debug::DebugLevel::Error, $category, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug_info {
    ($category:expr, $($arg:tt)*) => {
        $crate::debug::logf($crate::debug::DebugLevel::Info, $category, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug_log {
    ($category:expr, $($arg:tt)*) => {
        $crate::debug::logf($crate::debug::DebugLevel::Debug, $category, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug_trace {
    ($category:expr, $($arg:tt)*) => {
        $crate::debug::logf($crate::debug::DebugLevel::Trace, $category, format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parsing() {
        assert_eq!(DebugLevel::from_number("0"), DebugLevel::Off);
        assert_eq!(DebugLevel::from_number("3"), DebugLevel::Debug);
        assert_eq!(DebugLevel::from_number("nope"), DebugLevel::Off);
        assert!(DebugLevel::Trace > DebugLevel::Info);
    }

    #[test]
    fn test_log_levels_map_onto_debug_levels() {
        assert_eq!(DebugLevel::from_log_level(log::Level::Warn), DebugLevel::Error);
        assert_eq!(DebugLevel::from_log_level(log::Level::Info), DebugLevel::Info);
        assert_eq!(
            DebugLevel::Debug.to_level_filter(),
            log::LevelFilter::Debug
        );
    }
}
