// Library exports for the CLI, integration tests and embedding applications.
//
// The engine is built around one `router::LinkRouter` created at startup.
// Stores hand out immutable snapshots (`arc_swap`) to readers and serialize
// writers behind a `parking_lot::Mutex`; nothing here is async.

/// Application version (root crate version, for use by sub-crates).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[macro_use]
pub mod debug;

pub mod bundle;
pub mod cli;
pub mod error;
pub mod pattern;
pub mod resolver;
pub mod router;
pub mod store;
pub mod templates;
pub mod validation;

pub use error::{EntityKind, RouteError, StoreError};
pub use linkroute_config as config;
pub use resolver::{LaunchPlan, MatchResolver, MatchResult, MatchType, ProfileResolution};
pub use router::{ImportReport, LinkRouter};
pub use store::{GroupStore, RuleStore};
pub use templates::{SyncReport, TemplateSynchronizer};
pub use validation::{ValidationResult, ValidationService, WarningPolicy};
