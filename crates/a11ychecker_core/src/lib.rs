//! Core of the accessibility checker overlay.
//! Keeps issue-to-element bindings stable across markup round-trips and
//! renders issue state onto the live editable.

pub mod config;
pub mod decorator;
pub mod engine;
pub mod logging;
pub mod markup;
pub mod model;
pub mod service;

pub use config::{CheckerConfig, ConfigError};
pub use decorator::{
    CheckerMode, ClickOutcome, DecoratorError, EditableDecorator, IssueMarker, UnmarkTarget,
};
pub use engine::{
    BuiltinFixLoader, CheckContext, Engine, EngineError, FixLoadError, FixTypeCache, FixTypeLoader,
    FixesMapping, QuickFix, QuickFixType, RuleEngine,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::document::{Access, Document, Element, NodeId};
pub use model::issue::{Issue, IssueDetails, IssueList, Testability};
pub use service::{CheckReport, CheckSession, SessionError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
