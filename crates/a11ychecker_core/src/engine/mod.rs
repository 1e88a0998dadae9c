//! Checking engines and quick fix resolution.
//!
//! # Responsibility
//! - Define the engine contract the session drives.
//! - Resolve quick fixes for an issue through the engine's fix mapping.
//!
//! # Invariants
//! - `get_fixes` returns one instance per mapped type, in mapping order.
//! - `get_fixes` resolves only after every mapped type is loaded.
//! - An unmapped issue kind yields an empty list without touching the cache.
//!
//! # See also
//! - `cache` for load memoization.

pub mod cache;
pub mod loader;
pub mod quickfix;
pub mod rules;

use crate::decorator::click::{CheckerController, CheckerMode};
use crate::model::document::Document;
use crate::model::issue::{Issue, IssueDetails, IssueList};
use async_trait::async_trait;
use futures::future::try_join_all;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use uuid::Uuid;

pub use cache::{FixLoadError, FixTypeCache};
pub use loader::{BuiltinFixLoader, FixTypeLoad, FixTypeLoader};
pub use quickfix::{FixForm, FormInput, FormValues, InputKind, QuickFix, QuickFixError, QuickFixType};
pub use rules::RuleEngine;

/// Controller state handed to an engine for one `process` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CheckContext {
    /// Session that started the run; nil outside a session.
    pub session_id: Uuid,
    pub mode: CheckerMode,
    pub enabled: bool,
}

impl CheckContext {
    /// Snapshot of `controller` for the run started by `session_id`.
    pub fn from_controller(
        session_id: Uuid,
        mode: CheckerMode,
        controller: &dyn CheckerController,
    ) -> Self {
        Self {
            session_id,
            mode,
            enabled: controller.enabled(),
        }
    }
}

/// Issue kind id to ordered fix type names.
pub type FixesMapping = BTreeMap<String, Vec<String>>;

/// Engine failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The engine could not check the content.
    Process(String),
    /// No details are known for this issue kind.
    UnknownIssue(String),
    FixLoad(FixLoadError),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Process(message) => write!(f, "engine failed to process content: {message}"),
            Self::UnknownIssue(id) => write!(f, "unknown issue kind: {id}"),
            Self::FixLoad(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::FixLoad(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FixLoadError> for EngineError {
    fn from(value: FixLoadError) -> Self {
        Self::FixLoad(value)
    }
}

/// Accessibility checking engine.
///
/// Implementors provide `process` and `get_issue_details`; fix lookup has
/// working defaults built on `fixes_mapping` and `fix_cache`.
#[async_trait]
pub trait Engine: Send + Sync {
    fn name(&self) -> &str;

    fn fixes_mapping(&self) -> &FixesMapping;

    fn fix_cache(&self) -> &FixTypeCache;

    /// Checks `content` (a detached copy of the editable) and appends the
    /// issues found to `issues`.
    async fn process(
        &self,
        context: &CheckContext,
        content: &Document,
        issues: &mut IssueList,
    ) -> Result<(), EngineError>;

    async fn get_issue_details(&self, issue: &Issue) -> Result<IssueDetails, EngineError>;

    async fn get_fix_type(&self, name: &str) -> Result<Arc<dyn QuickFixType>, FixLoadError> {
        self.fix_cache().get(name).await
    }

    /// Fix instances bound to `issue`, in mapping order.
    async fn get_fixes(&self, issue: &Issue) -> Result<Vec<Box<dyn QuickFix>>, FixLoadError> {
        let names = match self.fixes_mapping().get(&issue.id) {
            Some(names) if !names.is_empty() => names,
            _ => return Ok(Vec::new()),
        };
        let types = try_join_all(names.iter().map(|name| self.get_fix_type(name))).await?;
        Ok(types
            .iter()
            .map(|fix_type| fix_type.create(issue.clone()))
            .collect())
    }
}
