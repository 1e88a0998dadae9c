//! Editable decorator facade.
//!
//! # Responsibility
//! - Own the editable document and its export pipeline.
//! - Expose identity, marking and click routing against that document.
//!
//! # Invariants
//! - The identity export filter is registered exactly once, at construction.
//! - Listener state survives `set_data`; only the document is replaced.
//! - Every mutation goes through `ElementAccess`; read-only content is kept.
//!
//! # See also
//! - `crate::service::session` for the controller driving this facade.

use crate::config::CheckerConfig;
use crate::decorator::click::{route_click, CheckerController, ClickOutcome};
use crate::decorator::identity::{self, IdentityFilter, ResolveSummary};
use crate::decorator::marking::{DefaultMarker, IssueMarker, UnmarkTarget};
use crate::markup::{parse_fragment_into, FilterContext, MarkupWriter};
use crate::model::document::{Document, NodeId};
use crate::model::issue::{Issue, IssueList};
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

const EDITABLE_ROOT_NAME: &str = "div";

/// Decorator errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecoratorError {
    /// No editable document is loaded.
    EditableUnavailable,
}

impl Display for DecoratorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EditableUnavailable => write!(f, "editable not available"),
        }
    }
}

impl Error for DecoratorError {}

/// Wraps one editable surface with the checker's bookkeeping.
pub struct EditableDecorator {
    editable: Option<Document>,
    writer: MarkupWriter,
    marker: Box<dyn IssueMarker>,
    listeners_attached: bool,
    disable_filter_strip: bool,
}

impl EditableDecorator {
    /// Decorator without an editable; `set_data` or `with_document` loads one.
    pub fn new(config: &CheckerConfig) -> Self {
        let mut writer = MarkupWriter::new();
        writer.add_filter(IdentityFilter {
            strip_ignore_data: config.no_ignore_data,
        });
        Self {
            editable: None,
            writer,
            marker: Box::new(DefaultMarker),
            listeners_attached: false,
            disable_filter_strip: false,
        }
    }

    pub fn with_document(config: &CheckerConfig, document: Document) -> Self {
        let mut decorator = Self::new(config);
        decorator.editable = Some(document);
        decorator
    }

    /// Swaps the marking policy.
    pub fn with_marker(mut self, marker: impl IssueMarker + 'static) -> Self {
        self.marker = Box::new(marker);
        self
    }

    pub fn editable(&self) -> Option<&Document> {
        self.editable.as_ref()
    }

    pub fn editable_mut(&mut self) -> Option<&mut Document> {
        self.editable.as_mut()
    }

    fn require_editable(&mut self) -> Result<&mut Document, DecoratorError> {
        self.editable
            .as_mut()
            .ok_or(DecoratorError::EditableUnavailable)
    }

    /// Enables click routing. Requires a loaded editable.
    pub fn add_listeners(&mut self) -> Result<(), DecoratorError> {
        if self.editable.is_none() {
            return Err(DecoratorError::EditableUnavailable);
        }
        self.listeners_attached = true;
        debug!("event=add_listeners module=decorator status=ok");
        Ok(())
    }

    pub fn listeners_attached(&self) -> bool {
        self.listeners_attached
    }

    /// Keeps identifiers in exported markup while set.
    pub fn set_disable_filter_strip(&mut self, disable: bool) {
        self.disable_filter_strip = disable;
    }

    pub fn disable_filter_strip(&self) -> bool {
        self.disable_filter_strip
    }

    /// Replaces the editable with a freshly parsed document.
    pub fn set_data(&mut self, html: &str) {
        self.editable = Some(parse_fragment_into(EDITABLE_ROOT_NAME, html));
        info!(
            "event=set_data module=decorator status=ok bytes={} listeners={}",
            html.len(),
            self.listeners_attached
        );
    }

    /// Exported markup, filtered with the decorator's current flags.
    pub fn get_data(&self) -> Result<String, DecoratorError> {
        self.get_data_with(FilterContext {
            disable_filter_strip: self.disable_filter_strip,
        })
    }

    pub fn get_data_with(&self, context: FilterContext) -> Result<String, DecoratorError> {
        let document = self
            .editable
            .as_ref()
            .ok_or(DecoratorError::EditableUnavailable)?;
        Ok(self.writer.write_children(document, document.root(), &context))
    }

    /// Stamps identifiers on the editable.
    pub fn apply_markup(&mut self) -> Result<usize, DecoratorError> {
        Ok(identity::stamp(self.require_editable()?))
    }

    /// Strips identifiers and marker classes from the editable.
    pub fn remove_markup(&mut self) -> Result<(), DecoratorError> {
        identity::unstamp(self.require_editable()?);
        Ok(())
    }

    pub fn resolve_editor_elements(
        &mut self,
        issues: &mut IssueList,
    ) -> Result<ResolveSummary, DecoratorError> {
        let document = self.require_editable()?;
        let summary = identity::resolve(issues, document);
        debug!(
            "event=resolve module=decorator status=ok resolved={} stale={}",
            summary.resolved, summary.stale
        );
        Ok(summary)
    }

    pub fn mark_issues(&mut self, issues: &IssueList) -> Result<(), DecoratorError> {
        let document = self
            .editable
            .as_mut()
            .ok_or(DecoratorError::EditableUnavailable)?;
        self.marker.mark_issues(document, issues);
        Ok(())
    }

    pub fn mark_issue_element(
        &mut self,
        issue: &Issue,
        issues: &IssueList,
    ) -> Result<(), DecoratorError> {
        let document = self
            .editable
            .as_mut()
            .ok_or(DecoratorError::EditableUnavailable)?;
        self.marker.mark_issue_element(document, issue, issues);
        Ok(())
    }

    pub fn unmark_issue_element(
        &mut self,
        target: UnmarkTarget<'_>,
        keep_common_marker: bool,
    ) -> Result<(), DecoratorError> {
        let document = self
            .editable
            .as_mut()
            .ok_or(DecoratorError::EditableUnavailable)?;
        self.marker
            .unmark_issue_element(document, target, keep_common_marker);
        Ok(())
    }

    pub fn set_focused(&mut self, node: NodeId, focused: bool) -> Result<(), DecoratorError> {
        let document = self
            .editable
            .as_mut()
            .ok_or(DecoratorError::EditableUnavailable)?;
        self.marker.set_focused(document, node, focused);
        Ok(())
    }

    /// Routes a click on `target`. Without listeners the click is ignored.
    pub fn click_listener(
        &self,
        target: NodeId,
        controller: &mut dyn CheckerController,
    ) -> ClickOutcome {
        match self.editable.as_ref() {
            Some(document) if self.listeners_attached => route_click(document, target, controller),
            _ => ClickOutcome::Ignored,
        }
    }
}
