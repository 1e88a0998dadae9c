//! Check session: the controller around one editable.
//!
//! # Responsibility
//! - Run the check pipeline: stamp, export, sketchpad, engine, resolve, mark.
//! - Own checker mode, enabled flag and the focused issue.
//! - Route clicks, ignore toggles and quick fixes back onto the editable.
//!
//! # Invariants
//! - At most one issue is focused, and only its element has the focused marker.
//! - Issue kinds toggled to ignored are recorded in `data-a11y-ignore` and
//!   restored on the next check.
//! - `close` leaves no checker attribute or class in the editable.

use crate::decorator::click::{AfterShow, CheckerController, CheckerMode, ClickOutcome};
use crate::decorator::editable::{DecoratorError, EditableDecorator};
use crate::decorator::identity::{ignored_kinds, set_ignored_kind};
use crate::decorator::marking::UnmarkTarget;
use crate::engine::cache::FixLoadError;
use crate::engine::quickfix::{FormValues, QuickFix, QuickFixError};
use crate::engine::{CheckContext, Engine, EngineError};
use crate::markup::{parse_fragment_into, FilterContext};
use crate::model::document::NodeId;
use crate::model::issue::{Issue, IssueDetails, IssueList};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use uuid::Uuid;

const SKETCHPAD_ROOT_NAME: &str = "div";

/// Session errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    Decorator(DecoratorError),
    Engine(EngineError),
    FixLoad(FixLoadError),
    QuickFix(QuickFixError),
    /// Fix input rejected; messages are user-facing.
    Validation(Vec<String>),
    IssueNotFound(usize),
    NoFocusedIssue,
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decorator(err) => write!(f, "{err}"),
            Self::Engine(err) => write!(f, "{err}"),
            Self::FixLoad(err) => write!(f, "{err}"),
            Self::QuickFix(err) => write!(f, "{err}"),
            Self::Validation(messages) => write!(f, "invalid fix input: {}", messages.join("; ")),
            Self::IssueNotFound(index) => write!(f, "issue not found at index {index}"),
            Self::NoFocusedIssue => write!(f, "no issue is focused"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Decorator(err) => Some(err),
            Self::Engine(err) => Some(err),
            Self::FixLoad(err) => Some(err),
            Self::QuickFix(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DecoratorError> for SessionError {
    fn from(value: DecoratorError) -> Self {
        Self::Decorator(value)
    }
}

impl From<EngineError> for SessionError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<FixLoadError> for SessionError {
    fn from(value: FixLoadError) -> Self {
        Self::FixLoad(value)
    }
}

impl From<QuickFixError> for SessionError {
    fn from(value: QuickFixError) -> Self {
        Self::QuickFix(value)
    }
}

/// Summary of one check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckReport {
    pub issues: usize,
    pub resolved: usize,
    pub stale: usize,
    pub ignored: usize,
}

/// Controller state the click router talks to.
#[derive(Debug, Default)]
struct ControllerState {
    mode: CheckerMode,
    enabled: bool,
    requested: Option<(NodeId, AfterShow)>,
}

impl CheckerController for ControllerState {
    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_mode(&mut self, mode: CheckerMode) {
        self.mode = mode;
    }

    fn show_issue_by_element(&mut self, node: NodeId, after: AfterShow) {
        self.requested = Some((node, after));
    }
}

/// One checking session over one editable.
pub struct CheckSession {
    id: Uuid,
    decorator: EditableDecorator,
    engine: Arc<dyn Engine>,
    issues: IssueList,
    state: ControllerState,
    focused: Option<usize>,
    last_after_show: Option<AfterShow>,
}

impl CheckSession {
    pub fn new(decorator: EditableDecorator, engine: Arc<dyn Engine>) -> Self {
        Self {
            id: Uuid::new_v4(),
            decorator,
            engine,
            issues: IssueList::new(),
            state: ControllerState {
                mode: CheckerMode::Closed,
                ..ControllerState::default()
            },
            focused: None,
            last_after_show: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> CheckerMode {
        self.state.mode
    }

    pub fn enabled(&self) -> bool {
        self.state.enabled
    }

    pub fn issues(&self) -> &IssueList {
        &self.issues
    }

    pub fn decorator(&self) -> &EditableDecorator {
        &self.decorator
    }

    pub fn decorator_mut(&mut self) -> &mut EditableDecorator {
        &mut self.decorator
    }

    pub fn engine(&self) -> &Arc<dyn Engine> {
        &self.engine
    }

    /// Index of the focused issue.
    pub fn focused_index(&self) -> Option<usize> {
        self.focused
    }

    pub fn focused_issue(&self) -> Option<&Issue> {
        self.focused.and_then(|index| self.issues.get_item(index))
    }

    /// Follow-up the last click asked the viewer to perform.
    pub fn last_after_show(&self) -> Option<AfterShow> {
        self.last_after_show
    }

    /// Runs a full check and marks the editable.
    pub async fn check(&mut self) -> Result<CheckReport, SessionError> {
        self.state.enabled = true;
        self.state.mode = CheckerMode::Checking;
        self.focused = None;

        match self.run_check().await {
            Ok(report) => {
                self.state.mode = CheckerMode::Normal;
                info!(
                    "event=check module=session status=ok session_id={} issues={} resolved={} stale={} ignored={}",
                    self.id, report.issues, report.resolved, report.stale, report.ignored
                );
                Ok(report)
            }
            Err(err) => {
                warn!(
                    "event=check module=session status=error session_id={} error={}",
                    self.id, err
                );
                self.issues.clear();
                if let Err(cleanup) = self.decorator.remove_markup() {
                    warn!(
                        "event=check_cleanup module=session status=error session_id={} error={}",
                        self.id, cleanup
                    );
                }
                self.state.mode = CheckerMode::Closed;
                self.state.enabled = false;
                Err(err)
            }
        }
    }

    async fn run_check(&mut self) -> Result<CheckReport, SessionError> {
        self.decorator.remove_markup()?;
        self.decorator.apply_markup()?;
        let markup = self.decorator.get_data_with(FilterContext {
            disable_filter_strip: true,
        })?;
        let sketchpad = parse_fragment_into(SKETCHPAD_ROOT_NAME, &markup);

        let mut issues = IssueList::new();
        let context = CheckContext::from_controller(self.id, self.state.mode, &self.state);
        self.engine.process(&context, &sketchpad, &mut issues).await?;
        let summary = self.decorator.resolve_editor_elements(&mut issues)?;
        let ignored = self.restore_ignored(&mut issues);
        self.decorator.mark_issues(&issues)?;
        self.issues = issues;

        Ok(CheckReport {
            issues: self.issues.count(),
            resolved: summary.resolved,
            stale: summary.stale,
            ignored,
        })
    }

    fn restore_ignored(&self, issues: &mut IssueList) -> usize {
        let Some(document) = self.decorator.editable() else {
            return 0;
        };
        let mut restored = 0;
        for issue in issues.iter_mut() {
            let listed = issue
                .element
                .and_then(|node| document.element(node))
                .is_some_and(|element| ignored_kinds(element).contains(&issue.id.as_str()));
            if listed {
                issue.set_ignored(true);
                restored += 1;
            }
        }
        restored
    }

    /// Routes a click on `target` inside the editable.
    pub fn click(&mut self, target: NodeId) -> Result<ClickOutcome, SessionError> {
        let outcome = self.decorator.click_listener(target, &mut self.state);
        if let Some((node, after)) = self.state.requested.take() {
            self.last_after_show = Some(after);
            self.show_issue_by_element(node)?;
        }
        Ok(outcome)
    }

    /// Focuses the first issue bound to `node`.
    pub fn show_issue_by_element(&mut self, node: NodeId) -> Result<usize, SessionError> {
        let index = self
            .issues
            .index_of_element(node)
            .ok_or(SessionError::NoFocusedIssue)?;
        self.focus_issue(index)?;
        Ok(index)
    }

    /// Moves the focused marker to issue `index`.
    pub fn focus_issue(&mut self, index: usize) -> Result<(), SessionError> {
        let node = self
            .issues
            .get_item(index)
            .ok_or(SessionError::IssueNotFound(index))?
            .element;

        if let Some(previous) = self.focused_element() {
            self.decorator.set_focused(previous, false)?;
        }
        if let Some(node) = node {
            self.decorator.set_focused(node, true)?;
        }
        self.focused = Some(index);
        Ok(())
    }

    fn focused_element(&self) -> Option<NodeId> {
        self.focused_issue().and_then(|issue| issue.element)
    }

    /// Moves focus to the next issue, wrapping around.
    pub fn next_issue(&mut self) -> Result<usize, SessionError> {
        if self.issues.is_empty() {
            return Err(SessionError::NoFocusedIssue);
        }
        let next = self
            .focused
            .map_or(0, |index| (index + 1) % self.issues.count());
        self.focus_issue(next)?;
        Ok(next)
    }

    /// Toggles the ignored flag of issue `index` and re-marks its element.
    pub fn set_issue_ignored(&mut self, index: usize, ignored: bool) -> Result<(), SessionError> {
        let issue = self
            .issues
            .get_item_mut(index)
            .ok_or(SessionError::IssueNotFound(index))?;
        issue.set_ignored(ignored);
        let kind = issue.id.clone();
        let Some(node) = issue.element else {
            return Ok(());
        };

        let document = self
            .decorator
            .editable_mut()
            .ok_or(DecoratorError::EditableUnavailable)?;
        document.with_writable(node, |element| set_ignored_kind(element, &kind, ignored));

        self.decorator
            .unmark_issue_element(UnmarkTarget::Element(node), true)?;
        let issue = self
            .issues
            .get_item(index)
            .ok_or(SessionError::IssueNotFound(index))?;
        self.decorator.mark_issue_element(issue, &self.issues)?;
        if self.focused_element() == Some(node) {
            self.decorator.set_focused(node, true)?;
        }
        Ok(())
    }

    pub async fn issue_details(&self, index: usize) -> Result<IssueDetails, SessionError> {
        let issue = self
            .issues
            .get_item(index)
            .ok_or(SessionError::IssueNotFound(index))?;
        Ok(self.engine.get_issue_details(issue).await?)
    }

    /// Quick fixes offered for the focused issue.
    pub async fn fixes_for_focused(&self) -> Result<Vec<Box<dyn QuickFix>>, SessionError> {
        let issue = self.focused_issue().ok_or(SessionError::NoFocusedIssue)?;
        Ok(self.engine.get_fixes(issue).await?)
    }

    /// Validates and applies `fix`, then checks again.
    pub async fn apply_fix(
        &mut self,
        fix: &dyn QuickFix,
        values: &FormValues,
    ) -> Result<CheckReport, SessionError> {
        let messages = fix.validate(values);
        if !messages.is_empty() {
            return Err(SessionError::Validation(messages));
        }
        let document = self
            .decorator
            .editable_mut()
            .ok_or(DecoratorError::EditableUnavailable)?;
        let node = fix.fix(document, values)?;
        info!(
            "event=apply_fix module=session status=ok session_id={} fix={} issue={} node={}",
            self.id,
            fix.name(),
            fix.issue().id,
            node
        );
        self.check().await
    }

    /// Ends the session and cleans the editable.
    pub fn close(&mut self) -> Result<(), SessionError> {
        self.decorator.remove_markup()?;
        self.issues.clear();
        self.focused = None;
        self.state.mode = CheckerMode::Closed;
        self.state.enabled = false;
        info!("event=close module=session status=ok session_id={}", self.id);
        Ok(())
    }
}
