//! Click routing from editable content to issues.
//!
//! The router never changes modes itself; it asks the controller.

use crate::decorator::marking::{FOCUSED_CLASS, ISSUE_CLASS};
use crate::model::document::{Document, NodeId};
use serde::Serialize;

/// Checker interaction modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckerMode {
    /// Issue viewer open, navigating issues.
    #[default]
    Normal,
    /// User edits content; the viewer waits for a re-check.
    Listening,
    /// An engine run is in progress.
    Checking,
    /// No check active.
    Closed,
}

/// Follow-up requested once an issue is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterShow {
    /// Move keyboard focus to the viewer's "next" control.
    FocusNext,
}

/// Controller side of click routing.
pub trait CheckerController {
    fn enabled(&self) -> bool;
    fn set_mode(&mut self, mode: CheckerMode);
    fn show_issue_by_element(&mut self, node: NodeId, after: AfterShow);
}

/// Branch taken for one click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Focused issue clicked again: the user wants to edit it.
    EditFocused(NodeId),
    ShowIssue(NodeId),
    /// Click outside any issue while the checker is enabled.
    Listen,
    Ignored,
}

/// `target` itself or its closest ancestor carrying the issue marker.
pub fn find_marked(document: &Document, target: NodeId) -> Option<NodeId> {
    std::iter::once(target)
        .chain(document.ancestors(target))
        .find(|node| {
            document
                .element(*node)
                .is_some_and(|element| element.has_class(ISSUE_CLASS))
        })
}

pub fn route_click(
    document: &Document,
    target: NodeId,
    controller: &mut dyn CheckerController,
) -> ClickOutcome {
    match find_marked(document, target) {
        Some(node) => {
            let focused = document
                .element(node)
                .is_some_and(|element| element.has_class(FOCUSED_CLASS));
            if focused {
                controller.set_mode(CheckerMode::Listening);
                ClickOutcome::EditFocused(node)
            } else {
                controller.show_issue_by_element(node, AfterShow::FocusNext);
                controller.set_mode(CheckerMode::Normal);
                ClickOutcome::ShowIssue(node)
            }
        }
        None if controller.enabled() => {
            controller.set_mode(CheckerMode::Listening);
            ClickOutcome::Listen
        }
        None => ClickOutcome::Ignored,
    }
}
