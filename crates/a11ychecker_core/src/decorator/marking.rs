//! Issue marker classes.
//!
//! # Responsibility
//! - Translate bound issues into marker classes on live elements.
//! - Remove marker classes when issues go away or the check closes.
//!
//! # Invariants
//! - A marked element carries `ISSUE_CLASS` plus exactly one of the
//!   severity classes or `IGNORED_CLASS`.
//! - An element shows `IGNORED_CLASS` only when all of its issues are
//!   ignored; otherwise it shows the highest non-ignored severity.
//! - Marking a whole list gives the same classes in any issue order.

use crate::model::document::{Document, NodeId};
use crate::model::issue::{Issue, IssueList, Testability};
use log::debug;

pub const ISSUE_CLASS: &str = "cke_a11ychecker_issue";
pub const ERROR_CLASS: &str = "cke_a11ychecker_error";
pub const WARNING_CLASS: &str = "cke_a11ychecker_warning";
pub const NOTICE_CLASS: &str = "cke_a11ychecker_notice";
pub const IGNORED_CLASS: &str = "cke_a11ychecker_ignored";
pub const FOCUSED_CLASS: &str = "cke_a11y_focused";

const SEVERITY_CLASSES: [&str; 3] = [ERROR_CLASS, WARNING_CLASS, NOTICE_CLASS];

/// Marker class for one severity tier.
pub fn testability_class(testability: Testability) -> &'static str {
    match testability {
        Testability::Notice => NOTICE_CLASS,
        Testability::Warning => WARNING_CLASS,
        Testability::Error => ERROR_CLASS,
    }
}

/// What `unmark_issue_element` operates on.
#[derive(Debug, Clone, Copy)]
pub enum UnmarkTarget<'a> {
    Element(NodeId),
    Issue(&'a Issue),
}

impl UnmarkTarget<'_> {
    fn node(&self) -> Option<NodeId> {
        match self {
            Self::Element(node) => Some(*node),
            Self::Issue(issue) => issue.element,
        }
    }
}

impl From<NodeId> for UnmarkTarget<'_> {
    fn from(node: NodeId) -> Self {
        Self::Element(node)
    }
}

impl<'a> From<&'a Issue> for UnmarkTarget<'a> {
    fn from(issue: &'a Issue) -> Self {
        Self::Issue(issue)
    }
}

/// Marking policy. Hosts override `mark_ignored_issue` to change how
/// ignored elements look; the rest is shared.
pub trait IssueMarker: Send + Sync {
    fn mark_issues(&self, document: &mut Document, issues: &IssueList) {
        for issue in issues {
            self.mark_issue_element(document, issue, issues);
        }
    }

    fn mark_issue_element(&self, document: &mut Document, issue: &Issue, issues: &IssueList) {
        let Some(node) = issue.element else {
            debug!(
                "event=mark_issue module=decorator status=skip issue={} reason=unresolved",
                issue.id
            );
            return;
        };

        let visible = issues.get_issues_by_element(node, true);
        let should_be_ignored = issue.is_ignored() && visible.is_empty();
        let severity = visible
            .iter()
            .map(|other| other.testability)
            .max()
            .unwrap_or(issue.testability);

        let marked = document.with_writable(node, |element| {
            element.add_class(ISSUE_CLASS);
            if should_be_ignored {
                for class in SEVERITY_CLASSES {
                    element.remove_class(class);
                }
                return;
            }
            element.remove_class(IGNORED_CLASS);
            let wanted = testability_class(severity);
            for class in SEVERITY_CLASSES {
                if class == wanted {
                    element.add_class(class);
                } else {
                    element.remove_class(class);
                }
            }
        });

        if marked.is_none() {
            debug!(
                "event=mark_issue module=decorator status=skip issue={} node={} reason=read_only",
                issue.id, node
            );
            return;
        }
        if should_be_ignored {
            self.mark_ignored_issue(document, node, issue);
        }
    }

    fn mark_ignored_issue(&self, document: &mut Document, node: NodeId, _issue: &Issue) {
        document.with_writable(node, |element| element.add_class(IGNORED_CLASS));
    }

    /// Drops severity, ignored and focused classes; `ISSUE_CLASS` too unless
    /// `keep_common_marker` is set.
    fn unmark_issue_element(
        &self,
        document: &mut Document,
        target: UnmarkTarget<'_>,
        keep_common_marker: bool,
    ) {
        let Some(node) = target.node() else {
            return;
        };
        document.with_writable(node, |element| {
            if !keep_common_marker {
                element.remove_class(ISSUE_CLASS);
            }
            for class in SEVERITY_CLASSES {
                element.remove_class(class);
            }
            element.remove_class(IGNORED_CLASS);
            element.remove_class(FOCUSED_CLASS);
        });
    }

    fn set_focused(&self, document: &mut Document, node: NodeId, focused: bool) {
        document.with_writable(node, |element| {
            if focused {
                element.add_class(FOCUSED_CLASS);
            } else {
                element.remove_class(FOCUSED_CLASS);
            }
        });
    }
}

/// Stock marker: ignored elements get `IGNORED_CLASS`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMarker;

impl IssueMarker for DefaultMarker {}
