//! Issue records produced by checking engines.
//!
//! # Responsibility
//! - Describe one detected accessibility problem and its node bindings.
//! - Keep the ordered issue list that marking and navigation read.
//!
//! # Invariants
//! - `IssueList` preserves insertion order; it is never re-sorted.
//! - `Issue::element` is only meaningful after identity resolution.
//! - An unresolved issue is stale, not broken.

use crate::model::document::{Attribute, Document, NodeId};
use serde::{Deserialize, Serialize};

/// Three-tier severity attached to an issue kind.
///
/// Ordering follows severity: `Notice < Warning < Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Testability {
    Notice,
    Warning,
    #[default]
    Error,
}

impl Testability {
    /// Maps an engine score (`0`, `0.5`, `1`) to a tier.
    ///
    /// Absent or unrecognised scores fall back to `Error`.
    pub fn from_score(score: Option<f64>) -> Self {
        match score {
            Some(value) if value == 0.0 => Self::Notice,
            Some(value) if value == 0.5 => Self::Warning,
            _ => Self::Error,
        }
    }

    pub fn score(self) -> f64 {
        match self {
            Self::Notice => 0.0,
            Self::Warning => 0.5,
            Self::Error => 1.0,
        }
    }
}

/// Detached copy of the element an engine flagged.
///
/// Engines run against a parsed copy of the markup, so the issue keeps the
/// element's name and attributes rather than a live reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetachedElement {
    pub name: String,
    pub attributes: Vec<Attribute>,
}

impl DetachedElement {
    /// Snapshots `node` from `document`; `None` when it is not an element.
    pub fn capture(document: &Document, node: NodeId) -> Option<Self> {
        let element = document.element(node)?;
        Some(Self {
            name: element.name().to_string(),
            attributes: element.attributes().to_vec(),
        })
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attribute| attribute.name == name)
            .map(|attribute| attribute.value.as_str())
    }
}

/// One detected accessibility issue.
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    /// Stable issue kind id, e.g. `imgHasAlt`.
    pub id: String,
    pub testability: Testability,
    /// Element as seen by the engine on the detached copy.
    pub original_element: Option<DetachedElement>,
    /// Live element, set by identity resolution.
    pub element: Option<NodeId>,
    ignored: bool,
}

impl Issue {
    pub fn new(id: impl Into<String>, testability: Testability) -> Self {
        Self {
            id: id.into(),
            testability,
            original_element: None,
            element: None,
            ignored: false,
        }
    }

    /// Creates an issue pointing at `node` of the engine's working copy.
    pub fn detected_at(
        id: impl Into<String>,
        testability: Testability,
        sketchpad: &Document,
        node: NodeId,
    ) -> Self {
        let mut issue = Self::new(id, testability);
        issue.original_element = DetachedElement::capture(sketchpad, node);
        issue
    }

    pub fn is_ignored(&self) -> bool {
        self.ignored
    }

    pub fn set_ignored(&mut self, ignored: bool) {
        self.ignored = ignored;
    }

    pub fn is_resolved(&self) -> bool {
        self.element.is_some()
    }
}

/// Human-readable explanation for one issue kind.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IssueDetails {
    pub title: String,
    pub descr: Vec<String>,
    /// Reference links (guideline sections).
    pub path: Vec<String>,
}

/// Ordered issue collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueList {
    issues: Vec<Issue>,
}

impl IssueList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn add_item(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn get_item(&self, index: usize) -> Option<&Issue> {
        self.issues.get(index)
    }

    pub fn get_item_mut(&mut self, index: usize) -> Option<&mut Issue> {
        self.issues.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Issue> {
        self.issues.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Issue> {
        self.issues.iter_mut()
    }

    pub fn clear(&mut self) {
        self.issues.clear();
    }

    /// Issues bound to `element`, in list order.
    ///
    /// With `skip_ignored` only non-ignored issues are returned.
    pub fn get_issues_by_element(&self, element: NodeId, skip_ignored: bool) -> Vec<&Issue> {
        self.issues
            .iter()
            .filter(|issue| issue.element == Some(element))
            .filter(|issue| !skip_ignored || !issue.is_ignored())
            .collect()
    }

    /// Index of the first issue bound to `element`.
    pub fn index_of_element(&self, element: NodeId) -> Option<usize> {
        self.issues
            .iter()
            .position(|issue| issue.element == Some(element))
    }

    pub fn resolved_count(&self) -> usize {
        self.issues.iter().filter(|issue| issue.is_resolved()).count()
    }
}

impl FromIterator<Issue> for IssueList {
    fn from_iter<T: IntoIterator<Item = Issue>>(iter: T) -> Self {
        Self {
            issues: iter.into_iter().collect(),
        }
    }
}

impl<'list> IntoIterator for &'list IssueList {
    type Item = &'list Issue;
    type IntoIter = std::slice::Iter<'list, Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.iter()
    }
}
