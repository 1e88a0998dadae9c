//! Stable element identifiers.
//!
//! # Responsibility
//! - Stamp every element of the editable with `data-quail-id`.
//! - Mirror the identifier into placeholder payloads.
//! - Bind issues found on a sketchpad back to live elements.
//!
//! # Invariants
//! - The editable root always receives `ROOT_ELEMENT_ID`.
//! - Identifiers grow by one per stamped element, in document order.
//! - Read-only elements are stamped too; only removal skips them.
//! - Exported markup carries no identifier, placeholder payloads included,
//!   unless the export disables filter stripping.
//! - A missing or unknown identifier leaves the issue unresolved.
//!
//! # See also
//! - `crate::markup::placeholder` for the payload codec.

use crate::decorator::marking::{DefaultMarker, IssueMarker, ISSUE_CLASS};
use crate::markup::placeholder::{self, is_placeholder, REAL_ELEMENT_ATTRIBUTE};
use crate::markup::{ElementFilter, FilterContext};
use crate::model::document::{Document, Element, NodeId};
use crate::model::issue::{DetachedElement, IssueList};
use log::{debug, warn};

/// Short identifier name, as exposed through `data-*` accessors.
pub const ID_ATTRIBUTE_NAME: &str = "quail-id";
/// Fully qualified identifier attribute.
pub const ID_ATTRIBUTE_NAME_FULL: &str = "data-quail-id";
/// Comma-separated issue kinds the user chose to ignore on an element.
pub const IGNORE_ATTRIBUTE: &str = "data-a11y-ignore";
/// Identifier reserved for the editable root.
pub const ROOT_ELEMENT_ID: u32 = 1;

/// Outcome of one `resolve` pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolveSummary {
    pub resolved: usize,
    pub stale: usize,
}

/// Assigns sequential identifiers to every element, read-only ones included.
///
/// Returns the number of stamped elements.
pub fn stamp(document: &mut Document) -> usize {
    let mut next_id = ROOT_ELEMENT_ID;
    let mut stamped = 0;

    for node in document.elements_in_order(document.root()) {
        let id = next_id;
        if let Err(err) = document.stamp_attribute(node, ID_ATTRIBUTE_NAME_FULL, id.to_string()) {
            warn!(
                "event=stamp module=decorator status=error node={} error={}",
                node, err
            );
            continue;
        }
        stamp_placeholder(document, node, id);
        next_id += 1;
        stamped += 1;
    }

    debug!("event=stamp module=decorator status=ok stamped={}", stamped);
    stamped
}

fn stamp_placeholder(document: &mut Document, node: NodeId, id: u32) {
    let Some(element) = document.element(node).filter(|element| is_placeholder(element)) else {
        return;
    };
    let written = placeholder::payload_with_token(element, ID_ATTRIBUTE_NAME_FULL, id)
        .map_err(|err| err.to_string())
        .and_then(|payload| {
            document
                .stamp_attribute(node, REAL_ELEMENT_ATTRIBUTE, payload)
                .map_err(|err| err.to_string())
        });
    if let Err(err) = written {
        warn!(
            "event=placeholder_stamp module=decorator status=error node={} error={}",
            node, err
        );
    }
}

/// Removes identifiers, placeholder tokens and every marker class.
///
/// Read-only elements keep their identifier; the walk carries on past them.
pub fn unstamp(document: &mut Document) {
    let marker = DefaultMarker;
    for node in document.elements_in_order(document.root()) {
        let has_issue = document.with_writable(node, |element| {
            element.remove_attribute(ID_ATTRIBUTE_NAME_FULL);
            if is_placeholder(element) {
                if let Err(err) = placeholder::remove_token(element, ID_ATTRIBUTE_NAME_FULL) {
                    warn!(
                        "event=placeholder_unstamp module=decorator status=error node={} error={}",
                        node, err
                    );
                }
            }
            element.has_class(ISSUE_CLASS)
        });

        match has_issue {
            Some(true) => marker.unmark_issue_element(document, node.into(), false),
            Some(false) => {}
            None => debug!(
                "event=unstamp_skip module=decorator status=skip node={} reason=read_only",
                node
            ),
        }
    }
}

/// Identifier carried by a live element.
pub fn read_id(element: &Element) -> Option<u32> {
    parse_id(element.attribute(ID_ATTRIBUTE_NAME_FULL))
}

/// Identifier recorded on a sketchpad snapshot.
pub fn read_detached_id(element: &DetachedElement) -> Option<u32> {
    parse_id(element.attribute(ID_ATTRIBUTE_NAME_FULL))
}

fn parse_id(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|value| value.trim().parse().ok())
}

/// First element under `root` (inclusive) stamped with `id`.
pub fn find_by_id(document: &Document, root: NodeId, id: u32) -> Option<NodeId> {
    document
        .elements_in_order(root)
        .into_iter()
        .find(|node| document.element(*node).and_then(read_id) == Some(id))
}

/// Binds every issue to the live element carrying its recorded identifier.
///
/// Issues without a match end up unresolved; previous bindings are
/// overwritten either way.
pub fn resolve(issues: &mut IssueList, document: &Document) -> ResolveSummary {
    let mut summary = ResolveSummary::default();
    for issue in issues.iter_mut() {
        let id = issue.original_element.as_ref().and_then(read_detached_id);
        issue.element = id.and_then(|id| find_by_id(document, document.root(), id));

        if issue.is_resolved() {
            summary.resolved += 1;
        } else {
            summary.stale += 1;
            debug!(
                "event=resolve_issue module=decorator status=skip issue={} id={:?}",
                issue.id, id
            );
        }
    }
    summary
}

/// Issue kinds listed in the element's `data-a11y-ignore` attribute.
pub fn ignored_kinds(element: &Element) -> Vec<&str> {
    element
        .attribute(IGNORE_ATTRIBUTE)
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|kind| !kind.is_empty())
        .collect()
}

/// Adds or removes `kind` in the element's `data-a11y-ignore` list.
pub fn set_ignored_kind(element: &mut Element, kind: &str, ignored: bool) {
    let mut kinds: Vec<String> = ignored_kinds(element)
        .into_iter()
        .filter(|existing| *existing != kind)
        .map(str::to_string)
        .collect();
    if ignored {
        kinds.push(kind.to_string());
    }

    if kinds.is_empty() {
        element.remove_attribute(IGNORE_ATTRIBUTE);
    } else {
        element.set_attribute(IGNORE_ATTRIBUTE, kinds.join(","));
    }
}

/// Export filter dropping checker bookkeeping attributes.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityFilter {
    /// Also drop `data-a11y-ignore`.
    pub strip_ignore_data: bool,
}

impl ElementFilter for IdentityFilter {
    fn filter_element(&self, element: &mut Element, context: &FilterContext) {
        if !context.disable_filter_strip {
            element.remove_attribute(ID_ATTRIBUTE_NAME_FULL);
            if is_placeholder(element) {
                if let Err(err) = placeholder::remove_token(element, ID_ATTRIBUTE_NAME_FULL) {
                    warn!(
                        "event=placeholder_filter module=decorator status=error element={} error={}",
                        element.name(),
                        err
                    );
                }
            }
        }
        if self.strip_ignore_data {
            element.remove_attribute(IGNORE_ATTRIBUTE);
        }
    }
}
