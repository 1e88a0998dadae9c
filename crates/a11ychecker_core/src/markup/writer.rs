//! Filtered markup serialization.

use crate::markup::{escape_attribute, escape_text, is_raw_text_element, is_void_element};
use crate::model::document::{Document, Element, NodeId, NodeKind};

/// Host-controlled switches visible to every filter during one export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterContext {
    /// Keeps internal bookkeeping attributes in the output.
    pub disable_filter_strip: bool,
}

/// Transformation applied to a copy of each element while exporting.
pub trait ElementFilter: Send + Sync {
    fn filter_element(&self, element: &mut Element, context: &FilterContext);
}

/// Serializes document nodes, running every registered filter once per
/// element.
#[derive(Default)]
pub struct MarkupWriter {
    filters: Vec<Box<dyn ElementFilter>>,
}

impl MarkupWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_filter(&mut self, filter: impl ElementFilter + 'static) {
        self.filters.push(Box::new(filter));
    }

    pub fn filter_count(&self) -> usize {
        self.filters.len()
    }

    /// Markup of the children of `node` (the editable's data).
    pub fn write_children(&self, document: &Document, node: NodeId, context: &FilterContext) -> String {
        let mut out = String::new();
        for child in document.children(node) {
            self.write_into(document, *child, context, &mut out);
        }
        out
    }

    /// Markup of `node` itself, tags included.
    pub fn write_node(&self, document: &Document, node: NodeId, context: &FilterContext) -> String {
        let mut out = String::new();
        self.write_into(document, node, context, &mut out);
        out
    }

    fn write_into(&self, document: &Document, node: NodeId, context: &FilterContext, out: &mut String) {
        match document.kind(node) {
            Some(NodeKind::Text(text)) => {
                let raw_parent = document
                    .parent(node)
                    .and_then(|parent| document.element(parent))
                    .is_some_and(|parent| is_raw_text_element(parent.name()));
                if raw_parent {
                    out.push_str(text);
                } else {
                    out.push_str(&escape_text(text));
                }
            }
            Some(NodeKind::Comment(text)) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            Some(NodeKind::Element(element)) => {
                let mut filtered = element.clone();
                for filter in &self.filters {
                    filter.filter_element(&mut filtered, context);
                }
                write_start_tag(&filtered, out);
                if is_void_element(filtered.name()) {
                    return;
                }
                for child in document.children(node) {
                    self.write_into(document, *child, context, out);
                }
                out.push_str("</");
                out.push_str(filtered.name());
                out.push('>');
            }
            None => {}
        }
    }
}

fn write_start_tag(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(element.name());
    for attribute in element.attributes() {
        out.push(' ');
        out.push_str(&attribute.name);
        out.push_str("=\"");
        out.push_str(&escape_attribute(&attribute.value));
        out.push('"');
    }
    out.push('>');
}
