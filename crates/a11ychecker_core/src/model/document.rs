//! Editable document tree.
//!
//! # Responsibility
//! - Own every node of one editable surface in an index-addressed arena.
//! - Gate attribute and class mutation behind `ElementAccess`.
//!
//! # Invariants
//! - `NodeId` values are never reused within one `Document`.
//! - Detached nodes keep their slot but are unreachable from the root.
//! - Read-only elements never change attributes or classes.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Arena index of one node inside a `Document`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One `name="value"` pair. Order of attributes is preserved for output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

const CLASS_ATTRIBUTE: &str = "class";

/// Element payload: lower-cased tag name plus ordered attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<Attribute>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_lowercase(),
            attributes: Vec::new(),
        }
    }

    /// Builder-style attribute setter used by parsers and tests.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attribute| attribute.name == name)
            .map(|attribute| attribute.value.as_str())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Sets or replaces one attribute, keeping its original position.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into().to_ascii_lowercase();
        let value = value.into();
        match self.attributes.iter_mut().find(|attr| attr.name == name) {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute { name, value }),
        }
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let position = self.attributes.iter().position(|attr| attr.name == name)?;
        Some(self.attributes.remove(position).value)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attribute(CLASS_ATTRIBUTE)
            .unwrap_or_default()
            .split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|existing| existing == class)
    }

    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let mut classes: Vec<&str> = self.classes().collect();
        classes.push(class);
        let joined = classes.join(" ");
        self.set_attribute(CLASS_ATTRIBUTE, joined);
    }

    /// Removes one class; drops the `class` attribute once it is empty.
    pub fn remove_class(&mut self, class: &str) {
        if !self.has_class(class) {
            return;
        }
        let remaining: Vec<&str> = self.classes().filter(|existing| *existing != class).collect();
        if remaining.is_empty() {
            self.remove_attribute(CLASS_ATTRIBUTE);
        } else {
            let joined = remaining.join(" ");
            self.set_attribute(CLASS_ATTRIBUTE, joined);
        }
    }
}

/// Node payload variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element(Element),
    Text(String),
    Comment(String),
}

/// Mutation capability of one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
    #[default]
    Writable,
    /// Content owned by a non-editable host. Only identifier stamping
    /// writes through; removals and class changes are refused.
    ReadOnly,
}

/// Capability-bounded view over one element.
///
/// Callers match on the variant instead of probing for a removal operation.
#[derive(Debug)]
pub enum ElementAccess<'doc> {
    Writable(&'doc mut Element),
    ReadOnly(&'doc Element),
}

impl ElementAccess<'_> {
    pub fn element(&self) -> &Element {
        match self {
            Self::Writable(element) => element,
            Self::ReadOnly(element) => element,
        }
    }
}

/// Tree mutation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// Id does not belong to this document.
    NodeNotFound(NodeId),
    /// Operation needs an element, got text or comment.
    NotAnElement(NodeId),
    /// Child already has a parent; detach it first.
    AlreadyAttached(NodeId),
    /// Node has no parent (root or detached).
    Detached(NodeId),
    /// Append would make a node its own ancestor.
    CycleDetected { node: NodeId, parent: NodeId },
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NodeNotFound(id) => write!(f, "node not found: {id}"),
            Self::NotAnElement(id) => write!(f, "node is not an element: {id}"),
            Self::AlreadyAttached(id) => write!(f, "node already has a parent: {id}"),
            Self::Detached(id) => write!(f, "node has no parent: {id}"),
            Self::CycleDetected { node, parent } => {
                write!(f, "append would create cycle: node {node} under parent {parent}")
            }
        }
    }
}

impl Error for DocumentError {}

#[derive(Debug, Clone)]
struct NodeSlot {
    kind: NodeKind,
    access: Access,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed element tree. The root element is the editable surface.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeSlot>,
    root: NodeId,
}

impl Document {
    /// Creates an empty document whose root element has `root_name`.
    pub fn new(root_name: &str) -> Self {
        let root = NodeSlot {
            kind: NodeKind::Element(Element::new(root_name)),
            access: Access::Writable,
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of allocated slots, detached nodes included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn create_element(&mut self, element: Element) -> NodeId {
        self.push(NodeKind::Element(element))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Comment(text.into()))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeSlot {
            kind,
            access: Access::Writable,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn slot(&self, node: NodeId) -> Result<&NodeSlot, DocumentError> {
        self.nodes
            .get(node.0)
            .ok_or(DocumentError::NodeNotFound(node))
    }

    fn ensure_element(&self, node: NodeId) -> Result<(), DocumentError> {
        match self.slot(node)?.kind {
            NodeKind::Element(_) => Ok(()),
            _ => Err(DocumentError::NotAnElement(node)),
        }
    }

    pub fn kind(&self, node: NodeId) -> Option<&NodeKind> {
        self.nodes.get(node.0).map(|slot| &slot.kind)
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        match self.kind(node)? {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.element(node).is_some()
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        match self.kind(node)? {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn access(&self, node: NodeId) -> Option<Access> {
        self.nodes.get(node.0).map(|slot| slot.access)
    }

    pub fn set_access(&mut self, node: NodeId, access: Access) -> Result<(), DocumentError> {
        self.ensure_element(node)?;
        self.nodes[node.0].access = access;
        Ok(())
    }

    /// Returns the capability-bounded view of one element.
    pub fn element_access(&mut self, node: NodeId) -> Option<ElementAccess<'_>> {
        let slot = self.nodes.get_mut(node.0)?;
        match (&mut slot.kind, slot.access) {
            (NodeKind::Element(element), Access::Writable) => Some(ElementAccess::Writable(element)),
            (NodeKind::Element(element), Access::ReadOnly) => Some(ElementAccess::ReadOnly(element)),
            _ => None,
        }
    }

    /// Runs `update` against a writable element.
    ///
    /// Returns `None` for read-only elements, non-elements and unknown ids.
    pub fn with_writable<R>(
        &mut self,
        node: NodeId,
        update: impl FnOnce(&mut Element) -> R,
    ) -> Option<R> {
        match self.element_access(node)? {
            ElementAccess::Writable(element) => Some(update(element)),
            ElementAccess::ReadOnly(_) => None,
        }
    }

    /// Sets one bookkeeping attribute regardless of access.
    ///
    /// Read-only elements accept new values but never lose attributes, so
    /// stamping is the only write that bypasses `with_writable`.
    pub fn stamp_attribute(
        &mut self,
        node: NodeId,
        name: &str,
        value: impl Into<String>,
    ) -> Result<(), DocumentError> {
        let slot = self
            .nodes
            .get_mut(node.0)
            .ok_or(DocumentError::NodeNotFound(node))?;
        match &mut slot.kind {
            NodeKind::Element(element) => {
                element.set_attribute(name, value);
                Ok(())
            }
            _ => Err(DocumentError::NotAnElement(node)),
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0)?.parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|slot| slot.children.as_slice())
            .unwrap_or_default()
    }

    pub fn element_children(&self, node: NodeId) -> Vec<NodeId> {
        self.children(node)
            .iter()
            .copied()
            .filter(|child| self.is_element(*child))
            .collect()
    }

    /// Appends `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DocumentError> {
        let index = self.children(parent).len();
        self.insert_child(parent, index, child)
    }

    /// Inserts `child` at `index` among the children of `parent`.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), DocumentError> {
        self.ensure_element(parent)?;
        if self.slot(child)?.parent.is_some() || child == self.root {
            return Err(DocumentError::AlreadyAttached(child));
        }
        if child == parent || self.ancestors(parent).any(|ancestor| ancestor == child) {
            return Err(DocumentError::CycleDetected {
                node: child,
                parent,
            });
        }

        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    /// Unlinks `node` from its parent. Detaching a detached node is a no-op.
    pub fn detach(&mut self, node: NodeId) -> Result<(), DocumentError> {
        let Some(parent) = self.slot(node)?.parent else {
            return Ok(());
        };
        self.nodes[parent.0].children.retain(|child| *child != node);
        self.nodes[node.0].parent = None;
        Ok(())
    }

    /// Replaces `node` with a new element named `new_name`.
    ///
    /// Children move to the new element and it takes the old position. The
    /// old element keeps its attributes and ends up detached.
    pub fn replace_element(&mut self, node: NodeId, new_name: &str) -> Result<NodeId, DocumentError> {
        self.ensure_element(node)?;
        let parent = self.parent(node).ok_or(DocumentError::Detached(node))?;
        let position = self
            .children(parent)
            .iter()
            .position(|child| *child == node)
            .ok_or(DocumentError::Detached(node))?;

        let replacement = self.create_element(Element::new(new_name));
        let moved = std::mem::take(&mut self.nodes[node.0].children);
        for child in &moved {
            self.nodes[child.0].parent = Some(replacement);
        }
        self.nodes[replacement.0].children = moved;

        self.detach(node)?;
        self.insert_child(parent, position, replacement)?;
        Ok(replacement)
    }

    /// Ancestors of `node`, closest first. `node` itself is excluded.
    pub fn ancestors(&self, node: NodeId) -> Ancestors<'_> {
        Ancestors {
            document: self,
            cursor: self.parent(node),
        }
    }

    /// Whether `node` is `ancestor` or sits below it.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor || self.ancestors(node).any(|current| current == ancestor)
    }

    /// `node` (when it is an element) followed by every descendant element,
    /// in document order.
    pub fn elements_in_order(&self, node: NodeId) -> Vec<NodeId> {
        let mut ordered = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if self.is_element(current) {
                ordered.push(current);
            }
            stack.extend(self.children(current).iter().rev().copied());
        }
        ordered
    }

    pub fn find_elements_by_name(&self, node: NodeId, name: &str) -> Vec<NodeId> {
        self.elements_in_order(node)
            .into_iter()
            .filter(|id| id != &node)
            .filter(|id| self.element(*id).is_some_and(|element| element.name() == name))
            .collect()
    }

    pub fn find_first_by_name(&self, node: NodeId, name: &str) -> Option<NodeId> {
        self.find_elements_by_name(node, name).into_iter().next()
    }

    /// Concatenated text of every text node below `node`.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut collected = String::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if let Some(text) = self.text(current) {
                collected.push_str(text);
            }
            stack.extend(self.children(current).iter().rev().copied());
        }
        collected
    }
}

/// Closest-first ancestor iterator.
pub struct Ancestors<'doc> {
    document: &'doc Document,
    cursor: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.cursor?;
        self.cursor = self.document.parent(current);
        Some(current)
    }
}
