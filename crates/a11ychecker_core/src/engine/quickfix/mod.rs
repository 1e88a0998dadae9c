//! Quick fix contracts and built-in fixes.
//!
//! # Responsibility
//! - Define how a fix type is instantiated for one issue.
//! - Define the form exchange between a fix and the host UI.
//!
//! # Invariants
//! - A fix instance is bound to exactly one issue for its whole life.
//! - `validate` never mutates; `fix` re-validates before touching the tree.

pub mod element_replace;
pub mod img_alt;

use crate::model::document::{Document, DocumentError, NodeId};
use crate::model::issue::Issue;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use element_replace::{ElementReplace, ParagraphToHeader, ParagraphToHeaderType};
pub use img_alt::{ImgAlt, ImgAltType};

/// Values the user submitted, keyed by input name.
pub type FormValues = BTreeMap<String, String>;

/// Input widget kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Select(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormInput {
    pub kind: InputKind,
    pub label: String,
    pub value: String,
}

impl FormInput {
    pub fn text(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: InputKind::Text,
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Inputs a fix asks the host to render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixForm {
    inputs: BTreeMap<String, FormInput>,
}

impl FixForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every input with `inputs`.
    pub fn set_inputs(&mut self, inputs: impl IntoIterator<Item = (String, FormInput)>) {
        self.inputs = inputs.into_iter().collect();
    }

    pub fn input(&self, name: &str) -> Option<&FormInput> {
        self.inputs.get(name)
    }

    pub fn inputs(&self) -> impl Iterator<Item = (&str, &FormInput)> {
        self.inputs.iter().map(|(name, input)| (name.as_str(), input))
    }

    /// Default values as if the user accepted every suggestion.
    pub fn default_values(&self) -> FormValues {
        self.inputs
            .iter()
            .map(|(name, input)| (name.clone(), input.value.clone()))
            .collect()
    }
}

/// Fix application errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuickFixError {
    /// The issue has no live element.
    Unresolved(String),
    /// The bound element cannot be modified.
    ReadOnly(NodeId),
    /// Submitted values failed validation.
    Invalid(Vec<String>),
    Document(DocumentError),
}

impl Display for QuickFixError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unresolved(issue) => write!(f, "issue `{issue}` is not bound to an element"),
            Self::ReadOnly(node) => write!(f, "element {node} is read-only"),
            Self::Invalid(messages) => write!(f, "invalid fix input: {}", messages.join("; ")),
            Self::Document(err) => write!(f, "{err}"),
        }
    }
}

impl Error for QuickFixError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Document(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DocumentError> for QuickFixError {
    fn from(value: DocumentError) -> Self {
        Self::Document(value)
    }
}

/// Loaded fix type; builds instances bound to one issue.
pub trait QuickFixType: Send + Sync {
    fn name(&self) -> &str;
    fn create(&self, issue: Issue) -> Box<dyn QuickFix>;
}

/// One fix offered for one issue.
pub trait QuickFix: Send + Sync {
    fn name(&self) -> &str;
    fn issue(&self) -> &Issue;

    /// Fills `form` with the inputs this fix needs.
    fn display(&self, document: &Document, form: &mut FixForm);

    /// Human-readable problems with `values`; empty when valid.
    fn validate(&self, values: &FormValues) -> Vec<String>;

    /// Applies the fix and returns the element now carrying the content.
    fn fix(&self, document: &mut Document, values: &FormValues) -> Result<NodeId, QuickFixError>;
}

/// Live element of `issue`, or `Unresolved`.
pub(crate) fn bound_element(issue: &Issue) -> Result<NodeId, QuickFixError> {
    issue
        .element
        .ok_or_else(|| QuickFixError::Unresolved(issue.id.clone()))
}

pub(crate) fn ensure_valid(messages: Vec<String>) -> Result<(), QuickFixError> {
    if messages.is_empty() {
        Ok(())
    } else {
        Err(QuickFixError::Invalid(messages))
    }
}

#[cfg(test)]
mod tests {
    use super::{FixForm, FormInput, InputKind};

    #[test]
    fn default_values_follow_inputs() {
        let mut form = FixForm::new();
        form.set_inputs([
            ("alt".to_string(), FormInput::text("Alternative text", "logo")),
            (
                "level".to_string(),
                FormInput {
                    kind: InputKind::Select(vec!["h1".to_string(), "h2".to_string()]),
                    label: "Heading level".to_string(),
                    value: "h2".to_string(),
                },
            ),
        ]);

        let values = form.default_values();
        assert_eq!(values.get("alt").map(String::as_str), Some("logo"));
        assert_eq!(values.get("level").map(String::as_str), Some("h2"));
        assert_eq!(form.inputs().count(), 2);

        form.set_inputs([("alt".to_string(), FormInput::text("Alternative text", ""))]);
        assert!(form.input("level").is_none());
    }
}
