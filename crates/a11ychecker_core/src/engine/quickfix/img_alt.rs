//! Alternative text fix for images.

use crate::engine::quickfix::{
    bound_element, ensure_valid, FixForm, FormInput, FormValues, QuickFix, QuickFixError,
    QuickFixType,
};
use crate::model::document::{Document, NodeId};
use crate::model::issue::Issue;

pub const IMG_ALT_FIX_NAME: &str = "ImgAlt";
const ALT_INPUT: &str = "alt";
const ALT_ATTRIBUTE: &str = "alt";

/// Builds `ImgAlt` fixes sharing one length limit.
#[derive(Debug, Clone, Copy)]
pub struct ImgAltType {
    /// Zero disables the length check.
    pub alt_length_limit: usize,
}

impl QuickFixType for ImgAltType {
    fn name(&self) -> &str {
        IMG_ALT_FIX_NAME
    }

    fn create(&self, issue: Issue) -> Box<dyn QuickFix> {
        Box::new(ImgAlt {
            issue,
            alt_length_limit: self.alt_length_limit,
        })
    }
}

/// Sets the `alt` attribute of the bound image.
#[derive(Debug, Clone)]
pub struct ImgAlt {
    issue: Issue,
    alt_length_limit: usize,
}

impl QuickFix for ImgAlt {
    fn name(&self) -> &str {
        IMG_ALT_FIX_NAME
    }

    fn issue(&self) -> &Issue {
        &self.issue
    }

    fn display(&self, document: &Document, form: &mut FixForm) {
        let current = self
            .issue
            .element
            .and_then(|node| document.element(node))
            .and_then(|element| element.attribute(ALT_ATTRIBUTE))
            .unwrap_or_default();
        form.set_inputs([(
            ALT_INPUT.to_string(),
            FormInput::text("Alternative text", current),
        )]);
    }

    fn validate(&self, values: &FormValues) -> Vec<String> {
        let alt = values.get(ALT_INPUT).map(String::as_str).unwrap_or_default();
        let length = alt.chars().count();

        let mut messages = Vec::new();
        if alt.is_empty() {
            messages.push("Alternative text can not be empty".to_string());
        }
        if self.alt_length_limit > 0 && length > self.alt_length_limit {
            messages.push(format!(
                "Alternative text is too long. It should be up to {} characters while your has {}.",
                self.alt_length_limit, length
            ));
        }
        messages
    }

    fn fix(&self, document: &mut Document, values: &FormValues) -> Result<NodeId, QuickFixError> {
        ensure_valid(self.validate(values))?;
        let node = bound_element(&self.issue)?;
        let alt = values.get(ALT_INPUT).cloned().unwrap_or_default();
        document
            .with_writable(node, |element| element.set_attribute(ALT_ATTRIBUTE, alt))
            .ok_or(QuickFixError::ReadOnly(node))?;
        Ok(node)
    }
}
