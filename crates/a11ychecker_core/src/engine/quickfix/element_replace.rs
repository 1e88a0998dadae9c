//! Fixes that swap the issue element for another tag.
//!
//! # Invariants
//! - The replacement takes the old position and adopts every child.
//! - Attributes of the replaced element are not carried over.

use crate::engine::quickfix::{
    bound_element, ensure_valid, FixForm, FormInput, FormValues, QuickFix, QuickFixError,
    QuickFixType,
};
use crate::model::document::{Access, Document, NodeId};
use crate::model::issue::Issue;
use once_cell::sync::Lazy;
use regex::Regex;

pub const PARAGRAPH_TO_HEADER_FIX_NAME: &str = "ParagraphToHeader";
const LEVEL_INPUT: &str = "level";
const MAX_HEADING_LEVEL: u8 = 6;

static HEADING_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[hH]([1-6])$").expect("valid heading tag regex"));
static LEVEL_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[hH]?([1-6])\s*$").expect("valid heading level regex"));

/// Replaces the bound element with a new element named `target_name`.
#[derive(Debug, Clone)]
pub struct ElementReplace {
    issue: Issue,
}

impl ElementReplace {
    pub fn new(issue: Issue) -> Self {
        Self { issue }
    }

    pub fn issue(&self) -> &Issue {
        &self.issue
    }

    pub fn replace(&self, document: &mut Document, target_name: &str) -> Result<NodeId, QuickFixError> {
        let node = bound_element(&self.issue)?;
        if document.access(node) == Some(Access::ReadOnly) {
            return Err(QuickFixError::ReadOnly(node));
        }
        Ok(document.replace_element(node, target_name)?)
    }
}

/// Builds `ParagraphToHeader` fixes limited to the configured levels.
#[derive(Debug, Clone)]
pub struct ParagraphToHeaderType {
    levels: Vec<u8>,
}

impl ParagraphToHeaderType {
    /// `levels` falls back to `1..=6` when empty.
    pub fn new(mut levels: Vec<u8>) -> Self {
        levels.retain(|level| (1..=MAX_HEADING_LEVEL).contains(level));
        levels.sort_unstable();
        levels.dedup();
        if levels.is_empty() {
            levels = (1..=MAX_HEADING_LEVEL).collect();
        }
        Self { levels }
    }
}

impl QuickFixType for ParagraphToHeaderType {
    fn name(&self) -> &str {
        PARAGRAPH_TO_HEADER_FIX_NAME
    }

    fn create(&self, issue: Issue) -> Box<dyn QuickFix> {
        Box::new(ParagraphToHeader {
            replace: ElementReplace::new(issue),
            levels: self.levels.clone(),
        })
    }
}

/// Turns a paragraph used as a heading into a real heading.
#[derive(Debug, Clone)]
pub struct ParagraphToHeader {
    replace: ElementReplace,
    levels: Vec<u8>,
}

impl ParagraphToHeader {
    /// One below the closest preceding heading, capped at 6; 1 without one.
    pub fn preferred_level(&self, document: &Document) -> u8 {
        let Some(node) = self.replace.issue().element else {
            return 1;
        };
        let ordered = document.elements_in_order(document.root());
        let Some(position) = ordered.iter().position(|current| *current == node) else {
            return 1;
        };

        ordered[..position]
            .iter()
            .rev()
            .filter(|current| !document.contains(**current, node))
            .filter_map(|current| document.element(*current))
            .find_map(|element| heading_level(element.name()))
            .map(|level| (level + 1).min(MAX_HEADING_LEVEL))
            .unwrap_or(1)
    }

    /// `(min, max)` of the allowed levels.
    pub fn possible_levels(&self) -> (u8, u8) {
        let min = self.levels.first().copied().unwrap_or(1);
        let max = self.levels.last().copied().unwrap_or(MAX_HEADING_LEVEL);
        (min, max)
    }

    fn requested_level(values: &FormValues) -> Option<u8> {
        let raw = values.get(LEVEL_INPUT)?;
        LEVEL_VALUE
            .captures(raw)
            .and_then(|captures| captures.get(1))
            .and_then(|level| level.as_str().parse().ok())
    }
}

fn heading_level(name: &str) -> Option<u8> {
    HEADING_TAG
        .captures(name)
        .and_then(|captures| captures.get(1))
        .and_then(|level| level.as_str().parse().ok())
}

impl QuickFix for ParagraphToHeader {
    fn name(&self) -> &str {
        PARAGRAPH_TO_HEADER_FIX_NAME
    }

    fn issue(&self) -> &Issue {
        self.replace.issue()
    }

    fn display(&self, document: &Document, form: &mut FixForm) {
        let (min, max) = self.possible_levels();
        let level = self.preferred_level(document).clamp(min, max);
        form.set_inputs([(
            LEVEL_INPUT.to_string(),
            FormInput::text("Heading level", format!("h{level}")),
        )]);
    }

    fn validate(&self, values: &FormValues) -> Vec<String> {
        match Self::requested_level(values) {
            Some(level) if self.levels.contains(&level) => Vec::new(),
            _ => {
                let allowed: Vec<String> = self.levels.iter().map(|level| format!("h{level}")).collect();
                vec![format!("Heading level should be one of: {}", allowed.join(", "))]
            }
        }
    }

    fn fix(&self, document: &mut Document, values: &FormValues) -> Result<NodeId, QuickFixError> {
        ensure_valid(self.validate(values))?;
        let level = Self::requested_level(values).unwrap_or(1);
        self.replace.replace(document, &format!("h{level}"))
    }
}

#[cfg(test)]
mod tests {
    use super::{ElementReplace, ParagraphToHeaderType, PARAGRAPH_TO_HEADER_FIX_NAME};
    use crate::engine::quickfix::{FixForm, FormValues, QuickFixError, QuickFixType};
    use crate::markup::{parse_fragment_into, FilterContext, MarkupWriter};
    use crate::model::document::{Access, Document, NodeId};
    use crate::model::issue::{Issue, Testability};

    fn paragraph_issue(html: &str, index: usize) -> (Document, NodeId, Issue) {
        let doc = parse_fragment_into("div", html);
        let para = doc.find_elements_by_name(doc.root(), "p")[index];
        let mut issue = Issue::new("pNotUsedAsHeader", Testability::Warning);
        issue.element = Some(para);
        (doc, para, issue)
    }

    fn level(value: &str) -> FormValues {
        [("level".to_string(), value.to_string())].into_iter().collect()
    }

    fn html(doc: &Document) -> String {
        MarkupWriter::new().write_children(doc, doc.root(), &FilterContext::default())
    }

    #[test]
    fn element_replace_keeps_children_and_position() {
        let (mut doc, _, issue) = paragraph_issue("<p>a</p><p><b>b</b></p><p>c</p>", 1);
        let replaced = ElementReplace::new(issue).replace(&mut doc, "h3").expect("replace");
        assert_eq!(html(&doc), "<p>a</p><h3><b>b</b></h3><p>c</p>");
        assert_eq!(doc.element(replaced).map(|element| element.name()), Some("h3"));
    }

    #[test]
    fn preferred_level_follows_previous_heading() {
        let fix_type = ParagraphToHeaderType::new(vec![1, 2, 3, 4, 5, 6]);

        let (doc, _, issue) = paragraph_issue("<p><b>Title</b></p>", 0);
        let mut form = FixForm::new();
        fix_type.create(issue).display(&doc, &mut form);
        assert_eq!(form.input("level").map(|input| input.value.as_str()), Some("h1"));

        let (doc, _, issue) = paragraph_issue("<h2>Intro</h2><div><p><b>Sub</b></p></div>", 0);
        fix_type.create(issue).display(&doc, &mut form);
        assert_eq!(form.input("level").map(|input| input.value.as_str()), Some("h3"));

        let (doc, _, issue) = paragraph_issue("<h6>Deep</h6><p><b>x</b></p>", 0);
        fix_type.create(issue).display(&doc, &mut form);
        assert_eq!(form.input("level").map(|input| input.value.as_str()), Some("h6"));
    }

    #[test]
    fn suggested_level_is_clamped_to_configured_levels() {
        let fix_type = ParagraphToHeaderType::new(vec![2, 3]);
        let (doc, _, issue) = paragraph_issue("<p><b>Title</b></p>", 0);
        let fix = fix_type.create(issue);
        let mut form = FixForm::new();
        fix.display(&doc, &mut form);
        assert_eq!(form.input("level").map(|input| input.value.as_str()), Some("h2"));

        assert!(fix.validate(&level("h3")).is_empty());
        assert!(fix.validate(&level("3")).is_empty());
        assert_eq!(
            fix.validate(&level("h5")),
            vec!["Heading level should be one of: h2, h3".to_string()]
        );
    }

    #[test]
    fn fix_replaces_paragraph_with_heading() {
        let fix_type = ParagraphToHeaderType::new(Vec::new());
        let (mut doc, para, issue) = paragraph_issue("<h1>A</h1><p><b>B</b></p>", 0);
        let fix = fix_type.create(issue);
        assert_eq!(fix.name(), PARAGRAPH_TO_HEADER_FIX_NAME);

        let heading = fix.fix(&mut doc, &level("h2")).expect("fix applies");
        assert_ne!(heading, para);
        assert_eq!(html(&doc), "<h1>A</h1><h2><b>B</b></h2>");
    }

    #[test]
    fn fix_rejects_read_only_and_unresolved_targets() {
        let fix_type = ParagraphToHeaderType::new(Vec::new());
        let (mut doc, para, issue) = paragraph_issue("<p>x</p>", 0);
        doc.set_access(para, Access::ReadOnly).expect("element");
        let err = fix_type
            .create(issue)
            .fix(&mut doc, &level("h1"))
            .expect_err("read-only");
        assert_eq!(err, QuickFixError::ReadOnly(para));

        let stale = Issue::new("pNotUsedAsHeader", Testability::Warning);
        let err = fix_type
            .create(stale)
            .fix(&mut doc, &level("h1"))
            .expect_err("unresolved");
        assert!(matches!(err, QuickFixError::Unresolved(_)));
    }
}
