//! Small built-in rule engine.
//!
//! Two rules, enough to drive the whole check flow from the CLI:
//! `imgHasAlt` and `pNotUsedAsHeader`.

use crate::config::CheckerConfig;
use crate::engine::cache::FixTypeCache;
use crate::engine::loader::BuiltinFixLoader;
use crate::engine::quickfix::img_alt::IMG_ALT_FIX_NAME;
use crate::engine::quickfix::element_replace::PARAGRAPH_TO_HEADER_FIX_NAME;
use crate::engine::{CheckContext, Engine, EngineError, FixesMapping};
use crate::model::document::{Document, NodeId};
use crate::model::issue::{Issue, IssueDetails, IssueList, Testability};
use async_trait::async_trait;
use log::debug;
use std::sync::Arc;

pub const IMG_HAS_ALT: &str = "imgHasAlt";
pub const P_NOT_USED_AS_HEADER: &str = "pNotUsedAsHeader";

const EMPHASIS_TAGS: [&str; 2] = ["b", "strong"];

/// Rule-based engine over the sketchpad document.
pub struct RuleEngine {
    mapping: FixesMapping,
    cache: Arc<FixTypeCache>,
}

impl RuleEngine {
    pub fn new(cache: Arc<FixTypeCache>) -> Self {
        let mapping = [
            (IMG_HAS_ALT, IMG_ALT_FIX_NAME),
            (P_NOT_USED_AS_HEADER, PARAGRAPH_TO_HEADER_FIX_NAME),
        ]
        .into_iter()
        .map(|(issue, fix)| (issue.to_string(), vec![fix.to_string()]))
        .collect();
        Self { mapping, cache }
    }

    /// Engine with its own cache over the built-in fixes tuned by `config`.
    pub fn with_config(config: &CheckerConfig) -> Self {
        Self::new(Arc::new(FixTypeCache::new(Arc::new(BuiltinFixLoader::new(
            config,
        )))))
    }

    /// Overrides or adds the fix types offered for `issue_kind`.
    pub fn map_fixes(&mut self, issue_kind: impl Into<String>, fixes: Vec<String>) {
        self.mapping.insert(issue_kind.into(), fixes);
    }

    fn check_element(content: &Document, node: NodeId) -> Option<(&'static str, Testability)> {
        let element = content.element(node)?;
        match element.name() {
            "img" if element.attribute("alt").map_or(true, |alt| alt.trim().is_empty()) => {
                Some((IMG_HAS_ALT, Testability::Error))
            }
            "p" if paragraph_looks_like_heading(content, node) => {
                Some((P_NOT_USED_AS_HEADER, Testability::Warning))
            }
            _ => None,
        }
    }
}

/// A paragraph whose only content is one bold run.
fn paragraph_looks_like_heading(content: &Document, node: NodeId) -> bool {
    let children = content.element_children(node);
    let [only] = children.as_slice() else {
        return false;
    };
    let emphasised = content
        .element(*only)
        .is_some_and(|element| EMPHASIS_TAGS.contains(&element.name()));
    let text = content.text_content(node);
    emphasised && !text.trim().is_empty() && text.trim() == content.text_content(*only).trim()
}

#[async_trait]
impl Engine for RuleEngine {
    fn name(&self) -> &str {
        "rules"
    }

    fn fixes_mapping(&self) -> &FixesMapping {
        &self.mapping
    }

    fn fix_cache(&self) -> &FixTypeCache {
        &self.cache
    }

    async fn process(
        &self,
        context: &CheckContext,
        content: &Document,
        issues: &mut IssueList,
    ) -> Result<(), EngineError> {
        let before = issues.count();
        for node in content.elements_in_order(content.root()) {
            if node == content.root() {
                continue;
            }
            if let Some((kind, testability)) = Self::check_element(content, node) {
                issues.add_item(Issue::detected_at(kind, testability, content, node));
            }
        }
        debug!(
            "event=engine_process module=engine status=ok engine={} session_id={} found={}",
            self.name(),
            context.session_id,
            issues.count() - before
        );
        Ok(())
    }

    async fn get_issue_details(&self, issue: &Issue) -> Result<IssueDetails, EngineError> {
        let (title, descr, path) = match issue.id.as_str() {
            IMG_HAS_ALT => (
                "Image alternative text missing",
                "Images must have an alt attribute describing their content.",
                "https://www.w3.org/TR/WCAG20-TECHS/H37.html",
            ),
            P_NOT_USED_AS_HEADER => (
                "Paragraph used as a heading",
                "Bold paragraphs that act as headings should use heading elements.",
                "https://www.w3.org/TR/WCAG20-TECHS/H42.html",
            ),
            other => return Err(EngineError::UnknownIssue(other.to_string())),
        };
        Ok(IssueDetails {
            title: title.to_string(),
            descr: vec![descr.to_string()],
            path: vec![path.to_string()],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{RuleEngine, IMG_HAS_ALT, P_NOT_USED_AS_HEADER};
    use crate::config::CheckerConfig;
    use crate::engine::{CheckContext, Engine, EngineError};
    use crate::markup::parse_fragment_into;
    use crate::model::issue::{Issue, IssueList, Testability};
    use futures::executor::block_on;

    #[test]
    fn process_flags_images_and_bold_paragraphs() {
        let engine = RuleEngine::with_config(&CheckerConfig::default());
        let content = parse_fragment_into(
            "div",
            r#"<p><b>Title</b></p><p>Body <b>bold</b></p><img src="a.png"><img alt="ok">"#,
        );
        let mut issues = IssueList::new();
        block_on(engine.process(&CheckContext::default(), &content, &mut issues)).expect("process");

        let found: Vec<(&str, Testability)> = issues
            .iter()
            .map(|issue| (issue.id.as_str(), issue.testability))
            .collect();
        assert_eq!(
            found,
            vec![
                (P_NOT_USED_AS_HEADER, Testability::Warning),
                (IMG_HAS_ALT, Testability::Error)
            ]
        );
        let img = issues.get_item(1).and_then(|issue| issue.original_element.as_ref());
        assert_eq!(img.and_then(|element| element.attribute("src")), Some("a.png"));
    }

    #[test]
    fn unknown_issue_kinds_have_no_details() {
        let engine = RuleEngine::with_config(&CheckerConfig::default());
        let details = block_on(engine.get_issue_details(&Issue::new(IMG_HAS_ALT, Testability::Error)))
            .expect("known kind");
        assert!(!details.title.is_empty());

        let err = block_on(engine.get_issue_details(&Issue::new("other", Testability::Notice)))
            .expect_err("unknown kind");
        assert_eq!(err, EngineError::UnknownIssue("other".to_string()));
    }

    #[test]
    fn get_fixes_follows_mapping() {
        let mut engine = RuleEngine::with_config(&CheckerConfig::default());
        let fixes = block_on(engine.get_fixes(&Issue::new(IMG_HAS_ALT, Testability::Error)))
            .expect("fixes load");
        assert_eq!(fixes.len(), 1);
        assert_eq!(fixes[0].name(), "ImgAlt");

        let none = block_on(engine.get_fixes(&Issue::new("unmapped", Testability::Error)))
            .expect("unmapped kind");
        assert!(none.is_empty());

        engine.map_fixes(IMG_HAS_ALT, Vec::new());
        let none = block_on(engine.get_fixes(&Issue::new(IMG_HAS_ALT, Testability::Error)))
            .expect("empty mapping");
        assert!(none.is_empty());
        assert_eq!(engine.fix_cache().len(), 1);
    }
}
