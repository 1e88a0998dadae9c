use a11ychecker_core::decorator::identity::{self, ID_ATTRIBUTE_NAME_FULL, IGNORE_ATTRIBUTE};
use a11ychecker_core::decorator::marking::{
    ERROR_CLASS, FOCUSED_CLASS, IGNORED_CLASS, ISSUE_CLASS, WARNING_CLASS,
};
use a11ychecker_core::engine::{FixForm, FormValues};
use a11ychecker_core::markup::placeholder::{self, REAL_ELEMENT_ATTRIBUTE, REAL_NODE_TYPE_ATTRIBUTE};
use a11ychecker_core::markup::{parse_fragment_into, FilterContext};
use a11ychecker_core::{
    CheckSession, CheckerConfig, CheckerMode, ClickOutcome, Document, EditableDecorator, Element,
    Issue, IssueList, NodeId, RuleEngine, SessionError, Testability,
};
use futures::executor::block_on;
use std::sync::Arc;

fn classes(document: &Document, node: NodeId) -> Vec<String> {
    let mut classes: Vec<String> = document
        .element(node)
        .expect("element")
        .classes()
        .map(str::to_string)
        .collect();
    classes.sort();
    classes
}

fn session_for(html: &str, config: &CheckerConfig) -> CheckSession {
    let mut decorator = EditableDecorator::new(config);
    decorator.set_data(html);
    decorator.add_listeners().expect("listeners");
    CheckSession::new(decorator, Arc::new(RuleEngine::with_config(config)))
}

#[test]
fn paragraph_and_image_scenario_marks_by_identifier() {
    let mut decorator = EditableDecorator::new(&CheckerConfig::default());
    decorator.set_data("<p></p><img>");
    assert_eq!(decorator.apply_markup().expect("stamp"), 3);

    let markup = decorator
        .get_data_with(FilterContext {
            disable_filter_strip: true,
        })
        .expect("export with ids");
    assert_eq!(markup, r#"<p data-quail-id="2"></p><img data-quail-id="3">"#);

    let sketchpad = parse_fragment_into("div", &markup);
    let sketch_p = sketchpad.find_first_by_name(sketchpad.root(), "p").expect("p");
    let sketch_img = sketchpad.find_first_by_name(sketchpad.root(), "img").expect("img");

    let mut issues = IssueList::new();
    issues.add_item(Issue::detected_at("pIssue", Testability::Error, &sketchpad, sketch_p));
    let mut img_issue = Issue::detected_at("imgIssue", Testability::Warning, &sketchpad, sketch_img);
    img_issue.set_ignored(true);
    issues.add_item(img_issue);

    let summary = decorator.resolve_editor_elements(&mut issues).expect("resolve");
    assert_eq!(summary.resolved, 2);
    decorator.mark_issues(&issues).expect("mark");

    let live = decorator.editable().expect("editable");
    let p = live.find_first_by_name(live.root(), "p").expect("live p");
    let img = live.find_first_by_name(live.root(), "img").expect("live img");
    assert_eq!(issues.get_item(0).and_then(|issue| issue.element), Some(p));
    assert_eq!(classes(live, p), vec![ERROR_CLASS, ISSUE_CLASS]);
    assert_eq!(classes(live, img), vec![IGNORED_CLASS, ISSUE_CLASS]);

    decorator.remove_markup().expect("unstamp");
    let live = decorator.editable().expect("editable");
    assert!(classes(live, p).is_empty());
    let exported = decorator
        .get_data_with(FilterContext {
            disable_filter_strip: true,
        })
        .expect("export");
    assert!(!exported.contains(ID_ATTRIBUTE_NAME_FULL));
}

#[test]
fn placeholder_payload_round_trips_identifier() {
    let mut document = Document::new("div");
    let real = r#"<iframe src="https://example.com/embed"></iframe>"#;
    let fake = document.create_element(
        Element::new("img")
            .with_attribute(REAL_NODE_TYPE_ATTRIBUTE, "1")
            .with_attribute(REAL_ELEMENT_ATTRIBUTE, placeholder::encode(real)),
    );
    let para = document.create_element(Element::new("p"));
    document.append_child(document.root(), para).expect("append p");
    document.append_child(document.root(), fake).expect("append placeholder");

    let mut decorator = EditableDecorator::with_document(&CheckerConfig::default(), document);
    decorator.apply_markup().expect("stamp");
    let live = decorator.editable().expect("editable");
    let payload = live
        .element(fake)
        .and_then(|element| element.attribute(REAL_ELEMENT_ATTRIBUTE))
        .expect("payload");
    assert_eq!(
        placeholder::decode(payload).expect("decode"),
        r#"<iframe data-quail-id="3" src="https://example.com/embed"></iframe>"#
    );

    decorator.apply_markup().expect("restamp");
    let payload = decorator
        .editable()
        .and_then(|live| live.element(fake))
        .and_then(|element| element.attribute(REAL_ELEMENT_ATTRIBUTE))
        .expect("payload");
    assert_eq!(placeholder::decode(payload).expect("decode").matches("data-quail-id").count(), 1);

    decorator.remove_markup().expect("unstamp");
    let payload = decorator
        .editable()
        .and_then(|live| live.element(fake))
        .and_then(|element| element.attribute(REAL_ELEMENT_ATTRIBUTE))
        .expect("payload");
    assert_eq!(placeholder::decode(payload).expect("decode"), real);
}

#[test]
fn session_check_click_fix_and_close() {
    let html = r#"<p><b>Heading</b></p><p>Body text</p><img src="logo.png">"#;
    let mut session = session_for(html, &CheckerConfig::default());

    let report = block_on(session.check()).expect("check");
    assert_eq!(report.issues, 2);
    assert_eq!(report.resolved, 2);
    assert_eq!(session.mode(), CheckerMode::Normal);

    let img_index = session
        .issues()
        .iter()
        .position(|issue| issue.id == "imgHasAlt")
        .expect("img issue");
    let img = session
        .issues()
        .get_item(img_index)
        .and_then(|issue| issue.element)
        .expect("resolved img");

    // Click outside any issue while enabled.
    let body = {
        let live = session.decorator().editable().expect("editable");
        live.find_elements_by_name(live.root(), "p")[1]
    };
    assert_eq!(session.click(body).expect("click"), ClickOutcome::Listen);
    assert_eq!(session.mode(), CheckerMode::Listening);

    assert_eq!(session.click(img).expect("click"), ClickOutcome::ShowIssue(img));
    assert_eq!(session.focused_index(), Some(img_index));
    let live = session.decorator().editable().expect("editable");
    assert!(classes(live, img).contains(&FOCUSED_CLASS.to_string()));

    let fixes = block_on(session.fixes_for_focused()).expect("fixes");
    assert_eq!(fixes.len(), 1);
    let fix = &fixes[0];

    let mut form = FixForm::new();
    fix.display(session.decorator().editable().expect("editable"), &mut form);
    assert_eq!(form.input("alt").map(|input| input.value.as_str()), Some(""));

    let err = block_on(session.apply_fix(fix.as_ref(), &form.default_values()))
        .expect_err("empty alt rejected");
    assert_eq!(
        err,
        SessionError::Validation(vec!["Alternative text can not be empty".to_string()])
    );

    let values: FormValues = [("alt".to_string(), "Company logo".to_string())]
        .into_iter()
        .collect();
    let report = block_on(session.apply_fix(fix.as_ref(), &values)).expect("fix applied");
    assert_eq!(report.issues, 1);
    assert_eq!(session.issues().get_item(0).map(|issue| issue.id.as_str()), Some("pNotUsedAsHeader"));

    session.close().expect("close");
    assert_eq!(session.mode(), CheckerMode::Closed);
    assert!(session.issues().is_empty());
    assert_eq!(
        session.decorator().get_data().expect("data"),
        r#"<p><b>Heading</b></p><p>Body text</p><img src="logo.png" alt="Company logo">"#
    );
}

#[test]
fn ignored_issue_persists_through_export_unless_stripped() {
    let html = "<p><b>Heading</b></p>";
    let mut session = session_for(html, &CheckerConfig::default());
    block_on(session.check()).expect("check");
    session.set_issue_ignored(0, true).expect("ignore");

    let node = session
        .issues()
        .get_item(0)
        .and_then(|issue| issue.element)
        .expect("resolved");
    let live = session.decorator().editable().expect("editable");
    assert_eq!(classes(live, node), vec![IGNORED_CLASS, ISSUE_CLASS]);

    session.close().expect("close");
    let exported = session.decorator().get_data().expect("data");
    assert_eq!(exported, format!(r#"<p {IGNORE_ATTRIBUTE}="pNotUsedAsHeader"><b>Heading</b></p>"#));

    // Reloading the exported markup restores the ignored state.
    let mut reloaded = session_for(&exported, &CheckerConfig::default());
    let report = block_on(reloaded.check()).expect("check");
    assert_eq!(report.ignored, 1);

    let config = CheckerConfig {
        no_ignore_data: true,
        ..CheckerConfig::default()
    };
    let mut stripped = session_for(&exported, &config);
    block_on(stripped.check()).expect("check");
    stripped.close().expect("close");
    assert_eq!(stripped.decorator().get_data().expect("data"), html);
}

#[test]
fn ignored_and_active_issues_on_one_element() {
    let mut decorator = EditableDecorator::new(&CheckerConfig::default());
    decorator.set_data("<img>");
    decorator.apply_markup().expect("stamp");
    let live = decorator.editable().expect("editable");
    let img = live.find_first_by_name(live.root(), "img").expect("img");
    let sketchpad = live.clone();

    let mut ignored = Issue::detected_at("a", Testability::Error, &sketchpad, img);
    ignored.set_ignored(true);
    let active = Issue::detected_at("b", Testability::Warning, &sketchpad, img);
    let mut issues: IssueList = [ignored, active].into_iter().collect();

    decorator.resolve_editor_elements(&mut issues).expect("resolve");
    decorator.mark_issues(&issues).expect("mark");
    let live = decorator.editable().expect("editable");
    assert_eq!(classes(live, img), vec![ISSUE_CLASS, WARNING_CLASS]);

    // Resolving again without tree changes keeps the same bindings.
    let before: Vec<Option<NodeId>> = issues.iter().map(|issue| issue.element).collect();
    identity::resolve(&mut issues, decorator.editable().expect("editable"));
    let after: Vec<Option<NodeId>> = issues.iter().map(|issue| issue.element).collect();
    assert_eq!(before, after);
}

#[test]
fn config_file_drives_fix_limits() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("a11ychecker.json");
    std::fs::write(&path, r#"{"imgAltLengthLimit": 5, "formatTags": "p;h2;h3"}"#)
        .expect("write config");
    let config = CheckerConfig::load(&path).expect("config loads");

    let mut session = session_for("<img>", &config);
    block_on(session.check()).expect("check");
    session.next_issue().expect("focus");
    let fixes = block_on(session.fixes_for_focused()).expect("fixes");
    let values: FormValues = [("alt".to_string(), "too long".to_string())]
        .into_iter()
        .collect();
    assert_eq!(
        fixes[0].validate(&values),
        vec!["Alternative text is too long. It should be up to 5 characters while your has 8."
            .to_string()]
    );

    let missing = CheckerConfig::load(&dir.path().join("missing.json"));
    assert!(missing.is_err());
}
