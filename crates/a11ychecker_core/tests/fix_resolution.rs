use a11ychecker_core::engine::{
    CheckContext, Engine, EngineError, FixForm, FixLoadError, FixTypeCache, FixTypeLoad,
    FixTypeLoader, FixesMapping, FormValues, QuickFix, QuickFixError, QuickFixType,
};
use a11ychecker_core::{Document, Issue, IssueDetails, IssueList, NodeId, Testability};
use async_trait::async_trait;
use futures::channel::oneshot;
use futures::executor::block_on;
use futures::FutureExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Loader whose loads finish only when the test opens their gate.
#[derive(Default)]
struct GatedLoader {
    calls: AtomicUsize,
    gates: Mutex<Vec<(String, oneshot::Sender<()>)>>,
}

impl GatedLoader {
    fn open(&self, name: &str) {
        let sender = self.take(name).expect("pending load for name");
        sender.send(()).expect("load still awaited");
    }

    fn fail(&self, name: &str) {
        drop(self.take(name).expect("pending load for name"));
    }

    fn take(&self, name: &str) -> Option<oneshot::Sender<()>> {
        let mut gates = self.gates.lock().expect("gates lock");
        let position = gates.iter().position(|(gate, _)| gate == name)?;
        Some(gates.remove(position).1)
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FixTypeLoader for GatedLoader {
    fn load(&self, name: &str) -> FixTypeLoad {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (sender, receiver) = oneshot::channel();
        self.gates
            .lock()
            .expect("gates lock")
            .push((name.to_string(), sender));
        let name = name.to_string();
        async move {
            receiver.await.map_err(|_| FixLoadError::Failed {
                name: name.clone(),
                reason: "loader dropped".to_string(),
            })?;
            let fix_type: Arc<dyn QuickFixType> = Arc::new(NamedType(name));
            Ok::<_, FixLoadError>(fix_type)
        }
        .boxed()
    }
}

struct NamedType(String);

impl QuickFixType for NamedType {
    fn name(&self) -> &str {
        &self.0
    }

    fn create(&self, issue: Issue) -> Box<dyn QuickFix> {
        Box::new(NamedFix {
            name: self.0.clone(),
            issue,
        })
    }
}

struct NamedFix {
    name: String,
    issue: Issue,
}

impl QuickFix for NamedFix {
    fn name(&self) -> &str {
        &self.name
    }

    fn issue(&self) -> &Issue {
        &self.issue
    }

    fn display(&self, _document: &Document, _form: &mut FixForm) {}

    fn validate(&self, _values: &FormValues) -> Vec<String> {
        Vec::new()
    }

    fn fix(&self, _document: &mut Document, _values: &FormValues) -> Result<NodeId, QuickFixError> {
        self.issue
            .element
            .ok_or_else(|| QuickFixError::Unresolved(self.issue.id.clone()))
    }
}

struct GatedEngine {
    mapping: FixesMapping,
    cache: FixTypeCache,
}

impl GatedEngine {
    fn new(loader: Arc<GatedLoader>) -> Self {
        let mut mapping = FixesMapping::new();
        mapping.insert(
            "twoFixes".to_string(),
            vec!["First".to_string(), "Second".to_string()],
        );
        mapping.insert("noFixes".to_string(), Vec::new());
        Self {
            mapping,
            cache: FixTypeCache::new(loader),
        }
    }
}

#[async_trait]
impl Engine for GatedEngine {
    fn name(&self) -> &str {
        "gated"
    }

    fn fixes_mapping(&self) -> &FixesMapping {
        &self.mapping
    }

    fn fix_cache(&self) -> &FixTypeCache {
        &self.cache
    }

    async fn process(
        &self,
        _context: &CheckContext,
        _content: &Document,
        _issues: &mut IssueList,
    ) -> Result<(), EngineError> {
        Ok(())
    }

    async fn get_issue_details(&self, issue: &Issue) -> Result<IssueDetails, EngineError> {
        Err(EngineError::UnknownIssue(issue.id.clone()))
    }
}

fn names(fixes: &[Box<dyn QuickFix>]) -> Vec<&str> {
    fixes.iter().map(|fix| fix.name()).collect()
}

#[test]
fn unmapped_and_empty_kinds_resolve_immediately_without_loading() {
    let loader = Arc::new(GatedLoader::default());
    let engine = GatedEngine::new(loader.clone());

    for kind in ["unmapped", "noFixes"] {
        let issue = Issue::new(kind, Testability::Error);
        let fixes = engine
            .get_fixes(&issue)
            .now_or_never()
            .expect("resolves without waiting")
            .expect("no load error");
        assert!(fixes.is_empty());
    }
    assert_eq!(loader.calls(), 0);
    assert!(engine.fix_cache().is_empty());
}

#[test]
fn get_fixes_waits_for_every_type_and_keeps_declared_order() {
    let loader = Arc::new(GatedLoader::default());
    let engine = GatedEngine::new(loader.clone());
    let issue = Issue::new("twoFixes", Testability::Warning);

    let mut fetch = engine.get_fixes(&issue);
    assert!(fetch.as_mut().now_or_never().is_none());
    assert_eq!(loader.calls(), 2);

    loader.open("Second");
    assert!(fetch.as_mut().now_or_never().is_none());

    loader.open("First");
    let fixes = fetch
        .as_mut()
        .now_or_never()
        .expect("both loads done")
        .expect("no load error");
    assert_eq!(names(&fixes), vec!["First", "Second"]);
    assert!(fixes.iter().all(|fix| fix.issue().id == "twoFixes"));
}

#[test]
fn concurrent_requests_share_one_load_per_type() {
    let loader = Arc::new(GatedLoader::default());
    let engine = GatedEngine::new(loader.clone());
    let issue = Issue::new("twoFixes", Testability::Notice);

    let mut first = engine.get_fixes(&issue);
    let mut second = engine.get_fixes(&issue);
    assert!(first.as_mut().now_or_never().is_none());
    assert!(second.as_mut().now_or_never().is_none());
    assert_eq!(loader.calls(), 2);

    loader.open("First");
    loader.open("Second");
    let first = block_on(first).expect("first request");
    let second = block_on(second).expect("second request");
    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 2);

    // Later requests are served from the cache.
    let third = block_on(engine.get_fixes(&issue)).expect("cached request");
    assert_eq!(names(&third), vec!["First", "Second"]);
    assert_eq!(loader.calls(), 2);
    assert!(engine.fix_cache().is_cached("First"));
}

#[test]
fn failed_load_is_reported_and_retried() {
    let loader = Arc::new(GatedLoader::default());
    let engine = GatedEngine::new(loader.clone());
    let issue = Issue::new("twoFixes", Testability::Error);

    let mut fetch = engine.get_fixes(&issue);
    assert!(fetch.as_mut().now_or_never().is_none());
    loader.open("First");
    loader.fail("Second");

    let err = block_on(fetch).err().expect("load failure surfaces");
    assert!(matches!(err, FixLoadError::Failed { ref name, .. } if name == "Second"));
    assert!(engine.fix_cache().is_cached("First"));
    assert!(!engine.fix_cache().is_pending_or_cached("Second"));

    let mut retry = engine.get_fixes(&issue);
    assert!(retry.as_mut().now_or_never().is_none());
    assert_eq!(loader.calls(), 3);
    loader.open("Second");
    let fixes = block_on(retry).expect("retry succeeds");
    assert_eq!(names(&fixes), vec!["First", "Second"]);
}
