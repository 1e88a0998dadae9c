//! Memoized quick fix type loading.
//!
//! # Responsibility
//! - Map fix type names to loaded types, loading each name at most once.
//!
//! # Invariants
//! - Concurrent requests for one name share a single in-flight load.
//! - A failed load is evicted, so the next request retries.
//! - Entries live as long as the cache; `global()` lives for the process.

use crate::config::CheckerConfig;
use crate::engine::loader::{BuiltinFixLoader, FixTypeLoad, FixTypeLoader};
use crate::engine::quickfix::QuickFixType;
use futures::future::{FutureExt, Shared};
use log::{debug, warn};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type SharedLoad = Shared<FixTypeLoad>;

static GLOBAL_CACHE: Lazy<Arc<FixTypeCache>> = Lazy::new(|| {
    Arc::new(FixTypeCache::new(Arc::new(BuiltinFixLoader::new(
        &CheckerConfig::default(),
    ))))
});

/// Fix type load failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixLoadError {
    NotFound(String),
    Failed { name: String, reason: String },
}

impl Display for FixLoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(name) => write!(f, "quick fix type not found: {name}"),
            Self::Failed { name, reason } => {
                write!(f, "failed to load quick fix type `{name}`: {reason}")
            }
        }
    }
}

impl Error for FixLoadError {}

/// Name-keyed cache of loaded fix types.
pub struct FixTypeCache {
    loader: Arc<dyn FixTypeLoader>,
    entries: Mutex<HashMap<String, SharedLoad>>,
}

impl FixTypeCache {
    pub fn new(loader: Arc<dyn FixTypeLoader>) -> Self {
        Self {
            loader,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Process-wide cache over the built-in types with default config.
    ///
    /// Hosts checking several documents with different settings should
    /// create one cache per session instead.
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL_CACHE)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SharedLoad>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Loaded type for `name`, loading it on first use.
    pub async fn get(&self, name: &str) -> Result<Arc<dyn QuickFixType>, FixLoadError> {
        let load = self.entry(name);
        let result = load.clone().await;
        if let Err(err) = &result {
            warn!(
                "event=fix_type_load module=engine status=error name={} error={}",
                name, err
            );
            let mut entries = self.lock();
            if entries
                .get(name)
                .is_some_and(|current| Shared::ptr_eq(current, &load))
            {
                entries.remove(name);
            }
        }
        result
    }

    fn entry(&self, name: &str) -> SharedLoad {
        let mut entries = self.lock();
        if let Some(existing) = entries.get(name) {
            debug!(
                "event=fix_type_load module=engine status=skip name={} reason=cached",
                name
            );
            return existing.clone();
        }
        debug!("event=fix_type_load module=engine status=ok name={} phase=start", name);
        let load = self.loader.load(name).shared();
        entries.insert(name.to_string(), load.clone());
        load
    }

    /// Whether `name` has a finished, successful load.
    pub fn is_cached(&self, name: &str) -> bool {
        self.lock()
            .get(name)
            .and_then(|load| load.peek())
            .is_some_and(Result::is_ok)
    }

    /// Whether a load for `name` has started and not been evicted.
    pub fn is_pending_or_cached(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{FixLoadError, FixTypeCache};
    use crate::engine::loader::{FixTypeLoad, FixTypeLoader};
    use crate::engine::quickfix::{ImgAltType, QuickFixType};
    use futures::executor::block_on;
    use futures::future::{self, FutureExt};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Fails the first `failures` loads, then succeeds.
    struct FlakyLoader {
        calls: AtomicUsize,
        failures: usize,
    }

    impl FixTypeLoader for FlakyLoader {
        fn load(&self, name: &str) -> FixTypeLoad {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let result: Result<Arc<dyn QuickFixType>, FixLoadError> = if call < self.failures {
                Err(FixLoadError::Failed {
                    name: name.to_string(),
                    reason: "network down".to_string(),
                })
            } else {
                Ok(Arc::new(ImgAltType {
                    alt_length_limit: 10,
                }))
            };
            future::ready(result).boxed()
        }
    }

    fn flaky(failures: usize) -> Arc<FlakyLoader> {
        Arc::new(FlakyLoader {
            calls: AtomicUsize::new(0),
            failures,
        })
    }

    #[test]
    fn hits_do_not_reload() {
        let loader = flaky(0);
        let cache = FixTypeCache::new(loader.clone());

        block_on(cache.get("ImgAlt")).expect("first load");
        block_on(cache.get("ImgAlt")).expect("cached load");

        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
        assert!(cache.is_cached("ImgAlt"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn failures_are_reported_and_evicted() {
        let loader = flaky(1);
        let cache = FixTypeCache::new(loader.clone());

        let err = block_on(cache.get("ImgAlt")).err().expect("first load fails");
        assert!(matches!(err, FixLoadError::Failed { .. }));
        assert!(cache.is_empty());

        block_on(cache.get("ImgAlt")).expect("retry succeeds");
        assert_eq!(loader.calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_cached("ImgAlt"));
    }

    #[test]
    fn global_cache_is_shared() {
        let first = FixTypeCache::global();
        let second = FixTypeCache::global();
        assert!(Arc::ptr_eq(&first, &second));
        let loaded = block_on(first.get("ParagraphToHeader")).expect("builtin");
        assert_eq!(loaded.name(), "ParagraphToHeader");
    }
}
