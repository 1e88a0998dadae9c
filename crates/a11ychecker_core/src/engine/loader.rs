//! Quick fix type loaders.

use crate::config::CheckerConfig;
use crate::engine::cache::FixLoadError;
use crate::engine::quickfix::{ImgAltType, ParagraphToHeaderType, QuickFixType};
use futures::future::{self, BoxFuture, FutureExt};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Future resolving to one loaded fix type.
pub type FixTypeLoad = BoxFuture<'static, Result<Arc<dyn QuickFixType>, FixLoadError>>;

/// Resolves a fix type name to its implementation.
///
/// The returned future must own everything it needs, because the cache
/// shares it between concurrent callers.
pub trait FixTypeLoader: Send + Sync {
    fn load(&self, name: &str) -> FixTypeLoad;
}

/// Registry of fix types compiled into this crate.
#[derive(Default)]
pub struct BuiltinFixLoader {
    types: BTreeMap<String, Arc<dyn QuickFixType>>,
}

impl BuiltinFixLoader {
    /// Loader with `ImgAlt` and `ParagraphToHeader` set up from `config`.
    pub fn new(config: &CheckerConfig) -> Self {
        let mut loader = Self::default();
        let builtins: [Arc<dyn QuickFixType>; 2] = [
            Arc::new(ImgAltType {
                alt_length_limit: config.img_alt_length_limit,
            }),
            Arc::new(ParagraphToHeaderType::new(config.heading_levels())),
        ];
        for fix_type in builtins {
            loader.types.insert(fix_type.name().to_string(), fix_type);
        }
        loader
    }

    /// Adds a host-provided fix type.
    ///
    /// # Errors
    /// - `FixLoadError::Failed` when the name is empty or already taken.
    pub fn register(&mut self, fix_type: Arc<dyn QuickFixType>) -> Result<(), FixLoadError> {
        let name = fix_type.name().trim().to_string();
        if name.is_empty() {
            return Err(FixLoadError::Failed {
                name,
                reason: "fix type name must not be empty".to_string(),
            });
        }
        if self.types.contains_key(&name) {
            return Err(FixLoadError::Failed {
                name,
                reason: "fix type already registered".to_string(),
            });
        }
        self.types.insert(name, fix_type);
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }
}

impl FixTypeLoader for BuiltinFixLoader {
    fn load(&self, name: &str) -> FixTypeLoad {
        let result = self
            .types
            .get(name)
            .cloned()
            .ok_or_else(|| FixLoadError::NotFound(name.to_string()));
        future::ready(result).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::{BuiltinFixLoader, FixTypeLoader};
    use crate::config::CheckerConfig;
    use crate::engine::cache::FixLoadError;
    use crate::engine::quickfix::{ImgAltType, QuickFixType};
    use futures::executor::block_on;
    use std::sync::Arc;

    #[test]
    fn builtins_are_loadable_by_name() {
        let loader = BuiltinFixLoader::new(&CheckerConfig::default());
        assert_eq!(
            loader.names().collect::<Vec<_>>(),
            vec!["ImgAlt", "ParagraphToHeader"]
        );
        let loaded = block_on(loader.load("ImgAlt")).expect("builtin loads");
        assert_eq!(loaded.name(), "ImgAlt");

        let err = block_on(loader.load("Missing")).err().expect("unknown name");
        assert_eq!(err, FixLoadError::NotFound("Missing".to_string()));
    }

    #[test]
    fn register_rejects_duplicates() {
        let mut loader = BuiltinFixLoader::new(&CheckerConfig::default());
        let err = loader
            .register(Arc::new(ImgAltType {
                alt_length_limit: 5,
            }))
            .expect_err("duplicate name");
        assert!(matches!(err, FixLoadError::Failed { .. }));
    }
}
