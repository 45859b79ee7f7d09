//! Class loaders
//!
//! A loader is a namespace of classes belonging to one release of the target
//! code base. The same class name can exist in several loaders at once, each
//! with its own layout and version.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::version::VersionTag;

use super::class::{ClassBuilder, RuntimeClass};
use super::error::LoaderError;

/// Unique loader identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoaderId(u64);

static NEXT_LOADER_ID: AtomicU64 = AtomicU64::new(1);

impl LoaderId {
    fn next() -> Self {
        LoaderId(NEXT_LOADER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the numeric ID value
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LoaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "loader#{}", self.0)
    }
}

/// A namespace of loaded classes tagged with a release version
pub struct ClassLoader {
    id: LoaderId,
    name: String,
    version: VersionTag,
    parent: Option<Arc<ClassLoader>>,
    classes: RwLock<FxHashMap<Arc<str>, Arc<RuntimeClass>>>,
    unloaded: AtomicBool,
}

impl ClassLoader {
    /// Create a root loader
    pub fn new(name: &str, version: VersionTag) -> Arc<Self> {
        Arc::new(Self {
            id: LoaderId::next(),
            name: name.to_string(),
            version,
            parent: None,
            classes: RwLock::new(FxHashMap::default()),
            unloaded: AtomicBool::new(false),
        })
    }

    /// Create a loader delegating unknown names to `parent`
    pub fn with_parent(name: &str, version: VersionTag, parent: Arc<ClassLoader>) -> Arc<Self> {
        Arc::new(Self {
            id: LoaderId::next(),
            name: name.to_string(),
            version,
            parent: Some(parent),
            classes: RwLock::new(FxHashMap::default()),
            unloaded: AtomicBool::new(false),
        })
    }

    /// Loader ID
    pub fn id(&self) -> LoaderId {
        self.id
    }

    /// Loader name (diagnostics only)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Release tag of the classes in this loader
    pub fn version(&self) -> &VersionTag {
        &self.version
    }

    /// Parent loader
    pub fn parent(&self) -> Option<&Arc<ClassLoader>> {
        self.parent.as_ref()
    }

    /// Define a class in this loader
    pub fn define(self: &Arc<Self>, builder: ClassBuilder) -> Result<Arc<RuntimeClass>, LoaderError> {
        let mut classes = self.classes.write();
        if classes.contains_key(builder.name()) {
            return Err(LoaderError::DuplicateClass(builder.name().to_string()));
        }
        let class = Arc::new(builder.finish(self.id, Arc::downgrade(self), self.version.clone())?);
        classes.insert(Arc::from(class.name()), class.clone());
        tracing::trace!(class = class.name(), loader = %self.id, "class defined");
        Ok(class)
    }

    /// Look up a class by name
    ///
    /// Tries the exact name here, then in the parent chain, then a unique
    /// simple-name match so unqualified references find qualified classes.
    pub fn find_class(&self, name: &str) -> Option<Arc<RuntimeClass>> {
        if let Some(class) = self.find_exact(name) {
            return Some(class);
        }

        let mut matches = Vec::new();
        let mut loader = Some(self);
        while let Some(current) = loader {
            for class in current.classes.read().values() {
                if class.simple_name() == name {
                    matches.push(class.clone());
                }
            }
            loader = current.parent.as_deref();
        }
        if matches.len() == 1 {
            matches.pop()
        } else {
            None
        }
    }

    fn find_exact(&self, name: &str) -> Option<Arc<RuntimeClass>> {
        let mut loader = Some(self);
        while let Some(current) = loader {
            if let Some(class) = current.classes.read().get(name) {
                return Some(class.clone());
            }
            loader = current.parent.as_deref();
        }
        None
    }

    /// Classes defined directly by this loader
    pub fn classes(&self) -> Vec<Arc<RuntimeClass>> {
        self.classes.read().values().cloned().collect()
    }

    /// Drop every class defined by this loader
    ///
    /// Classes stay alive only as long as something else (an instance)
    /// references them.
    pub fn unload(&self) {
        self.classes.write().clear();
        self.unloaded.store(true, Ordering::Release);
    }

    /// Check whether [`unload`](Self::unload) was called
    pub fn is_unloaded(&self) -> bool {
        self.unloaded.load(Ordering::Acquire)
    }
}

impl fmt::Debug for ClassLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassLoader")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("version", &self.version.to_string())
            .field("classes", &self.classes.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> VersionTag {
        VersionTag::parse(s).unwrap()
    }

    #[test]
    fn test_same_name_in_two_loaders() {
        let a = ClassLoader::new("a", v("1.0"));
        let b = ClassLoader::new("b", v("2.0"));
        let pa = a.define(ClassBuilder::new("geo.Point")).unwrap();
        let pb = b.define(ClassBuilder::new("geo.Point")).unwrap();
        assert_ne!(pa.id(), pb.id());
        assert_eq!(pa.version(), &v("1.0"));
        assert_eq!(pb.loader_id(), b.id());
    }

    #[test]
    fn test_duplicate_class() {
        let loader = ClassLoader::new("a", v("1.0"));
        loader.define(ClassBuilder::new("Point")).unwrap();
        assert_eq!(
            loader.define(ClassBuilder::new("Point")).unwrap_err(),
            LoaderError::DuplicateClass("Point".to_string())
        );
    }

    #[test]
    fn test_find_class_by_simple_name_and_parent() {
        let parent = ClassLoader::new("base", v("1.0"));
        parent.define(ClassBuilder::new("core.Entity")).unwrap();
        let child = ClassLoader::with_parent("plugin", v("1.0"), parent.clone());
        child.define(ClassBuilder::new("geo.Point")).unwrap();

        assert_eq!(child.find_class("geo.Point").unwrap().name(), "geo.Point");
        assert_eq!(child.find_class("Point").unwrap().name(), "geo.Point");
        assert_eq!(child.find_class("Entity").unwrap().name(), "core.Entity");
        assert!(parent.find_class("Point").is_none());
    }

    #[test]
    fn test_ambiguous_simple_name() {
        let loader = ClassLoader::new("a", v("1.0"));
        loader.define(ClassBuilder::new("a.Point")).unwrap();
        loader.define(ClassBuilder::new("b.Point")).unwrap();
        assert!(loader.find_class("Point").is_none());
    }

    #[test]
    fn test_unload_releases_classes() {
        let loader = ClassLoader::new("a", v("1.0"));
        let weak = Arc::downgrade(&loader.define(ClassBuilder::new("Point")).unwrap());
        assert!(weak.upgrade().is_some());
        loader.unload();
        assert!(loader.is_unloaded());
        assert!(weak.upgrade().is_none());
    }
}
