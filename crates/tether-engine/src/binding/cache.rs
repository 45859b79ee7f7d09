//! Single-flight binding cache
//!
//! One slot per (template, class, loader). The first caller for a key runs
//! resolution and generation; concurrent callers block on the slot's cell
//! and observe the same outcome. Failures are memoized like successes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::error::BindResult;
use crate::runtime::{ClassId, LoaderId, RuntimeClass};
use crate::template::{DescriptorId, TemplateDescriptor};

use super::Binding;

/// Cache key: descriptors compare by identity, classes by ID and loader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Template identity
    pub descriptor: DescriptorId,
    /// Target class
    pub class: ClassId,
    /// Loader of the target class
    pub loader: LoaderId,
}

impl CacheKey {
    /// Key for binding `descriptor` to `target`
    pub fn new(descriptor: &TemplateDescriptor, target: &RuntimeClass) -> Self {
        Self {
            descriptor: descriptor.id(),
            class: target.id(),
            loader: target.loader_id(),
        }
    }
}

/// How the builder should construct a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// First build for the key; the outcome is memoized
    Memoized,
    /// Nested request for a key this thread is already building; the
    /// outcome is returned to the caller only and must not generate
    Reentrant,
}

/// Cache counters
#[derive(Debug, Default)]
pub struct CacheStats {
    generation_runs: AtomicU64,
    hits: AtomicU64,
    reentrant: AtomicU64,
}

impl CacheStats {
    /// Number of memoized builds run
    pub fn generation_runs(&self) -> u64 {
        self.generation_runs.load(Ordering::Relaxed)
    }

    /// Number of requests answered from an existing slot
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of re-entrant requests served with a non-memoized binding
    pub fn reentrant(&self) -> u64 {
        self.reentrant.load(Ordering::Relaxed)
    }
}

struct Slot {
    cell: OnceCell<BindResult<Arc<Binding>>>,
    builder: Mutex<Option<ThreadId>>,
    target: Weak<RuntimeClass>,
}

impl Slot {
    fn new(target: &Arc<RuntimeClass>) -> Self {
        Self {
            cell: OnceCell::new(),
            builder: Mutex::new(None),
            target: Arc::downgrade(target),
        }
    }

    fn is_built_by(&self, thread: ThreadId) -> bool {
        *self.builder.lock() == Some(thread)
    }
}

/// Clears the slot's builder mark even if the build panics
struct BuilderGuard<'a>(&'a Slot);

impl<'a> BuilderGuard<'a> {
    fn enter(slot: &'a Slot) -> Self {
        *slot.builder.lock() = Some(thread::current().id());
        Self(slot)
    }
}

impl Drop for BuilderGuard<'_> {
    fn drop(&mut self) {
        *self.0.builder.lock() = None;
    }
}

/// Memoizes bindings per (template, class, loader)
///
/// Holds classes weakly; entries for unloaded classes are dropped by
/// [`BindingCache::purge_unloaded`] or [`BindingCache::evict_loader`].
pub struct BindingCache {
    slots: DashMap<CacheKey, Arc<Slot>>,
    stats: CacheStats,
}

impl BindingCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
            stats: CacheStats::default(),
        }
    }

    /// Return the binding for `descriptor` on `target`, running `build` at
    /// most once per key
    ///
    /// A request made by the thread currently building the same key calls
    /// `build` with [`BuildMode::Reentrant`] and does not memoize the result.
    pub fn get_or_create<F>(
        &self,
        descriptor: &TemplateDescriptor,
        target: &Arc<RuntimeClass>,
        build: F,
    ) -> BindResult<Arc<Binding>>
    where
        F: FnOnce(BuildMode) -> BindResult<Binding>,
    {
        let key = CacheKey::new(descriptor, target);
        let slot = self
            .slots
            .entry(key)
            .or_insert_with(|| Arc::new(Slot::new(target)))
            .clone();

        if let Some(outcome) = slot.cell.get() {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(template = descriptor.name(), target = target.name(), "binding cache hit");
            return outcome.clone();
        }

        let current = thread::current().id();
        if slot.is_built_by(current) {
            self.stats.reentrant.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(
                template = descriptor.name(),
                target = target.name(),
                "re-entrant binding request, using fallback"
            );
            return build(BuildMode::Reentrant).map(Arc::new);
        }

        let mut ran = false;
        let outcome = slot.cell.get_or_init(|| {
            let _guard = BuilderGuard::enter(&slot);
            ran = true;
            self.stats.generation_runs.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(template = descriptor.name(), target = target.name(), "binding cache miss");
            build(BuildMode::Memoized).map(Arc::new)
        });
        if !ran {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
        }
        outcome.clone()
    }

    /// Memoized outcome for a key, if one exists
    pub fn get(&self, key: &CacheKey) -> Option<BindResult<Arc<Binding>>> {
        self.slots.get(key).and_then(|slot| slot.cell.get().cloned())
    }

    /// Drop every entry whose class came from `loader`
    pub fn evict_loader(&self, loader: LoaderId) -> usize {
        let before = self.slots.len();
        self.slots.retain(|key, _| key.loader != loader);
        let evicted = before.saturating_sub(self.slots.len());
        tracing::debug!(%loader, evicted, "evicted bindings for loader");
        evicted
    }

    /// Drop every entry whose class is no longer alive
    pub fn purge_unloaded(&self) -> usize {
        let before = self.slots.len();
        self.slots.retain(|_, slot| slot.target.strong_count() > 0);
        before.saturating_sub(self.slots.len())
    }

    /// Number of keys with a slot
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.slots.clear();
    }

    /// Counters
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

impl Default for BindingCache {
    fn default() -> Self {
        Self::new()
    }
}
