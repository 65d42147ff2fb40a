//! Process-wide instance-to-handler registry.
//!
//! The single shared mutable resource of the engine. Entries hold the mock
//! weakly: the registry never keeps a mock alive, and dead entries are
//! pruned lazily when the map grows. A cleared mock's entry is replaced
//! with the DisabledHandler singleton, never removed, so later calls are
//! still intercepted and rejected safely.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;

use mirage_sdk::{DisabledHandler, InstanceHandle, MockHandler};

use crate::instance::{Instance, InstanceRef};

struct MockEntry {
    instance: Weak<Instance>,
    handler: Arc<dyn MockHandler>,
}

/// Concurrent mapping from mock instance identity to its active handler.
pub struct MockRegistry {
    entries: DashMap<InstanceHandle, MockEntry>,
    prune_watermark: AtomicUsize,
}

impl Default for MockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            prune_watermark: AtomicUsize::new(128),
        }
    }

    /// Attach `handler` to `instance`.
    ///
    /// The entry is inserted fully formed: a concurrent lookup either misses
    /// the instance entirely or observes it with its handler attached.
    pub fn register(&self, instance: &InstanceRef, handler: Arc<dyn MockHandler>) {
        if self.entries.len() >= self.prune_watermark.load(Ordering::Relaxed) {
            self.prune_dead();
            let next = (self.entries.len() * 2).max(128);
            self.prune_watermark.store(next, Ordering::Relaxed);
        }
        self.entries.insert(
            instance.handle(),
            MockEntry {
                instance: Arc::downgrade(instance),
                handler,
            },
        );
    }

    /// Current handler of `instance`, or `None` if it was never registered.
    pub fn get_handler(&self, instance: &InstanceRef) -> Option<Arc<dyn MockHandler>> {
        self.handler_by_handle(instance.handle())
    }

    /// Current handler by raw handle.
    pub fn handler_by_handle(&self, handle: InstanceHandle) -> Option<Arc<dyn MockHandler>> {
        self.entries.get(&handle).map(|e| e.handler.clone())
    }

    /// Replace the instance's handler with the DisabledHandler singleton.
    /// Idempotent; a never-registered instance stays unregistered.
    pub fn clear_mock(&self, instance: &InstanceRef) {
        if let Some(mut entry) = self.entries.get_mut(&instance.handle()) {
            entry.handler = DisabledHandler::handler();
        }
    }

    /// Replace every registered entry's handler with the DisabledHandler
    /// singleton. Idempotent; safe on an empty registry. Mocks registered
    /// after this call keep their own handlers.
    pub fn clear_all_mocks(&self) {
        self.entries.retain(|_, entry| entry.instance.strong_count() > 0);
        for mut entry in self.entries.iter_mut() {
            entry.handler = DisabledHandler::handler();
        }
    }

    /// Drop entries whose instance has been collected.
    pub fn prune_dead(&self) {
        self.entries.retain(|_, entry| entry.instance.strong_count() > 0);
    }

    /// Number of registered entries (dead entries included until pruned).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for MockRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockRegistry")
            .field("entries", &self.entries.len())
            .finish()
    }
}
