//! In-process registry of open graph instances.
//!
//! The registry is the single authority on which named graphs are open.
//! Publication is keyed per name: concurrent demand for one name collapses
//! into a single construction while operations on unrelated names proceed
//! independently.

use std::future::Future;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tenantgraph_backend::{BackendError, GraphInstance};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::ManagementError;

/// Concurrency-safe map from graph name to live instance.
///
/// Guarantees:
/// - at most one instance per name is observable at any instant
/// - `open_or_create` runs at most one construction per name at a time, and
///   every concurrent caller receives the instance that won publication
/// - a failed construction leaves the name immediately retryable
/// - `remove` atomically detaches: once it returns, no later call observes
///   the removed instance
pub struct GraphRegistry {
    /// Published instances
    graphs: DashMap<String, Arc<dyn GraphInstance>>,

    /// Per-name construction locks
    open_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl GraphRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            graphs: DashMap::new(),
            open_locks: DashMap::new(),
        }
    }

    /// The instance registered under `name`, if one is open.
    pub fn get(&self, name: &str) -> Option<Arc<dyn GraphInstance>> {
        self.graphs.get(name).map(|entry| Arc::clone(&entry))
    }

    /// Names of all open graphs.
    pub fn names(&self) -> Vec<String> {
        self.graphs.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Number of open graphs.
    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    /// Whether no graph is open.
    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    /// Return the instance registered under `name`, constructing and
    /// publishing it with `ctor` if absent.
    ///
    /// When several callers race on an absent name, one runs `ctor` while
    /// the rest wait on the name's lock and then observe the published
    /// instance. A `ctor` error propagates to its caller only; nothing is
    /// published and the next caller constructs again.
    pub async fn open_or_create<F, Fut>(
        &self,
        name: &str,
        ctor: F,
    ) -> Result<Arc<dyn GraphInstance>, ManagementError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<dyn GraphInstance>, BackendError>>,
    {
        if let Some(existing) = self.get(name) {
            return Ok(existing);
        }

        let lock = {
            let entry = self.open_locks.entry(name.to_string()).or_default();
            Arc::clone(&*entry)
        };
        let _guard = lock.lock().await;

        // Re-check after acquiring the lock: a concurrent caller may have
        // published while we waited.
        if let Some(existing) = self.get(name) {
            return Ok(existing);
        }

        debug!("constructing graph instance '{}'", name);
        let built = ctor().await?;

        match self.graphs.entry(name.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&built));
                info!("registered graph '{}'", name);
                Ok(built)
            }
            Entry::Occupied(slot) => {
                // A construction serialized on a stale lock raced a remove;
                // first publication wins and the loser is discarded.
                let existing = Arc::clone(slot.get());
                drop(slot);
                if let Err(err) = built.close().await {
                    warn!("failed to close losing instance of '{}': {}", name, err);
                }
                Ok(existing)
            }
        }
    }

    /// Detach and return the instance registered under `name`.
    ///
    /// Removal does not close the instance; callers own that step.
    pub fn remove(&self, name: &str) -> Option<Arc<dyn GraphInstance>> {
        let removed = self.graphs.remove(name).map(|(_, graph)| graph);
        if removed.is_some() {
            self.open_locks.remove(name);
            info!("removed graph '{}' from registry", name);
        }
        removed
    }
}

impl Default for GraphRegistry {
    fn default() -> Self {
        Self::new()
    }
}
