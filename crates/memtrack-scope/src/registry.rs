//! Bounded per-thread registry of active tracking contexts.
//!
//! Explicit parameter threading is the primary channel; this map exists only
//! for the instrumentation boundary, where an allocation observer has no way
//! to receive the context as an argument. Entries are inserted and removed
//! strictly within the lifetime of one `trace` invocation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::thread::{self, ThreadId};

use once_cell::sync::Lazy;
use thiserror::Error;

use memtrack_context::TrackContext;

/// Registry capacity when [`CAPACITY_ENV`] is unset or unparsable.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Env var bounding how many threads may hold an active scope at once.
pub const CAPACITY_ENV: &str = "MEMTRACK_MAX_SCOPES";

/// Registration refused because the registry is at capacity.
#[derive(Debug, Clone, Copy, Error)]
#[error("scope registry is at capacity")]
pub struct RegistryFull;

/// A concurrency-safe map from thread identity to that thread's active
/// tracking context, with a fixed capacity bound.
pub struct Registry {
    slots: RwLock<HashMap<ThreadId, Arc<TrackContext>>>,
    capacity: usize,
}

static GLOBAL: Lazy<Registry> = Lazy::new(|| Registry::with_capacity(capacity_from_env()));

fn capacity_from_env() -> usize {
    std::env::var(CAPACITY_ENV)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(DEFAULT_CAPACITY)
}

impl Registry {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Register `ctx` for the calling thread, returning any displaced
    /// registration so nested scopes can restore it on exit.
    pub fn set_active(
        &self,
        ctx: Arc<TrackContext>,
    ) -> Result<Option<Arc<TrackContext>>, RegistryFull> {
        let tid = thread::current().id();
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        if !slots.contains_key(&tid) && slots.len() >= self.capacity {
            return Err(RegistryFull);
        }
        Ok(slots.insert(tid, ctx))
    }

    /// Drop the calling thread's registration, returning it if present.
    pub fn clear_active(&self) -> Option<Arc<TrackContext>> {
        let tid = thread::current().id();
        self.slots
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&tid)
    }

    /// The calling thread's active context; `None` for threads that never
    /// entered a tracked scope.
    pub fn get_active(&self) -> Option<Arc<TrackContext>> {
        let tid = thread::current().id();
        self.slots
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&tid)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.slots.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Register on the process-wide registry.
pub fn set_active(ctx: Arc<TrackContext>) -> Result<Option<Arc<TrackContext>>, RegistryFull> {
    GLOBAL.set_active(ctx)
}

/// Unregister from the process-wide registry.
pub fn clear_active() -> Option<Arc<TrackContext>> {
    GLOBAL.clear_active()
}

/// Look up the calling thread's active context on the process-wide registry.
pub fn get_active() -> Option<Arc<TrackContext>> {
    GLOBAL.get_active()
}
