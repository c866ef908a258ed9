//! Deadline/cancellation sources a tracking context can sit under.
//!
//! A `DeadlineSource` is the non-tracking half of a context's parent: it may
//! carry a wall-clock deadline, report upstream cancellation, and answer
//! keyed value lookups. The tracking context delegates all three verbatim.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

/// Why a deadline source considers itself finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CancelReason {
    #[error("cancelled by caller")]
    Cancelled,
    #[error("deadline has elapsed")]
    DeadlineElapsed,
}

/// A cancellable-deadline parent with no tracking capability.
///
/// All methods have inert defaults so simple sources only override what they
/// carry. Implementations must be safe to query from any thread at any time.
pub trait DeadlineSource: Send + Sync + 'static {
    /// Wall-clock instant after which work under this source should stop.
    fn deadline(&self) -> Option<Instant> {
        None
    }

    /// `Some` once this source is cancelled or past its deadline. Must never
    /// revert to `None` afterwards.
    fn cancelled(&self) -> Option<CancelReason> {
        None
    }

    /// Keyed value lookup, mirroring the deadline chain's request-scoped data.
    fn value(&self, key: TypeId) -> Option<Arc<dyn Any + Send + Sync>> {
        let _ = key;
        None
    }
}

/// The root source: no deadline, never cancels, carries no values.
#[derive(Debug, Clone, Copy, Default)]
pub struct Background;

impl DeadlineSource for Background {}

/// A manually driven deadline source.
///
/// The owner cancels it explicitly or lets the optional deadline elapse;
/// values are attached at construction and immutable afterwards. Explicit
/// cancellation takes precedence over deadline elapse when both hold.
#[derive(Default)]
pub struct CancelSource {
    deadline: Option<Instant>,
    cancelled: AtomicBool,
    values: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl CancelSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(at: Instant) -> Self {
        Self {
            deadline: Some(at),
            ..Self::default()
        }
    }

    /// Attach a value retrievable through `value::<T>()` on any descendant
    /// context. Construction-time only, so lookups need no locking.
    pub fn with_value<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.values.insert(TypeId::of::<T>(), Arc::new(value));
        self
    }

    /// One-way cancellation switch.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

impl DeadlineSource for CancelSource {
    fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    fn cancelled(&self) -> Option<CancelReason> {
        if self.cancelled.load(Ordering::Acquire) {
            return Some(CancelReason::Cancelled);
        }
        match self.deadline {
            Some(at) if Instant::now() >= at => Some(CancelReason::DeadlineElapsed),
            _ => None,
        }
    }

    fn value(&self, key: TypeId) -> Option<Arc<dyn Any + Send + Sync>> {
        self.values.get(&key).cloned()
    }
}
