//! The tracking context: atomic accounting, limits, and parent propagation.
//!
//! All six 64-bit fields are independent atomics. Recording and observation
//! never take a lock and never block; readers of a multi-field snapshot must
//! tolerate slight skew between the quantities of one logical event.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::watch;

use memtrack_core::{DeadlineSource, Limit, Limits, Remains, Usage};

/// What a tracking context sits under.
///
/// The two non-root cases are deliberately explicit so propagation handles
/// "parent can track" vs "parent is only a deadline" exhaustively.
#[derive(Clone)]
pub enum Parent {
    /// Top of the chain; no deadline, no tracking above.
    Root,
    /// A cancellable-deadline source with no tracking capability.
    Deadline(Arc<dyn DeadlineSource>),
    /// An enclosing tracking context; recorded deltas roll up into it.
    Tracker(Arc<TrackContext>),
}

impl fmt::Debug for Parent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parent::Root => f.write_str("Parent::Root"),
            Parent::Deadline(_) => f.write_str("Parent::Deadline"),
            Parent::Tracker(_) => f.write_str("Parent::Tracker"),
        }
    }
}

/// One limit-setting option. Construction applies an ordered list of these
/// over the defaults; the last option for a quantity wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitOpt {
    Bytes(Limit),
    Objects(Limit),
    Calls(Limit),
}

/// A unit-of-work-scoped resource tracker.
///
/// Safe to share (`Arc`) across any number of concurrent recorders and
/// readers. The parent link is fixed at construction, before the context is
/// published to other threads.
pub struct TrackContext {
    pub(crate) parent: Parent,
    bytes: AtomicU64,
    objects: AtomicU64,
    calls: AtomicU64,
    limit_bytes: AtomicU64,
    limit_objects: AtomicU64,
    limit_calls: AtomicU64,
    /// Shared cancellation signal; lazily started by `done()`.
    pub(crate) signal: Mutex<Option<watch::Receiver<bool>>>,
    /// Back-reference to the owning `Arc`, so errors and the poll task can
    /// carry the context without changing method receivers.
    pub(crate) handle: Weak<TrackContext>,
}

impl TrackContext {
    /// Build a context under `parent`, applying `opts` in order over the
    /// defaults (64 MiB bytes, unbounded objects and calls).
    pub fn new(parent: Parent, opts: &[LimitOpt]) -> Arc<Self> {
        let mut limits = Limits::default();
        for opt in opts {
            match *opt {
                LimitOpt::Bytes(limit) => limits.bytes = limit,
                LimitOpt::Objects(limit) => limits.objects = limit,
                LimitOpt::Calls(limit) => limits.calls = limit,
            }
        }
        Arc::new_cyclic(|handle| Self {
            parent,
            bytes: AtomicU64::new(0),
            objects: AtomicU64::new(0),
            calls: AtomicU64::new(0),
            limit_bytes: AtomicU64::new(limits.bytes.to_raw()),
            limit_objects: AtomicU64::new(limits.objects.to_raw()),
            limit_calls: AtomicU64::new(limits.calls.to_raw()),
            signal: Mutex::new(None),
            handle: handle.clone(),
        })
    }

    /// Record one consumption event: `unit_bytes * objects` bytes, `objects`
    /// objects, `calls` calls. Fire-and-forget; never blocks, never fails.
    ///
    /// The same original deltas are forwarded synchronously to a tracking
    /// parent, so once this returns every ancestor's totals are visible.
    pub fn add(&self, unit_bytes: u64, objects: u64, calls: u64) {
        self.bytes.fetch_add(unit_bytes * objects, Ordering::Relaxed);
        self.objects.fetch_add(objects, Ordering::Relaxed);
        self.calls.fetch_add(calls, Ordering::Relaxed);
        if let Parent::Tracker(parent) = &self.parent {
            parent.add(unit_bytes, objects, calls);
        }
    }

    /// Current totals. Each field is loaded independently.
    pub fn used(&self) -> Usage {
        Usage {
            bytes: self.bytes.load(Ordering::Relaxed),
            objects: self.objects.load(Ordering::Relaxed),
            calls: self.calls.load(Ordering::Relaxed),
        }
    }

    /// Configured ceilings.
    pub fn limits(&self) -> Limits {
        Limits {
            bytes: Limit::from_raw(self.limit_bytes.load(Ordering::Relaxed)),
            objects: Limit::from_raw(self.limit_objects.load(Ordering::Relaxed)),
            calls: Limit::from_raw(self.limit_calls.load(Ordering::Relaxed)),
        }
    }

    /// Headroom per quantity. A locally unbounded quantity inherits the
    /// tracking parent's headroom, since the effective ceiling is the
    /// minimum across the chain.
    pub fn remains(&self) -> Remains {
        let used = self.used();
        let limits = self.limits();
        let inherited = match &self.parent {
            Parent::Tracker(parent) => Some(parent.remains()),
            _ => None,
        };
        let quantity = |limit: Limit, used: u64, up: Option<Limit>| -> Limit {
            if limit.is_unbounded() {
                up.unwrap_or(Limit::Unbounded)
            } else {
                limit.headroom(used)
            }
        };
        Remains {
            bytes: quantity(limits.bytes, used.bytes, inherited.map(|r| r.bytes)),
            objects: quantity(limits.objects, used.objects, inherited.map(|r| r.objects)),
            calls: quantity(limits.calls, used.calls, inherited.map(|r| r.calls)),
        }
    }

    /// True once any quantity is strictly over its finite ceiling here or in
    /// any tracking ancestor.
    pub fn exceeded(&self) -> bool {
        let used = self.used();
        let limits = self.limits();
        if limits.bytes.breached(used.bytes)
            || limits.objects.breached(used.objects)
            || limits.calls.breached(used.calls)
        {
            return true;
        }
        if let Parent::Tracker(parent) = &self.parent {
            return parent.exceeded();
        }
        false
    }

    /// Zero this context's counters. Limits and the parent chain (including
    /// an ancestor that is already over budget) are untouched.
    pub fn reset(&self) {
        self.bytes.store(0, Ordering::Relaxed);
        self.objects.store(0, Ordering::Relaxed);
        self.calls.store(0, Ordering::Relaxed);
    }
}

impl fmt::Display for TrackContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let used = self.used();
        write!(
            f,
            "{} objects allocated totalling {} bytes across {} calls",
            used.objects, used.bytes, used.calls
        )
    }
}

impl fmt::Debug for TrackContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackContext")
            .field("parent", &self.parent)
            .field("used", &self.used())
            .field("limits", &self.limits())
            .finish()
    }
}
