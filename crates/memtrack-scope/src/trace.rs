//! Scoped execution: run work with a tracking context bound to it.

use std::sync::Arc;

use tokio::task::JoinHandle;

use memtrack_context::{LimitOpt, Parent, TrackContext};

use crate::registry;

/// RAII registration for one scope. Restores the displaced outer
/// registration (or clears the slot) on drop, so unbinding happens even when
/// the work unwinds.
struct ActiveScope {
    prev: Option<Arc<TrackContext>>,
    registered: bool,
}

impl ActiveScope {
    fn enter(ctx: Arc<TrackContext>) -> Self {
        match registry::set_active(ctx) {
            Ok(prev) => {
                tracing::trace!("tracking scope registered");
                Self {
                    prev,
                    registered: true,
                }
            }
            Err(err) => {
                // The scope still runs; only implicit event routing is lost.
                tracing::warn!(%err, "tracking scope not registered");
                Self {
                    prev: None,
                    registered: false,
                }
            }
        }
    }
}

impl Drop for ActiveScope {
    fn drop(&mut self) {
        if !self.registered {
            return;
        }
        match self.prev.take() {
            // Our key is present, so restoring cannot hit the capacity bound.
            Some(prev) => {
                let _ = registry::set_active(prev);
            }
            None => {
                registry::clear_active();
            }
        }
        tracing::trace!("tracking scope unregistered");
    }
}

/// Run `work` under a fresh tracking context bound to the calling thread.
///
/// The context is built from `parent` and `opts`, registered for the
/// duration of the call, and handed to `work` explicitly as well. Nested
/// calls may pass `Parent::Tracker` of the enclosing context so consumption
/// rolls up.
pub fn trace<F, R>(parent: Parent, opts: &[LimitOpt], work: F) -> R
where
    F: FnOnce(Arc<TrackContext>) -> R,
{
    let ctx = TrackContext::new(parent, opts);
    let _scope = ActiveScope::enter(Arc::clone(&ctx));
    work(ctx)
}

/// Dispatch `work` on a tokio blocking thread under its own scope.
///
/// The new thread gets its own independent registration; nesting is explicit
/// via `Parent::Tracker`. The returned handle is the completion signal.
pub fn spawn_trace<F, R>(parent: Parent, opts: Vec<LimitOpt>, work: F) -> JoinHandle<R>
where
    F: FnOnce(Arc<TrackContext>) -> R + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(move || trace(parent, &opts, work))
}

/// Instrumentation entry point: route one observed allocation event
/// (`objects` objects of `unit_bytes` each, one call) to the calling
/// thread's active context. No-op outside any tracked scope.
pub fn record_alloc(unit_bytes: u64, objects: u64) {
    if let Some(ctx) = registry::get_active() {
        ctx.add(unit_bytes, objects, 1);
    }
}
