//! Cancellation adapter over the tracking context.
//!
//! Composes the parent chain's deadline state with the local exceeded
//! predicate. Deadline and value queries delegate verbatim; the done signal
//! is a watch channel fed by one lazily started poll task per context, shared
//! by every caller and torn down as soon as it fires.

use std::any::{Any, TypeId};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};

use crate::context::{Parent, TrackContext};
use crate::error::Error;

/// How often the poll task re-checks the parent and the local limits.
pub const POLL_INTERVAL: Duration = Duration::from_millis(1);

impl TrackContext {
    /// Deadline of the nearest deadline source up the chain, if any.
    pub fn deadline(&self) -> Option<Instant> {
        match &self.parent {
            Parent::Root => None,
            Parent::Deadline(src) => src.deadline(),
            Parent::Tracker(parent) => parent.deadline(),
        }
    }

    /// Why this context should stop, if it should.
    ///
    /// The parent chain's own error always wins over local exceedance, so an
    /// upstream timeout is never misreported as a limit breach.
    pub fn err(&self) -> Option<Error> {
        match &self.parent {
            Parent::Root => {}
            Parent::Deadline(src) => {
                if let Some(reason) = src.cancelled() {
                    return Some(Error::Cancelled(reason));
                }
            }
            Parent::Tracker(parent) => {
                if let Some(err) = parent.err() {
                    return Some(err);
                }
            }
        }
        if self.exceeded() {
            if let Some(me) = self.handle.upgrade() {
                return Some(Error::LimitsExceeded(me));
            }
        }
        None
    }

    /// Keyed value lookup, delegated verbatim up the chain.
    pub fn value(&self, key: TypeId) -> Option<Arc<dyn Any + Send + Sync>> {
        match &self.parent {
            Parent::Root => None,
            Parent::Deadline(src) => src.value(key),
            Parent::Tracker(parent) => parent.value(key),
        }
    }

    /// Typed convenience over [`TrackContext::value`].
    pub fn value_of<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.value(TypeId::of::<T>()).and_then(|v| v.downcast().ok())
    }

    /// Obtain the cancellation signal: a receiver that flips to `true` once
    /// the parent is cancelled or limits are exceeded.
    ///
    /// Already-triggered conditions yield an immediately-true receiver with
    /// no background work. Otherwise all callers share one poll task; a fresh
    /// task is started if a previous one fired and `reset()` has since
    /// cleared the condition. Must be called within a tokio runtime.
    pub fn done(&self) -> watch::Receiver<bool> {
        let mut slot = self.signal.lock().unwrap_or_else(|e| e.into_inner());
        if self.err().is_some() {
            let (tx, rx) = watch::channel(true);
            drop(tx);
            return rx;
        }
        if let Some(rx) = slot.as_ref() {
            if !*rx.borrow() {
                return rx.clone();
            }
        }
        let rx = spawn_watcher(self.handle.clone());
        *slot = Some(rx.clone());
        rx
    }

    /// Await the cancellation signal.
    pub async fn cancelled(&self) {
        let mut rx = self.done();
        while !*rx.borrow() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

fn spawn_watcher(handle: Weak<TrackContext>) -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        let mut tick = time::interval(POLL_INTERVAL);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tick.tick().await;
            // Only a weak handle is held here, so the context (and this
            // poll with it) can be reclaimed once every owner is gone.
            let Some(ctx) = handle.upgrade() else { return };
            if ctx.err().is_some() {
                tracing::trace!(context = %ctx, "cancellation signal fired");
                let _ = tx.send(true);
                // Returning drops the interval; polling stops here.
                return;
            }
        }
    });
    rx
}
