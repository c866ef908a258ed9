#![forbid(unsafe_code)]
//! memtrack-context: the resource-limit tracking context.
//!
//! A [`TrackContext`] accumulates bytes/objects/calls through lock-free
//! atomic counters, rolls every recorded delta up its parent chain, and
//! exposes the exceeded condition both as a predicate and as a single-fire
//! cancellation signal composed with the parent's own deadline state.
//!
//! Accounting never blocks and never fails; observing the signal and
//! deciding to stop is the caller's job.

pub mod cancel;
pub mod context;
pub mod error;

pub use context::{LimitOpt, Parent, TrackContext};
pub use error::{Error, Result};
