#![forbid(unsafe_code)]
//! memtrack: composable resource-limit tracking contexts.
//!
//! Umbrella crate re-exporting the workspace members:
//! - `memtrack-core` — the quantity/limit model and deadline-source traits
//! - `memtrack-context` — the atomic tracking context and its cancellation
//!   adapter
//! - `memtrack-scope` — scoped execution binding and the per-thread registry
//!
//! ```no_run
//! use memtrack::{trace, Limit, LimitOpt, Parent};
//!
//! trace(Parent::Root, &[LimitOpt::Bytes(Limit::Finite(1024))], |ctx| {
//!     ctx.add(64, 2, 1); // two 64-byte objects in one call
//!     assert!(!ctx.exceeded());
//! });
//! ```

pub use memtrack_core::{
    limit, Background, CancelReason, CancelSource, DeadlineSource, Limit, Limits, Remains, Usage,
};

pub use memtrack_context::{cancel::POLL_INTERVAL, Error, LimitOpt, Parent, TrackContext};

pub use memtrack_scope::{
    clear_active, get_active, record_alloc, set_active, spawn_trace, trace, Registry, RegistryFull,
};
