#![forbid(unsafe_code)]
//! memtrack-core: quantity/limit model and deadline-source abstractions.
//!
//! This crate holds the value types shared by the tracking context and the
//! scope layer: the `Limit` tagged type (no sentinel arithmetic anywhere),
//! usage/limit/headroom snapshots, and the `DeadlineSource` trait that a
//! tracking context composes with. The mutable, concurrent machinery lives in
//! `memtrack-context`.

pub mod deadline;
pub mod limit;
pub mod usage;

pub use deadline::{Background, CancelReason, CancelSource, DeadlineSource};
pub use limit::Limit;
pub use usage::{Limits, Remains, Usage};
