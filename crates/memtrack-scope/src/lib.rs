#![forbid(unsafe_code)]
//! memtrack-scope: binding a tracking context to a unit of work.
//!
//! `trace` runs a closure with a fresh [`TrackContext`] registered as the
//! calling thread's active context; `spawn_trace` does the same on a tokio
//! blocking thread. The registry is the boundary handed to instrumentation
//! collaborators: they call [`record_alloc`] (or `get_active` directly) to
//! route observed allocation events without parameter threading.
//!
//! [`TrackContext`]: memtrack_context::TrackContext

pub mod registry;
pub mod trace;

pub use registry::{clear_active, get_active, set_active, Registry, RegistryFull};
pub use trace::{record_alloc, spawn_trace, trace};
