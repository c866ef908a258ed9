use std::sync::Arc;

use thiserror::Error;

use memtrack_core::CancelReason;

use crate::context::TrackContext;

/// Result type local to memtrack-context.
pub type Result<T> = std::result::Result<T, Error>;

/// The two ways a tracked scope can be told to stop.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The parent deadline chain cancelled or timed out. Always reported in
    /// preference to a local limit breach.
    #[error("parent cancelled: {0}")]
    Cancelled(#[from] CancelReason),

    /// This context (or an ancestor tracker) is over budget. Carries the
    /// offending context so callers can render its current usage.
    #[error("resource limits exceeded ({0})")]
    LimitsExceeded(Arc<TrackContext>),
}

impl Error {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled(_))
    }

    pub fn is_limits_exceeded(&self) -> bool {
        matches!(self, Error::LimitsExceeded(_))
    }
}
