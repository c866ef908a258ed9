//! Snapshot value types: usage, configured limits, and remaining headroom.
//!
//! These are plain Copy structs. The context loads each field independently,
//! so a snapshot taken under concurrent recording may show slight skew
//! between the three quantities of one logical event.

use serde::{Deserialize, Serialize};

use crate::limit::{Limit, MIB};

/// Cumulative consumption for one context: total bytes, allocated objects,
/// and recording calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub bytes: u64,
    pub objects: u64,
    pub calls: u64,
}

/// Configured ceilings, one per tracked quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    pub bytes: Limit,
    pub objects: Limit,
    pub calls: Limit,
}

impl Default for Limits {
    /// A modest byte ceiling with unlimited object and call counts.
    fn default() -> Self {
        Self {
            bytes: Limit::Finite(64 * MIB),
            objects: Limit::Unbounded,
            calls: Limit::Unbounded,
        }
    }
}

/// Remaining headroom per quantity; never negative, unbounded where no
/// finite ceiling applies anywhere on the parent chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remains {
    pub bytes: Limit,
    pub objects: Limit,
    pub calls: Limit,
}
