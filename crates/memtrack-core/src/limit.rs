//! The `Limit` tagged type and byte/count unit constants.
//!
//! A limit is either a finite non-negative ceiling or explicitly unbounded.
//! Keeping the two cases in the type system (instead of a reserved counter
//! value) means comparison and headroom arithmetic cannot mix up the cases.

use std::fmt;

use serde::{Deserialize, Serialize};

// Binary byte units.
pub const KIB: u64 = 1024;
pub const MIB: u64 = KIB * 1024;
pub const GIB: u64 = MIB * 1024;
pub const TIB: u64 = GIB * 1024;
pub const PIB: u64 = TIB * 1024;
pub const EIB: u64 = PIB * 1024;

// Decimal byte units.
pub const KB: u64 = 1000;
pub const MB: u64 = KB * 1000;
pub const GB: u64 = MB * 1000;
pub const TB: u64 = GB * 1000;
pub const PB: u64 = TB * 1000;
pub const EB: u64 = PB * 1000;

// Plain count units, handy for object/call ceilings.
pub const KILO: u64 = 1000;
pub const MEGA: u64 = KILO * 1000;
pub const GIGA: u64 = MEGA * 1000;
pub const TERA: u64 = GIGA * 1000;
pub const PETA: u64 = TERA * 1000;
pub const EXA: u64 = PETA * 1000;

/// A ceiling for one tracked quantity.
///
/// Counters themselves are plain `u64`s and can never take the unbounded
/// case; only configured limits can.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Limit {
    /// No ceiling; never contributes to exceedance.
    Unbounded,
    /// A finite ceiling in the quantity's own unit (bytes or count).
    Finite(u64),
}

/// Raw cell value standing for [`Limit::Unbounded`] in atomic storage.
const UNBOUNDED_RAW: u64 = u64::MAX;

impl Limit {
    pub const fn is_unbounded(self) -> bool {
        matches!(self, Limit::Unbounded)
    }

    pub const fn is_finite(self) -> bool {
        matches!(self, Limit::Finite(_))
    }

    /// True when `used` is strictly over a finite ceiling.
    pub fn breached(self, used: u64) -> bool {
        match self {
            Limit::Unbounded => false,
            Limit::Finite(ceiling) => used > ceiling,
        }
    }

    /// Remaining room under this limit given `used`. Finite headroom never
    /// goes negative; an unbounded limit has unbounded headroom.
    pub fn headroom(self, used: u64) -> Limit {
        match self {
            Limit::Unbounded => Limit::Unbounded,
            Limit::Finite(ceiling) => Limit::Finite(ceiling.saturating_sub(used)),
        }
    }

    /// Encoding used to store a limit in a 64-bit atomic cell.
    ///
    /// `u64::MAX` is reserved for the unbounded case; a finite limit of
    /// `u64::MAX` is clamped down one, which is far beyond any real ceiling.
    pub fn to_raw(self) -> u64 {
        match self {
            Limit::Unbounded => UNBOUNDED_RAW,
            Limit::Finite(ceiling) => ceiling.min(UNBOUNDED_RAW - 1),
        }
    }

    /// Inverse of [`Limit::to_raw`].
    pub fn from_raw(raw: u64) -> Limit {
        if raw == UNBOUNDED_RAW {
            Limit::Unbounded
        } else {
            Limit::Finite(raw)
        }
    }
}

impl From<u64> for Limit {
    fn from(ceiling: u64) -> Self {
        Limit::Finite(ceiling)
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Unbounded => f.write_str("unbounded"),
            Limit::Finite(ceiling) => write!(f, "{}", ceiling),
        }
    }
}
