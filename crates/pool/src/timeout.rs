//! Wait policies for allocation

use std::fmt;
use std::num::NonZeroU32;

/// Tick count that requests an unbounded wait (`osWaitForever`).
pub const WAIT_FOREVER: u32 = u32::MAX;

/// How long an allocation may block when the pool is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timeout {
    /// Fail immediately
    NoWait,
    /// Block until a block is freed
    Forever,
    /// Block for at most this many ticks
    Ticks(NonZeroU32),
}

impl Timeout {
    /// Map an RTOS tick timeout: `0` never waits, [`WAIT_FOREVER`] never
    /// gives up, anything else is a bounded wait.
    #[must_use]
    pub fn from_ticks(ticks: u32) -> Self {
        match ticks {
            WAIT_FOREVER => Self::Forever,
            _ => NonZeroU32::new(ticks).map_or(Self::NoWait, Self::Ticks),
        }
    }

    /// The raw tick value this policy encodes
    #[must_use]
    pub fn as_ticks(self) -> u32 {
        match self {
            Self::NoWait => 0,
            Self::Forever => WAIT_FOREVER,
            Self::Ticks(ticks) => ticks.get(),
        }
    }
}

impl From<u32> for Timeout {
    fn from(ticks: u32) -> Self {
        Self::from_ticks(ticks)
    }
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoWait => write!(f, "no-wait"),
            Self::Forever => write!(f, "forever"),
            Self::Ticks(ticks) => write!(f, "{ticks} ticks"),
        }
    }
}
