//! Tick rate configuration

use serde::{Deserialize, Serialize};

use crate::error::{Result, TickError};
use crate::timespec::NANOS_PER_SEC;

/// Default tick length: one millisecond.
pub const DEFAULT_NANOS_PER_TICK: u32 = 1_000_000;

/// Longest accepted tick length: one second.
pub const MAX_NANOS_PER_TICK: u32 = NANOS_PER_SEC as u32;

const _: () = assert!(
    DEFAULT_NANOS_PER_TICK > 0 && DEFAULT_NANOS_PER_TICK <= MAX_NANOS_PER_TICK,
    "a tick longer than one second overflows the deadline arithmetic"
);

/// Clock a relative timeout is measured against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineClock {
    /// Steady clock; immune to system time changes
    #[default]
    Monotonic,
    /// Settable wall clock; the deadline is an absolute point in real time
    Realtime,
}

/// Tick configuration shared by every timed operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Length of one tick in nanoseconds
    pub nanos_per_tick: u32,
    /// Clock that deadlines are computed on
    pub clock: DeadlineClock,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            nanos_per_tick: DEFAULT_NANOS_PER_TICK,
            clock: DeadlineClock::Monotonic,
        }
    }
}

impl TickConfig {
    /// One-millisecond ticks on the monotonic clock
    #[must_use]
    pub fn millisecond() -> Self {
        Self::default()
    }

    /// One-microsecond ticks on the monotonic clock
    #[must_use]
    pub fn microsecond() -> Self {
        Self {
            nanos_per_tick: 1_000,
            ..Self::default()
        }
    }

    /// One-millisecond ticks measured on the wall clock
    #[must_use]
    pub fn realtime() -> Self {
        Self {
            clock: DeadlineClock::Realtime,
            ..Self::default()
        }
    }

    /// Build a validated configuration with the given tick length
    pub fn with_nanos_per_tick(nanos_per_tick: u32) -> Result<Self> {
        let config = Self {
            nanos_per_tick,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Select the clock deadlines are computed on
    pub fn with_clock(mut self, clock: DeadlineClock) -> Self {
        self.clock = clock;
        self
    }

    /// Check the tick length against the deadline arithmetic limits
    pub fn validate(&self) -> Result<()> {
        if self.nanos_per_tick == 0 {
            return Err(TickError::ZeroTick);
        }
        if self.nanos_per_tick > MAX_NANOS_PER_TICK {
            return Err(TickError::tick_too_long(self.nanos_per_tick));
        }
        Ok(())
    }

    /// Duration covered by `ticks` ticks
    #[must_use]
    pub fn ticks_to_duration(&self, ticks: u32) -> std::time::Duration {
        std::time::Duration::from_nanos(u64::from(ticks) * u64::from(self.nanos_per_tick))
    }
}
