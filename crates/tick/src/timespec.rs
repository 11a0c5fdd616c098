//! Absolute wall-clock timestamps
//!
//! [`Timespec`] mirrors the seconds/nanoseconds pair that absolute-deadline
//! wait primitives consume. The nanosecond part is always kept in
//! `[0, NANOS_PER_SEC)`.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Nanoseconds in one second.
pub const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Point in wall-clock time, relative to the Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timespec {
    /// Whole seconds since the epoch (negative before it)
    pub secs: i64,
    /// Sub-second part, always below one second
    pub nanos: u32,
}

impl Timespec {
    /// Build a timestamp, carrying excess nanoseconds into the seconds part
    #[must_use]
    pub fn new(secs: i64, nanos: u32) -> Self {
        let nanos = i64::from(nanos);
        Self {
            secs: secs + nanos / NANOS_PER_SEC,
            nanos: (nanos % NANOS_PER_SEC) as u32,
        }
    }

    /// Read the current wall-clock time
    #[must_use]
    pub fn now() -> Self {
        Self::from(SystemTime::now())
    }

    /// Absolute timestamp `ticks` ticks after `now`.
    ///
    /// The product `ticks * nanos_per_tick` is formed in 64-bit signed
    /// arithmetic; with `nanos_per_tick <= NANOS_PER_SEC` it cannot overflow.
    #[must_use]
    pub fn after_ticks(now: Self, ticks: u32, nanos_per_tick: u32) -> Self {
        let total_nanos = i64::from(ticks) * i64::from(nanos_per_tick);

        let mut secs = now.secs + total_nanos / NANOS_PER_SEC;
        let mut nanos = i64::from(now.nanos) + total_nanos % NANOS_PER_SEC;

        if nanos >= NANOS_PER_SEC {
            secs += nanos / NANOS_PER_SEC;
            nanos %= NANOS_PER_SEC;
        }

        Self {
            secs,
            nanos: nanos as u32,
        }
    }

    /// Time left from `now` until `self`, zero once passed
    #[must_use]
    pub fn saturating_since(self, now: Self) -> Duration {
        let diff = i128::from(self.secs - now.secs) * i128::from(NANOS_PER_SEC)
            + i128::from(self.nanos)
            - i128::from(now.nanos);
        if diff <= 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(u64::try_from(diff).unwrap_or(u64::MAX))
        }
    }
}

impl From<SystemTime> for Timespec {
    fn from(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(since) => Self {
                secs: since.as_secs() as i64,
                nanos: since.subsec_nanos(),
            },
            // Before the epoch: borrow one second so the nanos stay positive.
            Err(err) => {
                let before = err.duration();
                let secs = -(before.as_secs() as i64);
                match before.subsec_nanos() {
                    0 => Self { secs, nanos: 0 },
                    sub => Self {
                        secs: secs - 1,
                        nanos: NANOS_PER_SEC as u32 - sub,
                    },
                }
            }
        }
    }
}

impl fmt::Display for Timespec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.secs, self.nanos)
    }
}
