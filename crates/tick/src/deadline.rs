//! Relative tick timeouts turned into absolute deadlines
//!
//! A [`Deadline`] is computed once, when a bounded wait starts, and then
//! handed to every [`Deadline::wait`] call of that wait loop. Spurious
//! wake-ups therefore never extend the total time spent blocked.
//!
//! Two clocks are supported:
//!
//! - [`DeadlineClock::Monotonic`] (default): the deadline is an [`Instant`].
//! - [`DeadlineClock::Realtime`]: the deadline is an absolute wall-clock
//!   [`Timespec`]. The wait sleeps in short slices and re-reads the wall
//!   clock before each one, so moving the system time moves the effective
//!   timeout with it, noticed within one slice.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, MutexGuard};
use tracing::trace;

use crate::config::{DeadlineClock, TickConfig};
use crate::timespec::Timespec;

/// Upper bound for a monotonic deadline that cannot be represented.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Longest single sleep of a wall-clock wait; bounds how late a clock jump
/// is noticed.
pub(crate) const REALTIME_SLICE: Duration = Duration::from_millis(10);

/// Result of one timed wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Woken before the deadline; the caller re-checks its condition
    Notified,
    /// The deadline passed
    TimedOut,
}

impl WaitOutcome {
    /// Whether the deadline passed
    #[must_use]
    pub fn timed_out(self) -> bool {
        matches!(self, Self::TimedOut)
    }
}

/// Absolute point in time a bounded wait gives up at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    /// Measured on the steady clock
    Monotonic(Instant),
    /// Measured on the settable wall clock
    Realtime(Timespec),
}

impl Deadline {
    /// Deadline `ticks` ticks from now on the configured clock
    #[must_use]
    pub fn after_ticks(ticks: u32, config: &TickConfig) -> Self {
        match config.clock {
            DeadlineClock::Monotonic => {
                let now = Instant::now();
                let wait = config.ticks_to_duration(ticks);
                Self::Monotonic(now.checked_add(wait).unwrap_or(now + FAR_FUTURE))
            }
            DeadlineClock::Realtime => Self::Realtime(Timespec::after_ticks(
                Timespec::now(),
                ticks,
                config.nanos_per_tick,
            )),
        }
    }

    /// Time left until the deadline, zero once it passed
    #[must_use]
    pub fn remaining(&self) -> Duration {
        match self {
            Self::Monotonic(at) => at.saturating_duration_since(Instant::now()),
            Self::Realtime(at) => at.saturating_since(Timespec::now()),
        }
    }

    /// Whether the deadline already passed
    #[must_use]
    pub fn has_elapsed(&self) -> bool {
        self.remaining().is_zero()
    }

    /// Block on `condvar` until notified or until the deadline passes.
    ///
    /// `guard` is released while blocked and re-acquired before returning,
    /// as with [`Condvar::wait_until`]. A wall-clock wait sleeps at most
    /// `REALTIME_SLICE` (10 ms) at a time and may report
    /// [`WaitOutcome::Notified`] without a notification; callers re-check
    /// their condition and wait again.
    pub fn wait<T: ?Sized>(&self, condvar: &Condvar, guard: &mut MutexGuard<'_, T>) -> WaitOutcome {
        match self {
            Self::Monotonic(at) => {
                if condvar.wait_until(guard, *at).timed_out() {
                    WaitOutcome::TimedOut
                } else {
                    WaitOutcome::Notified
                }
            }
            Self::Realtime(at) => {
                let remaining = at.saturating_since(Timespec::now());
                if remaining.is_zero() {
                    return WaitOutcome::TimedOut;
                }
                trace!(deadline = %at, ?remaining, "waiting on wall-clock deadline");
                condvar.wait_for(guard, remaining.min(REALTIME_SLICE));
                if self.has_elapsed() {
                    WaitOutcome::TimedOut
                } else {
                    WaitOutcome::Notified
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_zero_ticks_elapses_immediately() {
        let deadline = Deadline::after_ticks(0, &TickConfig::default());
        assert!(deadline.has_elapsed());
        assert_eq!(deadline.remaining(), Duration::ZERO);

        let deadline = Deadline::after_ticks(0, &TickConfig::realtime());
        assert!(deadline.has_elapsed());
    }

    #[test]
    fn test_clock_selection() {
        assert!(matches!(
            Deadline::after_ticks(10, &TickConfig::default()),
            Deadline::Monotonic(_)
        ));
        assert!(matches!(
            Deadline::after_ticks(10, &TickConfig::realtime()),
            Deadline::Realtime(_)
        ));
    }

    #[test]
    fn test_remaining_bounded_by_timeout() {
        let deadline = Deadline::after_ticks(500, &TickConfig::default());
        let remaining = deadline.remaining();
        assert!(remaining <= Duration::from_millis(500));
        assert!(remaining > Duration::from_millis(400));
    }

    #[test]
    fn test_realtime_wait_rechecks_clock_each_slice() {
        let lock = Mutex::new(());
        let condvar = Condvar::new();
        let deadline = Deadline::after_ticks(5_000, &TickConfig::realtime());

        let start = Instant::now();
        let mut guard = lock.lock();
        assert_eq!(deadline.wait(&condvar, &mut guard), WaitOutcome::Notified);
        let elapsed = start.elapsed();
        assert!(elapsed >= REALTIME_SLICE / 2, "returned early: {elapsed:?}");
        assert!(elapsed < Duration::from_secs(1), "slept past one slice: {elapsed:?}");
        assert!(!deadline.has_elapsed());
    }

    #[test]
    fn test_wait_times_out_without_notification() {
        let lock = Mutex::new(());
        let condvar = Condvar::new();
        for config in [TickConfig::default(), TickConfig::realtime()] {
            let start = Instant::now();
            let deadline = Deadline::after_ticks(20, &config);
            let mut guard = lock.lock();
            while !deadline.wait(&condvar, &mut guard).timed_out() {}
            assert!(start.elapsed() >= Duration::from_millis(20));
        }
    }
}
