//! # rtpool-tick
//!
//! Tick-based timing for RTOS-style blocking calls.
//!
//! RTOS APIs express timeouts as a count of kernel ticks. This crate turns
//! such a relative tick count into an absolute [`Deadline`] and provides the
//! timed wait that blocking primitives park on:
//!
//! - [`TickConfig`]: tick length and clock selection
//! - [`Timespec`]: absolute wall-clock timestamp with normalized nanoseconds
//! - [`Deadline`]: absolute deadline on the monotonic or the wall clock
//!
//! ## Example
//!
//! ```rust
//! use parking_lot::{Condvar, Mutex};
//! use rtpool_tick::{Deadline, TickConfig};
//!
//! let ready = Mutex::new(false);
//! let condvar = Condvar::new();
//!
//! let deadline = Deadline::after_ticks(5, &TickConfig::default());
//! let mut guard = ready.lock();
//! while !*guard {
//!     if deadline.wait(&condvar, &mut guard).timed_out() {
//!         break;
//!     }
//! }
//! ```

#![warn(rust_2018_idioms)]

pub mod config;
pub mod deadline;
pub mod error;
pub mod timespec;

pub use config::{DEFAULT_NANOS_PER_TICK, DeadlineClock, MAX_NANOS_PER_TICK, TickConfig};
pub use deadline::{Deadline, WaitOutcome};
pub use error::{Result, TickError};
pub use timespec::{NANOS_PER_SEC, Timespec};
