//! # rtpool
//!
//! Fixed-block memory pools with blocking and timed allocation, shaped after
//! the CMSIS-RTOS2 memory pool API.
//!
//! A pool hands out equally sized, 4-byte aligned blocks from one arena.
//! When every block is in use, an allocation can fail immediately, wait for
//! a bounded number of ticks, or wait until another thread frees a block.
//!
//! Two surfaces are provided:
//!
//! - [`MemoryPool`]: an owned pool object with `Result`-returning methods
//!   and an RAII [`Block`] guard
//! - [`api`]: free functions over opaque [`PoolId`] handles returning
//!   [`Status`] codes, for code written against the RTOS API
//!
//! ## Quick Start
//!
//! ```rust
//! use rtpool::prelude::*;
//!
//! let pool = MemoryPool::new(8, 64, PoolAttr::named("packets"))?;
//!
//! let mut block = pool.block(Timeout::NoWait)?;
//! block[..5].copy_from_slice(b"hello");
//! assert_eq!(pool.count(), 1);
//!
//! drop(block);
//! assert_eq!(pool.space(), 8);
//! # Ok::<(), PoolError>(())
//! ```
//!
//! ## Timeouts
//!
//! Bounded waits are expressed in ticks. The tick length and the clock the
//! deadline is measured on come from the pool's [`TickConfig`]; by default a
//! tick is one millisecond on the monotonic clock.

#![warn(missing_docs, rust_2018_idioms)]
// Arena and block guard hand out raw block memory
#![allow(unsafe_code)]

pub mod api;
mod arena;
pub mod attr;
pub mod block;
pub mod error;
pub mod pool;
pub mod registry;
mod slots;
pub mod status;
pub mod timeout;

pub use arena::{BLOCK_ALIGN, padded_block_size};
pub use attr::PoolAttr;
pub use block::Block;
pub use error::{PoolError, Result};
pub use pool::{MemoryPool, PoolStats};
pub use registry::{PoolId, PoolRegistry};
pub use rtpool_tick::{DeadlineClock, TickConfig};
pub use status::Status;
pub use timeout::{Timeout, WAIT_FOREVER};

/// Common imports
pub mod prelude {
    pub use crate::{
        Block, MemoryPool, PoolAttr, PoolError, PoolId, PoolRegistry, PoolStats, Status,
        TickConfig, Timeout, WAIT_FOREVER,
    };
}
