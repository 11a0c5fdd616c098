//! Fixed-block memory pool
//!
//! A [`MemoryPool`] owns an arena of `block_count` equally sized blocks. The
//! free-slot count and the per-slot used flags live together behind one
//! lock, so the number of admitted allocations can never drift from the
//! number of claimed slots. Allocators that find the pool empty park on a
//! condition variable until a block is freed or their deadline passes.
//!
//! # Ordering
//!
//! - Admission (taking one unit of the free count) happens-before the slot
//!   claim, inside the same critical section
//! - Clearing a slot happens-before the free count is raised; waiters are
//!   notified only after the lock is released
//! - Which blocked allocator wins a freed block is left to the lock
//!
//! Blocks handed out through a [`Block`] guard are marked as guarded; only
//! the guard can return them, so safe code cannot free a block that a live
//! guard still dereferences.

use std::borrow::Cow;
use std::fmt;
use std::ptr::NonNull;

use parking_lot::{Condvar, Mutex};
use rtpool_tick::{Deadline, TickConfig};
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::arena::Arena;
use crate::attr::PoolAttr;
use crate::block::Block;
use crate::error::{PoolError, Result};
use crate::slots::{Slot, SlotTable};
use crate::timeout::Timeout;

/// Point-in-time view of a pool's occupancy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Total number of blocks
    pub capacity: u32,
    /// Blocks currently handed out
    pub used: u32,
    /// Blocks currently available
    pub free: u32,
    /// Requested block size in bytes
    pub block_size: u32,
    /// Distance between block starts in bytes
    pub padded_block_size: u32,
}

/// Pool of fixed-size, 4-byte aligned memory blocks
///
/// # Example
/// ```
/// use rtpool::{MemoryPool, PoolAttr, Timeout};
///
/// let pool = MemoryPool::new(4, 10, PoolAttr::named("frames"))?;
/// assert_eq!(pool.padded_block_size(), 12);
///
/// let block = pool.allocate(Timeout::NoWait)?;
/// assert_eq!(pool.count(), 1);
///
/// pool.free(block)?;
/// assert_eq!(pool.space(), 4);
/// # Ok::<(), rtpool::PoolError>(())
/// ```
pub struct MemoryPool {
    name: Option<Cow<'static, str>>,
    block_count: u32,
    block_size: u32,
    padded_block_size: u32,
    tick: TickConfig,
    arena: Arena,
    slots: Mutex<SlotTable>,
    available: Condvar,
}

impl MemoryPool {
    /// Create a pool of `block_count` blocks of `block_size` bytes each.
    ///
    /// Every block occupies `block_size` rounded up to a multiple of four.
    /// Nothing is left allocated when creation fails.
    pub fn new(block_count: u32, block_size: u32, attr: PoolAttr) -> Result<Self> {
        if block_count == 0 {
            warn!(block_size, "memory pool rejected: zero block count");
            return Err(PoolError::ZeroBlockCount);
        }
        if block_size == 0 {
            warn!(block_count, "memory pool rejected: zero block size");
            return Err(PoolError::ZeroBlockSize);
        }
        attr.tick.validate()?;

        let arena = Arena::new(block_count, block_size)?;
        let padded_block_size = arena.stride() as u32;

        debug!(
            name = attr.name.as_deref().unwrap_or_default(),
            block_count,
            block_size,
            padded_block_size,
            "memory pool created"
        );

        Ok(Self {
            name: attr.name,
            block_count,
            block_size,
            padded_block_size,
            tick: attr.tick,
            arena,
            slots: Mutex::new(SlotTable::new(block_count as usize)),
            available: Condvar::new(),
        })
    }

    // ------------------------------------------------------------------------
    // Allocation
    // ------------------------------------------------------------------------

    /// Allocate one block, waiting according to `timeout` while the pool is
    /// full.
    ///
    /// The lowest free slot is always handed out first. A closed pool
    /// rejects the call with [`PoolError::InvalidHandle`].
    pub fn allocate(&self, timeout: Timeout) -> Result<NonNull<u8>> {
        let index = self.acquire(timeout, Slot::Raw)?;
        Ok(self.arena.block_ptr(index))
    }

    /// Allocate without waiting
    pub fn try_allocate(&self) -> Result<NonNull<u8>> {
        self.allocate(Timeout::NoWait)
    }

    /// Allocate, waiting at most `ticks` ticks (`0` does not wait)
    pub fn allocate_for(&self, ticks: u32) -> Result<NonNull<u8>> {
        self.allocate(Timeout::from_ticks(ticks))
    }

    /// Allocate a block wrapped in a guard that frees it on drop.
    ///
    /// While the guard lives, [`MemoryPool::free`] rejects its address with
    /// [`PoolError::BlockGuarded`].
    pub fn block(&self, timeout: Timeout) -> Result<Block<'_>> {
        let index = self.acquire(timeout, Slot::Guarded)?;
        Ok(Block::new(self, index, self.arena.block_ptr(index)))
    }

    #[tracing::instrument(level = "trace", skip(self), fields(pool = self.name().unwrap_or_default()))]
    fn acquire(&self, timeout: Timeout, state: Slot) -> Result<usize> {
        let mut slots = self.slots.lock();

        match timeout {
            Timeout::NoWait => {}
            Timeout::Forever => {
                while slots.free() == 0 && !slots.is_closed() {
                    self.available.wait(&mut slots);
                }
            }
            Timeout::Ticks(ticks) => {
                if slots.free() == 0 && !slots.is_closed() {
                    let deadline = Deadline::after_ticks(ticks.get(), &self.tick);
                    while slots.free() == 0 && !slots.is_closed() {
                        if deadline.wait(&self.available, &mut slots).timed_out()
                            && slots.free() == 0
                            && !slots.is_closed()
                        {
                            trace!(ticks = ticks.get(), "allocation timed out");
                            return Err(PoolError::Timeout { ticks: ticks.get() });
                        }
                    }
                }
            }
        }

        if slots.is_closed() {
            return Err(PoolError::InvalidHandle);
        }
        if slots.free() == 0 {
            return Err(PoolError::WouldBlock);
        }

        let index = slots.claim(state)?;
        drop(slots);

        trace!(index, ?state, "block allocated");
        Ok(index)
    }

    /// Return a block to the pool.
    ///
    /// `block` must be the exact start of a block that is currently
    /// allocated through [`MemoryPool::allocate`]; anything else is
    /// rejected without side effects.
    pub fn free(&self, block: NonNull<u8>) -> Result<()> {
        let index = self
            .arena
            .index_of(block)
            .ok_or_else(|| PoolError::unknown_address(block.as_ptr() as usize))?;
        self.release(index, Slot::Raw)
    }

    pub(crate) fn release(&self, index: usize, state: Slot) -> Result<()> {
        self.slots.lock().release(index, state)?;
        self.available.notify_one();

        trace!(index, "block freed");
        Ok(())
    }

    pub(crate) fn unguard(&self, index: usize) -> Result<()> {
        self.slots.lock().unguard(index)
    }

    /// Stop admitting allocations and wake every blocked allocator.
    ///
    /// Waiters and later allocations fail with [`PoolError::InvalidHandle`].
    /// Blocks already handed out can still be freed.
    pub fn close(&self) {
        self.slots.lock().close();
        self.available.notify_all();
        debug!(name = self.name().unwrap_or_default(), "memory pool closed");
    }

    /// Whether [`MemoryPool::close`] was called
    pub fn is_closed(&self) -> bool {
        self.slots.lock().is_closed()
    }

    // ------------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------------

    /// Display name given at creation
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn shared_name(&self) -> Option<Cow<'static, str>> {
        self.name.clone()
    }

    /// Total number of blocks
    pub fn capacity(&self) -> u32 {
        self.block_count
    }

    /// Requested size of each block
    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Size of each block rounded up to a multiple of four
    pub fn padded_block_size(&self) -> u32 {
        self.padded_block_size
    }

    /// Tick configuration used for bounded waits
    pub fn tick_config(&self) -> &TickConfig {
        &self.tick
    }

    /// Number of blocks currently allocated.
    ///
    /// Advisory only: concurrent allocations may change it immediately.
    pub fn count(&self) -> u32 {
        self.slots.lock().used() as u32
    }

    /// Number of blocks currently free.
    ///
    /// Advisory only: concurrent allocations may change it immediately.
    pub fn space(&self) -> u32 {
        self.slots.lock().free() as u32
    }

    /// Occupancy snapshot taken under one lock acquisition
    pub fn stats(&self) -> PoolStats {
        let slots = self.slots.lock();
        PoolStats {
            capacity: self.block_count,
            used: slots.used() as u32,
            free: slots.free() as u32,
            block_size: self.block_size,
            padded_block_size: self.padded_block_size,
        }
    }

    /// Start of the arena backing all blocks
    pub(crate) fn arena_base(&self) -> NonNull<u8> {
        self.arena.base()
    }

    /// Whether `ptr` points anywhere inside this pool's arena
    pub fn contains(&self, ptr: *const u8) -> bool {
        self.arena.contains(ptr)
    }

    /// Slot index of the block starting at `ptr`
    pub fn index_of(&self, ptr: NonNull<u8>) -> Option<usize> {
        self.arena.index_of(ptr)
    }

    /// Whether the block starting at `ptr` is currently allocated
    pub fn is_allocated(&self, ptr: NonNull<u8>) -> bool {
        self.arena
            .index_of(ptr)
            .is_some_and(|index| self.slots.lock().is_used(index))
    }
}

impl fmt::Debug for MemoryPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryPool")
            .field("name", &self.name)
            .field("stats", &self.stats())
            .field("tick", &self.tick)
            .finish()
    }
}

impl Drop for MemoryPool {
    fn drop(&mut self) {
        let outstanding = self.slots.get_mut().used();
        if outstanding > 0 {
            warn!(
                name = self.name().unwrap_or_default(),
                outstanding, "memory pool destroyed with blocks still allocated"
            );
        }
        debug!(name = self.name().unwrap_or_default(), "memory pool destroyed");
    }
}
