//! Slot occupancy bookkeeping
//!
//! ## Invariants
//!
//! - `free == slots.len() - (number of non-free slots)` after every method
//!   returns
//! - `claim` only runs when `free > 0`, so it always finds a slot
//! - A [`Slot::Guarded`] slot is owned by a live `Block` and is only
//!   released through that guard

use crate::error::{PoolError, Result};

/// State of one slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    Free,
    /// Handed out as a raw address; released by `MemoryPool::free`
    Raw,
    /// Owned by a `Block` guard
    Guarded,
}

/// Slot states plus the free-slot count, kept under one lock by the pool
#[derive(Debug)]
pub(crate) struct SlotTable {
    slots: Vec<Slot>,
    free: usize,
    closed: bool,
}

impl SlotTable {
    /// Table with `block_count` free slots
    pub(crate) fn new(block_count: usize) -> Self {
        Self {
            slots: vec![Slot::Free; block_count],
            free: block_count,
            closed: false,
        }
    }

    /// Number of free slots
    pub(crate) fn free(&self) -> usize {
        self.free
    }

    /// Number of handed-out slots
    pub(crate) fn used(&self) -> usize {
        self.slots.len() - self.free
    }

    /// Whether slot `index` is handed out
    pub(crate) fn is_used(&self, index: usize) -> bool {
        self.slots.get(index).is_some_and(|&slot| slot != Slot::Free)
    }

    /// Whether the pool stopped admitting allocations
    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    /// Stop admitting allocations; frees are still accepted
    pub(crate) fn close(&mut self) {
        self.closed = true;
    }

    /// Mark the lowest free slot as `state` and return its index.
    ///
    /// The caller must have observed `free() > 0` under the same lock.
    pub(crate) fn claim(&mut self, state: Slot) -> Result<usize> {
        debug_assert_ne!(state, Slot::Free);
        if self.free == 0 {
            return Err(PoolError::inconsistent("claim on a table with no free slot"));
        }
        let index = self
            .slots
            .iter()
            .position(|&slot| slot == Slot::Free)
            .ok_or_else(|| PoolError::inconsistent("free count positive but every slot used"))?;
        self.slots[index] = state;
        self.free -= 1;
        Ok(index)
    }

    /// Free slot `index` if it is currently in state `expected`.
    ///
    /// Free slots are rejected as double frees, guarded slots freed by
    /// address are rejected as still owned.
    pub(crate) fn release(&mut self, index: usize, expected: Slot) -> Result<()> {
        let Some(slot) = self.slots.get_mut(index) else {
            return Err(PoolError::inconsistent("release of an out-of-range slot"));
        };
        match (*slot, expected) {
            (Slot::Free, _) => return Err(PoolError::double_free(index)),
            (Slot::Guarded, Slot::Raw) => return Err(PoolError::guarded(index)),
            (actual, expected) if actual != expected => {
                return Err(PoolError::inconsistent("release with mismatched slot state"));
            }
            _ => {}
        }
        *slot = Slot::Free;
        self.free += 1;
        Ok(())
    }

    /// Hand a guarded slot over to raw ownership
    pub(crate) fn unguard(&mut self, index: usize) -> Result<()> {
        let Some(slot) = self.slots.get_mut(index).filter(|slot| **slot == Slot::Guarded) else {
            return Err(PoolError::inconsistent("unguard of a slot no guard owns"));
        };
        *slot = Slot::Raw;
        Ok(())
    }
}
