//! Contiguous backing storage for pool blocks
//!
//! # Safety
//!
//! The arena owns one heap allocation of `block_count * stride` bytes:
//! - The base is aligned to [`BLOCK_ALIGN`] and the stride is a multiple of
//!   it, so every block start is aligned as well
//! - Block `i` spans `[base + i * stride, base + (i + 1) * stride)`
//! - Addresses are produced and parsed only here; the rest of the crate
//!   works with slot indices

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use crate::error::{PoolError, Result};

/// Alignment guaranteed for every block.
pub const BLOCK_ALIGN: usize = 4;

/// Round `block_size` up to the next multiple of [`BLOCK_ALIGN`].
///
/// Returns `None` when the padded size does not fit in `u32`.
#[must_use]
pub fn padded_block_size(block_size: u32) -> Option<u32> {
    let padded = (block_size as usize).div_ceil(BLOCK_ALIGN) * BLOCK_ALIGN;
    u32::try_from(padded).ok()
}

/// Heap buffer holding all blocks of one pool
pub(crate) struct Arena {
    base: NonNull<u8>,
    layout: Layout,
    stride: usize,
    block_count: usize,
}

// SAFETY: Arena only hands out raw block addresses.
// - The buffer is exclusively owned and freed exactly once in Drop
// - Which block may be written by whom is decided by the slot table lock
unsafe impl Send for Arena {}
// SAFETY: &Arena exposes no access to the bytes, only address arithmetic.
unsafe impl Sync for Arena {}

impl Arena {
    /// Allocate a zeroed arena of `block_count` blocks, `stride` bytes each
    pub(crate) fn new(block_count: u32, block_size: u32) -> Result<Self> {
        let overflow = || PoolError::SizeOverflow {
            block_count,
            block_size,
        };

        let stride = padded_block_size(block_size).ok_or_else(overflow)? as usize;
        let size = (block_count as usize)
            .checked_mul(stride)
            .ok_or_else(overflow)?;
        let layout = Layout::from_size_align(size, BLOCK_ALIGN).map_err(|_| overflow())?;

        // SAFETY: Allocating with a non-zero layout.
        // - block_count > 0 and block_size > 0 are checked by the pool
        // - stride >= BLOCK_ALIGN, so size > 0
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let base = NonNull::new(raw).ok_or_else(|| PoolError::allocation_failed(size))?;

        Ok(Self {
            base,
            layout,
            stride,
            block_count: block_count as usize,
        })
    }

    /// Distance between consecutive block starts
    pub(crate) fn stride(&self) -> usize {
        self.stride
    }

    /// Total arena size in bytes
    pub(crate) fn len(&self) -> usize {
        self.layout.size()
    }

    /// Start of the arena
    pub(crate) fn base(&self) -> NonNull<u8> {
        self.base
    }

    /// Start address of block `index`
    pub(crate) fn block_ptr(&self, index: usize) -> NonNull<u8> {
        debug_assert!(index < self.block_count, "slot index out of range");
        // SAFETY: index < block_count, so the offset stays inside the
        // allocation and the result is non-null.
        unsafe { self.base.add(index * self.stride) }
    }

    /// Slot index of the block starting exactly at `ptr`
    pub(crate) fn index_of(&self, ptr: NonNull<u8>) -> Option<usize> {
        let offset = (ptr.as_ptr() as usize).checked_sub(self.base.as_ptr() as usize)?;
        if offset >= self.len() || offset % self.stride != 0 {
            return None;
        }
        Some(offset / self.stride)
    }

    /// Whether `ptr` points anywhere inside the arena
    pub(crate) fn contains(&self, ptr: *const u8) -> bool {
        let start = self.base.as_ptr() as usize;
        (start..start + self.len()).contains(&(ptr as usize))
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        // SAFETY: base was returned by alloc_zeroed with this exact layout and
        // is released only here.
        unsafe { alloc::dealloc(self.base.as_ptr(), self.layout) }
    }
}
