//! RAII guard for a pool block

use std::fmt;
use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use tracing::error;

use crate::error::Result;
use crate::pool::MemoryPool;
use crate::slots::Slot;

/// Exclusive handle to one allocated block; returns it to the pool on drop.
///
/// The pool marks the block as guarded, so freeing its address through
/// [`MemoryPool::free`] fails while the guard lives:
///
/// ```
/// use rtpool::{MemoryPool, PoolAttr, PoolError, Timeout};
///
/// let pool = MemoryPool::new(1, 8, PoolAttr::default())?;
/// let block = pool.block(Timeout::NoWait)?;
/// assert_eq!(pool.free(block.as_ptr()), Err(PoolError::BlockGuarded { index: 0 }));
/// # Ok::<(), PoolError>(())
/// ```
pub struct Block<'a> {
    pool: &'a MemoryPool,
    index: usize,
    ptr: NonNull<u8>,
}

impl<'a> Block<'a> {
    /// Guard for slot `index`, which the pool just claimed as guarded
    pub(crate) fn new(pool: &'a MemoryPool, index: usize, ptr: NonNull<u8>) -> Self {
        Self { pool, index, ptr }
    }

    /// Start address of the block
    pub fn as_ptr(&self) -> NonNull<u8> {
        self.ptr
    }

    /// Slot index of the block within its pool
    pub fn index(&self) -> usize {
        self.index
    }

    /// Pool the block belongs to
    pub fn pool(&self) -> &'a MemoryPool {
        self.pool
    }

    /// Give up the guard without freeing.
    ///
    /// The block becomes a plain allocation that must be returned with
    /// [`MemoryPool::free`].
    pub fn into_raw(self) -> Result<NonNull<u8>> {
        let this = ManuallyDrop::new(self);
        this.pool.unguard(this.index)?;
        Ok(this.ptr)
    }
}

impl Deref for Block<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        // SAFETY: The guard owns the block exclusively.
        // - ptr starts a block of at least block_size bytes inside the arena
        // - the arena outlives 'a, and the slot stays guarded until drop, so
        //   no other Block or raw free can reach it
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.pool.block_size() as usize) }
    }
}

impl DerefMut for Block<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        // SAFETY: Same bounds as Deref; &mut self guarantees unique access.
        unsafe {
            std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.pool.block_size() as usize)
        }
    }
}

impl Drop for Block<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.pool.release(self.index, Slot::Guarded) {
            error!(error = %err, "failed to return guarded block");
        }
    }
}

impl fmt::Debug for Block<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("pool", &self.pool.name())
            .field("index", &self.index)
            .field("ptr", &self.ptr)
            .field("len", &self.pool.block_size())
            .finish()
    }
}

// SAFETY: The guard is the sole owner of its block's bytes.
// - MemoryPool is Sync, so &MemoryPool may move across threads
// - the bytes are plain memory with no thread affinity
unsafe impl Send for Block<'_> {}
// SAFETY: &Block only exposes &[u8] reads.
unsafe impl Sync for Block<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PoolAttr, PoolError, Timeout};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_guard_frees_on_drop() {
        let pool = MemoryPool::new(2, 6, PoolAttr::default()).unwrap();
        {
            let mut block = pool.block(Timeout::NoWait).unwrap();
            assert_eq!(block.len(), 6);
            assert_eq!(block.index(), 0);
            block.copy_from_slice(b"abcdef");
            assert_eq!(&block[..], b"abcdef");
            assert_eq!(pool.count(), 1);
        }
        assert_eq!(pool.count(), 0);
    }

    #[test]
    fn test_into_raw_keeps_block() {
        let pool = MemoryPool::new(1, 4, PoolAttr::default()).unwrap();
        let raw = pool.block(Timeout::NoWait).unwrap().into_raw().unwrap();
        assert_eq!(pool.count(), 1);
        pool.free(raw).unwrap();
        assert_eq!(pool.space(), 1);
    }

    #[test]
    fn test_raw_free_cannot_reclaim_guarded_block() {
        let pool = MemoryPool::new(2, 4, PoolAttr::default()).unwrap();
        let mut first = pool.block(Timeout::NoWait).unwrap();

        assert_eq!(
            pool.free(first.as_ptr()),
            Err(PoolError::BlockGuarded { index: 0 })
        );
        assert_eq!(pool.space(), 1);

        let mut second = pool.block(Timeout::NoWait).unwrap();
        assert_ne!(first.as_ptr(), second.as_ptr());
        assert_eq!(second.index(), 1);

        first.fill(0xAA);
        second.fill(0xBB);
        assert!(first.iter().all(|&b| b == 0xAA));

        drop(first);
        let third = pool.block(Timeout::NoWait).unwrap();
        assert_eq!(third.index(), 0);
        assert_ne!(third.as_ptr(), second.as_ptr());
        assert!(second.iter().all(|&b| b == 0xBB));
    }

    #[test]
    fn test_guarded_blocks_do_not_overlap() {
        let pool = MemoryPool::new(3, 5, PoolAttr::default()).unwrap();
        let mut blocks: Vec<_> = (0..3).map(|_| pool.block(Timeout::NoWait).unwrap()).collect();
        for (i, block) in blocks.iter_mut().enumerate() {
            block.fill(i as u8 + 1);
        }
        for (i, block) in blocks.iter().enumerate() {
            assert!(block.iter().all(|&b| b == i as u8 + 1));
        }
    }
}
