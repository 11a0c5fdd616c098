//! CMSIS-RTOS2 shaped front end
//!
//! Free functions over opaque [`PoolId`] handles, backed by the
//! process-wide [`PoolRegistry`]. A null handle is `None`; handles of
//! deleted pools behave exactly like null handles.
//!
//! ```
//! use rtpool::api::*;
//! use rtpool::Status;
//!
//! let id = memory_pool_new(4, 10, None);
//! assert!(id.is_some());
//!
//! let block = memory_pool_alloc(id, 0).unwrap();
//! assert_eq!(memory_pool_get_count(id), 1);
//! assert_eq!(memory_pool_free(id, block), Status::Ok);
//! assert_eq!(memory_pool_delete(id), Status::Ok);
//! assert_eq!(memory_pool_delete(id), Status::ErrorParameter);
//! ```

use std::borrow::Cow;
use std::ptr::NonNull;

pub use crate::registry::PoolId;
pub use crate::status::Status;
pub use crate::timeout::WAIT_FOREVER;

use crate::attr::PoolAttr;
use crate::pool::MemoryPool;
use crate::registry::PoolRegistry;
use crate::timeout::Timeout;

/// Create a pool of `block_count` blocks of `block_size` bytes.
///
/// Returns `None` when either size is zero or the arena cannot be obtained.
pub fn memory_pool_new(block_count: u32, block_size: u32, attr: Option<&PoolAttr>) -> Option<PoolId> {
    PoolRegistry::global().create(block_count, block_size, attr).ok()
}

/// Allocate one block.
///
/// `timeout_ticks` is `0` for no wait, [`WAIT_FOREVER`] for an unbounded
/// wait, or a tick count for a bounded wait.
pub fn memory_pool_alloc(id: Option<PoolId>, timeout_ticks: u32) -> Option<NonNull<u8>> {
    PoolRegistry::global()
        .allocate(id, Timeout::from_ticks(timeout_ticks))
        .ok()
}

/// Return a block to its pool
pub fn memory_pool_free(id: Option<PoolId>, block: NonNull<u8>) -> Status {
    Status::from(&PoolRegistry::global().free(id, block))
}

/// Display name of the pool
pub fn memory_pool_get_name(id: Option<PoolId>) -> Option<Cow<'static, str>> {
    PoolRegistry::global().get(id).ok()?.shared_name()
}

/// Total number of blocks, `0` for an invalid handle
pub fn memory_pool_get_capacity(id: Option<PoolId>) -> u32 {
    query(id, |pool| pool.capacity())
}

/// Requested block size, `0` for an invalid handle
pub fn memory_pool_get_block_size(id: Option<PoolId>) -> u32 {
    query(id, |pool| pool.block_size())
}

/// Blocks currently allocated, `0` for an invalid handle
pub fn memory_pool_get_count(id: Option<PoolId>) -> u32 {
    query(id, |pool| pool.count())
}

/// Blocks currently free, `0` for an invalid handle
pub fn memory_pool_get_space(id: Option<PoolId>) -> u32 {
    query(id, |pool| pool.space())
}

/// Delete the pool; blocks still allocated from it become invalid
pub fn memory_pool_delete(id: Option<PoolId>) -> Status {
    Status::from(&PoolRegistry::global().destroy(id))
}

fn query(id: Option<PoolId>, f: impl FnOnce(&MemoryPool) -> u32) -> u32 {
    PoolRegistry::global()
        .get(id)
        .map_or(0, |pool| f(pool.as_ref()))
}
