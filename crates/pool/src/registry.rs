//! Handle-addressed pool registry
//!
//! Pools created through the handle API live in a [`PoolRegistry`] keyed by
//! [`PoolId`]. Lookups hand out an `Arc`, so an allocator blocked inside a
//! pool keeps it alive even if the handle is deleted meanwhile. Deleting
//! closes the pool, which wakes such allocators, and the arena is released
//! when the last reference goes away.

use std::fmt;
use std::num::NonZeroU32;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::attr::PoolAttr;
use crate::error::{PoolError, Result};
use crate::pool::MemoryPool;
use crate::timeout::Timeout;

/// Opaque handle naming a registered pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoolId(NonZeroU32);

impl PoolId {
    /// Raw handle value
    #[must_use]
    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// Rebuild a handle from its raw value; `0` is the null handle
    #[must_use]
    pub fn from_raw(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pool#{}", self.0)
    }
}

/// Map from handles to live pools
#[derive(Debug)]
pub struct PoolRegistry {
    pools: DashMap<PoolId, Arc<MemoryPool>>,
    next_id: AtomicU32,
}

static GLOBAL: LazyLock<PoolRegistry> = LazyLock::new(PoolRegistry::new);

impl Default for PoolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PoolRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            pools: DashMap::new(),
            next_id: AtomicU32::new(1),
        }
    }

    /// Process-wide registry used by the free functions in [`crate::api`]
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Create a pool and register it
    pub fn create(
        &self,
        block_count: u32,
        block_size: u32,
        attr: Option<&PoolAttr>,
    ) -> Result<PoolId> {
        let attr = attr.cloned().unwrap_or_default();
        let pool = MemoryPool::new(block_count, block_size, attr)?;
        Ok(self.insert(pool))
    }

    /// Register an existing pool under a fresh handle
    pub fn insert(&self, pool: MemoryPool) -> PoolId {
        let pool = Arc::new(pool);
        loop {
            let raw = self.next_id.fetch_add(1, Ordering::Relaxed);
            let Some(id) = PoolId::from_raw(raw) else {
                continue;
            };
            if let Entry::Vacant(slot) = self.pools.entry(id) {
                slot.insert(pool);
                debug!(%id, "memory pool registered");
                return id;
            }
        }
    }

    /// Look up a live pool
    pub fn get(&self, id: Option<PoolId>) -> Result<Arc<MemoryPool>> {
        let id = id.ok_or(PoolError::InvalidHandle)?;
        self.pools
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(PoolError::InvalidHandle)
    }

    /// Allocate from the pool named by `id`.
    ///
    /// The map entry is released before blocking.
    pub fn allocate(&self, id: Option<PoolId>, timeout: Timeout) -> Result<NonNull<u8>> {
        self.get(id)?.allocate(timeout)
    }

    /// Return a block to the pool named by `id`
    pub fn free(&self, id: Option<PoolId>, block: NonNull<u8>) -> Result<()> {
        self.get(id)?.free(block)
    }

    /// Unregister and close the pool; the handle becomes invalid immediately.
    ///
    /// Allocators blocked in the pool wake up with
    /// [`PoolError::InvalidHandle`]. Storage is released once no in-flight
    /// operation holds the pool.
    pub fn destroy(&self, id: Option<PoolId>) -> Result<()> {
        let Some(id) = id else {
            warn!("delete of null memory pool handle rejected");
            return Err(PoolError::InvalidHandle);
        };
        let Some((_, pool)) = self.pools.remove(&id) else {
            warn!(%id, "delete of unknown memory pool handle rejected");
            return Err(PoolError::InvalidHandle);
        };
        pool.close();
        debug!(%id, in_flight = Arc::strong_count(&pool) - 1, "memory pool unregistered");
        Ok(())
    }

    /// Number of registered pools
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    /// Whether no pool is registered
    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_handles_are_distinct() {
        let registry = PoolRegistry::new();
        let a = registry.create(1, 4, None).unwrap();
        let b = registry.create(1, 4, None).unwrap();
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_null_and_stale_handles() {
        let registry = PoolRegistry::new();
        assert_eq!(registry.get(None).unwrap_err(), PoolError::InvalidHandle);
        assert_eq!(registry.destroy(None), Err(PoolError::InvalidHandle));

        let id = registry.create(2, 8, None).unwrap();
        registry.destroy(Some(id)).unwrap();
        assert!(registry.is_empty());
        assert_eq!(registry.get(Some(id)).unwrap_err(), PoolError::InvalidHandle);
        assert_eq!(registry.destroy(Some(id)), Err(PoolError::InvalidHandle));
        assert_eq!(
            registry.allocate(Some(id), Timeout::NoWait),
            Err(PoolError::InvalidHandle)
        );
    }

    #[test]
    fn test_destroy_keeps_in_flight_pool_alive() {
        let registry = PoolRegistry::new();
        let id = registry.create(1, 4, Some(&PoolAttr::named("held"))).unwrap();
        let pool = registry.get(Some(id)).unwrap();
        let weak = Arc::downgrade(&pool);

        registry.destroy(Some(id)).unwrap();
        assert_eq!(pool.name(), Some("held"));
        drop(pool);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_destroy_wakes_forever_waiter() {
        let registry = Arc::new(PoolRegistry::new());
        let id = registry.create(1, 4, None).ok();
        let _held = registry.allocate(id, Timeout::NoWait).unwrap();
        let weak = Arc::downgrade(&registry.get(id).unwrap());

        let waiter = {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || registry.allocate(id, Timeout::Forever).err())
        };
        std::thread::sleep(std::time::Duration::from_millis(20));

        registry.destroy(id).unwrap();
        assert_eq!(waiter.join().unwrap(), Some(PoolError::InvalidHandle));
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_from_raw() {
        assert_eq!(PoolId::from_raw(0), None);
        let id = PoolId::from_raw(7).unwrap();
        assert_eq!(id.get(), 7);
        assert_eq!(id.to_string(), "pool#7");
    }
}
