//! End-to-end scenarios through the object API and the handle API.

use std::ptr::NonNull;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use pretty_assertions::assert_eq;
use rtpool::api::*;
use rtpool::{MemoryPool, PoolAttr, PoolError, PoolRegistry, PoolStats, Timeout};

fn offsets(base: NonNull<u8>, blocks: &[NonNull<u8>]) -> Vec<usize> {
    blocks
        .iter()
        .map(|b| b.as_ptr() as usize - base.as_ptr() as usize)
        .collect()
}

// ---------------------------------------------------------------------------
// Four blocks of ten bytes
// ---------------------------------------------------------------------------

#[test]
fn four_by_ten_scenario_object_api() {
    let pool = MemoryPool::new(4, 10, PoolAttr::default()).unwrap();
    assert_eq!(pool.padded_block_size(), 12);

    let blocks: Vec<_> = (0..4).map(|_| pool.try_allocate().unwrap()).collect();
    assert_eq!(offsets(blocks[0], &blocks), vec![0, 12, 24, 36]);
    let indices: Vec<_> = blocks.iter().map(|&b| pool.index_of(b)).collect();
    assert_eq!(indices, vec![Some(0), Some(1), Some(2), Some(3)]);
    assert_eq!(pool.try_allocate(), Err(PoolError::WouldBlock));

    pool.free(blocks[1]).unwrap();
    assert_eq!(pool.space(), 1);

    let again = pool.try_allocate().unwrap();
    assert_eq!(again, blocks[1]);
    assert_eq!(pool.space(), 0);
    assert_eq!(
        pool.stats(),
        PoolStats {
            capacity: 4,
            used: 4,
            free: 0,
            block_size: 10,
            padded_block_size: 12,
        }
    );
}

#[test]
fn four_by_ten_scenario_handle_api() {
    let id = memory_pool_new(4, 10, Some(&PoolAttr::named("scenario")));
    assert!(id.is_some());
    assert_eq!(memory_pool_get_capacity(id), 4);
    assert_eq!(memory_pool_get_block_size(id), 10);

    let blocks: Vec<_> = (0..4).map(|_| memory_pool_alloc(id, 0).unwrap()).collect();
    assert_eq!(offsets(blocks[0], &blocks), vec![0, 12, 24, 36]);
    assert_eq!(memory_pool_alloc(id, 0), None);

    assert_eq!(memory_pool_free(id, blocks[1]), Status::Ok);
    assert_eq!(memory_pool_get_space(id), 1);
    assert_eq!(memory_pool_alloc(id, 0), Some(blocks[1]));
    assert_eq!(memory_pool_get_space(id), 0);
    assert_eq!(memory_pool_get_count(id), 4);

    assert_eq!(memory_pool_delete(id), Status::Ok);
}

// ---------------------------------------------------------------------------
// Rejected frees
// ---------------------------------------------------------------------------

#[test]
fn bad_frees_leave_free_count_unchanged() {
    let id = memory_pool_new(2, 8, None);
    let block = memory_pool_alloc(id, 0).unwrap();
    assert_eq!(memory_pool_get_space(id), 1);

    let mut foreign = [0u8; 8];
    assert_eq!(
        memory_pool_free(id, NonNull::from(&mut foreign[0])),
        Status::ErrorParameter
    );
    // SAFETY: two bytes into an eight-byte block.
    let inside = unsafe { block.add(2) };
    assert_eq!(memory_pool_free(id, inside), Status::ErrorParameter);
    assert_eq!(memory_pool_get_space(id), 1);

    assert_eq!(memory_pool_free(id, block), Status::Ok);
    assert_eq!(memory_pool_free(id, block), Status::ErrorParameter);
    assert_eq!(memory_pool_get_space(id), 2);

    assert_eq!(memory_pool_delete(id), Status::Ok);
}

#[test]
fn block_from_other_pool_is_rejected() {
    let a = memory_pool_new(1, 8, None);
    let b = memory_pool_new(1, 8, None);
    let block = memory_pool_alloc(a, 0).unwrap();

    assert_eq!(memory_pool_free(b, block), Status::ErrorParameter);
    assert_eq!(memory_pool_get_space(b), 1);
    assert_eq!(memory_pool_free(a, block), Status::Ok);

    assert_eq!(memory_pool_delete(a), Status::Ok);
    assert_eq!(memory_pool_delete(b), Status::Ok);
}

// ---------------------------------------------------------------------------
// Create and delete
// ---------------------------------------------------------------------------

#[test]
fn zero_block_count_yields_null_handle() {
    let registry = PoolRegistry::new();
    assert_eq!(registry.create(0, 16, None), Err(PoolError::ZeroBlockCount));
    assert!(registry.is_empty());
    assert_eq!(memory_pool_new(0, 16, None), None);
}

#[test]
fn delete_of_null_or_stale_handle_is_parameter_error() {
    assert_eq!(memory_pool_delete(None), Status::ErrorParameter);

    let id = memory_pool_new(1, 4, None);
    assert_eq!(memory_pool_delete(id), Status::Ok);
    assert_eq!(memory_pool_delete(id), Status::ErrorParameter);
    assert_eq!(memory_pool_alloc(id, 0), None);
    assert_eq!(memory_pool_get_capacity(id), 0);
    assert_eq!(memory_pool_get_name(id), None);
}

#[test]
fn delete_releases_pool_storage() {
    let id = memory_pool_new(4, 32, None);
    let weak = Arc::downgrade(&PoolRegistry::global().get(id).unwrap());

    assert_eq!(memory_pool_delete(id), Status::Ok);
    assert!(weak.upgrade().is_none(), "pool leaked after delete");
}

#[test]
fn delete_wakes_blocked_allocator_and_releases_pool() {
    let registry = Arc::new(PoolRegistry::new());
    let id = registry.create(1, 8, None).ok();
    let _held = registry.allocate(id, Timeout::NoWait).unwrap();
    let weak = Arc::downgrade(&registry.get(id).unwrap());

    let waiter = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || registry.allocate(id, Timeout::Forever).err())
    };
    thread::sleep(Duration::from_millis(20));

    registry.destroy(id).unwrap();
    assert_eq!(registry.get(id).unwrap_err(), PoolError::InvalidHandle);

    assert_eq!(waiter.join().unwrap(), Some(PoolError::InvalidHandle));
    assert!(weak.upgrade().is_none());
}
