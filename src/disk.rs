//! `HeapDisk`: the block pool shared by every `RegularFile` (spec §4.A).
//!
//! Blocks are reused instead of freed: a bounded cache of already-allocated
//! buffers is kept around so that truncate-then-grow doesn't pay the zeroing
//! cost twice. This mirrors the `Buffer`/`Vec<Buffer>` block-list shape used
//! by the allocator this module is grounded on, minus its async hand-off —
//! `HeapDisk` is guarded by a single synchronous mutex (spec §4.A
//! "Concurrency"), since every caller is already a blocking write path.

use std::sync::Mutex;

use crate::error::{FsError, FsResult};

/// A single fixed-size, heap-allocated byte buffer.
pub type Block = Box<[u8]>;

struct DiskState {
    allocated_block_count: u64,
    /// Reclaimed blocks available for instant reuse, up to
    /// `max_cached_block_count`.
    cache: Vec<Block>,
}

/// Shared pool of fixed-size blocks with a hard quota and a soft free-block
/// cache.
pub struct HeapDisk {
    block_size: usize,
    max_block_count: u64,
    max_cached_block_count: u64,
    state: Mutex<DiskState>,
}

impl HeapDisk {
    /// `max_size` and `max_cache_size` are rounded down to a multiple of
    /// `block_size` (spec §6.1).
    pub fn new(block_size: u64, max_size: u64, max_cache_size: u64) -> Self {
        assert!(block_size > 0, "block_size must be positive");
        Self {
            block_size: block_size as usize,
            max_block_count: max_size / block_size,
            max_cached_block_count: max_cache_size / block_size,
            state: Mutex::new(DiskState { allocated_block_count: 0, cache: Vec::new() }),
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn total_space(&self) -> u64 {
        self.max_block_count * self.block_size as u64
    }

    pub fn unallocated_space(&self) -> u64 {
        let state = self.state.lock().expect("disk mutex poisoned");
        (self.max_block_count - state.allocated_block_count) * self.block_size as u64
    }

    pub fn allocated_block_count(&self) -> u64 {
        self.state.lock().expect("disk mutex poisoned").allocated_block_count
    }

    /// Appends `count` blocks to `blocks`, reusing cached buffers first and
    /// zero-allocating the rest. Fails with `OutOfSpace` if the quota would
    /// be exceeded, leaving `blocks` and the disk's counters untouched.
    pub fn allocate(&self, blocks: &mut Vec<Block>, count: u64) -> FsResult<()> {
        if count == 0 {
            return Ok(());
        }
        let mut state = self.state.lock().expect("disk mutex poisoned");
        if state.allocated_block_count + count > self.max_block_count {
            return Err(FsError::OutOfSpace);
        }

        let reuse = count.min(state.cache.len() as u64) as usize;
        blocks.reserve(count as usize);
        for _ in 0..reuse {
            let mut block = state.cache.pop().expect("reuse count bounded by cache length");
            block.fill(0);
            blocks.push(block);
        }
        for _ in reuse as u64..count {
            blocks.push(vec![0u8; self.block_size].into_boxed_slice());
        }
        state.allocated_block_count += count;
        Ok(())
    }

    /// Removes up to `count` trailing blocks from `blocks`, caching as many
    /// as `max_cached_block_count` allows and dropping the rest. `None`
    /// frees every block owned by `blocks`.
    pub fn free(&self, blocks: &mut Vec<Block>, count: Option<u64>) {
        let count = count.unwrap_or(blocks.len() as u64);
        if count == 0 {
            return;
        }
        let count = count.min(blocks.len() as u64) as usize;
        let mut state = self.state.lock().expect("disk mutex poisoned");

        let cache_room = self.max_cached_block_count.saturating_sub(state.cache.len() as u64) as usize;
        let cacheable = count.min(cache_room);

        for _ in 0..cacheable {
            if let Some(block) = blocks.pop() {
                state.cache.push(block);
            }
        }
        // Remaining blocks beyond cache room are simply truncated (dropped).
        let remaining_to_drop = count - cacheable;
        let new_len = blocks.len().saturating_sub(remaining_to_drop);
        blocks.truncate(new_len);

        state.allocated_block_count = state.allocated_block_count.saturating_sub(count as u64);
    }
}
