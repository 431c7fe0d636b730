//! `RegularFile`: a block-list-backed byte store with positioned I/O and a
//! content reader-writer lock (spec §4.B).

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::disk::{Block, HeapDisk};
use crate::error::FsResult;
use crate::time::{FileTime, FileTimeSource};

/// Outcome of a positioned read: either the number of bytes actually read,
/// or `Eof` when the starting position was already at or past the file's
/// size (spec §4.B "Positioned I/O contract").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    Eof,
    Read(usize),
}

struct Content {
    blocks: Vec<Block>,
    size: u64,
}

struct Times {
    created: FileTime,
    accessed: FileTime,
    modified: FileTime,
}

/// A regular file's byte content, shared by every hard link and every open
/// channel pointing at the same inode.
///
/// Timestamps live here rather than on the owning `FileNode` because
/// content I/O must never take the store lock (spec §5 "Content I/O takes
/// only the file's content lock, never the store lock"): updating
/// `lastAccessTime`/`lastModifiedTime` on every `read`/`write` has to be
/// possible without touching the namespace.
pub struct RegularFile {
    disk: Arc<HeapDisk>,
    content: std::sync::RwLock<Content>,
    times: Mutex<Times>,
    open_count: AtomicU64,
    deleted: AtomicBool,
}

impl RegularFile {
    pub fn new(disk: Arc<HeapDisk>, clock: &dyn FileTimeSource) -> Self {
        let now = clock.now();
        Self {
            disk,
            content: std::sync::RwLock::new(Content { blocks: Vec::new(), size: 0 }),
            times: Mutex::new(Times { created: now, accessed: now, modified: now }),
            open_count: AtomicU64::new(0),
            deleted: AtomicBool::new(false),
        }
    }

    fn block_size(&self) -> u64 {
        self.disk.block_size() as u64
    }

    pub fn size(&self) -> u64 {
        self.content.read().expect("content lock poisoned").size
    }

    pub fn created(&self) -> FileTime {
        self.times.lock().expect("times lock poisoned").created
    }

    pub fn accessed(&self) -> FileTime {
        self.times.lock().expect("times lock poisoned").accessed
    }

    pub fn modified(&self) -> FileTime {
        self.times.lock().expect("times lock poisoned").modified
    }

    pub fn set_created(&self, value: FileTime) {
        self.times.lock().expect("times lock poisoned").created = value;
    }

    pub fn set_accessed(&self, value: FileTime) {
        self.times.lock().expect("times lock poisoned").accessed = value;
    }

    pub fn set_modified(&self, value: FileTime) {
        self.times.lock().expect("times lock poisoned").modified = value;
    }

    fn touch_accessed(&self, clock: &dyn FileTimeSource) {
        self.times.lock().expect("times lock poisoned").accessed = clock.now();
    }

    fn touch_modified(&self, clock: &dyn FileTimeSource) {
        self.times.lock().expect("times lock poisoned").modified = clock.now();
    }

    /// Positioned read. Never advances `size`. See [`ReadOutcome`].
    pub fn read_at(&self, pos: u64, buf: &mut [u8], clock: &dyn FileTimeSource) -> ReadOutcome {
        let outcome = {
            let content = self.content.read().expect("content lock poisoned");
            if pos >= content.size {
                ReadOutcome::Eof
            } else {
                let available = (content.size - pos).min(buf.len() as u64) as usize;
                if available == 0 {
                    ReadOutcome::Read(0)
                } else {
                    scatter_read(&content.blocks, self.block_size(), pos, &mut buf[..available]);
                    ReadOutcome::Read(available)
                }
            }
        };
        self.touch_accessed(clock);
        outcome
    }

    /// Positioned write. Grows the file and zero-fills `[size, pos)` if
    /// `pos > size` (spec §4.B "Write algorithm").
    pub fn write_at(&self, pos: u64, buf: &[u8], clock: &dyn FileTimeSource) -> FsResult<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        {
            let mut content = self.content.write().expect("content lock poisoned");
            let end = pos + buf.len() as u64;
            let required_blocks = div_ceil(end, self.block_size());
            if required_blocks > content.blocks.len() as u64 {
                let deficit = required_blocks - content.blocks.len() as u64;
                self.disk.allocate(&mut content.blocks, deficit)?;
            }

            if pos > content.size {
                zero_fill(&mut content.blocks, self.block_size(), content.size, pos);
                content.size = pos;
            }

            scatter_write(&mut content.blocks, self.block_size(), pos, buf);
            content.size = content.size.max(end);
        }
        self.touch_modified(clock);
        Ok(buf.len())
    }

    /// Truncates to `new_size`. No-op (returns `false`) if `new_size >=
    /// size` (spec §4.B "Truncation", boundary B2).
    pub fn truncate(&self, new_size: u64, clock: &dyn FileTimeSource) -> bool {
        let changed = {
            let mut content = self.content.write().expect("content lock poisoned");
            if new_size >= content.size {
                false
            } else {
                content.size = new_size;
                let new_block_count = div_ceil(new_size, self.block_size());
                let extra = content.blocks.len() as u64 - new_block_count;
                if extra > 0 {
                    self.disk.free(&mut content.blocks, Some(extra));
                }
                true
            }
        };
        if changed {
            self.touch_modified(clock);
        }
        changed
    }

    /// Copies this file's content onto `other`, which must be freshly
    /// created and empty (spec §4.B "copyContentTo").
    pub fn copy_content_to(&self, other: &RegularFile) -> FsResult<()> {
        let source = self.content.read().expect("content lock poisoned");
        let mut dest = other.content.write().expect("content lock poisoned");
        debug_assert!(dest.blocks.is_empty());
        self.disk.allocate(&mut dest.blocks, source.blocks.len() as u64)?;
        for (src_block, dst_block) in source.blocks.iter().zip(dest.blocks.iter_mut()) {
            dst_block.copy_from_slice(src_block);
        }
        dest.size = source.size;
        Ok(())
    }

    /// Registers a new open channel/stream on this file.
    pub fn opened(&self) {
        self.open_count.fetch_add(1, Ordering::SeqCst);
    }

    /// Deregisters an open channel/stream. If this was the last open
    /// handle and the file had been marked `deleted`, its blocks are freed
    /// and `size` reset to zero (spec §4.B "open_count / deleted").
    pub fn closed(&self) {
        let previous = self.open_count.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(previous > 0, "closed() called without a matching opened()");
        if previous == 1 && self.deleted.load(Ordering::SeqCst) {
            self.free_all_content();
        }
    }

    pub fn open_count(&self) -> u64 {
        self.open_count.load(Ordering::SeqCst)
    }

    /// Marks the file as deleted (last name unlinked). If there are no
    /// open handles, its content is freed immediately; otherwise deferred
    /// to the last `closed()` (spec invariant 8).
    pub fn mark_deleted(&self) {
        self.deleted.store(true, Ordering::SeqCst);
        if self.open_count.load(Ordering::SeqCst) == 0 {
            self.free_all_content();
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.load(Ordering::SeqCst)
    }

    fn free_all_content(&self) {
        let mut content = self.content.write().expect("content lock poisoned");
        self.disk.free(&mut content.blocks, None);
        content.size = 0;
    }
}

fn div_ceil(value: u64, divisor: u64) -> u64 {
    (value + divisor - 1) / divisor
}

fn scatter_read(blocks: &[Block], block_size: u64, pos: u64, out: &mut [u8]) {
    let mut remaining = out;
    let mut offset = pos;
    while !remaining.is_empty() {
        let block_index = (offset / block_size) as usize;
        let block_offset = (offset % block_size) as usize;
        let block = &blocks[block_index];
        let chunk = (block.len() - block_offset).min(remaining.len());
        remaining[..chunk].copy_from_slice(&block[block_offset..block_offset + chunk]);
        remaining = &mut remaining[chunk..];
        offset += chunk as u64;
    }
}

fn scatter_write(blocks: &mut [Block], block_size: u64, pos: u64, data: &[u8]) {
    let mut remaining = data;
    let mut offset = pos;
    while !remaining.is_empty() {
        let block_index = (offset / block_size) as usize;
        let block_offset = (offset % block_size) as usize;
        let block = &mut blocks[block_index];
        let chunk = (block.len() - block_offset).min(remaining.len());
        block[block_offset..block_offset + chunk].copy_from_slice(&remaining[..chunk]);
        remaining = &remaining[chunk..];
        offset += chunk as u64;
    }
}

fn zero_fill(blocks: &mut [Block], block_size: u64, from: u64, to: u64) {
    if to <= from {
        return;
    }
    let len = (to - from) as usize;
    let zeros = vec![0u8; len];
    scatter_write(blocks, block_size, from, &zeros);
}
