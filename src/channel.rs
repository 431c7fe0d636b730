//! `FileChannel` and its thin input/output stream adapters (spec §4.G):
//! positioned I/O against a shared [`RegularFile`], channel-local position,
//! append semantics, and close-from-another-thread cancellation.
//!
//! Every call here checks the channel's closed flag before and after the
//! content operation, reporting [`FsError::AsyncClosed`] if a concurrent
//! `close()` raced it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::error::{FsError, FsResult};
use crate::options::OpenOptions;
use crate::regular_file::{ReadOutcome, RegularFile};
use crate::state::{Closeable, FileSystemState, ResourceId};
use crate::time::FileTimeSource;

/// A no-op advisory lock token, released by dropping it or calling
/// [`FileLock::release`] explicitly (spec §4.G "lock/tryLock").
pub struct FileLock {
    released: AtomicBool,
}

impl FileLock {
    fn new() -> Arc<Self> {
        Arc::new(Self { released: AtomicBool::new(false) })
    }

    pub fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
    }

    pub fn is_valid(&self) -> bool {
        !self.released.load(Ordering::SeqCst)
    }
}

/// A channel open on one `RegularFile`, with its own position and open
/// mode (spec §4.G).
pub struct FileChannel {
    file: Arc<RegularFile>,
    clock: Arc<dyn FileTimeSource>,
    state: Arc<FileSystemState>,
    position: Mutex<u64>,
    read: bool,
    write: bool,
    append: bool,
    closed: AtomicBool,
    resource_id: Mutex<Option<ResourceId>>,
}

impl FileChannel {
    pub fn open(
        file: Arc<RegularFile>,
        options: OpenOptions,
        clock: Arc<dyn FileTimeSource>,
        state: Arc<FileSystemState>,
    ) -> FsResult<Arc<Self>> {
        options.validate()?;
        file.opened();
        let position = if options.append { file.size() } else { 0 };
        let channel = Arc::new(Self {
            file,
            clock,
            state: state.clone(),
            position: Mutex::new(position),
            read: options.read,
            write: options.write || options.append,
            append: options.append,
            closed: AtomicBool::new(false),
            resource_id: Mutex::new(None),
        });
        let id = state.register(Box::new(ChannelCloseProxy(Arc::downgrade(&channel))))?;
        *channel.resource_id.lock().expect("resource id mutex poisoned") = Some(id);
        Ok(channel)
    }

    fn ensure_open(&self) -> FsResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            Err(FsError::Closed)
        } else {
            Ok(())
        }
    }

    fn ensure_not_raced(&self) -> FsResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            Err(FsError::AsyncClosed)
        } else {
            Ok(())
        }
    }

    fn ensure_readable(&self) -> FsResult<()> {
        if self.read {
            Ok(())
        } else {
            Err(FsError::InvalidArgument("channel was not opened for reading"))
        }
    }

    fn ensure_writable(&self) -> FsResult<()> {
        if self.write {
            Ok(())
        } else {
            Err(FsError::InvalidArgument("channel was not opened for writing"))
        }
    }

    /// Reads at the channel's current position, advancing it. Returns
    /// `-1` at EOF rather than an error, matching the table's "return
    /// count or -1 at EOF" contract.
    pub fn read(&self, buf: &mut [u8]) -> FsResult<i64> {
        self.ensure_open()?;
        self.ensure_readable()?;
        let mut position = self.position.lock().expect("channel position mutex poisoned");
        let outcome = self.file.read_at(*position, buf, self.clock.as_ref());
        self.ensure_not_raced()?;
        match outcome {
            ReadOutcome::Eof => Ok(-1),
            ReadOutcome::Read(n) => {
                *position += n as u64;
                Ok(n as i64)
            }
        }
    }

    /// Positioned read; never changes the channel's position.
    pub fn read_at(&self, buf: &mut [u8], pos: u64) -> FsResult<i64> {
        self.ensure_open()?;
        self.ensure_readable()?;
        let outcome = self.file.read_at(pos, buf, self.clock.as_ref());
        self.ensure_not_raced()?;
        Ok(match outcome {
            ReadOutcome::Eof => -1,
            ReadOutcome::Read(n) => n as i64,
        })
    }

    /// Writes at the channel's current position (or at the file's current
    /// size, if `append`), advancing the position.
    pub fn write(&self, buf: &[u8]) -> FsResult<usize> {
        self.ensure_open()?;
        self.ensure_writable()?;
        let mut position = self.position.lock().expect("channel position mutex poisoned");
        let pos = if self.append { self.file.size() } else { *position };
        let written = self.file.write_at(pos, buf, self.clock.as_ref())?;
        self.ensure_not_raced()?;
        *position = pos + written as u64;
        Ok(written)
    }

    /// Positioned write. In append mode the write still happens at the
    /// file's current size rather than `pos`, and the channel's position
    /// advances to just past it — append overrides any explicit position,
    /// it does not merely ignore it (§9 open question 2).
    pub fn write_at(&self, buf: &[u8], pos: u64) -> FsResult<usize> {
        self.ensure_open()?;
        self.ensure_writable()?;
        let effective_pos = if self.append { self.file.size() } else { pos };
        let written = self.file.write_at(effective_pos, buf, self.clock.as_ref())?;
        self.ensure_not_raced()?;
        if self.append {
            *self.position.lock().expect("channel position mutex poisoned") = effective_pos + written as u64;
        }
        Ok(written)
    }

    pub fn position(&self) -> u64 {
        *self.position.lock().expect("channel position mutex poisoned")
    }

    pub fn set_position(&self, pos: u64) {
        *self.position.lock().expect("channel position mutex poisoned") = pos;
    }

    pub fn size(&self) -> FsResult<u64> {
        self.ensure_open()?;
        Ok(self.file.size())
    }

    /// Truncates the underlying file; if the channel's position is past
    /// the new size, clamps it down to match.
    pub fn truncate(&self, new_size: u64) -> FsResult<()> {
        self.ensure_open()?;
        self.ensure_writable()?;
        self.file.truncate(new_size, self.clock.as_ref());
        self.ensure_not_raced()?;
        let mut position = self.position.lock().expect("channel position mutex poisoned");
        if *position > new_size {
            *position = new_size;
        }
        Ok(())
    }

    /// Reads up to `count` bytes starting at `pos` and writes them into
    /// `dest` through its own `write`, respecting `dest`'s append mode.
    pub fn transfer_to(&self, pos: u64, count: u64, dest: &FileChannel) -> FsResult<u64> {
        self.ensure_open()?;
        self.ensure_readable()?;
        dest.ensure_open()?;
        dest.ensure_writable()?;
        transfer(|offset, chunk| self.file.read_at(pos + offset, chunk, self.clock.as_ref()), count, |chunk| dest.write(chunk))
    }

    /// Reads up to `count` bytes from `src`'s current file content and
    /// writes them into `self` at `pos` (append-overridden exactly like
    /// [`Self::write_at`]).
    pub fn transfer_from(&self, src: &FileChannel, pos: u64, count: u64) -> FsResult<u64> {
        self.ensure_open()?;
        self.ensure_writable()?;
        src.ensure_open()?;
        src.ensure_readable()?;
        let mut written_total = 0u64;
        let mut offset = 0u64;
        let mut buf = [0u8; 8192];
        while offset < count {
            let chunk_len = (count - offset).min(buf.len() as u64) as usize;
            let read = match src.file.read_at(offset, &mut buf[..chunk_len], src.clock.as_ref()) {
                ReadOutcome::Eof => break,
                ReadOutcome::Read(0) => break,
                ReadOutcome::Read(n) => n,
            };
            written_total += self.write_at(&buf[..read], pos + offset)? as u64;
            offset += read as u64;
        }
        Ok(written_total)
    }

    pub fn lock(&self) -> FsResult<Arc<FileLock>> {
        self.ensure_open()?;
        Ok(FileLock::new())
    }

    pub fn try_lock(&self) -> FsResult<Arc<FileLock>> {
        self.lock()
    }

    /// Idempotent explicit close, usable from any thread; deregisters the
    /// channel from the `FileSystemState` it was opened against.
    pub fn close(&self) -> FsResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.file.closed();
        if let Some(id) = self.resource_id.lock().expect("resource id mutex poisoned").take() {
            self.state.deregister(id);
        }
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }
}

/// Registered with [`FileSystemState`] in place of the channel itself: the
/// channel is handed out to its caller as an `Arc`, so the registry holds
/// only a weak reference and is a no-op once the channel has already
/// dropped.
struct ChannelCloseProxy(Weak<FileChannel>);

impl Closeable for ChannelCloseProxy {
    fn close(&self) -> FsResult<()> {
        match self.0.upgrade() {
            Some(channel) => channel.close(),
            None => Ok(()),
        }
    }
}

/// Generic chunked copy loop shared by `transfer_to`'s read/write halves.
fn transfer(read: impl Fn(u64, &mut [u8]) -> ReadOutcome, count: u64, mut write: impl FnMut(&[u8]) -> FsResult<usize>) -> FsResult<u64> {
    let mut offset = 0u64;
    let mut buf = [0u8; 8192];
    while offset < count {
        let chunk_len = (count - offset).min(buf.len() as u64) as usize;
        match read(offset, &mut buf[..chunk_len]) {
            ReadOutcome::Eof | ReadOutcome::Read(0) => break,
            ReadOutcome::Read(n) => {
                write(&buf[..n])?;
                offset += n as u64;
            }
        }
    }
    Ok(offset)
}

/// A sequential reader over a `RegularFile`, independent of any
/// `FileChannel` (spec §4.G "input streams").
pub struct FileInputStream {
    file: Arc<RegularFile>,
    clock: Arc<dyn FileTimeSource>,
    position: Mutex<u64>,
    closed: AtomicBool,
}

impl FileInputStream {
    pub fn new(file: Arc<RegularFile>, clock: Arc<dyn FileTimeSource>) -> Self {
        file.opened();
        Self { file, clock, position: Mutex::new(0), closed: AtomicBool::new(false) }
    }

    pub fn read(&self, buf: &mut [u8]) -> FsResult<i64> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(FsError::Closed);
        }
        let mut position = self.position.lock().expect("stream position mutex poisoned");
        match self.file.read_at(*position, buf, self.clock.as_ref()) {
            ReadOutcome::Eof => Ok(-1),
            ReadOutcome::Read(n) => {
                *position += n as u64;
                Ok(n as i64)
            }
        }
    }

    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.file.closed();
        }
    }
}

/// A sequential writer over a `RegularFile`, recomputing its position from
/// the file's current size before every write when `append` is set (spec
/// §4.G "output streams").
pub struct FileOutputStream {
    file: Arc<RegularFile>,
    clock: Arc<dyn FileTimeSource>,
    position: Mutex<u64>,
    append: bool,
    closed: AtomicBool,
}

impl FileOutputStream {
    pub fn new(file: Arc<RegularFile>, clock: Arc<dyn FileTimeSource>, append: bool) -> Self {
        file.opened();
        let position = if append { file.size() } else { 0 };
        Self { file, clock, position: Mutex::new(position), append, closed: AtomicBool::new(false) }
    }

    pub fn write(&self, buf: &[u8]) -> FsResult<usize> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(FsError::Closed);
        }
        let mut position = self.position.lock().expect("stream position mutex poisoned");
        let pos = if self.append { self.file.size() } else { *position };
        let written = self.file.write_at(pos, buf, self.clock.as_ref())?;
        *position = pos + written as u64;
        Ok(written)
    }

    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.file.closed();
        }
    }
}
