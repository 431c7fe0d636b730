//! `AsyncFileChannel`: an async submission wrapper around [`FileChannel`]
//! (spec §4.G.1). It never reimplements the I/O algorithms — every method
//! hands the equivalent synchronous call to `tokio::task::spawn_blocking`
//! and awaits the result.

use std::sync::Arc;

use crate::channel::FileChannel;
use crate::error::{FsError, FsResult};

/// Wraps one [`FileChannel`] for use from async code. Cloning an
/// `AsyncFileChannel` is cheap and shares the same underlying channel.
#[derive(Clone)]
pub struct AsyncFileChannel {
    inner: Arc<FileChannel>,
}

impl AsyncFileChannel {
    pub fn new(inner: Arc<FileChannel>) -> Self {
        Self { inner }
    }

    /// An independent handle that cancels any operation in flight (and any
    /// started afterward) on this channel by closing it — the blocking
    /// call observes the close the next time it checks the channel's
    /// closed flag and returns [`FsError::AsyncClosed`] instead of
    /// completing (spec §4.G.1 "cancelling... interrupts the channel").
    pub fn abort_handle(&self) -> AsyncAbortHandle {
        AsyncAbortHandle { inner: self.inner.clone() }
    }

    pub async fn read(&self, mut buf: Vec<u8>) -> FsResult<(Vec<u8>, i64)> {
        let channel = self.inner.clone();
        let joined = tokio::task::spawn_blocking(move || {
            let outcome = channel.read(&mut buf);
            (buf, outcome)
        })
        .await;
        unpack(joined)
    }

    pub async fn read_at(&self, mut buf: Vec<u8>, pos: u64) -> FsResult<(Vec<u8>, i64)> {
        let channel = self.inner.clone();
        let joined = tokio::task::spawn_blocking(move || {
            let outcome = channel.read_at(&mut buf, pos);
            (buf, outcome)
        })
        .await;
        unpack(joined)
    }

    pub async fn write(&self, buf: Vec<u8>) -> FsResult<usize> {
        let channel = self.inner.clone();
        let joined = tokio::task::spawn_blocking(move || channel.write(&buf)).await;
        flatten(joined)
    }

    pub async fn write_at(&self, buf: Vec<u8>, pos: u64) -> FsResult<usize> {
        let channel = self.inner.clone();
        let joined = tokio::task::spawn_blocking(move || channel.write_at(&buf, pos)).await;
        flatten(joined)
    }

    pub async fn truncate(&self, new_size: u64) -> FsResult<()> {
        let channel = self.inner.clone();
        let joined = tokio::task::spawn_blocking(move || channel.truncate(new_size)).await;
        flatten(joined)
    }

    pub async fn transfer_to(&self, pos: u64, count: u64, dest: Arc<FileChannel>) -> FsResult<u64> {
        let channel = self.inner.clone();
        let joined = tokio::task::spawn_blocking(move || channel.transfer_to(pos, count, &dest)).await;
        flatten(joined)
    }

    pub async fn transfer_from(&self, src: Arc<FileChannel>, pos: u64, count: u64) -> FsResult<u64> {
        let channel = self.inner.clone();
        let joined = tokio::task::spawn_blocking(move || channel.transfer_from(&src, pos, count)).await;
        flatten(joined)
    }

    /// Cheap, non-blocking accessors are passed straight through rather
    /// than detoured through the blocking pool.
    pub fn position(&self) -> u64 {
        self.inner.position()
    }

    pub fn set_position(&self, pos: u64) {
        self.inner.set_position(pos)
    }

    pub fn size(&self) -> FsResult<u64> {
        self.inner.size()
    }

    pub fn close(&self) -> FsResult<()> {
        self.inner.close()
    }
}

/// Closes the wrapped channel without holding a strong reference to the
/// [`AsyncFileChannel`] it came from.
pub struct AsyncAbortHandle {
    inner: Arc<FileChannel>,
}

impl AsyncAbortHandle {
    pub fn abort(&self) {
        let _ = self.inner.close();
    }
}

fn unpack<T>(joined: Result<(T, FsResult<i64>), tokio::task::JoinError>) -> FsResult<(T, i64)> {
    match joined {
        Ok((value, Ok(n))) => Ok((value, n)),
        Ok((_, Err(err))) => Err(err),
        Err(_) => Err(FsError::AsyncClosed),
    }
}

fn flatten<T>(joined: Result<FsResult<T>, tokio::task::JoinError>) -> FsResult<T> {
    match joined {
        Ok(result) => result,
        Err(_) => Err(FsError::AsyncClosed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::HeapDisk;
    use crate::options::OpenOptions;
    use crate::regular_file::RegularFile;
    use crate::state::FileSystemState;
    use crate::time::SystemClock;

    fn channel() -> Arc<FileChannel> {
        let file = Arc::new(RegularFile::new(Arc::new(HeapDisk::new(8, 4096, 4096)), &SystemClock));
        FileChannel::open(file, OpenOptions::read_write(), Arc::new(SystemClock), Arc::new(FileSystemState::new())).unwrap()
    }

    #[tokio::test]
    async fn write_then_read_round_trips_through_spawn_blocking() {
        let async_channel = AsyncFileChannel::new(channel());
        async_channel.write(b"hello".to_vec()).await.unwrap();
        async_channel.set_position(0);
        let (buf, n) = async_channel.read(vec![0u8; 5]).await.unwrap();
        assert_eq!(n, 5);
        assert_eq!(&buf, b"hello");
    }

    #[tokio::test]
    async fn abort_handle_closes_the_underlying_channel() {
        let async_channel = AsyncFileChannel::new(channel());
        let handle = async_channel.abort_handle();
        handle.abort();
        assert!(matches!(async_channel.write(b"x".to_vec()).await, Err(FsError::Closed)));
    }
}
