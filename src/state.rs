//! `FileSystemState`: the filesystem's open/closed lifecycle and the
//! registry of live closeable resources that must go down with it (spec
//! §4.H).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use crate::error::{FsError, FsResult};

pub type ResourceId = u64;

/// Anything that must be force-closed when the owning filesystem closes:
/// channels, streams, watch services, directory streams.
pub trait Closeable: Send + Sync {
    fn close(&self) -> FsResult<()>;
}

/// Shared open/closed flag plus the set of resources registered against it.
///
/// `register`/`close` use a simple `Mutex`-guarded map rather than an
/// async concurrent map (see `DESIGN.md`) because this registry backs the
/// fully synchronous [`crate::channel::FileChannel`], not just its async
/// wrapper, and must be usable with no Tokio runtime in scope.
pub struct FileSystemState {
    open: AtomicBool,
    next_id: AtomicU64,
    registering: AtomicU64,
    resources: Mutex<HashMap<ResourceId, Box<dyn Closeable>>>,
    on_close: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl FileSystemState {
    pub fn new() -> Self {
        Self {
            open: AtomicBool::new(true),
            next_id: AtomicU64::new(1),
            registering: AtomicU64::new(0),
            resources: Mutex::new(HashMap::new()),
            on_close: Mutex::new(None),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    pub fn check_open(&self) -> FsResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(FsError::Closed)
        }
    }

    /// Installs a callback run once, the first time `close()` succeeds
    /// (spec §4.H "on-close callback", used by an owning cache/provider to
    /// evict this filesystem).
    pub fn set_on_close(&self, callback: impl FnOnce() + Send + 'static) {
        *self.on_close.lock().expect("on-close callback mutex poisoned") = Some(Box::new(callback));
    }

    /// Registers `resource`, returning the id later passed to
    /// [`Self::deregister`]. Double-checks the open flag around a
    /// registration counter so a concurrent `close()` can never miss a
    /// resource that started registering just before the flag flipped
    /// (spec §4.H "register").
    pub fn register(&self, resource: Box<dyn Closeable>) -> FsResult<ResourceId> {
        self.registering.fetch_add(1, Ordering::SeqCst);
        let result = if !self.is_open() {
            Err(FsError::Closed)
        } else {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            self.resources.lock().expect("resource registry poisoned").insert(id, resource);
            Ok(id)
        };
        self.registering.fetch_sub(1, Ordering::SeqCst);
        result
    }

    /// Removes `id` from the registry without closing it — for a resource
    /// that has already closed itself and is just cleaning up.
    pub fn deregister(&self, id: ResourceId) {
        self.resources.lock().expect("resource registry poisoned").remove(&id);
    }

    /// CAS-es open -> closed, runs the on-close callback, then repeatedly
    /// drains the resource set — including resources still arriving from
    /// in-flight `register` calls — until both the registry is empty and
    /// no registration is in flight (spec §4.H "close"). Errors from
    /// individual resources are logged, not propagated, so one failing
    /// resource never blocks the rest from closing.
    pub fn close(&self) {
        if !self.open.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(callback) = self.on_close.lock().expect("on-close callback mutex poisoned").take() {
            callback();
        }
        loop {
            let drained: Vec<Box<dyn Closeable>> = {
                let mut resources = self.resources.lock().expect("resource registry poisoned");
                resources.drain().map(|(_, resource)| resource).collect()
            };
            let was_empty = drained.is_empty();
            for resource in &drained {
                if let Err(err) = resource.close() {
                    tracing::warn!(error = %err, "error closing resource during filesystem shutdown");
                }
            }
            if was_empty {
                if self.registering.load(Ordering::SeqCst) == 0 {
                    break;
                }
                std::thread::yield_now();
            }
        }
    }
}

impl Default for FileSystemState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::sync::Arc;

    struct CountingResource(Arc<AtomicU32>);

    impl Closeable for CountingResource {
        fn close(&self) -> FsResult<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn register_fails_once_closed() {
        let state = FileSystemState::new();
        state.close();
        let closes = Arc::new(AtomicU32::new(0));
        assert!(matches!(state.register(Box::new(CountingResource(closes))), Err(FsError::Closed)));
    }

    #[test]
    fn close_drains_and_closes_every_registered_resource() {
        let state = FileSystemState::new();
        let closes = Arc::new(AtomicU32::new(0));
        state.register(Box::new(CountingResource(closes.clone()))).unwrap();
        state.register(Box::new(CountingResource(closes.clone()))).unwrap();
        state.close();
        assert_eq!(closes.load(Ordering::SeqCst), 2);
        assert!(!state.is_open());
    }

    #[test]
    fn on_close_callback_runs_exactly_once() {
        let state = FileSystemState::new();
        let ran = Arc::new(AtomicU32::new(0));
        let ran_clone = ran.clone();
        state.set_on_close(move || {
            ran_clone.fetch_add(1, Ordering::SeqCst);
        });
        state.close();
        state.close();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn deregister_removes_without_closing() {
        let state = FileSystemState::new();
        let closes = Arc::new(AtomicU32::new(0));
        let id = state.register(Box::new(CountingResource(closes.clone()))).unwrap();
        state.deregister(id);
        state.close();
        assert_eq!(closes.load(Ordering::SeqCst), 0);
    }
}
