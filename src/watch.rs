//! `PollingWatchService`: periodic directory-snapshot diffing delivered
//! through bounded per-key event queues (spec §4.I).
//!
//! Every `poll_interval`, each registered directory's entry table is
//! re-snapshotted and diffed against the previous snapshot; differences are
//! posted to the directory's registered keys.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_queue::ArrayQueue;

use crate::arena::FileId;
use crate::error::{FsError, FsResult};
use crate::state::Closeable;
use crate::time::FileTime;
use crate::view::Store;

const QUEUE_CAPACITY: usize = 256;

/// The kind of change a [`WatchEvent`] reports (spec §4.I "Event kinds").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventKind {
    Create,
    Delete,
    Modify,
    /// Synthesized once per drain when events arrived faster than a key's
    /// queue could hold them (spec §4.I "Overflow").
    Overflow,
}

/// One reported change. `context` names the affected entry; it is empty
/// for `Overflow`, whose `count` instead reports how many events were
/// dropped since the last [`WatchKey::poll_events`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub kind: EventKind,
    pub context: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyState {
    Ready,
    Signalled,
}

struct KeyInner {
    directory: FileId,
    kinds: Vec<EventKind>,
    state: Mutex<KeyState>,
    events: ArrayQueue<WatchEvent>,
    overflow_count: AtomicU64,
    valid: AtomicBool,
    signalled: async_channel::Sender<WatchKey>,
}

/// A handle to one registered directory watch (spec §4.I `WatchKey`).
/// Cloning shares the same underlying queue and state machine.
#[derive(Clone)]
pub struct WatchKey(Arc<KeyInner>);

impl WatchKey {
    pub fn is_valid(&self) -> bool {
        self.0.valid.load(Ordering::SeqCst)
    }

    pub fn directory(&self) -> FileId {
        self.0.directory
    }

    pub fn watches(&self, kind: EventKind) -> bool {
        self.0.kinds.contains(&kind)
    }

    /// Drains every queued event, appending one coalesced `Overflow` event
    /// at the end if any events were dropped since the last drain (spec
    /// §4.I "pollEvents").
    pub fn poll_events(&self) -> Vec<WatchEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.0.events.pop() {
            events.push(event);
        }
        let overflow = self.0.overflow_count.swap(0, Ordering::SeqCst);
        if overflow > 0 {
            events.push(WatchEvent { kind: EventKind::Overflow, context: String::new(), count: overflow as usize });
        }
        events
    }

    /// Returns this key to the `READY` state, re-signalling immediately if
    /// events arrived while it was being processed (spec §4.I "reset").
    pub fn reset(&self) -> FsResult<()> {
        *self.0.state.lock().expect("watch key state mutex poisoned") = KeyState::Ready;
        if !self.0.events.is_empty() || self.0.overflow_count.load(Ordering::SeqCst) > 0 {
            self.signal();
        }
        Ok(())
    }

    pub fn cancel(&self) {
        self.0.valid.store(false, Ordering::SeqCst);
    }

    /// Transitions `READY -> SIGNALLED` and pushes this key onto the
    /// signalled-keys queue; a key already `SIGNALLED` is left alone, since
    /// it is already somewhere in (or about to be in) that queue.
    fn signal(&self) {
        let mut state = self.0.state.lock().expect("watch key state mutex poisoned");
        if *state == KeyState::Signalled {
            return;
        }
        *state = KeyState::Signalled;
        drop(state);
        let _ = self.0.signalled.try_send(self.clone());
    }

    fn post(&self, kind: EventKind, context: String) -> bool {
        if !self.watches(kind) {
            return false;
        }
        if self.0.events.push(WatchEvent { kind, context, count: 1 }).is_err() {
            self.0.overflow_count.fetch_add(1, Ordering::SeqCst);
        }
        true
    }
}

type Snapshot = BTreeMap<String, FileTime>;

struct Registration {
    key: WatchKey,
    last_snapshot: Snapshot,
}

struct ServiceState {
    registrations: Vec<Registration>,
}

/// Owns every registered [`WatchKey`] for one `Store` and the background
/// thread that periodically re-diffs them (spec §4.I).
pub struct PollingWatchService {
    store: Arc<Store>,
    poll_interval: Duration,
    state: Mutex<ServiceState>,
    signalled_tx: async_channel::Sender<WatchKey>,
    signalled_rx: async_channel::Receiver<WatchKey>,
    poller_started: AtomicBool,
    closed: AtomicBool,
}

impl PollingWatchService {
    pub fn new(store: Arc<Store>, poll_interval: Duration) -> Arc<Self> {
        let (tx, rx) = async_channel::unbounded();
        Arc::new(Self {
            store,
            poll_interval,
            state: Mutex::new(ServiceState { registrations: Vec::new() }),
            signalled_tx: tx,
            signalled_rx: rx,
            poller_started: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        })
    }

    pub fn register(&self, directory: FileId, kinds: Vec<EventKind>) -> FsResult<WatchKey> {
        let snapshot = self.snapshot_of(directory)?;
        let key = WatchKey(Arc::new(KeyInner {
            directory,
            kinds,
            state: Mutex::new(KeyState::Ready),
            events: ArrayQueue::new(QUEUE_CAPACITY),
            overflow_count: AtomicU64::new(0),
            valid: AtomicBool::new(true),
            signalled: self.signalled_tx.clone(),
        }));
        self.state
            .lock()
            .expect("watch service state mutex poisoned")
            .registrations
            .push(Registration { key: key.clone(), last_snapshot: snapshot });
        Ok(key)
    }

    fn snapshot_of(&self, directory: FileId) -> FsResult<Snapshot> {
        let arena = self.store.arena.read().expect("store arena lock poisoned");
        let dir = arena.get(directory)?.as_directory()?;
        dir.snapshot()
            .into_iter()
            .map(|entry| Ok((entry.name.display().to_string(), arena.get(entry.file)?.modified())))
            .collect()
    }

    /// Re-snapshots every still-valid registration, diffs it against the
    /// previous snapshot, and signals any key that a posted event touched
    /// (spec §4.I "Poll tick").
    pub fn poll_tick(&self) {
        let mut state = self.state.lock().expect("watch service state mutex poisoned");
        state.registrations.retain(|reg| reg.key.is_valid());
        for reg in state.registrations.iter_mut() {
            let fresh = match self.snapshot_of(reg.key.directory()) {
                Ok(snapshot) => snapshot,
                Err(_) => continue,
            };
            let mut any_posted = false;
            for (name, mtime) in &fresh {
                match reg.last_snapshot.get(name) {
                    None => any_posted |= reg.key.post(EventKind::Create, name.clone()),
                    Some(previous) if previous != mtime => any_posted |= reg.key.post(EventKind::Modify, name.clone()),
                    _ => {}
                }
            }
            for name in reg.last_snapshot.keys() {
                if !fresh.contains_key(name) {
                    any_posted |= reg.key.post(EventKind::Delete, name.clone());
                }
            }
            reg.last_snapshot = fresh;
            if any_posted {
                reg.key.signal();
            }
        }
    }

    /// Blocks the calling thread until a key has events to report.
    pub fn take(&self) -> FsResult<WatchKey> {
        self.signalled_rx.recv_blocking().map_err(|_| FsError::Closed)
    }

    /// Non-blocking variant of [`Self::take`].
    pub fn poll(&self) -> FsResult<Option<WatchKey>> {
        match self.signalled_rx.try_recv() {
            Ok(key) => Ok(Some(key)),
            Err(async_channel::TryRecvError::Empty) => Ok(None),
            Err(async_channel::TryRecvError::Closed) => Err(FsError::Closed),
        }
    }

    /// Spawns the background polling thread exactly once per service.
    pub fn spawn_poller(self: &Arc<Self>) {
        if self.poller_started.swap(true, Ordering::SeqCst) {
            return;
        }
        let service = self.clone();
        std::thread::spawn(move || {
            while !service.closed.load(Ordering::SeqCst) {
                std::thread::sleep(service.poll_interval);
                if service.closed.load(Ordering::SeqCst) {
                    break;
                }
                service.poll_tick();
            }
        });
    }
}

impl Closeable for PollingWatchService {
    fn close(&self) -> FsResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        let state = self.state.lock().expect("watch service state mutex poisoned");
        for reg in &state.registrations {
            reg.key.cancel();
        }
        self.signalled_rx.close();
        Ok(())
    }
}
