//! `FileSystem`: the object a [`crate::config::FileSystemConfig`] builds,
//! tying together the arena, disk, attribute service, watch service, and
//! open/close lifecycle behind one path-taking public API (spec §4.K, §9
//! data-flow).

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use crate::arena::{FileArena, FileId};
use crate::async_channel::AsyncFileChannel;
use crate::attribute::AttributeValue;
use crate::channel::{FileChannel, FileInputStream, FileOutputStream};
use crate::config::FileSystemConfig;
use crate::disk::HeapDisk;
use crate::error::{FsError, FsResult};
use crate::lookup::Resolution;
use crate::name::Name;
use crate::options::{CopyOptions, DeleteMode, LinkOption, OpenOptions};
use crate::path::ParsedPath;
use crate::state::{Closeable, FileSystemState};
use crate::time::{FileTimeSource, SystemClock};
use crate::view::{CreateKind, FileSystemView, Store};
use crate::watch::{EventKind, PollingWatchService, WatchKey};

/// A snapshot of one directory's entry names, captured once at construction
/// time so concurrent renames of the directory itself cannot invalidate an
/// iteration in progress (spec §4.F "Secure directory streams"). Yields
/// `FsResult<String>` rather than a bare `String` so a future entry that
/// fails to resolve surfaces through the iterator instead of panicking
/// (spec §7 "thrown-from-iterator").
pub struct DirectoryStream {
    names: VecDeque<String>,
}

impl Iterator for DirectoryStream {
    type Item = FsResult<String>;

    fn next(&mut self) -> Option<FsResult<String>> {
        self.names.pop_front().map(Ok)
    }
}

struct WatchServiceCloseProxy(Arc<PollingWatchService>);

impl Closeable for WatchServiceCloseProxy {
    fn close(&self) -> FsResult<()> {
        self.0.close()
    }
}

/// The top-level filesystem instance (spec §4.K). Owns every root
/// directory, the id-keyed inode arena, the shared disk, the attribute
/// registry, the open/close lifecycle, and the watch service; exposes a
/// path-taking API layered on top of [`FileSystemView`].
pub struct FileSystem {
    store: Arc<Store>,
    view: FileSystemView,
    state: Arc<FileSystemState>,
    watch_service: Arc<PollingWatchService>,
    config: FileSystemConfig,
}

impl FileSystem {
    pub fn new(config: FileSystemConfig) -> FsResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Builds a filesystem against an injected clock, used by tests that
    /// need deterministic timestamps (spec §5 "Time source").
    pub fn with_clock(config: FileSystemConfig, clock: Arc<dyn FileTimeSource>) -> FsResult<Self> {
        config.validate()?;

        let disk = Arc::new(HeapDisk::new(config.block_size, config.max_size, config.max_cache_size));
        let mut arena = FileArena::new();
        let mut roots = BTreeMap::new();
        for root_name in &config.roots {
            let root_id = arena.create_directory(clock.as_ref());
            arena.get_mut(root_id)?.as_directory_mut()?.link_into_parent(root_id, Name::self_name());
            roots.insert(root_name.clone(), root_id);
        }

        let store = Store::new(&config, arena, roots.clone(), disk, clock.clone());

        let first_root = *roots.values().next().ok_or(FsError::InvalidArgument("at least one root is required"))?;
        let bootstrap_view = FileSystemView::new(store.clone(), first_root);
        let working_directory = bootstrap_view.create_file(&config.working_directory, CreateKind::Directory, false, &[])?;

        let view = FileSystemView::new(store.clone(), working_directory);

        let watch_service = PollingWatchService::new(store.clone(), Duration::from_millis(config.watch_service.poll_interval_millis));
        watch_service.spawn_poller();

        let state = Arc::new(FileSystemState::new());
        state.register(Box::new(WatchServiceCloseProxy(watch_service.clone())))?;

        Ok(Self { store, view, state, watch_service, config })
    }

    pub fn config(&self) -> &FileSystemConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }

    pub fn close(&self) {
        self.state.close();
    }

    /// A view rooted at the first configured filesystem root.
    pub fn root_view(&self) -> FileSystemView {
        let root = *self.store.root_ids().next().expect("at least one root");
        FileSystemView::new(self.store.clone(), root)
    }

    /// A view whose working directory is the filesystem's default working
    /// directory (spec §6.1 `workingDirectory`).
    pub fn working_directory_view(&self) -> FileSystemView {
        self.view.clone()
    }

    fn check_open(&self) -> FsResult<()> {
        self.state.check_open()
    }

    pub fn create_directory(&self, path: &str, explicit_attrs: &[(String, String, AttributeValue)]) -> FsResult<FileId> {
        self.check_open()?;
        self.view.create_directory(path, explicit_attrs)
    }

    pub fn create_symbolic_link(&self, path: &str, target: String, explicit_attrs: &[(String, String, AttributeValue)]) -> FsResult<FileId> {
        self.check_open()?;
        self.view.create_symbolic_link(path, target, explicit_attrs)
    }

    pub fn create_link(&self, link_path: &str, existing_path: &str) -> FsResult<FileId> {
        self.check_open()?;
        self.view.link(link_path, &self.view, existing_path)
    }

    pub fn delete(&self, path: &str, mode: DeleteMode) -> FsResult<()> {
        self.check_open()?;
        self.view.delete_file(path, mode)
    }

    pub fn copy(&self, source: &str, dest: &str, options: CopyOptions) -> FsResult<()> {
        self.check_open()?;
        self.view.copy(source, &self.view, dest, options, false)
    }

    pub fn move_(&self, source: &str, dest: &str, options: CopyOptions) -> FsResult<()> {
        self.check_open()?;
        self.view.copy(source, &self.view, dest, options, true)
    }

    pub fn read_symbolic_link(&self, path: &str) -> FsResult<String> {
        self.check_open()?;
        self.view.read_symbolic_link(path)
    }

    pub fn check_access(&self, path: &str) -> FsResult<()> {
        self.check_open()?;
        self.view.check_access(path)
    }

    pub fn read_attributes(&self, path: &str, expr: &str, follow: LinkOption) -> FsResult<BTreeMap<String, AttributeValue>> {
        self.check_open()?;
        let (view, attrs) = self.store.attributes.parse_expression(expr)?;
        let all = self.view.read_attributes(path, &view, follow)?;
        Ok(all.into_iter().filter(|(k, _)| attrs.contains(k)).collect())
    }

    pub fn set_attribute(&self, path: &str, expr: &str, value: AttributeValue, follow: LinkOption) -> FsResult<()> {
        self.check_open()?;
        let (view, attrs) = self.store.attributes.parse_expression(expr)?;
        let attr = attrs.first().ok_or(FsError::InvalidArgument("setAttribute requires exactly one attribute name"))?;
        self.view.set_attribute(path, &view, attr, value, follow)
    }

    fn resolve_regular_file(&self, path: &str, follow: bool) -> FsResult<Arc<crate::regular_file::RegularFile>> {
        let parsed = self.view.parse(path)?;
        let arena = self.store.arena.read().expect("store arena lock poisoned");
        let file = self.view.lookup_ctx(&arena).resolve(&parsed, self.view.working_directory(), follow)?.into_file(path)?;
        Ok(arena.get(file)?.as_regular()?.clone())
    }

    pub fn open_channel(&self, path: &str, options: OpenOptions, explicit_attrs: &[(String, String, AttributeValue)]) -> FsResult<Arc<FileChannel>> {
        self.check_open()?;
        self.store.features.require(crate::options::Feature::FileChannel)?;
        let file_id = self.view.get_or_create_regular_file(path, options, explicit_attrs)?;
        let file = self.store.arena.read().expect("store arena lock poisoned").get(file_id)?.as_regular()?.clone();
        FileChannel::open(file, options, self.store.clock.clone(), self.state.clone())
    }

    /// Opens a channel and wraps it for async callers (spec §4.G.1);
    /// requires `FILE_CHANNEL` the same as [`Self::open_channel`].
    pub fn open_async_channel(&self, path: &str, options: OpenOptions, explicit_attrs: &[(String, String, AttributeValue)]) -> FsResult<AsyncFileChannel> {
        Ok(AsyncFileChannel::new(self.open_channel(path, options, explicit_attrs)?))
    }

    pub fn open_input_stream(&self, path: &str) -> FsResult<FileInputStream> {
        self.check_open()?;
        let file = self.resolve_regular_file(path, true)?;
        Ok(FileInputStream::new(file, self.store.clock.clone()))
    }

    pub fn open_output_stream(&self, path: &str, append: bool, explicit_attrs: &[(String, String, AttributeValue)]) -> FsResult<FileOutputStream> {
        self.check_open()?;
        let mut options = OpenOptions::write().with_create();
        if append {
            options = options.with_append();
        }
        let file_id = self.view.get_or_create_regular_file(path, options, explicit_attrs)?;
        let file = self.store.arena.read().expect("store arena lock poisoned").get(file_id)?.as_regular()?.clone();
        Ok(FileOutputStream::new(file, self.store.clock.clone(), append))
    }

    pub fn read_directory(&self, path: &str) -> FsResult<Vec<String>> {
        self.check_open()?;
        let parsed = self.view.parse(path)?;
        let arena = self.store.arena.read().expect("store arena lock poisoned");
        let dir_id = self.view.lookup_ctx(&arena).resolve(&parsed, self.view.working_directory(), true)?.into_file(path)?;
        Ok(arena.get(dir_id)?.as_directory()?.snapshot().into_iter().map(|e| e.name.display().to_string()).collect())
    }

    /// Opens a [`DirectoryStream`] pinned to the resolved directory inode,
    /// immune to a concurrent rename of the directory itself (spec §4.F
    /// "Secure directory streams", requires `SECURE_DIRECTORY_STREAM`).
    pub fn open_directory_stream(&self, path: &str) -> FsResult<DirectoryStream> {
        self.check_open()?;
        self.store.features.require(crate::options::Feature::SecureDirectoryStream)?;
        let parsed = self.view.parse(path)?;
        let arena = self.store.arena.read().expect("store arena lock poisoned");
        let dir_id = self.view.lookup_ctx(&arena).resolve(&parsed, self.view.working_directory(), true)?.into_file(path)?;
        let names = arena.get(dir_id)?.as_directory()?.snapshot().into_iter().map(|e| e.name.display().to_string()).collect();
        Ok(DirectoryStream { names })
    }

    pub fn parse_path(&self, raw: &str) -> FsResult<ParsedPath> {
        self.view.parse(raw)
    }

    pub fn normalize_path(&self, raw: &str) -> FsResult<ParsedPath> {
        Ok(crate::path::normalize(&self.view.parse(raw)?))
    }

    pub fn resolve_path(&self, base: &str, relative: &str) -> FsResult<ParsedPath> {
        let base = self.view.parse(base)?;
        let other = self.view.parse(relative)?;
        Ok(crate::path::normalize(&crate::path::join(&base, &other)))
    }

    pub fn relativize_path(&self, base: &str, target: &str) -> FsResult<ParsedPath> {
        crate::path::relativize(&self.view.parse(base)?, &self.view.parse(target)?)
    }

    /// Registers a watch on the directory at `path` for the given event
    /// kinds (spec §4.I `register`).
    pub fn register_watch(&self, path: &str, kinds: Vec<EventKind>) -> FsResult<WatchKey> {
        self.check_open()?;
        let parsed = self.view.parse(path)?;
        let dir_id = {
            let arena = self.store.arena.read().expect("store arena lock poisoned");
            match self.view.lookup_ctx(&arena).resolve(&parsed, self.view.working_directory(), true)? {
                Resolution::Found { file, .. } if arena.get(file)?.is_directory() => file,
                Resolution::Found { .. } => return Err(FsError::NotDirectory(path.into())),
                Resolution::Missing { .. } => return Err(FsError::NoSuchFile(path.into())),
            }
        };
        self.watch_service.register(dir_id, kinds)
    }

    /// Forces one watch-service poll tick immediately rather than waiting
    /// for the background poller's interval, so tests can observe events
    /// deterministically (spec §5 "Time source" applies the same rationale
    /// to polling as it does to timestamps).
    pub fn poll_watches_now(&self) {
        self.watch_service.poll_tick();
    }
}
