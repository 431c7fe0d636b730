//! `Store` and `FileSystemView`: the transactional mutation layer (spec
//! §4.F) sitting directly on top of the inode arena and directory tables.
//!
//! One `Store` is shared by every view opened against the same filesystem
//! instance; a `FileSystemView` is a cheap, cloneable handle pairing a
//! `Store` with one working directory, mirroring the "root view" vs.
//! "relative view" distinction in §4.F.

mod attrs;
mod copy;
mod create;
mod delete;
mod link;

pub use copy::NodeKind;
pub use create::CreateKind;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockWriteGuard};

use crate::arena::{FileArena, FileId};
use crate::attribute::AttributeService;
use crate::config::{FileSystemConfig, PathType};
use crate::disk::HeapDisk;
use crate::error::FsResult;
use crate::lookup::LookupContext;
use crate::name::NormalizationList;
use crate::options::SupportedFeatures;
use crate::path::{self, ParsedPath};
use crate::time::FileTimeSource;

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

/// Everything a `FileSystemView` needs that doesn't vary per working
/// directory: the arena itself, the root table, the attribute registry, and
/// the configuration values lookup and name construction depend on.
pub struct Store {
    id: u64,
    pub(crate) arena: RwLock<FileArena>,
    pub(crate) disk: Arc<HeapDisk>,
    pub(crate) attributes: AttributeService,
    pub(crate) roots: BTreeMap<String, FileId>,
    pub(crate) clock: Arc<dyn FileTimeSource>,
    pub(crate) path_type: PathType,
    pub(crate) display_norm: NormalizationList,
    pub(crate) canonical_norm: NormalizationList,
    pub(crate) features: SupportedFeatures,
    pub(crate) default_attribute_values: BTreeMap<String, String>,
}

impl Store {
    pub fn new(
        config: &FileSystemConfig,
        arena: FileArena,
        roots: BTreeMap<String, FileId>,
        disk: Arc<HeapDisk>,
        clock: Arc<dyn FileTimeSource>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: NEXT_STORE_ID.fetch_add(1, Ordering::SeqCst),
            arena: RwLock::new(arena),
            disk,
            attributes: AttributeService::new(&config.attribute_views),
            roots,
            clock,
            path_type: config.path_type,
            display_norm: config.name_display_normalization.clone(),
            canonical_norm: config.name_canonical_normalization.clone(),
            features: config.supported_features.clone(),
            default_attribute_values: config.default_attribute_values.clone(),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn same_store(a: &Store, b: &Store) -> bool {
        a.id == b.id
    }

    pub fn root_ids(&self) -> impl Iterator<Item = &FileId> {
        self.roots.values()
    }

    fn parse(&self, raw: &str) -> FsResult<ParsedPath> {
        path::parse(self.path_type, raw)
    }
}

/// A handle pairing a `Store` with one working directory (spec §4.F "view").
/// Cloning a view is cheap: it shares the underlying `Store` through its
/// `Arc` and only copies the working-directory id.
#[derive(Clone)]
pub struct FileSystemView {
    store: Arc<Store>,
    working_directory: FileId,
}

impl FileSystemView {
    pub fn new(store: Arc<Store>, working_directory: FileId) -> Self {
        Self { store, working_directory }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn working_directory(&self) -> FileId {
        self.working_directory
    }

    pub fn with_working_directory(&self, working_directory: FileId) -> Self {
        Self { store: self.store.clone(), working_directory }
    }

    pub(crate) fn parse(&self, raw: &str) -> FsResult<ParsedPath> {
        self.store.parse(raw)
    }

    /// Builds a [`LookupContext`] borrowing `arena`, which the caller holds
    /// locked for the duration of the resolve (and usually the mutation
    /// that follows it).
    pub(crate) fn lookup_ctx<'a>(&'a self, arena: &'a FileArena) -> LookupContext<'a> {
        LookupContext {
            arena,
            roots: &self.store.roots,
            path_type: self.store.path_type,
            display_norm: &self.store.display_norm,
            canonical_norm: &self.store.canonical_norm,
        }
    }
}

/// Locks both stores' arenas for a cross-store operation using the
/// try-lock-backoff protocol from spec §9 open question 3: lock the first
/// store, try the second; on failure release the first, block on the
/// second, then try the first again. Repeats until both are held, so two
/// concurrent cross-store operations moving in opposite directions can
/// never deadlock against each other.
pub(crate) fn lock_both<'a>(first: &'a Store, second: &'a Store) -> (RwLockWriteGuard<'a, FileArena>, RwLockWriteGuard<'a, FileArena>) {
    loop {
        let first_guard = first.arena.write().expect("store arena lock poisoned");
        match second.arena.try_write() {
            Ok(second_guard) => return (first_guard, second_guard),
            Err(_) => {
                drop(first_guard);
                let second_guard = second.arena.write().expect("store arena lock poisoned");
                match first.arena.try_write() {
                    Ok(first_guard) => return (first_guard, second_guard),
                    Err(_) => {
                        drop(second_guard);
                        continue;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn test_store() -> (Arc<Store>, FileId) {
    use crate::name::Name;
    use crate::time::SystemClock;

    let config = FileSystemConfig::unix();
    let mut arena = FileArena::new();
    let root = arena.create_directory(&SystemClock);
    arena.get_mut(root).unwrap().as_directory_mut().unwrap().link_into_parent(root, Name::self_name());
    let roots: BTreeMap<String, FileId> = [("/".to_string(), root)].into_iter().collect();
    let disk = Arc::new(HeapDisk::new(config.block_size, config.max_size, config.max_cache_size));
    let store = Store::new(&config, arena, roots, disk, Arc::new(SystemClock));
    (store, root)
}
