//! The inode arena (spec §9 "Cyclic ownership").
//!
//! Directory entries, symlink targets, and cross-references all go through
//! an `id`-keyed [`FileId`] instead of owning references, so the
//! directory/entry/file cycle described in §3 never has to be expressed as
//! an actual Rust reference cycle. The arena is reached only through the
//! filesystem's single store lock (spec §5 lock level 2); `RegularFile`
//! content is the one exception, reached directly through an `Arc` so
//! content I/O never needs that lock (spec §5 "Content I/O takes only the
//! file's content lock").

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::directory::Directory;
use crate::disk::HeapDisk;
use crate::error::{FsError, FsResult};
use crate::regular_file::RegularFile;
use crate::symlink::SymbolicLink;
use crate::time::{FileTime, FileTimeSource};

/// Opaque inode identifier, used both as the arena key and as the `basic:
/// fileKey` attribute (spec §3 "Identifiers").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(u64);

impl FileId {
    #[cfg(test)]
    pub(crate) fn from_raw(raw: u64) -> Self {
        FileId(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonically increasing id counter, the sole source of new [`FileId`]s
/// (spec §3 "Lifecycle", `FileFactory`).
#[derive(Debug, Default)]
pub struct FileFactory {
    next: AtomicU64,
}

impl FileFactory {
    pub fn new() -> Self {
        Self { next: AtomicU64::new(1) }
    }

    pub fn next_id(&self) -> FileId {
        FileId(self.next.fetch_add(1, Ordering::SeqCst))
    }
}

/// The tagged sum of inode kinds (spec §9 "Polymorphism across inode
/// kinds").
pub enum FileData {
    Directory(Directory),
    Regular(Arc<RegularFile>),
    Symlink(SymbolicLink),
}

/// One inode: the shared header plus kind-specific data.
///
/// `created`/`modified` live here for directories and symlinks, whose
/// metadata only ever changes under the store write lock; regular files
/// track their own timestamps on [`RegularFile`] instead (see its
/// doc-comment) since their content can be touched without that lock.
pub struct FileNode {
    id: FileId,
    link_count: u32,
    created: FileTime,
    modified: FileTime,
    pub attributes: crate::attribute::AttributeTable,
    data: FileData,
}

impl FileNode {
    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn link_count(&self) -> u32 {
        self.link_count
    }

    pub fn data(&self) -> &FileData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut FileData {
        &mut self.data
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.data, FileData::Directory(_))
    }

    pub fn is_regular(&self) -> bool {
        matches!(self.data, FileData::Regular(_))
    }

    pub fn is_symlink(&self) -> bool {
        matches!(self.data, FileData::Symlink(_))
    }

    pub fn as_directory(&self) -> FsResult<&Directory> {
        match &self.data {
            FileData::Directory(dir) => Ok(dir),
            _ => Err(FsError::NotDirectory(self.id.to_string().into())),
        }
    }

    pub fn as_directory_mut(&mut self) -> FsResult<&mut Directory> {
        match &mut self.data {
            FileData::Directory(dir) => Ok(dir),
            _ => Err(FsError::NotDirectory(self.id.to_string().into())),
        }
    }

    pub fn as_regular(&self) -> FsResult<&Arc<RegularFile>> {
        match &self.data {
            FileData::Regular(file) => Ok(file),
            _ => Err(FsError::NotRegularFile(self.id.to_string().into())),
        }
    }

    pub fn as_symlink(&self) -> FsResult<&SymbolicLink> {
        match &self.data {
            FileData::Symlink(link) => Ok(link),
            _ => Err(FsError::NotSymbolicLink(self.id.to_string().into())),
        }
    }

    pub fn created(&self) -> FileTime {
        match &self.data {
            FileData::Regular(file) => file.created(),
            _ => self.created,
        }
    }

    pub fn modified(&self) -> FileTime {
        match &self.data {
            FileData::Regular(file) => file.modified(),
            _ => self.modified,
        }
    }

    pub fn accessed(&self) -> FileTime {
        match &self.data {
            FileData::Regular(file) => file.accessed(),
            _ => self.modified,
        }
    }

    pub fn touch_modified(&mut self, clock: &dyn FileTimeSource) {
        match &self.data {
            FileData::Regular(file) => file.set_modified(clock.now()),
            _ => self.modified = clock.now(),
        }
    }

    /// Directory/symlink inodes track only `created`/`modified` (no
    /// separate access time); used by `basic:creationTime` sets.
    pub fn set_created_field(&mut self, value: FileTime) {
        self.created = value;
    }

    /// Used by `basic:lastModifiedTime`/`basic:lastAccessTime` sets on
    /// directories and symlinks, which fold both onto the one `modified`
    /// field they track.
    pub fn set_modified_field(&mut self, value: FileTime) {
        self.modified = value;
    }
}

/// The id-keyed inode store. Reached exclusively through the filesystem's
/// single store `RwLock` (spec §5 level 2), except for the `Arc<
/// RegularFile>` handles it hands out, which channels keep past the
/// lifetime of any lock acquisition.
pub struct FileArena {
    factory: FileFactory,
    nodes: HashMap<FileId, FileNode>,
}

impl FileArena {
    pub fn new() -> Self {
        Self { factory: FileFactory::new(), nodes: HashMap::new() }
    }

    pub fn create_directory(&mut self, clock: &dyn FileTimeSource) -> FileId {
        let id = self.factory.next_id();
        let now = clock.now();
        self.nodes.insert(
            id,
            FileNode {
                id,
                link_count: 0,
                created: now,
                modified: now,
                attributes: Default::default(),
                data: FileData::Directory(Directory::new(id)),
            },
        );
        id
    }

    pub fn create_regular(&mut self, disk: Arc<HeapDisk>, clock: &dyn FileTimeSource) -> FileId {
        let id = self.factory.next_id();
        let now = clock.now();
        self.nodes.insert(
            id,
            FileNode {
                id,
                link_count: 0,
                created: now,
                modified: now,
                attributes: Default::default(),
                data: FileData::Regular(Arc::new(RegularFile::new(disk, clock))),
            },
        );
        id
    }

    pub fn create_symlink(&mut self, target: String, clock: &dyn FileTimeSource) -> FileId {
        let id = self.factory.next_id();
        let now = clock.now();
        self.nodes.insert(
            id,
            FileNode {
                id,
                link_count: 0,
                created: now,
                modified: now,
                attributes: Default::default(),
                data: FileData::Symlink(SymbolicLink::new(target)),
            },
        );
        id
    }

    pub fn get(&self, id: FileId) -> FsResult<&FileNode> {
        self.nodes.get(&id).ok_or_else(|| FsError::Invariant("dangling file id in directory entry"))
    }

    pub fn get_mut(&mut self, id: FileId) -> FsResult<&mut FileNode> {
        self.nodes.get_mut(&id).ok_or_else(|| FsError::Invariant("dangling file id in directory entry"))
    }

    pub fn contains(&self, id: FileId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Called whenever a new name is bound to `id` (spec §3 "Lifecycle",
    /// `linked`). Bumps the link count; if `id` is a directory, additionally
    /// records its parent back-pointer and the synthetic `PARENT` entry.
    pub fn linked(&mut self, id: FileId, parent: FileId, name_in_parent: crate::name::Name) -> FsResult<()> {
        let is_directory = self.get(id)?.is_directory();
        let node = self.get_mut(id)?;
        node.link_count += 1;
        if is_directory {
            node.as_directory_mut()?.link_into_parent(parent, name_in_parent);
        }
        Ok(())
    }

    /// Called whenever a name bound to `id` is removed (spec §3
    /// "Lifecycle", `unlinked`). Decrements the link count; for a
    /// directory this accounts for the `PARENT` back-link by also
    /// decrementing the parent's link count by one.
    pub fn unlinked(&mut self, id: FileId) -> FsResult<Option<FileId>> {
        let (is_directory, parent) = {
            let node = self.get(id)?;
            (node.is_directory(), node.as_directory().ok().and_then(|d| d.entry_in_parent().map(|(p, _)| *p)))
        };
        let node = self.get_mut(id)?;
        node.link_count = node.link_count.saturating_sub(1);
        if is_directory {
            if let Some(parent_id) = parent {
                if parent_id != id {
                    let parent_node = self.get_mut(parent_id)?;
                    parent_node.link_count = parent_node.link_count.saturating_sub(1);
                }
                return Ok(Some(parent_id));
            }
        }
        Ok(None)
    }

    /// Reclaims `id`'s slot once it is both unreachable by name and has no
    /// open channels (spec §9 "arena slots are reclaimed when (link count =
    /// 0) ∧ (open count = 0)").
    pub fn reclaim_if_unreachable(&mut self, id: FileId) -> FsResult<()> {
        let reclaimable = {
            let node = self.get(id)?;
            if node.link_count() > 0 {
                false
            } else {
                match &node.data {
                    FileData::Regular(file) => {
                        file.mark_deleted();
                        file.open_count() == 0
                    }
                    _ => true,
                }
            }
        };
        if reclaimable {
            self.nodes.remove(&id);
        }
        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl Default for FileArena {
    fn default() -> Self {
        Self::new()
    }
}
