//! `Directory`: a hash-bucketed table of directory entries (spec §4.C,
//! §3 "Inode variants").
//!
//! The bucket array doubles when the load factor exceeds 0.75, mirroring a
//! textbook separate-chaining hash table; user-visible ordering never
//! depends on bucket layout because [`Directory::snapshot`] always sorts by
//! display name.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::arena::FileId;
use crate::error::{FsError, FsResult};
use crate::name::{self, Name};

const INITIAL_CAPACITY: usize = 16;
const LOAD_FACTOR: f64 = 0.75;

/// One `name -> inode` binding inside a directory.
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    pub name: Name,
    pub file: FileId,
}

/// A directory's entry table plus the back-pointer used to find its own
/// name in its parent once it has been linked somewhere (spec's
/// `entryInParent`).
pub struct Directory {
    buckets: Vec<Vec<DirectoryEntry>>,
    count: usize,
    /// `(parent, name this directory is known by in that parent)`, set by
    /// [`Directory::link_into_parent`]. Root directories point at
    /// themselves.
    entry_in_parent: Option<(FileId, Name)>,
}

impl Directory {
    /// A freshly created, unlinked directory: just the `SELF` entry.
    pub fn new(id: FileId) -> Self {
        let mut dir = Directory {
            buckets: (0..INITIAL_CAPACITY).map(|_| Vec::new()).collect(),
            count: 0,
            entry_in_parent: None,
        };
        dir.insert_unchecked(Name::self_name(), id);
        dir
    }

    pub fn len(&self) -> usize {
        self.count
    }

    /// `entry_count == 2`: `SELF` plus a linked `PARENT`.
    pub fn is_empty(&self) -> bool {
        self.count <= 2
    }

    pub fn entry_in_parent(&self) -> Option<&(FileId, Name)> {
        self.entry_in_parent.as_ref()
    }

    pub fn get(&self, name: &Name) -> Option<FileId> {
        let bucket = self.bucket_for(name);
        bucket.iter().find(|e| &e.name == name).map(|e| e.file)
    }

    /// Inserts `name -> file`. Refuses the reserved names and duplicates
    /// (spec §4.C "Link").
    pub fn link(&mut self, name: Name, file: FileId) -> FsResult<()> {
        if name.is_reserved() {
            return Err(FsError::InvalidArgument("SELF/PARENT cannot be linked by name"));
        }
        if self.get(&name).is_some() {
            return Err(FsError::FileAlreadyExists(name.display().into()));
        }
        self.insert_unchecked(name, file);
        self.maybe_grow();
        Ok(())
    }

    /// Removes `name`, returning the inode it was bound to. Refuses the
    /// reserved names (spec §4.C "Unlink").
    pub fn unlink(&mut self, name: &Name) -> FsResult<FileId> {
        if name.is_reserved() {
            return Err(FsError::InvalidArgument("SELF/PARENT cannot be unlinked by name"));
        }
        let index = bucket_index(name, self.buckets.len());
        let bucket = &mut self.buckets[index];
        let position = bucket.iter().position(|e| &e.name == name).ok_or_else(|| FsError::NoSuchFile(name.display().into()))?;
        let entry = bucket.remove(position);
        self.count -= 1;
        Ok(entry.file)
    }

    /// Records that this directory now lives at `name` inside `parent`,
    /// installing/overwriting the synthetic `PARENT` entry without
    /// changing `entry_count` (spec §4.C "Link", invariant 2).
    pub fn link_into_parent(&mut self, parent: FileId, name_in_parent: Name) {
        self.overwrite_unchecked(Name::parent_name(), parent);
        self.entry_in_parent = Some((parent, name_in_parent));
    }

    /// Sorted (by display form), reserved-name-excluded listing (spec §4.C
    /// "Snapshot").
    pub fn snapshot(&self) -> Vec<DirectoryEntry> {
        let mut entries: Vec<DirectoryEntry> = self
            .buckets
            .iter()
            .flatten()
            .filter(|e| !e.name.is_reserved())
            .cloned()
            .collect();
        entries.sort_by(|a, b| name::by_display(&a.name, &b.name));
        entries
    }

    fn bucket_for(&self, name: &Name) -> &Vec<DirectoryEntry> {
        &self.buckets[bucket_index(name, self.buckets.len())]
    }

    fn insert_unchecked(&mut self, name: Name, file: FileId) {
        let index = bucket_index(&name, self.buckets.len());
        self.buckets[index].insert(0, DirectoryEntry { name, file });
        self.count += 1;
    }

    /// Replaces an existing binding for `name`, or inserts it fresh if
    /// absent, without touching `count` when it was already present.
    fn overwrite_unchecked(&mut self, name: Name, file: FileId) {
        let index = bucket_index(&name, self.buckets.len());
        if let Some(existing) = self.buckets[index].iter_mut().find(|e| e.name == name) {
            existing.file = file;
            return;
        }
        self.buckets[index].insert(0, DirectoryEntry { name, file });
        self.count += 1;
    }

    fn maybe_grow(&mut self) {
        if self.count as f64 <= self.buckets.len() as f64 * LOAD_FACTOR {
            return;
        }
        let new_capacity = self.buckets.len() * 2;
        let mut new_buckets: Vec<Vec<DirectoryEntry>> = (0..new_capacity).map(|_| Vec::new()).collect();
        for entry in self.buckets.drain(..).flatten() {
            let index = bucket_index(&entry.name, new_capacity);
            new_buckets[index].push(entry);
        }
        self.buckets = new_buckets;
    }
}

fn bucket_index(name: &Name, capacity: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    name.hash(&mut hasher);
    (hasher.finish() as usize) & (capacity - 1)
}
