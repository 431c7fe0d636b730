//! `copy`/`move` (spec §4.F "Copy and move"), including the cross-store
//! variant that uses the try-lock-backoff protocol from §9 open question 3.

use std::sync::Arc;

use crate::arena::{FileArena, FileId};
use crate::attribute::AttributeService;
use crate::disk::HeapDisk;
use crate::error::{FsError, FsResult};
use crate::lookup::Resolution;
use crate::name::Name;
use crate::options::CopyOptions;
use crate::regular_file::RegularFile;
use crate::time::FileTimeSource;

use super::{lock_both, FileSystemView, Store};

/// The source inode's kind, captured before the destination side is
/// touched so the right kind of inode gets created on the other side of a
/// cross-store copy.
pub enum NodeKind {
    Directory,
    Regular,
    Symlink(String),
}

impl FileSystemView {
    /// Copies (or, if `is_move`, moves) `source_path` onto `dest_path` in
    /// `dest_view`, dispatching to the same-store or cross-store path
    /// depending on whether the two views share a `Store`.
    pub fn copy(&self, source_path: &str, dest_view: &FileSystemView, dest_path: &str, options: CopyOptions, is_move: bool) -> FsResult<()> {
        options.validate(is_move)?;
        if Store::same_store(self.store(), dest_view.store()) {
            self.copy_same_store(source_path, dest_path, options, is_move)
        } else {
            self.copy_cross_store(source_path, dest_view, dest_path, options, is_move)
        }
    }

    fn copy_same_store(&self, source_path: &str, dest_path: &str, options: CopyOptions, is_move: bool) -> FsResult<()> {
        let source_parsed = self.parse(source_path)?;
        let dest_parsed = self.parse(dest_path)?;

        let mut arena = self.store().arena.write().expect("store arena lock poisoned");

        let (source_parent, source_name, source_id) = match self.lookup_ctx(&arena).resolve(&source_parsed, self.working_directory(), false)? {
            Resolution::Found { parent, name, file } => (parent, name, file),
            Resolution::Missing { .. } => return Err(FsError::NoSuchFile(source_path.into())),
        };

        let (dest_parent, dest_name, existing) = match self.lookup_ctx(&arena).resolve(&dest_parsed, self.working_directory(), false)? {
            Resolution::Found { parent, name, file } => (parent, name, Some(file)),
            Resolution::Missing { parent, name } => (parent, name, None),
        };

        if is_move && is_within(&arena, source_id, dest_parent)? {
            return Err(FsError::InvalidArgument("cannot move a directory into its own subtree"));
        }

        if let Some(existing_id) = existing {
            if existing_id == source_id {
                return Ok(());
            }
            if !options.replace_existing {
                return Err(FsError::FileAlreadyExists(dest_path.into()));
            }
            delete_existing(&mut arena, dest_parent, dest_name.clone(), existing_id, self.store().clock.as_ref())?;
        }

        let clock = self.store().clock.clone();
        if is_move {
            arena.get_mut(source_parent)?.as_directory_mut()?.unlink(&source_name)?;
            arena.unlinked(source_id)?;
            arena.get_mut(dest_parent)?.as_directory_mut()?.link(dest_name.clone(), source_id)?;
            arena.linked(source_id, dest_parent, dest_name)?;
            arena.get_mut(source_parent)?.touch_modified(clock.as_ref());
        } else {
            let (new_id, content_copy) = clone_metadata_within(&mut arena, source_id, self.store().disk.clone(), options, clock.clone())?;
            arena.get_mut(dest_parent)?.as_directory_mut()?.link(dest_name.clone(), new_id)?;
            arena.linked(new_id, dest_parent, dest_name)?;
            arena.get_mut(dest_parent)?.touch_modified(clock.as_ref());
            drop(arena);
            if let Some((source, dest)) = content_copy {
                source.copy_content_to(&dest)?;
            }
            return Ok(());
        }
        arena.get_mut(dest_parent)?.touch_modified(clock.as_ref());
        Ok(())
    }

    fn copy_cross_store(&self, source_path: &str, dest_view: &FileSystemView, dest_path: &str, options: CopyOptions, is_move: bool) -> FsResult<()> {
        let source_parsed = self.parse(source_path)?;
        let dest_parsed = dest_view.parse(dest_path)?;

        let (mut source_arena, mut dest_arena) = lock_both(self.store(), dest_view.store());

        let (source_parent, source_name, source_id) = match self.lookup_ctx(&source_arena).resolve(&source_parsed, self.working_directory(), false)? {
            Resolution::Found { parent, name, file } => (parent, name, file),
            Resolution::Missing { .. } => return Err(FsError::NoSuchFile(source_path.into())),
        };

        let (dest_parent, dest_name, existing) = match dest_view.lookup_ctx(&dest_arena).resolve(&dest_parsed, dest_view.working_directory(), false)? {
            Resolution::Found { parent, name, file } => (parent, name, Some(file)),
            Resolution::Missing { parent, name } => (parent, name, None),
        };

        if let Some(existing_id) = existing {
            if !options.replace_existing {
                return Err(FsError::FileAlreadyExists(dest_path.into()));
            }
            delete_existing(&mut dest_arena, dest_parent, dest_name.clone(), existing_id, dest_view.store().clock.as_ref())?;
        }

        let (new_id, content_copy) =
            clone_metadata_across(&source_arena, source_id, &mut dest_arena, dest_view.store().disk.clone(), &dest_view.store().attributes, options, dest_view.store().clock.as_ref())?;
        dest_arena.get_mut(dest_parent)?.as_directory_mut()?.link(dest_name.clone(), new_id)?;
        dest_arena.linked(new_id, dest_parent, dest_name)?;
        let dest_clock = dest_view.store().clock.clone();
        dest_arena.get_mut(dest_parent)?.touch_modified(dest_clock.as_ref());

        drop(source_arena);
        drop(dest_arena);

        if let Some((source, dest)) = content_copy {
            source.copy_content_to(&dest)?;
        }

        if is_move {
            let mut source_arena = self.store().arena.write().expect("store arena lock poisoned");
            source_arena.get_mut(source_parent)?.as_directory_mut()?.unlink(&source_name)?;
            source_arena.unlinked(source_id)?;
            source_arena.reclaim_if_unreachable(source_id)?;
            let source_clock = self.store().clock.clone();
            source_arena.get_mut(source_parent)?.touch_modified(source_clock.as_ref());
        }
        Ok(())
    }
}

/// Creates a fresh inode in the same arena with `source_id`'s kind and
/// (optionally) attributes, without linking it anywhere yet. `disk` is the
/// store's shared block pool, needed to back a new regular file's content.
///
/// For a regular file, the content itself is not copied here: the pair of
/// `Arc<RegularFile>` handles is returned instead so the caller can copy the
/// bytes after releasing the store lock (spec §4.F).
fn clone_metadata_within(
    arena: &mut FileArena,
    source_id: FileId,
    disk: Arc<HeapDisk>,
    options: CopyOptions,
    clock: Arc<dyn FileTimeSource>,
) -> FsResult<(FileId, Option<(Arc<RegularFile>, Arc<RegularFile>)>)> {
    let kind = node_kind(arena, source_id)?;
    let new_id = match &kind {
        NodeKind::Directory => arena.create_directory(clock.as_ref()),
        NodeKind::Regular => arena.create_regular(disk, clock.as_ref()),
        NodeKind::Symlink(target) => arena.create_symlink(target.clone(), clock.as_ref()),
    };

    if options.copy_attributes {
        let attributes_clone = arena.get(source_id)?.attributes.clone();
        arena.get_mut(new_id)?.attributes = attributes_clone;
    }

    let content_copy = if let NodeKind::Regular = kind {
        let source = arena.get(source_id)?.as_regular()?.clone();
        let dest = arena.get(new_id)?.as_regular()?.clone();
        Some((source, dest))
    } else {
        None
    };
    Ok((new_id, content_copy))
}

/// Same as [`clone_metadata_within`] but across two distinct arenas, used
/// by the cross-store copy/move path. `dest_disk` backs the new inode's
/// content (always the destination store's disk, never the source's). As
/// with [`clone_metadata_within`], content is not copied here; the caller
/// copies it once both store locks have been released.
fn clone_metadata_across(
    source_arena: &FileArena,
    source_id: FileId,
    dest_arena: &mut FileArena,
    dest_disk: Arc<HeapDisk>,
    _attributes: &AttributeService,
    options: CopyOptions,
    clock: &dyn FileTimeSource,
) -> FsResult<(FileId, Option<(Arc<RegularFile>, Arc<RegularFile>)>)> {
    let source_node = source_arena.get(source_id)?;
    let new_id = match source_node.data() {
        crate::arena::FileData::Directory(_) => dest_arena.create_directory(clock),
        crate::arena::FileData::Regular(_) => dest_arena.create_regular(dest_disk, clock),
        crate::arena::FileData::Symlink(link) => dest_arena.create_symlink(link.target().to_string(), clock),
    };

    if options.copy_attributes {
        let attributes_clone = source_node.attributes.clone();
        dest_arena.get_mut(new_id)?.attributes = attributes_clone;
    }

    let content_copy = if let crate::arena::FileData::Regular(source_file) = source_node.data() {
        let dest_file = dest_arena.get(new_id)?.as_regular()?.clone();
        Some((source_file.clone(), dest_file))
    } else {
        None
    };
    Ok((new_id, content_copy))
}

fn node_kind(arena: &FileArena, id: FileId) -> FsResult<NodeKind> {
    let node = arena.get(id)?;
    Ok(match node.data() {
        crate::arena::FileData::Directory(_) => NodeKind::Directory,
        crate::arena::FileData::Regular(_) => NodeKind::Regular,
        crate::arena::FileData::Symlink(link) => NodeKind::Symlink(link.target().to_string()),
    })
}

/// Walks `node`'s `entryInParent` chain upward looking for `ancestor`,
/// stopping once a directory reports itself as its own parent (a
/// filesystem root).
fn is_within(arena: &FileArena, ancestor: FileId, node: FileId) -> FsResult<bool> {
    let mut current = node;
    loop {
        if current == ancestor {
            return Ok(true);
        }
        let dir = match arena.get(current)?.as_directory() {
            Ok(dir) => dir,
            Err(_) => return Ok(false),
        };
        match dir.entry_in_parent() {
            Some((parent, _)) if *parent != current => current = *parent,
            _ => return Ok(false),
        }
    }
}

fn delete_existing(arena: &mut FileArena, parent: FileId, name: Name, existing: FileId, clock: &dyn FileTimeSource) -> FsResult<()> {
    if arena.get(existing)?.is_directory() && !arena.get(existing)?.as_directory()?.is_empty() {
        return Err(FsError::DirectoryNotEmpty(name.display().into()));
    }
    arena.get_mut(parent)?.as_directory_mut()?.unlink(&name)?;
    arena.unlinked(existing)?;
    arena.reclaim_if_unreachable(existing)?;
    arena.get_mut(parent)?.touch_modified(clock);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OpenOptions;
    use crate::view::test_store;
    use crate::view::FileSystemView;

    #[test]
    fn copy_same_store_duplicates_content() {
        let (store, root) = test_store();
        let view = FileSystemView::new(store, root);
        let file = view.get_or_create_regular_file("/a.txt", OpenOptions::write().with_create(), &[]).unwrap();
        {
            let arena = view.store().arena.read().unwrap();
            let regular = arena.get(file).unwrap().as_regular().unwrap().clone();
            regular.write_at(0, b"payload", view.store().clock.as_ref()).unwrap();
        }
        view.copy("/a.txt", &view, "/b.txt", CopyOptions::default(), false).unwrap();
        let arena = view.store().arena.read().unwrap();
        let b = view.lookup_ctx(&arena).resolve(&crate::path::parse(crate::config::PathType::Unix, "/b.txt").unwrap(), root, false).unwrap().into_file("/b.txt").unwrap();
        assert_ne!(b, file);
        assert_eq!(arena.get(b).unwrap().as_regular().unwrap().size(), 7);
    }

    #[test]
    fn move_within_own_subtree_is_rejected() {
        let (store, root) = test_store();
        let view = FileSystemView::new(store, root);
        view.create_directory("/sub", &[]).unwrap();
        let result = view.copy("/sub", &view, "/sub/inner", CopyOptions::default(), true);
        assert!(matches!(result, Err(FsError::InvalidArgument(_))));
    }

    #[test]
    fn move_renames_without_copying_content() {
        let (store, root) = test_store();
        let view = FileSystemView::new(store, root);
        let file = view.get_or_create_regular_file("/a.txt", OpenOptions::write().with_create(), &[]).unwrap();
        view.copy("/a.txt", &view, "/b.txt", CopyOptions::default(), true).unwrap();
        let arena = view.store().arena.read().unwrap();
        let b = view.lookup_ctx(&arena).resolve(&crate::path::parse(crate::config::PathType::Unix, "/b.txt").unwrap(), root, false).unwrap().into_file("/b.txt").unwrap();
        assert_eq!(b, file);
    }

    #[test]
    fn cross_store_copy_duplicates_into_the_other_filesystem() {
        let (store_a, root_a) = test_store();
        let (store_b, root_b) = test_store();
        let view_a = FileSystemView::new(store_a, root_a);
        let view_b = FileSystemView::new(store_b, root_b);
        let file = view_a.get_or_create_regular_file("/a.txt", OpenOptions::write().with_create(), &[]).unwrap();
        {
            let arena = view_a.store().arena.read().unwrap();
            let regular = arena.get(file).unwrap().as_regular().unwrap().clone();
            regular.write_at(0, b"cross-store", view_a.store().clock.as_ref()).unwrap();
        }
        view_a.copy("/a.txt", &view_b, "/a.txt", CopyOptions::default(), false).unwrap();
        let arena_b = view_b.store().arena.read().unwrap();
        let copied = view_b.lookup_ctx(&arena_b).resolve(&crate::path::parse(crate::config::PathType::Unix, "/a.txt").unwrap(), root_b, false).unwrap().into_file("/a.txt").unwrap();
        assert_eq!(arena_b.get(copied).unwrap().as_regular().unwrap().size(), 11);
    }
}
