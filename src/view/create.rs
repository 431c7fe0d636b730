//! `create_*`/`get_or_create_regular_file` (spec §4.F "createFile").

use crate::arena::FileId;
use crate::attribute::AttributeValue;
use crate::error::{FsError, FsResult};
use crate::lookup::Resolution;
use crate::options::{Feature, OpenOptions};

use super::FileSystemView;

/// Which inode kind [`FileSystemView::create_file`] should instantiate.
pub enum CreateKind {
    Directory,
    Regular,
    Symlink(String),
}

impl FileSystemView {
    /// Creates one new inode at `path` and links it into its parent
    /// directory. `fail_if_exists` selects between the "must not already
    /// exist" and "return the existing inode" variants (spec §4.F "Link
    /// semantics").
    pub fn create_file(
        &self,
        raw_path: &str,
        kind: CreateKind,
        fail_if_exists: bool,
        explicit_attrs: &[(String, String, AttributeValue)],
    ) -> FsResult<FileId> {
        let parsed = self.parse(raw_path)?;
        let mut arena = self.store().arena.write().expect("store arena lock poisoned");
        let resolution = self.lookup_ctx(&arena).resolve(&parsed, self.working_directory(), false)?;

        let (parent, name) = match resolution {
            Resolution::Found { file, .. } if !fail_if_exists => return Ok(file),
            Resolution::Found { .. } => return Err(FsError::FileAlreadyExists(raw_path.into())),
            Resolution::Missing { parent, name } => (parent, name),
        };

        let new_id = match &kind {
            CreateKind::Directory => arena.create_directory(self.store().clock.as_ref()),
            CreateKind::Regular => arena.create_regular(self.store().disk.clone(), self.store().clock.as_ref()),
            CreateKind::Symlink(target) => arena.create_symlink(target.clone(), self.store().clock.as_ref()),
        };

        self.store().attributes.apply_creation_attributes(arena.get_mut(new_id)?, &self.store().default_attribute_values, explicit_attrs)?;

        arena.get_mut(parent)?.as_directory_mut()?.link(name.clone(), new_id)?;
        arena.linked(new_id, parent, name)?;
        let clock = self.store().clock.clone();
        arena.get_mut(parent)?.touch_modified(clock.as_ref());

        Ok(new_id)
    }

    pub fn create_directory(&self, raw_path: &str, explicit_attrs: &[(String, String, AttributeValue)]) -> FsResult<FileId> {
        self.create_file(raw_path, CreateKind::Directory, true, explicit_attrs)
    }

    pub fn create_symbolic_link(&self, raw_path: &str, target: String, explicit_attrs: &[(String, String, AttributeValue)]) -> FsResult<FileId> {
        self.store().features.require(Feature::SymbolicLinks)?;
        self.create_file(raw_path, CreateKind::Symlink(target), true, explicit_attrs)
    }

    /// Opens (or, per `options`, creates) the regular file at `raw_path`,
    /// returning its id. Handles `CREATE`, `CREATE_NEW`, and
    /// `TRUNCATE_EXISTING` (spec §4.F, §6.4).
    pub fn get_or_create_regular_file(
        &self,
        raw_path: &str,
        options: OpenOptions,
        explicit_attrs: &[(String, String, AttributeValue)],
    ) -> FsResult<FileId> {
        options.validate()?;

        let existing = if !options.create_new {
            let parsed = self.parse(raw_path)?;
            let arena = self.store().arena.read().expect("store arena lock poisoned");
            match self.lookup_ctx(&arena).resolve(&parsed, self.working_directory(), !options.nofollow_links)? {
                Resolution::Found { file, .. } => Some(file),
                Resolution::Missing { .. } => None,
            }
        } else {
            None
        };

        let file_id = match existing {
            Some(id) => id,
            None if options.create => self.create_file(raw_path, CreateKind::Regular, options.create_new, explicit_attrs)?,
            None => return Err(FsError::NoSuchFile(raw_path.into())),
        };

        if options.write && options.truncate_existing {
            let arena = self.store().arena.read().expect("store arena lock poisoned");
            let regular = arena.get(file_id)?.as_regular()?.clone();
            drop(arena);
            regular.truncate(0, self.store().clock.as_ref());
        }

        Ok(file_id)
    }
}
