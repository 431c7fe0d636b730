//! `link`, `read_symbolic_link`, `check_access` (spec §4.F "Hard links").

use crate::arena::FileId;
use crate::error::{FsError, FsResult};
use crate::lookup::Resolution;
use crate::options::Feature;

use super::{FileSystemView, Store};

impl FileSystemView {
    /// Binds `link_path` to the same inode as `existing_path` (resolved
    /// through `existing_view`, which must belong to the same store). Only
    /// regular files may be hard-linked (spec §4.F invariant: "links always
    /// target a regular file").
    pub fn link(&self, link_path: &str, existing_view: &FileSystemView, existing_path: &str) -> FsResult<FileId> {
        self.store().features.require(Feature::Links)?;
        if !Store::same_store(self.store(), existing_view.store()) {
            return Err(FsError::ProviderMismatch);
        }

        let existing_parsed = existing_view.parse(existing_path)?;
        let link_parsed = self.parse(link_path)?;

        let mut arena = self.store().arena.write().expect("store arena lock poisoned");

        let existing_id = match self.lookup_ctx(&arena).resolve(&existing_parsed, existing_view.working_directory(), true)? {
            Resolution::Found { file, .. } => file,
            Resolution::Missing { .. } => return Err(FsError::NoSuchFile(existing_path.into())),
        };
        if !arena.get(existing_id)?.is_regular() {
            return Err(FsError::NotRegularFile(existing_path.into()));
        }

        let (parent, name) = match self.lookup_ctx(&arena).resolve(&link_parsed, self.working_directory(), false)? {
            Resolution::Found { .. } => return Err(FsError::FileAlreadyExists(link_path.into())),
            Resolution::Missing { parent, name } => (parent, name),
        };

        arena.get_mut(parent)?.as_directory_mut()?.link(name.clone(), existing_id)?;
        arena.linked(existing_id, parent, name)?;
        let clock = self.store().clock.clone();
        arena.get_mut(parent)?.touch_modified(clock.as_ref());
        Ok(existing_id)
    }

    pub fn read_symbolic_link(&self, raw_path: &str) -> FsResult<String> {
        let parsed = self.parse(raw_path)?;
        let arena = self.store().arena.read().expect("store arena lock poisoned");
        let file = match self.lookup_ctx(&arena).resolve(&parsed, self.working_directory(), false)? {
            Resolution::Found { file, .. } => file,
            Resolution::Missing { .. } => return Err(FsError::NoSuchFile(raw_path.into())),
        };
        Ok(arena.get(file)?.as_symlink()?.target().to_string())
    }

    /// Existence-only check: this crate enforces no access-control model
    /// (spec §1 Non-goals "permission enforcement"), so `check_access`
    /// succeeds exactly when `raw_path` resolves to something.
    pub fn check_access(&self, raw_path: &str) -> FsResult<()> {
        let parsed = self.parse(raw_path)?;
        let arena = self.store().arena.read().expect("store arena lock poisoned");
        self.lookup_ctx(&arena).resolve(&parsed, self.working_directory(), true)?.into_file(raw_path).map(|_| ())
    }
}
