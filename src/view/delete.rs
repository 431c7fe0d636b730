//! `delete_file` (spec §4.F "Unlink").

use crate::error::{FsError, FsResult};
use crate::lookup::Resolution;
use crate::options::DeleteMode;

use super::FileSystemView;

impl FileSystemView {
    /// Removes the binding at `raw_path`. `mode` restricts the operation to
    /// non-directories, directories only, or either (spec §4.F
    /// `DeleteMode`). Rejects deleting a filesystem root outright, and
    /// rejects deleting the view's own working directory via a *relative*
    /// path while still allowing it via an absolute one.
    pub fn delete_file(&self, raw_path: &str, mode: DeleteMode) -> FsResult<()> {
        let parsed = self.parse(raw_path)?;
        let mut arena = self.store().arena.write().expect("store arena lock poisoned");

        let (parent, name, file) = match self.lookup_ctx(&arena).resolve(&parsed, self.working_directory(), false)? {
            Resolution::Found { parent, name, file } => (parent, name, file),
            Resolution::Missing { .. } => return Err(FsError::NoSuchFile(raw_path.into())),
        };

        if self.store().root_ids().any(|root| *root == file) {
            return Err(FsError::InvalidArgument("a filesystem root cannot be deleted"));
        }
        if !parsed.is_absolute() && file == self.working_directory() {
            return Err(FsError::InvalidArgument("a view's working directory cannot be deleted through a relative path"));
        }

        let is_directory = arena.get(file)?.is_directory();
        match mode {
            DeleteMode::Any => {}
            DeleteMode::NonDirectoryOnly if is_directory => return Err(FsError::NotRegularFile(raw_path.into())),
            DeleteMode::DirectoryOnly if !is_directory => return Err(FsError::NotDirectory(raw_path.into())),
            _ => {}
        }
        if is_directory && !arena.get(file)?.as_directory()?.is_empty() {
            return Err(FsError::DirectoryNotEmpty(raw_path.into()));
        }

        arena.get_mut(parent)?.as_directory_mut()?.unlink(&name)?;
        arena.unlinked(file)?;
        arena.reclaim_if_unreachable(file)?;
        let clock = self.store().clock.clone();
        arena.get_mut(parent)?.touch_modified(clock.as_ref());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OpenOptions;
    use crate::view::test_store;

    #[test]
    fn delete_removes_a_regular_file() {
        let (store, root) = test_store();
        let view = FileSystemView::new(store, root);
        view.get_or_create_regular_file("/a.txt", OpenOptions::write().with_create(), &[]).unwrap();
        view.delete_file("/a.txt", DeleteMode::Any).unwrap();
        assert!(matches!(view.check_access("/a.txt"), Err(FsError::NoSuchFile(_))));
    }

    #[test]
    fn delete_rejects_nonempty_directory() {
        let (store, root) = test_store();
        let view = FileSystemView::new(store, root);
        view.create_directory("/sub", &[]).unwrap();
        view.get_or_create_regular_file("/sub/a.txt", OpenOptions::write().with_create(), &[]).unwrap();
        assert!(matches!(view.delete_file("/sub", DeleteMode::Any), Err(FsError::DirectoryNotEmpty(_))));
    }

    #[test]
    fn working_directory_cannot_be_deleted_by_relative_path_but_can_by_absolute() {
        let (store, root) = test_store();
        view_can_delete_wd_only_absolutely(store, root);
    }

    fn view_can_delete_wd_only_absolutely(store: std::sync::Arc<crate::view::Store>, root: crate::arena::FileId) {
        let view = FileSystemView::new(store, root);
        view.create_directory("/wd", &[]).unwrap();
        let wd_id = match view.store().arena.read().unwrap().get(root).unwrap().as_directory().unwrap().get(&crate::name::Name::new("wd", &Default::default(), &Default::default())) {
            Some(id) => id,
            None => panic!("missing wd"),
        };
        let wd_view = view.with_working_directory(wd_id);
        assert!(matches!(wd_view.delete_file(".", DeleteMode::Any), Err(FsError::InvalidArgument(_))));
        wd_view.delete_file("/wd", DeleteMode::Any).unwrap();
    }
}
