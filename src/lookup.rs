//! Path resolution (spec §4.D): walks a parsed path one name at a time
//! against the inode arena, always following symlinks encountered
//! mid-path and optionally following a symlink found at the final name.

use std::collections::BTreeMap;

use crate::arena::{FileArena, FileId};
use crate::config::PathType;
use crate::error::{FsError, FsResult};
use crate::name::{Name, NormalizationList};
use crate::path::{self, ParsedPath};

/// The maximum number of recursive symlink follows before giving up (spec
/// §4.D "Symlink cycles").
const MAX_LINK_DEPTH: u32 = 40;

/// The outcome of resolving a path down to its final name.
pub enum Resolution {
    /// The final name is bound to an inode.
    Found { parent: FileId, name: Name, file: FileId },
    /// The final name has no binding in `parent` — callers that want to
    /// create the entry use this, callers that wanted it to exist treat
    /// it as [`FsError::NoSuchFile`].
    Missing { parent: FileId, name: Name },
}

impl Resolution {
    pub fn into_file(self, path_for_error: impl Into<std::path::PathBuf>) -> FsResult<FileId> {
        match self {
            Resolution::Found { file, .. } => Ok(file),
            Resolution::Missing { .. } => Err(FsError::NoSuchFile(path_for_error.into())),
        }
    }
}

/// Everything lookup needs that isn't part of the path itself: the root
/// table, the two name-normalization lists, and the path syntax used to
/// re-parse symlink targets.
pub struct LookupContext<'a> {
    pub arena: &'a FileArena,
    pub roots: &'a BTreeMap<String, FileId>,
    pub path_type: PathType,
    pub display_norm: &'a NormalizationList,
    pub canonical_norm: &'a NormalizationList,
}

impl<'a> LookupContext<'a> {
    fn make_name(&self, raw: &str) -> Name {
        Name::new(raw, self.display_norm, self.canonical_norm)
    }

    fn select_root(&self, root: &str, path_for_error: &ParsedPath) -> FsResult<FileId> {
        self.roots.get(root).copied().ok_or_else(|| {
            FsError::NoSuchFile(path::render(self.path_type, path_for_error).into())
        })
    }

    /// Resolves `parsed` starting from `working_directory` (used when
    /// `parsed` is relative). `follow_terminal` selects FOLLOW vs NOFOLLOW
    /// for the final name only; mid-path symlinks are always followed.
    pub fn resolve(&self, parsed: &ParsedPath, working_directory: FileId, follow_terminal: bool) -> FsResult<Resolution> {
        let mut depth = 0;
        self.resolve_inner(parsed, working_directory, follow_terminal, &mut depth)
    }

    fn resolve_inner(
        &self,
        parsed: &ParsedPath,
        working_directory: FileId,
        follow_terminal: bool,
        depth: &mut u32,
    ) -> FsResult<Resolution> {
        let mut current = if let Some(root) = &parsed.root {
            self.select_root(root, parsed)?
        } else {
            working_directory
        };

        let names: Vec<Name> = if parsed.components.is_empty() {
            vec![Name::self_name()]
        } else {
            parsed.components.iter().map(|c| self.make_name(c)).collect()
        };

        let (last, init) = names.split_last().expect("always at least one name");

        for name in init {
            let dir = self.directory_of(current)?;
            let bound = dir.get(name).ok_or_else(|| FsError::NoSuchFile(name.display().to_string().into()))?;
            current = self.follow_if_symlink(current, bound, depth)?;
        }

        let parent = current;
        let dir = self.directory_of(parent)?;
        let bound = match dir.get(last) {
            Some(file) => file,
            None => return Ok(Resolution::Missing { parent, name: last.clone() }),
        };

        let resolved = if follow_terminal && self.arena.get(bound)?.is_symlink() {
            self.follow_if_symlink(parent, bound, depth)?
        } else {
            bound
        };

        if last.is_reserved() {
            return Ok(self.normalize_reserved(parent, last.clone(), resolved));
        }

        Ok(Resolution::Found { parent, name: last.clone(), file: resolved })
    }

    /// For a final name of `SELF`/`PARENT`, replaces the synthetic parent
    /// (`parent`, `name`) with the resolved directory's own
    /// `entryInParent`, so the caller sees the real binding (spec §4.D
    /// step 4).
    fn normalize_reserved(&self, parent: FileId, name: Name, resolved: FileId) -> Resolution {
        if let Ok(dir) = self.arena.get(resolved).and_then(|n| n.as_directory()) {
            if let Some((real_parent, real_name)) = dir.entry_in_parent() {
                return Resolution::Found { parent: *real_parent, name: real_name.clone(), file: resolved };
            }
        }
        Resolution::Found { parent, name, file: resolved }
    }

    fn directory_of(&self, id: FileId) -> FsResult<&crate::directory::Directory> {
        self.arena.get(id)?.as_directory().map_err(|_| FsError::NoSuchFile(id.to_string().into()))
    }

    /// Follows `id` if it is a symlink, relative targets resolving against
    /// `containing_dir` (the directory `id` was looked up in) and absolute
    /// targets restarting lookup from the root set. Chains of symlinks
    /// resolve through the recursive call to [`Self::resolve_inner`]
    /// (itself following a terminal symlink), bumping `depth` once per hop
    /// against the shared cap.
    fn follow_if_symlink(&self, containing_dir: FileId, id: FileId, depth: &mut u32) -> FsResult<FileId> {
        let node = self.arena.get(id)?;
        if !node.is_symlink() {
            return Ok(id);
        }
        *depth += 1;
        if *depth > MAX_LINK_DEPTH {
            return Err(FsError::SymbolicLinkLoop(id.to_string().into()));
        }
        let target = node.as_symlink()?.target().to_string();
        let parsed = path::parse(self.path_type, &target)?;
        match self.resolve_inner(&parsed, containing_dir, true, depth)? {
            Resolution::Found { file, .. } => Ok(file),
            Resolution::Missing { .. } => Err(FsError::NoSuchFile(target.into())),
        }
    }
}
