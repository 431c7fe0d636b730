//! Small enumerated option types shared by the channel and view layers
//! (spec §6.4).

use crate::error::{FsError, FsResult};

/// Flags accepted when opening or creating a regular file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenOptions {
    pub read: bool,
    pub write: bool,
    pub append: bool,
    pub create: bool,
    pub create_new: bool,
    pub truncate_existing: bool,
    pub sparse: bool,
    pub dsync: bool,
    pub sync: bool,
    pub nofollow_links: bool,
}

impl OpenOptions {
    pub fn read() -> Self {
        Self { read: true, ..Default::default() }
    }

    pub fn write() -> Self {
        Self { write: true, ..Default::default() }
    }

    pub fn read_write() -> Self {
        Self { read: true, write: true, ..Default::default() }
    }

    pub fn with_append(mut self) -> Self {
        self.append = true;
        self.write = true;
        self
    }

    pub fn with_create(mut self) -> Self {
        self.create = true;
        self
    }

    pub fn with_create_new(mut self) -> Self {
        self.create_new = true;
        self.create = true;
        self
    }

    pub fn with_truncate_existing(mut self) -> Self {
        self.truncate_existing = true;
        self
    }

    pub fn with_nofollow(mut self) -> Self {
        self.nofollow_links = true;
        self
    }

    /// Validates the combination, rejecting READ+APPEND and other
    /// structurally incompatible combinations (spec §6.4).
    pub fn validate(&self) -> FsResult<()> {
        if self.read && self.append {
            return Err(FsError::UnsupportedOption("READ cannot be combined with APPEND"));
        }
        if self.truncate_existing && !self.write {
            return Err(FsError::UnsupportedOption("TRUNCATE_EXISTING requires WRITE"));
        }
        if self.create_new && !self.create {
            // create_new implies create; a caller constructing this by hand
            // with a mismatched pair is a caller bug, not a valid option set.
            return Err(FsError::UnsupportedOption("CREATE_NEW requires CREATE"));
        }
        Ok(())
    }
}

/// Flags accepted by copy/move operations (spec §6.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CopyOptions {
    pub replace_existing: bool,
    pub copy_attributes: bool,
    pub atomic_move: bool,
    pub nofollow_links: bool,
}

impl CopyOptions {
    /// `ATOMIC_MOVE` is only meaningful for move operations.
    pub fn validate(&self, is_move: bool) -> FsResult<()> {
        if self.atomic_move && !is_move {
            return Err(FsError::UnsupportedOption("ATOMIC_MOVE is only valid for move"));
        }
        Ok(())
    }
}

/// Whether mid-path and/or terminal symlinks should be followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOption {
    Follow,
    NoFollow,
}

impl LinkOption {
    pub fn follows(self) -> bool {
        matches!(self, LinkOption::Follow)
    }
}

/// Optional filesystem capabilities that may be enabled or disabled
/// (spec §6.1 `supportedFeatures`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Feature {
    Links,
    SymbolicLinks,
    SecureDirectoryStream,
    FileChannel,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SupportedFeatures(pub std::collections::BTreeSet<Feature>);

impl SupportedFeatures {
    pub fn all() -> Self {
        use Feature::*;
        Self([Links, SymbolicLinks, SecureDirectoryStream, FileChannel].into_iter().collect())
    }

    pub fn contains(&self, feature: Feature) -> bool {
        self.0.contains(&feature)
    }

    pub fn require(&self, feature: Feature) -> FsResult<()> {
        if self.contains(feature) {
            Ok(())
        } else {
            Err(FsError::UnsupportedFeature(match feature {
                Feature::Links => "LINKS",
                Feature::SymbolicLinks => "SYMBOLIC_LINKS",
                Feature::SecureDirectoryStream => "SECURE_DIRECTORY_STREAM",
                Feature::FileChannel => "FILE_CHANNEL",
            }))
        }
    }
}

impl Default for SupportedFeatures {
    fn default() -> Self {
        Self::all()
    }
}

/// `mode` argument to `FileSystemView::delete_file` (spec §4.F).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    Any,
    NonDirectoryOnly,
    DirectoryOnly,
}
