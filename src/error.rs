//! Error taxonomy shared by every public operation.
//!
//! Every I/O-style call in this crate returns [`FsResult`]. Each variant
//! names the offending path (or both paths, for two-sided operations) so an
//! error is self-describing once logged or surfaced to a caller.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type FsResult<T> = Result<T, FsError>;

/// The error kinds a filesystem operation can fail with.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FsError {
    #[error("invalid path syntax: {reason} ({path:?})")]
    PathSyntaxInvalid { path: String, reason: &'static str },

    #[error("no such file or directory: {0}")]
    NoSuchFile(PathBuf),

    #[error("file already exists: {0}")]
    FileAlreadyExists(PathBuf),

    #[error("not a directory: {0}")]
    NotDirectory(PathBuf),

    #[error("not a regular file: {0}")]
    NotRegularFile(PathBuf),

    #[error("not a symbolic link: {0}")]
    NotSymbolicLink(PathBuf),

    #[error("directory not empty: {0}")]
    DirectoryNotEmpty(PathBuf),

    #[error("too many levels of symbolic links: {0}")]
    SymbolicLinkLoop(PathBuf),

    #[error("no space left on heap disk")]
    OutOfSpace,

    #[error("attribute view `{view}` does not support `{attr}`")]
    AttributeUnsupported { view: String, attr: String },

    #[error("attribute `{view}:{attr}` cannot be set")]
    AttributeUnsettable { view: String, attr: String },

    #[error("attribute `{view}:{attr}` cannot be set at creation time")]
    AttributeNotCreatable { view: String, attr: String },

    #[error("attribute `{view}:{attr}` was given a value of the wrong type")]
    AttributeInvalidType { view: String, attr: String },

    #[error("filesystem resource is closed")]
    Closed,

    #[error("blocking operation was cancelled by a concurrent close")]
    AsyncClosed,

    #[error("unsupported option combination: {0}")]
    UnsupportedOption(&'static str),

    #[error("unsupported feature: {0}")]
    UnsupportedFeature(&'static str),

    #[error("paths belong to different filesystem instances")]
    ProviderMismatch,

    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("internal invariant violated: {0}")]
    Invariant(&'static str),
}

impl FsError {
    /// True for errors that indicate the crate itself is in an inconsistent
    /// state, as opposed to a caller mistake or resource limit.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FsError::Invariant(_))
    }
}
