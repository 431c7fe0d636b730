//! `heapfs` - an in-process, in-memory virtual filesystem: an id-keyed
//! inode arena, POSIX- and Windows-flavored path syntax, pluggable
//! attribute views, positioned-I/O channels (sync and async), and a
//! polling watch service, all reachable through one [`filesystem::FileSystem`]
//! handle per instance.

mod arena;
mod async_channel;
mod attribute;
mod channel;
mod config;
mod directory;
mod disk;
mod error;
mod filesystem;
mod lookup;
mod name;
mod options;
mod path;
mod regular_file;
mod state;
mod symlink;
mod time;
mod view;
mod watch;

pub use arena::FileId;
pub use async_channel::{AsyncAbortHandle, AsyncFileChannel};
pub use attribute::{AclEntry, AttributeValue, PosixPermissions};
pub use channel::{FileChannel, FileInputStream, FileLock, FileOutputStream};
pub use config::{FileSystemConfig, PathType, WatchServiceConfig};
pub use error::{FsError, FsResult};
pub use filesystem::{DirectoryStream, FileSystem};
pub use options::{CopyOptions, DeleteMode, Feature, LinkOption, OpenOptions, SupportedFeatures};
pub use path::ParsedPath;
pub use time::{FileTime, FileTimeSource, FixedClock, SystemClock};
pub use view::FileSystemView;
pub use watch::{EventKind, PollingWatchService, WatchEvent, WatchKey};
