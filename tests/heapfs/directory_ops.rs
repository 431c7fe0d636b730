use heapfs::{DeleteMode, FsError, FsResult, OpenOptions};

use crate::common::Fixture;

#[test]
fn read_directory_lists_every_entry() {
    let fx = Fixture::new();
    fx.fs.create_directory(&fx.path("sub"), &[]).unwrap();
    fx.fs.open_channel(&fx.path("a.txt"), OpenOptions::write().with_create(), &[]).unwrap();
    let mut entries = fx.fs.read_directory("/work").unwrap();
    entries.sort();
    assert_eq!(entries, vec!["a.txt".to_string(), "sub".to_string()]);
}

#[test]
fn newly_created_directory_starts_empty() {
    let fx = Fixture::new();
    fx.fs.create_directory(&fx.path("sub"), &[]).unwrap();
    assert!(fx.fs.read_directory(&fx.path("sub")).unwrap().is_empty());
}

#[test]
fn directory_stream_is_a_snapshot_taken_once() {
    let fx = Fixture::new();
    fx.fs.create_directory(&fx.path("a"), &[]).unwrap();
    fx.fs.create_directory(&fx.path("b"), &[]).unwrap();
    let stream = fx.fs.open_directory_stream("/work").unwrap();
    // Rename "/work" itself after the stream was opened; the already-taken
    // snapshot must still be usable.
    fx.fs.create_directory(&fx.path("c"), &[]).unwrap();
    fx.fs.delete(&fx.path("a"), DeleteMode::DirectoryOnly).unwrap();

    let entries: FsResult<Vec<String>> = stream.collect();
    let mut entries = entries.unwrap();
    entries.sort();
    assert_eq!(entries, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn delete_rejects_a_nonempty_directory() {
    let fx = Fixture::new();
    fx.fs.create_directory(&fx.path("sub"), &[]).unwrap();
    fx.fs.open_channel(&fx.path("sub/a.txt"), OpenOptions::write().with_create(), &[]).unwrap();
    assert!(matches!(fx.fs.delete(&fx.path("sub"), DeleteMode::Any), Err(FsError::DirectoryNotEmpty(_))));
}

#[test]
fn delete_honors_a_directory_only_or_non_directory_only_mode() {
    let fx = Fixture::new();
    fx.fs.create_directory(&fx.path("sub"), &[]).unwrap();
    fx.fs.open_channel(&fx.path("a.txt"), OpenOptions::write().with_create(), &[]).unwrap();
    assert!(matches!(fx.fs.delete(&fx.path("sub"), DeleteMode::NonDirectoryOnly), Err(FsError::NotRegularFile(_))));
    assert!(matches!(fx.fs.delete(&fx.path("a.txt"), DeleteMode::DirectoryOnly), Err(FsError::NotDirectory(_))));
}
