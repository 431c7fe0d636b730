use heapfs::{CopyOptions, FsError, OpenOptions};

use crate::common::Fixture;

/// Spec §8 S5: moving a directory into its own subtree is rejected and
/// leaves the source unchanged.
#[test]
fn move_into_own_subtree_is_rejected() {
    let fx = Fixture::new();
    fx.fs.create_directory(&fx.path("a"), &[]).unwrap();
    fx.fs.create_directory(&fx.path("a/b"), &[]).unwrap();
    fx.fs.create_directory(&fx.path("a/b/c"), &[]).unwrap();

    let result = fx.fs.move_(&fx.path("a"), &fx.path("a/b/d"), CopyOptions::default());
    assert!(matches!(result, Err(FsError::InvalidArgument(_))));
    assert_eq!(fx.fs.read_directory(&fx.path("a/b")).unwrap(), vec!["c".to_string()]);
}

/// Spec §8 B6: moving a path onto itself is a no-op, detected by inode
/// identity rather than string comparison.
#[test]
fn move_onto_the_same_path_is_a_noop() {
    let fx = Fixture::new();
    fx.write_file("a.txt", b"content");
    fx.fs.move_(&fx.path("a.txt"), &fx.path("a.txt"), CopyOptions { replace_existing: true, ..Default::default() }).unwrap();
    assert_eq!(fx.read_file("a.txt"), b"content");
}

#[test]
fn move_renames_a_file_without_copying_its_bytes() {
    let fx = Fixture::new();
    fx.write_file("a.txt", b"move-me");
    fx.fs.move_(&fx.path("a.txt"), &fx.path("b.txt"), CopyOptions::default()).unwrap();
    assert!(matches!(fx.fs.check_access(&fx.path("a.txt")), Err(FsError::NoSuchFile(_))));
    assert_eq!(fx.read_file("b.txt"), b"move-me");
}

#[test]
fn move_without_replace_existing_fails_when_destination_is_present() {
    let fx = Fixture::new();
    fx.write_file("a.txt", b"one");
    fx.write_file("b.txt", b"two");
    let result = fx.fs.move_(&fx.path("a.txt"), &fx.path("b.txt"), CopyOptions::default());
    assert!(matches!(result, Err(FsError::FileAlreadyExists(_))));
}

#[test]
fn move_with_replace_existing_overwrites_the_destination() {
    let fx = Fixture::new();
    fx.write_file("a.txt", b"one");
    fx.write_file("b.txt", b"two");
    fx.fs.move_(&fx.path("a.txt"), &fx.path("b.txt"), CopyOptions { replace_existing: true, ..Default::default() }).unwrap();
    assert_eq!(fx.read_file("b.txt"), b"one");
}

#[test]
fn copy_duplicates_content_into_a_new_inode() {
    let fx = Fixture::new();
    fx.write_file("a.txt", b"copy-me");
    fx.fs.copy(&fx.path("a.txt"), &fx.path("b.txt"), CopyOptions::default()).unwrap();
    assert_eq!(fx.read_file("a.txt"), b"copy-me");
    assert_eq!(fx.read_file("b.txt"), b"copy-me");

    // The two paths are independent inodes: writing through one channel
    // must not be visible through the other.
    let channel = fx.fs.open_channel(&fx.path("b.txt"), OpenOptions::write(), &[]).unwrap();
    channel.write(b"changed").unwrap();
    channel.close().unwrap();
    assert_eq!(fx.read_file("a.txt"), b"copy-me");
}

#[test]
fn cross_filesystem_move_copies_then_deletes_the_source() {
    let fx_a = Fixture::new();
    let fx_b = Fixture::new();
    fx_a.write_file("a.txt", b"cross-fs");

    let view_a = fx_a.fs.working_directory_view();
    let view_b = fx_b.fs.working_directory_view();
    view_a.copy(&fx_a.path("a.txt"), &view_b, &fx_b.path("a.txt"), CopyOptions::default(), true).unwrap();

    assert!(matches!(fx_a.fs.check_access(&fx_a.path("a.txt")), Err(FsError::NoSuchFile(_))));
    assert_eq!(fx_b.read_file("a.txt"), b"cross-fs");
}
