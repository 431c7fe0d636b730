use heapfs::{FsError, OpenOptions};

use crate::common::Fixture;

/// Spec §8 S4: a symlink cycle fails with `SymbolicLinkLoop` rather than
/// recursing forever.
#[test]
fn a_symlink_cycle_is_detected() {
    let fx = Fixture::new();
    fx.fs.create_directory(&fx.path("foo"), &[]).unwrap();
    fx.fs.create_symbolic_link(&fx.path("foo/bar"), "baz".to_string(), &[]).unwrap();
    fx.fs.create_symbolic_link(&fx.path("foo/baz"), "bar".to_string(), &[]).unwrap();

    let result = fx.fs.open_channel(&fx.path("foo/bar/file"), OpenOptions::read(), &[]);
    assert!(matches!(result, Err(FsError::SymbolicLinkLoop(_))));
}

#[test]
fn a_symlink_resolves_to_its_targets_content() {
    let fx = Fixture::new();
    fx.write_file("real.txt", b"target content");
    fx.fs.create_symbolic_link(&fx.path("alias.txt"), fx.path("real.txt"), &[]).unwrap();
    assert_eq!(fx.read_file("alias.txt"), b"target content");
}

#[test]
fn read_symbolic_link_returns_the_raw_target_without_following_it() {
    let fx = Fixture::new();
    fx.fs.create_symbolic_link(&fx.path("broken"), "/nowhere".to_string(), &[]).unwrap();
    assert_eq!(fx.fs.read_symbolic_link(&fx.path("broken")).unwrap(), "/nowhere");
}

#[test]
fn opening_through_a_dangling_symlink_reports_no_such_file() {
    let fx = Fixture::new();
    fx.fs.create_symbolic_link(&fx.path("broken"), "/nowhere".to_string(), &[]).unwrap();
    let result = fx.fs.open_channel(&fx.path("broken"), OpenOptions::read(), &[]);
    assert!(matches!(result, Err(FsError::NoSuchFile(_))));
}

#[test]
fn a_relative_symlink_target_resolves_against_its_containing_directory() {
    let fx = Fixture::new();
    fx.fs.create_directory(&fx.path("dir"), &[]).unwrap();
    fx.fs
        .open_channel(&fx.path("dir/real.txt"), OpenOptions::write().with_create(), &[])
        .unwrap()
        .write(b"nested")
        .unwrap();
    fx.fs.create_symbolic_link(&fx.path("dir/alias.txt"), "real.txt".to_string(), &[]).unwrap();
    assert_eq!(fx.read_file("dir/alias.txt"), b"nested");
}
