use heapfs::{FsError, OpenOptions};

use crate::common::Fixture;

/// Spec §8 S3: hard-link delete semantics.
#[test]
fn deleting_one_hard_link_leaves_the_other_names_content_intact() {
    let fx = Fixture::new();
    fx.write_file("a", b"payload");
    fx.fs.create_link(&fx.path("b"), &fx.path("a")).unwrap();

    let attrs = fx.fs.read_attributes(&fx.path("a"), "basic:fileKey", heapfs::LinkOption::Follow).unwrap();
    let key_a = attrs.get("fileKey").unwrap().clone();
    let attrs_b = fx.fs.read_attributes(&fx.path("b"), "basic:fileKey", heapfs::LinkOption::Follow).unwrap();
    assert_eq!(key_a, attrs_b.get("fileKey").unwrap().clone());

    fx.fs.delete(&fx.path("a"), heapfs::DeleteMode::Any).unwrap();
    assert!(matches!(fx.fs.check_access(&fx.path("a")), Err(FsError::NoSuchFile(_))));
    assert_eq!(fx.read_file("b"), b"payload");
}

/// Spec §8 B4/S6: writing up to exactly the quota succeeds, one byte past
/// it fails with `OutOfSpace` and leaves the file's size unchanged.
#[test]
fn writing_past_the_disk_quota_fails_without_growing_the_file() {
    let fx = Fixture::with_config(heapfs::FileSystemConfig::unix().with_block_size(8).with_max_size(16));
    let channel = fx.fs.open_channel(&fx.path("big"), OpenOptions::write().with_create(), &[]).unwrap();
    channel.write(&[0u8; 16]).unwrap();
    assert_eq!(channel.size().unwrap(), 16);

    let result = channel.write(&[0u8; 1]);
    assert!(matches!(result, Err(FsError::OutOfSpace)));
    assert_eq!(channel.size().unwrap(), 16);
}

/// Spec §8 P2: a file's blocks are only freed once its link count and open
/// count both reach zero.
#[test]
fn content_is_retained_until_the_last_close_after_the_last_unlink() {
    let fx = Fixture::new();
    let channel = fx.fs.open_channel(&fx.path("a"), OpenOptions::read_write().with_create(), &[]).unwrap();
    channel.write(b"still open").unwrap();
    fx.fs.delete(&fx.path("a"), heapfs::DeleteMode::Any).unwrap();

    // The content is still reachable through the open channel even though
    // the name is gone.
    channel.set_position(0);
    let mut buf = [0u8; 10];
    assert_eq!(channel.read(&mut buf).unwrap(), 10);
    assert_eq!(&buf, b"still open");
    channel.close().unwrap();
}

#[test]
fn delete_mode_non_directory_only_rejects_a_directory() {
    let fx = Fixture::new();
    fx.fs.create_directory(&fx.path("sub"), &[]).unwrap();
    assert!(matches!(
        fx.fs.delete(&fx.path("sub"), heapfs::DeleteMode::NonDirectoryOnly),
        Err(FsError::NotRegularFile(_))
    ));
}
