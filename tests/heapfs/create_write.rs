use heapfs::{FsError, OpenOptions};

use crate::common::Fixture;

#[test]
fn create_write_and_read_back_a_file() {
    let fx = Fixture::new();
    fx.write_file("note.txt", b"hello, heap");
    assert_eq!(fx.read_file("note.txt"), b"hello, heap");
}

#[test]
fn append_mode_always_writes_past_current_size() {
    let fx = Fixture::new();
    let channel = fx.fs.open_channel(&fx.path("log.txt"), OpenOptions::write().with_create().with_append(), &[]).unwrap();
    channel.write(b"first;").unwrap();
    channel.write(b"second;").unwrap();
    channel.close().unwrap();
    assert_eq!(fx.read_file("log.txt"), b"first;second;");
}

#[test]
fn appending_channel_ignores_an_explicit_write_at_position() {
    let fx = Fixture::new();
    let channel = fx.fs.open_channel(&fx.path("a.txt"), OpenOptions::write().with_create().with_append(), &[]).unwrap();
    channel.write(b"abc").unwrap();
    channel.write_at(b"xyz", 0).unwrap();
    assert_eq!(fx.read_file("a.txt"), b"abcxyz");
}

#[test]
fn write_exactly_at_current_size_does_not_zero_pad() {
    let fx = Fixture::new();
    let channel = fx.fs.open_channel(&fx.path("b.txt"), OpenOptions::write().with_create(), &[]).unwrap();
    channel.write(b"abc").unwrap();
    channel.write(b"de").unwrap();
    channel.close().unwrap();
    assert_eq!(fx.read_file("b.txt"), b"abcde");
}

#[test]
fn write_past_current_size_zero_fills_the_gap() {
    let fx = Fixture::new();
    let channel = fx.fs.open_channel(&fx.path("c.txt"), OpenOptions::read_write().with_create(), &[]).unwrap();
    channel.write_at(b"z", 5).unwrap();
    let mut buf = [0xFFu8; 6];
    channel.read_at(&mut buf, 0).unwrap();
    assert_eq!(buf, [0, 0, 0, 0, 0, b'z']);
}

#[test]
fn truncate_to_the_current_size_is_a_noop() {
    let fx = Fixture::new();
    let channel = fx.fs.open_channel(&fx.path("d.txt"), OpenOptions::read_write().with_create(), &[]).unwrap();
    channel.write(b"abc").unwrap();
    channel.truncate(3).unwrap();
    assert_eq!(channel.size().unwrap(), 3);
    channel.truncate(10).unwrap();
    assert_eq!(channel.size().unwrap(), 3);
    channel.truncate(1).unwrap();
    assert_eq!(channel.size().unwrap(), 1);
}

#[test]
fn reads_at_or_past_eof_report_minus_one() {
    let fx = Fixture::new();
    let channel = fx.fs.open_channel(&fx.path("e.txt"), OpenOptions::read_write().with_create(), &[]).unwrap();
    channel.write(b"ab").unwrap();
    let mut buf = [0u8; 4];
    assert_eq!(channel.read_at(&mut buf, 2).unwrap(), -1);
    assert_eq!(channel.read_at(&mut buf, 1).unwrap(), 1);
}

#[test]
fn write_beyond_the_configured_quota_fails_with_out_of_space() {
    let config = heapfs::FileSystemConfig::unix().with_block_size(8).with_max_size(16).with_max_cache_size(16);
    let fx = Fixture::with_config(config);
    let channel = fx.fs.open_channel(&fx.path("full.txt"), OpenOptions::write().with_create(), &[]).unwrap();
    channel.write(&[0u8; 16]).unwrap();
    assert!(matches!(channel.write(b"x"), Err(FsError::OutOfSpace)));
}

#[test]
fn write_exactly_up_to_the_quota_boundary_succeeds() {
    let config = heapfs::FileSystemConfig::unix().with_block_size(8).with_max_size(16).with_max_cache_size(16);
    let fx = Fixture::with_config(config);
    let channel = fx.fs.open_channel(&fx.path("edge.txt"), OpenOptions::write().with_create(), &[]).unwrap();
    assert_eq!(channel.write(&[7u8; 16]).unwrap(), 16);
    assert_eq!(channel.size().unwrap(), 16);
}
