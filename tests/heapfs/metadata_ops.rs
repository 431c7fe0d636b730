use heapfs::{AttributeValue, FileTime, FsError, LinkOption, OpenOptions, PosixPermissions};

use crate::common::Fixture;

#[test]
fn basic_size_tracks_written_content() {
    let fx = Fixture::new();
    fx.write_file("a.txt", b"hello");
    let size = fx.fs.read_attributes(&fx.path("a.txt"), "basic:size", LinkOption::Follow).unwrap();
    assert_eq!(size.get("size").unwrap().clone(), AttributeValue::U64(5));
}

#[test]
fn basic_star_expands_to_every_fixed_attribute() {
    let fx = Fixture::new();
    fx.write_file("a.txt", b"x");
    let all = fx.fs.read_attributes(&fx.path("a.txt"), "basic:*", LinkOption::Follow).unwrap();
    assert!(all.contains_key("isRegularFile"));
    assert!(all.contains_key("creationTime"));
    assert!(all.contains_key("lastModifiedTime"));
}

#[test]
fn basic_size_cannot_be_set() {
    let fx = Fixture::new();
    fx.write_file("a.txt", b"x");
    let result = fx.fs.set_attribute(&fx.path("a.txt"), "basic:size", AttributeValue::U64(0), LinkOption::Follow);
    assert!(matches!(result, Err(FsError::AttributeUnsettable { .. })));
}

#[test]
fn posix_permissions_round_trip() {
    let fx = Fixture::new();
    fx.write_file("a.txt", b"x");
    let perms = PosixPermissions::from_rwx_string("rwxr-xr--").unwrap();
    fx.fs.set_attribute(&fx.path("a.txt"), "posix:permissions", AttributeValue::Permissions(perms), LinkOption::Follow).unwrap();
    let read = fx.fs.read_attributes(&fx.path("a.txt"), "posix:permissions", LinkOption::Follow).unwrap();
    assert_eq!(read.get("permissions").unwrap().as_permissions().unwrap().to_rwx_string(), "rwxr-xr--");
}

#[test]
fn basic_creation_time_round_trips_on_a_regular_file() {
    let fx = Fixture::new();
    fx.write_file("a.txt", b"x");
    let stamp = FileTime::from_unix_time(1_000, 0);
    fx.fs.set_attribute(&fx.path("a.txt"), "basic:creationTime", AttributeValue::Time(stamp), LinkOption::Follow).unwrap();
    let read = fx.fs.read_attributes(&fx.path("a.txt"), "basic:creationTime", LinkOption::Follow).unwrap();
    assert_eq!(read.get("creationTime").unwrap().clone(), AttributeValue::Time(stamp));
}

#[test]
fn dos_readonly_flag_round_trips() {
    let fx = Fixture::new();
    fx.write_file("a.txt", b"x");
    fx.fs.set_attribute(&fx.path("a.txt"), "dos:readonly", AttributeValue::Bool(true), LinkOption::Follow).unwrap();
    let read = fx.fs.read_attributes(&fx.path("a.txt"), "dos:readonly", LinkOption::Follow).unwrap();
    assert_eq!(read.get("readonly").unwrap().as_bool().unwrap(), true);
}

#[test]
fn user_attribute_stores_arbitrary_bytes() {
    let fx = Fixture::new();
    fx.write_file("a.txt", b"x");
    fx.fs
        .set_attribute(&fx.path("a.txt"), "user:checksum", AttributeValue::Bytes(vec![1, 2, 3]), LinkOption::Follow)
        .unwrap();
    let read = fx.fs.read_attributes(&fx.path("a.txt"), "user:checksum", LinkOption::Follow).unwrap();
    assert_eq!(read.get("checksum").unwrap().as_bytes().unwrap(), &[1, 2, 3]);
}

#[test]
fn unix_view_is_not_reachable_through_the_public_attribute_boundary() {
    let fx = Fixture::new();
    fx.write_file("a.txt", b"x");
    let result = fx.fs.read_attributes(&fx.path("a.txt"), "unix:mode", LinkOption::Follow);
    assert!(result.is_err());
}

#[test]
fn mixing_star_with_named_attributes_is_rejected() {
    let fx = Fixture::new();
    fx.write_file("a.txt", b"x");
    let result = fx.fs.read_attributes(&fx.path("a.txt"), "basic:size,*", LinkOption::Follow);
    assert!(matches!(result, Err(FsError::UnsupportedOption(_))));
}

#[test]
fn bare_attribute_name_defaults_to_the_basic_view() {
    let fx = Fixture::new();
    fx.write_file("a.txt", b"abc");
    let read = fx.fs.read_attributes(&fx.path("a.txt"), "size", LinkOption::Follow).unwrap();
    assert_eq!(read.get("size").unwrap().clone(), AttributeValue::U64(3));
}

#[test]
fn channel_open_requires_the_file_channel_feature() {
    use heapfs::{Feature, FileSystemConfig, SupportedFeatures};
    let mut config = FileSystemConfig::unix();
    config.supported_features = SupportedFeatures(
        [Feature::Links, Feature::SymbolicLinks, Feature::SecureDirectoryStream].into_iter().collect(),
    );
    let fx = Fixture::with_config(config);
    let result = fx.fs.open_channel(&fx.path("a.txt"), OpenOptions::write().with_create(), &[]);
    assert!(matches!(result, Err(FsError::UnsupportedFeature(_))));
}
