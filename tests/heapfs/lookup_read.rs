use heapfs::{FsError, OpenOptions};

use crate::common::Fixture;

#[test]
fn absolute_and_relative_paths_resolve_to_the_same_file() {
    let fx = Fixture::new();
    fx.write_file("a.txt", b"x");
    assert_eq!(fx.fs.read_symbolic_link("a.txt").is_err(), true); // not a symlink, sanity check it resolves at all
    assert!(fx.fs.check_access("a.txt").is_ok());
    assert!(fx.fs.check_access("/work/a.txt").is_ok());
}

#[test]
fn dot_and_dot_dot_components_resolve_through_the_namespace() {
    let fx = Fixture::new();
    fx.fs.create_directory(&fx.path("sub"), &[]).unwrap();
    fx.fs.open_channel(&fx.path("sub/./a.txt"), OpenOptions::write().with_create(), &[]).unwrap();
    assert!(fx.fs.check_access("/work/sub/../sub/a.txt").is_ok());
}

#[test]
fn missing_file_reports_no_such_file() {
    let fx = Fixture::new();
    assert!(matches!(fx.fs.check_access("/work/missing.txt"), Err(FsError::NoSuchFile(_))));
}

#[test]
fn normalize_path_collapses_dot_and_dot_dot() {
    let fx = Fixture::new();
    let normalized = fx.fs.normalize_path("/work/sub/../a/./b").unwrap();
    assert_eq!(normalized.components, vec!["work".to_string(), "a".to_string(), "b".to_string()]);
}

#[test]
fn resolve_path_joins_a_relative_path_onto_a_base() {
    let fx = Fixture::new();
    let resolved = fx.fs.resolve_path("/work/sub", "../other").unwrap();
    assert_eq!(resolved.components, vec!["work".to_string(), "other".to_string()]);
}

#[test]
fn relativize_path_computes_updirs_between_two_absolute_paths() {
    let fx = Fixture::new();
    let rel = fx.fs.relativize_path("/work/a/b", "/work/c").unwrap();
    assert_eq!(rel.components, vec!["..".to_string(), "..".to_string(), "c".to_string()]);
}

#[test]
fn input_and_output_streams_round_trip_a_file() {
    let fx = Fixture::new();
    {
        let out = fx.fs.open_output_stream(&fx.path("stream.txt"), false, &[]).unwrap();
        out.write(b"streamed").unwrap();
        out.close();
    }
    let input = fx.fs.open_input_stream(&fx.path("stream.txt")).unwrap();
    let mut buf = [0u8; 8];
    assert_eq!(input.read(&mut buf).unwrap(), 8);
    assert_eq!(&buf, b"streamed");
}

#[test]
fn output_stream_append_continues_from_the_current_size() {
    let fx = Fixture::new();
    {
        let out = fx.fs.open_output_stream(&fx.path("appended.txt"), false, &[]).unwrap();
        out.write(b"first-").unwrap();
        out.close();
    }
    {
        let out = fx.fs.open_output_stream(&fx.path("appended.txt"), true, &[]).unwrap();
        out.write(b"second").unwrap();
        out.close();
    }
    assert_eq!(fx.read_file("appended.txt"), b"first-second");
}
