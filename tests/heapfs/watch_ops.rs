use heapfs::{EventKind, OpenOptions};

use crate::common::Fixture;

/// Spec §8 S7: create / modify / delete of a watched directory's entry is
/// observed across three manual poll ticks.
#[test]
fn watch_reports_create_modify_then_delete_across_polls() {
    let fx = Fixture::new();
    let key = fx.fs.register_watch("/work", vec![EventKind::Create, EventKind::Modify, EventKind::Delete]).unwrap();

    fx.write_file("x", b"one");
    fx.fs.poll_watches_now();
    let created: Vec<_> = key.poll_events();
    assert!(created.iter().any(|e| e.kind == EventKind::Create && e.context == "x"));

    {
        let channel = fx.fs.open_channel(&fx.path("x"), OpenOptions::write(), &[]).unwrap();
        channel.write(b"two").unwrap();
        channel.close().unwrap();
    }
    fx.fs.poll_watches_now();
    let modified: Vec<_> = key.poll_events();
    assert!(modified.iter().any(|e| e.kind == EventKind::Modify && e.context == "x"));

    fx.fs.delete(&fx.path("x"), heapfs::DeleteMode::Any).unwrap();
    fx.fs.poll_watches_now();
    let deleted: Vec<_> = key.poll_events();
    assert!(deleted.iter().any(|e| e.kind == EventKind::Delete && e.context == "x"));
}

/// Spec §8 P8: a key only reports the event kinds it subscribed to.
#[test]
fn watch_ignores_unsubscribed_event_kinds() {
    let fx = Fixture::new();
    let key = fx.fs.register_watch("/work", vec![EventKind::Delete]).unwrap();
    fx.write_file("ignored", b"x");
    fx.fs.poll_watches_now();
    assert!(key.poll_events().is_empty());
}

/// Spec §8 B6/P8 (overflow): once the bounded per-key queue fills, further
/// events in the same tick coalesce into a single `OVERFLOW` event.
#[test]
fn overflowing_events_coalesce_into_a_single_overflow_event() {
    let fx = Fixture::new();
    let key = fx.fs.register_watch("/work", vec![EventKind::Create]).unwrap();
    for i in 0..300 {
        fx.write_file(&format!("f{i}"), b"x");
    }
    fx.fs.poll_watches_now();
    let events = key.poll_events();
    assert!(events.iter().any(|e| e.kind == EventKind::Overflow && e.count > 0));
}

#[test]
fn cancelling_a_key_marks_it_invalid() {
    let fx = Fixture::new();
    let key = fx.fs.register_watch("/work", vec![EventKind::Create]).unwrap();
    assert!(key.is_valid());
    key.cancel();
    assert!(!key.is_valid());
}
