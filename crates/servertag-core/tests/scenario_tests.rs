//! End-to-end request scenarios through `apply`

mod common;

use chrono::{TimeZone, Utc};
use common::{add_cmd, remove_cmd, rest_meta, seeded_store};
use servertag_core::render::HostListView;
use servertag_core::{apply, Command, HostStore, OnMissing, ServerTagError};

#[test]
fn test_exclusive_tag_replaces_same_prefix() {
    // GIVEN cleon tagged foo and env:stg
    let mut store = seeded_store(&[("cleon", &["foo", "env:stg"])]);

    // WHEN env:prod and bar are added
    let outcome = apply(
        &mut store,
        &add_cmd(&["cleon"], &["env:prod", "bar"]),
        &rest_meta(),
        Utc::now(),
    )
    .unwrap();

    // THEN env:stg is gone and the diff names only what was added
    let cleon = store.find_host_by_name("cleon").unwrap();
    assert_eq!(cleon.tag_names(), vec!["bar", "env:prod", "foo"]);
    assert_eq!(outcome.added_tag_names, vec!["env:prod", "bar"]);
    assert_eq!(
        outcome.event.diffs,
        vec!["Added tag(s) 'env:prod' and 'bar' to host(s) 'cleon'"]
    );
}

#[test]
fn test_hosts_with_identical_changes_share_a_line() {
    let mut store = seeded_store(&[("cleon", &["web"]), ("swan", &["web"]), ("lynx", &["db"])]);

    let outcome = apply(
        &mut store,
        &add_cmd(&["cleon", "swan", "lynx"], &["foo", "web"]),
        &rest_meta(),
        Utc::now(),
    )
    .unwrap();

    // cleon and swan gained ["foo"], lynx gained ["foo", "web"]
    assert_eq!(
        outcome.event.diffs,
        vec![
            "Added tag(s) 'foo' to host(s) 'cleon' and 'swan'",
            "Added tag(s) 'foo' and 'web' to host(s) 'lynx'",
        ]
    );
}

#[test]
fn test_oxford_comma_for_three_hosts() {
    let mut store = seeded_store(&[]);

    let outcome = apply(
        &mut store,
        &add_cmd(&["a", "b", "c"], &["x", "y", "z"]),
        &rest_meta(),
        Utc::now(),
    )
    .unwrap();

    assert_eq!(
        outcome.event.diffs.last().map(String::as_str),
        Some("Added tag(s) 'x', 'y', and 'z' to host(s) 'a', 'b', and 'c'")
    );
}

#[test]
fn test_removing_last_tag_deletes_the_host() {
    let mut store = seeded_store(&[("cleon", &["foo"]), ("swan", &["foo", "bar"])]);

    let outcome = apply(
        &mut store,
        &remove_cmd(&["cleon", "swan"], &["foo"]),
        &rest_meta(),
        Utc::now(),
    )
    .unwrap();

    assert_eq!(
        outcome.event.diffs,
        vec![
            "Deleted host 'cleon'",
            "Removed tag(s) 'foo' from host(s) 'cleon' and 'swan'",
        ]
    );
    assert!(matches!(
        store.find_host_by_name("cleon"),
        Err(ServerTagError::HostNotFound { .. })
    ));

    let view = HostListView::from_hosts(&outcome.hosts, &outcome.added_tag_names);
    assert_eq!(view.results.len(), 1);
    assert_eq!(view.results[0].hostname, "swan");
}

#[test]
fn test_add_with_fail_on_missing_changes_nothing() {
    let mut store = seeded_store(&[("cleon", &["foo"])]);
    let cmd = Command::AddTags {
        hosts: vec!["cleon".to_string(), "ghost".to_string()],
        tags: vec!["bar".to_string()],
        on_missing: OnMissing::Fail,
    };

    let err = apply(&mut store, &cmd, &rest_meta(), Utc::now()).unwrap_err();

    assert!(matches!(err, ServerTagError::HostNotFound { ref name } if name == "ghost"));
    assert_eq!(store.find_host_by_name("cleon").unwrap().tag_names(), vec!["foo"]);
    assert!(store.history().is_empty());
}

#[test]
fn test_invalid_tag_rejects_whole_batch() {
    let mut store = seeded_store(&[("cleon", &["foo"])]);

    let err = apply(
        &mut store,
        &add_cmd(&["cleon"], &["good", "bad/tag"]),
        &rest_meta(),
        Utc::now(),
    )
    .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Invalid tag name specified: 'bad/tag'"
    );
    assert_eq!(store.find_host_by_name("cleon").unwrap().tag_names(), vec!["foo"]);
}

#[test]
fn test_delete_host_command_logs_tags_then_deletion() {
    let mut store = seeded_store(&[("cleon", &["foo", "bar", "env:prod"])]);
    let cmd = Command::DeleteHost {
        host: "Cleon".to_string(),
    };

    let outcome = apply(&mut store, &cmd, &rest_meta(), Utc::now()).unwrap();

    assert_eq!(store.host_count(), 0);
    assert_eq!(
        outcome.event.diffs,
        vec![
            "Deleted host 'cleon'",
            "Removed tag(s) 'bar', 'env:prod', and 'foo' from host(s) 'cleon'",
        ]
    );
}

#[test]
fn test_history_lists_newest_first() {
    let mut store = seeded_store(&[]);
    for (hour, tag) in [(9, "first"), (10, "second"), (11, "third")] {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap();
        apply(&mut store, &add_cmd(&["cleon"], &[tag]), &rest_meta(), now).unwrap();
    }

    let page = store.most_recent_history(2).unwrap();

    assert_eq!(page.total, 3);
    assert_eq!(page.hits[0].diffs, vec!["Added tag(s) 'third' to host(s) 'cleon'"]);
    assert_eq!(page.hits[1].diffs, vec!["Added tag(s) 'second' to host(s) 'cleon'"]);
}

#[test]
fn test_event_records_actor() {
    let mut store = seeded_store(&[]);
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

    let outcome = apply(&mut store, &add_cmd(&["cleon"], &["foo"]), &rest_meta(), now).unwrap();

    let stored = &store.history()[0];
    assert_eq!(stored, &outcome.event);
    assert_eq!(stored.user, "dan");
    assert_eq!(stored.client, "rest");
    assert_eq!(stored.remote_host, "127.0.0.1");
    assert_eq!(stored.datetime, now);
}
