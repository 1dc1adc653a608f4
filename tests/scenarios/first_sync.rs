//! Scenario: first sync into an empty destination, then re-runs.

use std::collections::BTreeMap;

use treesync::PathFilter;

use crate::common::*;

fn tree(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn empty_destination_receives_whole_tree() {
    let env = TestEnv::new();
    env.write_source("a.txt", "alpha", 100);
    env.write_source("sub/b.txt", "beta", 50);

    let report = sync_local(&env, false, false, PathFilter::default()).unwrap();

    assert_eq!(report.copied, vec!["a.txt", "sub/b.txt"]);
    assert_eq!(report.created_dirs, vec!["sub"]);
    assert_eq!(
        env.destination_tree(),
        tree(&[("a.txt", "alpha"), ("sub/", "/"), ("sub/b.txt", "beta")])
    );
}

#[test]
fn copies_carry_modification_times() {
    let env = TestEnv::new();
    env.write_source("a.txt", "alpha", 100);

    sync_local(&env, false, false, PathFilter::default()).unwrap();

    assert_eq!(modified(&env.destination.join("a.txt")), mtime(100));
}

#[test]
fn second_run_copies_nothing() {
    let env = TestEnv::new();
    env.write_source("a.txt", "alpha", 100);
    env.write_source("sub/deeper/c.txt", "gamma", 70);

    sync_local(&env, false, false, PathFilter::default()).unwrap();
    let second = sync_local(&env, false, false, PathFilter::default()).unwrap();

    assert!(second.copied.is_empty());
    assert!(second.created_dirs.is_empty());
    assert_eq!(second.skipped.len(), 2);
}

#[test]
fn only_newer_sources_are_copied() {
    let env = TestEnv::new();
    env.write_source("newer.txt", "fresh", 200);
    env.write_destination("newer.txt", "stale", 100);
    env.write_source("older.txt", "old source", 100);
    env.write_destination("older.txt", "edited on destination", 200);

    let report = sync_local(&env, false, false, PathFilter::default()).unwrap();

    assert_eq!(report.copied, vec!["newer.txt"]);
    assert_eq!(report.skipped, vec!["older.txt"]);
    let tree = env.destination_tree();
    assert_eq!(tree["newer.txt"], "fresh");
    assert_eq!(tree["older.txt"], "edited on destination");
}

#[test]
fn force_copies_every_file() {
    let env = TestEnv::new();
    env.write_source("a.txt", "source", 100);
    env.write_destination("a.txt", "destination", 100);
    env.write_source("b.txt", "source b", 10);
    env.write_destination("b.txt", "destination b", 900);

    let report = sync_local(&env, false, true, PathFilter::default()).unwrap();

    assert_eq!(report.copied, vec!["a.txt", "b.txt"]);
    assert_eq!(env.destination_tree(), env.source_tree());
}
