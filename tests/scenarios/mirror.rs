//! Scenario: mirroring with reconciliation enabled.

use std::fs;

use treesync::{
    Endpoint, FilterChain, PathFilter, SyncConfiguration, SyncDirection, SyncEngine, SyncError,
};

use crate::common::*;

#[test]
fn extraneous_destination_file_is_deleted() {
    let env = TestEnv::new();
    env.write_source("a.txt", "alpha", 100);
    env.write_source("sub/b.txt", "beta", 50);
    env.write_destination("a.txt", "alpha", 100);
    env.write_destination("extra.txt", "extra", 100);

    let report = sync_local(&env, true, false, PathFilter::default()).unwrap();

    assert_eq!(report.skipped, vec!["a.txt"]);
    assert_eq!(report.deleted, vec!["extra.txt"]);
    assert_eq!(report.copied, vec!["sub/b.txt"]);
    assert!(!env.destination.join("extra.txt").exists());
}

#[test]
fn without_delete_extraneous_files_survive() {
    let env = TestEnv::new();
    env.write_source("a.txt", "alpha", 100);
    env.write_destination("extra.txt", "extra", 100);

    let report = sync_local(&env, false, false, PathFilter::default()).unwrap();

    assert!(report.deleted.is_empty());
    assert!(env.destination.join("extra.txt").exists());
}

#[test]
fn extraneous_directory_is_removed_recursively() {
    let env = TestEnv::new();
    env.write_source("keep.txt", "k", 100);
    env.write_destination("gone/deep/x.txt", "x", 100);
    env.write_destination("gone/y.txt", "y", 100);

    let report = sync_local(&env, true, false, PathFilter::default()).unwrap();

    assert_eq!(report.deleted, vec!["gone"]);
    assert!(!env.destination.join("gone").exists());
}

#[test]
fn nested_levels_are_reconciled() {
    let env = TestEnv::new();
    env.write_source("sub/a.txt", "a", 100);
    env.write_destination("sub/a.txt", "a", 100);
    env.write_destination("sub/stale.txt", "s", 100);

    let report = sync_local(&env, true, false, PathFilter::default()).unwrap();

    assert_eq!(report.deleted, vec!["sub/stale.txt"]);
    assert_eq!(
        env.destination_tree().keys().collect::<Vec<_>>(),
        vec!["sub/", "sub/a.txt"]
    );
}

#[test]
fn mirrored_tree_matches_source() {
    let env = TestEnv::new();
    env.write_source("a.txt", "alpha", 100);
    env.write_source("x/y/z.txt", "zed", 100);
    env.write_destination("b.txt", "beta", 100);
    env.write_destination("x/old/q.txt", "q", 100);

    sync_local(&env, true, false, PathFilter::default()).unwrap();

    assert_eq!(env.destination_tree(), env.source_tree());
}

#[test]
fn reverse_direction_copies_back_to_source() {
    let env = TestEnv::new();
    env.write_destination("from-dest.txt", "d", 100);
    env.write_source("only-source.txt", "s", 100);

    let config = SyncConfiguration::new(
        Endpoint::local(&env.source),
        Endpoint::local(&env.destination),
    )
    .with_delete(true);
    let report = SyncEngine::new()
        .sync(
            &config,
            SyncDirection::ToSource,
            &[],
            false,
            &FilterChain::new(),
        )
        .unwrap();

    assert_eq!(report.copied, vec!["from-dest.txt"]);
    assert_eq!(report.deleted, vec!["only-source.txt"]);
    assert_eq!(env.source_tree(), env.destination_tree());
}

#[test]
fn two_way_fails_before_touching_anything() {
    let env = TestEnv::new();
    env.write_source("a.txt", "alpha", 100);
    env.write_destination("extra.txt", "extra", 100);

    let config = SyncConfiguration::new(
        Endpoint::local(&env.source),
        Endpoint::local(&env.destination),
    )
    .with_delete(true);
    let err = SyncEngine::new()
        .sync(&config, SyncDirection::TwoWay, &[], false, &FilterChain::new())
        .unwrap_err();

    assert!(matches!(err, SyncError::Configuration(_)));
    assert!(err.to_string().contains("two-way"));
    assert_eq!(
        fs::read_dir(&env.destination).unwrap().count(),
        1,
        "destination must be untouched"
    );
}
