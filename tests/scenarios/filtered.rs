//! Scenario: include/exclude prefixes.

use treesync::{
    Endpoint, FilterChain, PathFilter, SyncConfiguration, SyncDirection, SyncEngine, SyncError,
};

use crate::common::*;

#[test]
fn excluded_subtree_is_never_visited() {
    let env = TestEnv::new();
    env.write_source("a.txt", "alpha", 100);
    env.write_source("sub/b.txt", "beta", 50);

    let report = sync_local(&env, false, false, PathFilter::excluding(["sub"])).unwrap();

    assert_eq!(report.copied, vec!["a.txt"]);
    assert!(report.created_dirs.is_empty());
    assert!(!env.destination.join("sub").exists());
}

#[test]
fn excluded_destination_entries_are_protected_from_deletion() {
    let env = TestEnv::new();
    env.write_source("a.txt", "alpha", 100);
    env.write_destination("sub/b.txt", "kept", 50);
    env.write_destination("extra.txt", "gone", 100);

    let report = sync_local(&env, true, false, PathFilter::excluding(["sub"])).unwrap();

    assert_eq!(report.deleted, vec!["extra.txt"]);
    assert!(env.destination.join("sub/b.txt").exists());
}

#[test]
fn includes_apply_only_alongside_excludes() {
    let env = TestEnv::new();
    env.write_source("docs/a.md", "a", 100);
    env.write_source("src/main.rs", "m", 100);
    env.write_source("docs/tmp/x", "x", 100);

    let gated = PathFilter::new(vec!["docs".to_string()], vec!["docs/tmp".to_string()]);
    let report = sync_local(&env, false, false, gated).unwrap();
    assert_eq!(report.copied, vec!["docs/a.md"]);

    let env = TestEnv::new();
    env.write_source("docs/a.md", "a", 100);
    env.write_source("src/main.rs", "m", 100);

    let include_only = PathFilter::new(vec!["docs".to_string()], vec![]);
    let report = sync_local(&env, false, false, include_only).unwrap();
    assert_eq!(report.copied, vec!["docs/a.md", "src/main.rs"]);
}

#[test]
fn call_filter_composes_with_configured_filter() {
    let env = TestEnv::new();
    env.write_source("a.txt", "a", 100);
    env.write_source("b.log", "b", 100);
    env.write_source("cache/c", "c", 100);

    let config = SyncConfiguration::new(
        Endpoint::local(&env.source),
        Endpoint::local(&env.destination),
    )
    .with_filter(PathFilter::excluding(["cache"]));
    let report = SyncEngine::new()
        .sync(
            &config,
            SyncDirection::ToDestination,
            &[],
            false,
            &FilterChain::from(PathFilter::excluding(["b."])),
        )
        .unwrap();

    assert_eq!(report.copied, vec!["a.txt"]);
}

#[test]
fn escaping_filter_prefix_is_rejected() {
    let env = TestEnv::new();
    env.write_source("a.txt", "a", 100);

    let config = SyncConfiguration::new(
        Endpoint::local(&env.source),
        Endpoint::local(&env.destination),
    )
    .with_filter(PathFilter::excluding(["../outside"]));
    let err = SyncEngine::new()
        .sync(
            &config,
            SyncDirection::ToDestination,
            &[],
            false,
            &FilterChain::new(),
        )
        .unwrap_err();

    assert!(matches!(err, SyncError::Configuration(_)));
    assert!(!env.destination.join("a.txt").exists());
}
