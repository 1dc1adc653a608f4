//! Scenario: whole-run delegation to an external copy tool.
//!
//! `/bin/sh -c` stands in for the tool so the argument vector can be
//! recorded and the copy carried out with `cp`.

#![cfg(unix)]

use std::fs;
use std::path::Path;

use treesync::{
    DelegateOptions, Endpoint, FilterChain, PathFilter, SyncConfiguration, SyncDirection,
    SyncEngine, SyncError, TransportMode,
};

use crate::common::*;

/// Shell stand-in: logs its arguments, then copies source contents.
fn fake_tool(log: &Path) -> DelegateOptions {
    let script = format!(
        r#"printf '%s\n' "$@" > '{}'; for a; do src=$dst; dst=$a; done; cp -R "$src." "$dst""#,
        log.display()
    );
    DelegateOptions {
        tool: "/bin/sh".into(),
        options: vec!["-c".to_string(), script, "fake-tool".to_string()],
        credential_flag: "--password-file".to_string(),
    }
}

fn delegated_config(env: &TestEnv, delegate: DelegateOptions) -> SyncConfiguration {
    SyncConfiguration::new(
        Endpoint::local(&env.source),
        Endpoint::local(&env.destination),
    )
    .with_mode(TransportMode::Delegate)
    .with_delegate(delegate)
}

fn logged_args(log: &Path) -> Vec<String> {
    fs::read_to_string(log)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn delegated_run_copies_tree_and_reports_delegation() {
    let env = TestEnv::new();
    env.write_source("a.txt", "alpha", 100);
    env.write_source("sub/b.txt", "beta", 50);
    let log = env.root().join("args.log");

    let config = delegated_config(&env, fake_tool(&log));
    let report = SyncEngine::new()
        .sync(
            &config,
            SyncDirection::ToDestination,
            &[],
            false,
            &FilterChain::new(),
        )
        .unwrap();

    assert!(report.delegated);
    assert!(report.copied.is_empty());
    assert_eq!(env.destination_tree(), env.source_tree());
    assert_eq!(
        logged_args(&log),
        vec![
            format!("{}/", env.source.display()),
            env.destination.display().to_string(),
        ]
    );
}

#[test]
fn run_flags_and_excludes_reach_the_tool() {
    let env = TestEnv::new();
    env.write_source("a.txt", "alpha", 100);
    let log = env.root().join("args.log");

    let config = delegated_config(&env, fake_tool(&log))
        .with_delete(true)
        .with_filter(PathFilter::excluding(["cache"]));
    SyncEngine::new()
        .sync(
            &config,
            SyncDirection::ToDestination,
            &[],
            true,
            &FilterChain::from(PathFilter::excluding(["tmp"])),
        )
        .unwrap();

    let args = logged_args(&log);
    assert_eq!(
        &args[..4],
        &["--ignore-times", "--delete", "--exclude=/cache*", "--exclude=/tmp*"]
    );
}

#[test]
fn failing_tool_surfaces_exit_code_and_stderr() {
    let env = TestEnv::new();
    env.write_source("a.txt", "alpha", 100);

    let delegate = DelegateOptions {
        tool: "/bin/sh".into(),
        options: vec![
            "-c".to_string(),
            "echo 'no space left' >&2; exit 23".to_string(),
            "fake-tool".to_string(),
        ],
        credential_flag: "--password-file".to_string(),
    };
    let err = SyncEngine::new()
        .sync(
            &delegated_config(&env, delegate),
            SyncDirection::ToDestination,
            &[],
            false,
            &FilterChain::new(),
        )
        .unwrap_err();

    match err {
        SyncError::DelegatedTool { code, stderr, .. } => {
            assert_eq!(code, Some(23));
            assert!(stderr.contains("no space left"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn reverse_direction_is_refused() {
    let env = TestEnv::new();
    let log = env.root().join("args.log");

    let err = SyncEngine::new()
        .sync(
            &delegated_config(&env, fake_tool(&log)),
            SyncDirection::ToSource,
            &[],
            false,
            &FilterChain::new(),
        )
        .unwrap_err();

    assert!(matches!(err, SyncError::Configuration(_)));
    assert!(!log.exists());
}

#[test]
fn include_gated_filter_is_refused() {
    let env = TestEnv::new();
    let log = env.root().join("args.log");

    let config = delegated_config(&env, fake_tool(&log)).with_filter(PathFilter::new(
        vec!["docs".to_string()],
        vec!["docs/tmp".to_string()],
    ));
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
    assert!(!log.exists());
}

#[test]
fn dry_run_is_forwarded() {
    let env = TestEnv::new();
    let log = env.root().join("args.log");
    let delegate = DelegateOptions {
        tool: "/bin/sh".into(),
        options: vec![
            "-c".to_string(),
            format!(r#"printf '%s\n' "$@" > '{}'"#, log.display()),
            "fake-tool".to_string(),
        ],
        credential_flag: "--password-file".to_string(),
    };

    let report = SyncEngine::new()
        .with_dry_run(true)
        .sync(
            &delegated_config(&env, delegate),
            SyncDirection::ToDestination,
            &[],
            false,
            &FilterChain::new(),
        )
        .unwrap();

    assert!(report.dry_run);
    assert_eq!(logged_args(&log)[0], "--dry-run");
}
