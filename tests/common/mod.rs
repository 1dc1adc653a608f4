//! Common test utilities for treesync integration tests.
//!
//! This module provides:
//! - `TestEnv`: Isolated source/destination trees plus a private HOME
//! - Tree helpers: write files with fixed mtimes, snapshot a tree
//! - `run_cli`: Run the `treesync` binary inside the environment

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tempfile::TempDir;

/// Result of running the CLI
#[derive(Debug)]
pub struct TestResult {
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Isolated source and destination directories
pub struct TestEnv {
    root: TempDir,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub home: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let source = root.path().join("source");
        let destination = root.path().join("destination");
        let home = root.path().join("home");
        for dir in [&source, &destination, &home] {
            fs::create_dir_all(dir).unwrap();
        }
        Self {
            root,
            source,
            destination,
            home,
        }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn write_source(&self, rel: &str, content: &str, mtime_secs: u64) {
        write_file(&self.source, rel, content, mtime_secs);
    }

    pub fn write_destination(&self, rel: &str, content: &str, mtime_secs: u64) {
        write_file(&self.destination, rel, content, mtime_secs);
    }

    pub fn source_tree(&self) -> BTreeMap<String, String> {
        snapshot(&self.source)
    }

    pub fn destination_tree(&self) -> BTreeMap<String, String> {
        snapshot(&self.destination)
    }

    /// Run `treesync` with the environment's root as working directory
    pub fn run_cli(&self, args: &[&str]) -> TestResult {
        self.run_cli_with_env(args, &[])
    }

    pub fn run_cli_with_env(&self, args: &[&str], env: &[(&str, &str)]) -> TestResult {
        let mut command = Command::new(env!("CARGO_BIN_EXE_treesync"));
        command
            .current_dir(self.root())
            .args(args)
            .env("HOME", &self.home)
            .env("XDG_CONFIG_HOME", self.home.join(".config"))
            .env_remove("RUST_LOG");
        for key in [
            "TREESYNC_MODE",
            "TREESYNC_HOST_KEY_POLICY",
            "TREESYNC_DELEGATE_TOOL",
            "TREESYNC_DELETE",
        ] {
            command.env_remove(key);
        }
        for (key, value) in env {
            command.env(key, value);
        }

        let output = command.output().unwrap();
        TestResult {
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

pub fn mtime(secs: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs)
}

pub fn write_file(root: &Path, rel: &str, content: &str, mtime_secs: u64) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    set_mtime(&path, mtime_secs);
}

pub fn set_mtime(path: &Path, secs: u64) {
    fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(mtime(secs))
        .unwrap();
}

pub fn modified(path: &Path) -> SystemTime {
    fs::metadata(path).unwrap().modified().unwrap()
}

/// Relative path to content for files, `"/"` marker for directories
pub fn snapshot(root: &Path) -> BTreeMap<String, String> {
    let mut tree = BTreeMap::new();
    collect(root, root, &mut tree);
    tree
}

fn collect(root: &Path, dir: &Path, tree: &mut BTreeMap<String, String>) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        let rel = path
            .strip_prefix(root)
            .unwrap()
            .to_string_lossy()
            .replace('\\', "/");
        if path.is_dir() {
            tree.insert(format!("{}/", rel), "/".to_string());
            collect(root, &path, tree);
        } else {
            tree.insert(rel, fs::read_to_string(&path).unwrap());
        }
    }
}

/// Sync the environment's source onto its destination through the engine
pub fn sync_local(
    env: &TestEnv,
    delete: bool,
    force: bool,
    filter: treesync::PathFilter,
) -> treesync::SyncResult<treesync::SyncReport> {
    let config = treesync::SyncConfiguration::new(
        treesync::Endpoint::local(&env.source),
        treesync::Endpoint::local(&env.destination),
    )
    .with_delete(delete)
    .with_filter(filter);
    treesync::SyncEngine::new().sync(
        &config,
        treesync::SyncDirection::ToDestination,
        &[],
        force,
        &treesync::FilterChain::new(),
    )
}
