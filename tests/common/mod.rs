// Shared helpers for integration tests.
//
// Provides a temporary directory holding a garden and a set of package
// directories, plus a fluent builder so each integration test can set up an
// isolated environment without repeating filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use symlink_garden::actions::Plan;
use symlink_garden::garden::{Garden, Package, TendOptions};
use symlink_garden::logging::{ActionStatus, Log};
use symlink_garden::runner;

/// A [`Log`] that discards everything.
#[derive(Debug, Default)]
pub struct SilentLog;

impl Log for SilentLog {
    fn stage(&self, _msg: &str) {}
    fn info(&self, _msg: &str) {}
    fn debug(&self, _msg: &str) {}
    fn warn(&self, _msg: &str) {}
    fn error(&self, _msg: &str) {}
    fn dry_run(&self, _msg: &str) {}
    fn begin_action(&self, _description: &str) {}
    fn end_action(&self, _ok: bool) {}
    fn record_action(&self, _description: &str, _status: ActionStatus, _message: Option<&str>) {}
}

/// An isolated garden and package area backed by a [`tempfile::TempDir`].
pub struct TestGarden {
    dir: tempfile::TempDir,
}

impl TestGarden {
    /// Create `garden/` and `pkgs/` under a fresh temp directory.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir_all(dir.path().join("garden")).expect("create garden dir");
        std::fs::create_dir_all(dir.path().join("pkgs")).expect("create pkgs dir");
        Self { dir }
    }

    /// Add a package directory holding `files`, each containing its own
    /// package name.
    pub fn with_package(self, name: &str, files: &[&str]) -> Self {
        let root = self.package_root(name);
        std::fs::create_dir_all(&root).expect("create package dir");
        for file in files {
            write(&root.join(file), name);
        }
        self
    }

    /// Add a plain file to the garden.
    pub fn with_weed(self, rel: &str, content: &str) -> Self {
        write(&self.garden_path(rel), content);
        self
    }

    /// Garden root.
    pub fn root(&self) -> PathBuf {
        self.dir.path().join("garden")
    }

    /// Absolute path of `rel` inside the garden.
    pub fn garden_path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    /// Root directory of the package `name`.
    pub fn package_root(&self, name: &str) -> PathBuf {
        self.dir.path().join("pkgs").join(name)
    }

    /// Load the package `name` from disk.
    pub fn package(&self, name: &str) -> Package {
        Package::load(name, &self.package_root(name)).expect("load package")
    }

    /// Open the garden, reading the manifest from disk.
    pub fn open(&self) -> Garden {
        Garden::open(&self.root()).expect("open garden")
    }

    /// Prepare the garden and plant `names` in order.
    pub fn planted(self, names: &[&str]) -> Self {
        apply(
            &self
                .open()
                .prepare(false, TendOptions::default())
                .expect("plan prepare"),
        );
        let packages = names.iter().map(|n| self.package(n)).collect();
        apply(
            &self
                .open()
                .plant(packages, false, TendOptions::default())
                .expect("plan plant"),
        );
        self
    }

    /// Where the symlink at `rel` points, if it is one.
    pub fn link_target(&self, rel: &str) -> Option<PathBuf> {
        std::fs::read_link(self.garden_path(rel)).ok()
    }

    /// Read `rel` through any symlink.
    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.garden_path(rel)).expect("read garden file")
    }

    /// Raw manifest text.
    pub fn manifest_text(&self) -> String {
        std::fs::read_to_string(self.root().join(".symlink-garden/manifest.json"))
            .expect("read manifest")
    }
}

/// Apply `plan` through the runner, panicking on failure.
pub fn apply(plan: &Plan) {
    runner::execute(plan, &SilentLog, false, &AtomicBool::new(false)).expect("execute plan");
}

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent");
    }
    std::fs::write(path, content).expect("write file");
}
