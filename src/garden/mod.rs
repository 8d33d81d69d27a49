//! The garden: a directory of symlinks into planted packages.
//!
//! [`Garden`] holds the package records loaded from the manifest in
//! precedence order (lowest first).  Every public operation plans against
//! the current filesystem and returns a [`Plan`](crate::actions::Plan);
//! nothing is mutated on disk until the plan is applied.
//!
//! - **[`tend`]** - reconcile links with what packages provide
//! - **[`ops`]** - plant, prune, cultivate, fallow, arrange, prepare
//! - **[`weeds`]** - conflict policy for unowned files
//! - **[`manifest`]** - the persisted records
pub mod manifest;
pub mod ops;
pub mod package;
pub mod record;
pub mod tend;
pub mod weeds;

use std::path::{Path, PathBuf};

pub use package::Package;
pub use record::{Liveness, PackageRecord};
pub use tend::TendOptions;
pub use weeds::WeedStrategy;

use crate::actions::helpers::fs::{absolute, lexists};
use crate::actions::{Plan, WriteManifest};
use crate::error::{GardenError, PreconditionError};

/// Name of the metadata directory that marks a garden root.
pub const SHED_NAME: &str = ".symlink-garden";

/// File name of the manifest inside the shed.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// File name of the advisory lock inside the shed.
pub const LOCK_FILE_NAME: &str = "lock";

/// A managed directory and its planted packages.
#[derive(Debug)]
pub struct Garden {
    root: PathBuf,
    records: Vec<PackageRecord>,
    dirty: bool,
}

/// In-memory planning state saved before an operation.
///
/// Liveness handles are shared with pending actions, so their values are
/// saved separately from the records that hold them.
#[derive(Debug)]
struct Checkpoint {
    records: Vec<PackageRecord>,
    liveness: Vec<Liveness>,
    dirty: bool,
}

impl Garden {
    /// Open the garden rooted exactly at `root`.  The shed need not exist
    /// yet; a missing manifest means no packages are planted.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` is not a directory or the manifest is
    /// invalid.
    pub fn open(root: &Path) -> Result<Self, GardenError> {
        let root = absolute(root).map_err(|e| GardenError::io(root, e))?;
        if !root.is_dir() {
            return Err(PreconditionError::NotADirectory {
                path: root,
                role: "garden",
            }
            .into());
        }
        let records = manifest::load(&root.join(SHED_NAME).join(MANIFEST_FILE_NAME))?;
        tracing::debug!(root = %root.display(), packages = records.len(), "opened garden");
        Ok(Self {
            root,
            records,
            dirty: false,
        })
    }

    /// Open the nearest garden at or above `start`.
    ///
    /// # Errors
    ///
    /// Returns [`PreconditionError::GardenNotFound`] if no ancestor holds a
    /// shed, or any error from [`Garden::open`].
    pub fn find(start: &Path) -> Result<Self, GardenError> {
        let start = absolute(start).map_err(|e| GardenError::io(start, e))?;
        if !start.is_dir() {
            return Err(PreconditionError::NotADirectory {
                path: start,
                role: "garden",
            }
            .into());
        }
        start
            .ancestors()
            .find(|dir| dir.join(SHED_NAME).is_dir())
            .map_or_else(
                || Err(PreconditionError::GardenNotFound(start.clone()).into()),
                Self::open,
            )
    }

    /// Absolute garden root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The `.symlink-garden` metadata directory.
    #[must_use]
    pub fn shed_path(&self) -> PathBuf {
        self.root.join(SHED_NAME)
    }

    /// Path of `manifest.json`.
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.shed_path().join(MANIFEST_FILE_NAME)
    }

    /// Path of the advisory lock file.
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        self.shed_path().join(LOCK_FILE_NAME)
    }

    /// `true` once `prepare` has created the shed.
    #[must_use]
    pub fn is_prepared(&self) -> bool {
        self.shed_path().is_dir()
    }

    /// All records, including ones pruned during this session.
    #[must_use]
    pub fn records(&self) -> &[PackageRecord] {
        &self.records
    }

    /// The active record named `name`, if planted.
    #[must_use]
    pub fn record(&self, name: &str) -> Option<&PackageRecord> {
        self.records
            .iter()
            .find(|r| r.is_active() && r.name() == name)
    }

    /// Names of planted packages, lowest precedence first.
    #[must_use]
    pub fn package_names(&self) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| r.is_active())
            .map(|r| r.name().to_string())
            .collect()
    }

    /// Return `true` if `abs_path` is not a weed: either nothing exists
    /// there or it is a symlink owned by an active or dying package.
    #[must_use]
    pub fn owns(&self, abs_path: &Path) -> bool {
        !lexists(abs_path)
            || self
                .records
                .iter()
                .filter(|r| r.answers_ownership())
                .any(|r| r.package.owns(abs_path))
    }

    /// Index of the active record named `name`.
    fn position(&self, name: &str) -> Result<usize, PreconditionError> {
        self.records
            .iter()
            .position(|r| r.is_active() && r.name() == name)
            .ok_or_else(|| PreconditionError::UnknownPackage(name.to_string()))
    }

    /// Drop records whose prune has been applied.
    fn purge_gone(&mut self) {
        self.records.retain(PackageRecord::answers_ownership);
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            records: self.records.clone(),
            liveness: self.records.iter().map(|r| r.liveness.get()).collect(),
            dirty: self.dirty,
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        for (record, liveness) in checkpoint.records.iter().zip(checkpoint.liveness) {
            record.liveness.reset(liveness);
        }
        self.records = checkpoint.records;
        self.dirty = checkpoint.dirty;
    }

    /// Run one planning operation; if it fails, the garden is left exactly
    /// as it was before.
    fn atomically<F>(&mut self, plan_with: F) -> Result<Plan, GardenError>
    where
        F: FnOnce(&mut Self) -> Result<Plan, GardenError>,
    {
        let checkpoint = self.checkpoint();
        let result = plan_with(self);
        if result.is_err() {
            self.restore(checkpoint);
        }
        result
    }

    /// Emit a manifest write if anything changed since the last one.
    fn clean(&mut self, plan: &mut Plan) -> Result<(), GardenError> {
        if self.dirty {
            let contents = manifest::render(&self.records)?;
            plan.push(WriteManifest::new(self.manifest_path(), contents));
            self.dirty = false;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn open_requires_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file");
        std::fs::write(&file, "").unwrap();
        let err = Garden::open(&file).unwrap_err();
        assert!(matches!(
            err,
            GardenError::Precondition(PreconditionError::NotADirectory { role: "garden", .. })
        ));
    }

    #[test]
    fn find_walks_up_to_the_shed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(SHED_NAME)).unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        let garden = Garden::find(&nested).unwrap();
        assert_eq!(garden.root(), absolute(dir.path()).unwrap());
        assert!(garden.is_prepared());
        assert!(garden.package_names().is_empty());
    }

    #[test]
    fn find_without_shed_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Garden::find(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            GardenError::Precondition(PreconditionError::GardenNotFound(_))
        ));
    }

    #[test]
    fn owns_treats_empty_soil_as_owned() {
        let dir = tempfile::tempdir().unwrap();
        let garden = Garden::open(dir.path()).unwrap();
        assert!(garden.owns(&dir.path().join("nothing")));

        let weed = dir.path().join("weed");
        std::fs::write(&weed, "").unwrap();
        assert!(!garden.owns(&weed));
    }

    #[test]
    fn restore_rolls_back_liveness_and_records() {
        let dir = tempfile::tempdir().unwrap();
        let mut garden = Garden::open(dir.path()).unwrap();
        garden
            .records
            .push(PackageRecord::new(Package::load("a", &dir.path().join("a")).unwrap()));
        let checkpoint = garden.checkpoint();

        garden.records[0].liveness.kill();
        garden.records[0].tracked.insert(PathBuf::from("x"));
        garden
            .records
            .push(PackageRecord::new(Package::load("b", &dir.path().join("b")).unwrap()));
        garden.dirty = true;
        garden.restore(checkpoint);

        assert_eq!(garden.package_names(), ["a"]);
        assert!(garden.records[0].tracked.is_empty());
        assert!(!garden.dirty);
    }

    #[test]
    fn clean_only_writes_when_dirty() {
        let dir = tempfile::tempdir().unwrap();
        let mut garden = Garden::open(dir.path()).unwrap();
        let mut plan = Plan::new();

        garden.clean(&mut plan).unwrap();
        assert!(plan.is_empty());

        garden.dirty = true;
        garden.clean(&mut plan).unwrap();
        garden.clean(&mut plan).unwrap();
        assert_eq!(plan.len(), 1);
    }
}
