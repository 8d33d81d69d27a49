//! Garden operations built on top of [`tend`](super::tend).
//!
//! Each public operation plans atomically and emits at most one manifest
//! write, as its last action.
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::package::{Package, files_under};
use super::record::PackageRecord;
use super::tend::TendOptions;
use super::{Garden, SHED_NAME};
use crate::actions::helpers::fs::{absolute, lexists};
use crate::actions::{
    FinalizePrune, MoveIntoPackage, MoveOutOfPackage, Plan, PruneSymlink, WriteSymlink,
};
use crate::error::{GardenError, OwnershipError, PreconditionError};

impl Garden {
    /// Create the garden's shed and an empty manifest.
    ///
    /// With `reset`, every planted package is pruned first; without it an
    /// existing shed is an error.
    ///
    /// # Errors
    ///
    /// Returns [`PreconditionError::GardenExists`] if the garden is already
    /// prepared and `reset` is false, or any tend error.
    pub fn prepare(&mut self, reset: bool, options: TendOptions) -> Result<Plan, GardenError> {
        self.atomically(|garden| {
            let mut plan = Plan::new();
            if reset {
                for name in garden.package_names() {
                    garden.plan_prune_one(&mut plan, &name)?;
                }
                garden.plan_tend(&mut plan, options)?;
            } else if garden.shed_path().exists() {
                return Err(PreconditionError::GardenExists(garden.root.clone()).into());
            }
            garden.dirty = true;
            garden.clean(&mut plan)?;
            Ok(plan)
        })
    }

    /// Plant `packages` at the highest precedence and tend.
    ///
    /// With `replace`, a package that reuses a planted name retires the old
    /// record (unlinking what it owns) and takes over its precedence slot.
    ///
    /// # Errors
    ///
    /// Returns an error if a package root is not a directory, if a name is
    /// already planted and `replace` is false, or any tend error.
    pub fn plant(
        &mut self,
        packages: Vec<Package>,
        replace: bool,
        options: TendOptions,
    ) -> Result<Plan, GardenError> {
        self.atomically(|garden| {
            let mut plan = Plan::new();
            for package in packages {
                if !package.root().is_dir() {
                    return Err(PreconditionError::NotADirectory {
                        path: package.root().to_path_buf(),
                        role: "package",
                    }
                    .into());
                }

                match garden.position(package.name()) {
                    Ok(_) if !replace => {
                        return Err(PreconditionError::DuplicatePackage {
                            name: package.name().to_string(),
                            garden: garden.root.clone(),
                        }
                        .into());
                    }
                    Ok(idx) => {
                        let record = garden.retire(&mut plan, idx, &package);
                        garden.records.insert(idx + 1, record);
                    }
                    Err(_) => garden.records.push(PackageRecord::new(package)),
                }
                garden.dirty = true;
            }

            garden.plan_tend(&mut plan, options)?;
            garden.clean(&mut plan)?;
            Ok(plan)
        })
    }

    /// Retire the record at `idx` in favour of `successor`.
    ///
    /// Links the successor would own anyway (same root) are carried over
    /// instead of being unlinked and rewritten.
    fn retire(&self, plan: &mut Plan, idx: usize, successor: &Package) -> PackageRecord {
        let mut kept = BTreeSet::new();
        if let Some(old) = self.records.get(idx) {
            for path in &old.tracked {
                let abs = self.root.join(path);
                if successor.owns(&abs) {
                    kept.insert(path.clone());
                } else if old.package.owns(&abs) {
                    plan.push(PruneSymlink::new(old.package.to_ref(), abs));
                }
            }
            old.liveness.kill();
            plan.push(FinalizePrune::new(
                old.name().to_string(),
                old.liveness.clone(),
            ));
        }
        PackageRecord::with_tracked(successor.clone(), kept)
    }

    /// Unplant the named packages, then tend.
    ///
    /// # Errors
    ///
    /// Returns [`PreconditionError::UnknownPackage`] for a name that is not
    /// planted, or any tend error.
    pub fn prune<S: AsRef<str>>(
        &mut self,
        names: &[S],
        options: TendOptions,
    ) -> Result<Plan, GardenError> {
        self.atomically(|garden| {
            let mut plan = Plan::new();
            for name in names {
                garden.plan_prune_one(&mut plan, name.as_ref())?;
            }
            garden.plan_tend(&mut plan, options)?;
            garden.clean(&mut plan)?;
            Ok(plan)
        })
    }

    /// Unlink everything `name` still owns and mark its record dying.
    pub(super) fn plan_prune_one(&mut self, plan: &mut Plan, name: &str) -> Result<(), GardenError> {
        let idx = self.position(name)?;
        let Some(record) = self.records.get(idx) else {
            return Err(PreconditionError::UnknownPackage(name.to_string()).into());
        };
        for path in &record.tracked {
            let abs = self.root.join(path);
            if record.package.owns(&abs) {
                plan.push(PruneSymlink::new(record.package.to_ref(), abs));
            }
        }
        record.liveness.kill();
        plan.push(FinalizePrune::new(
            name.to_string(),
            record.liveness.clone(),
        ));
        self.dirty = true;
        Ok(())
    }

    /// Move garden files into the package `name` and link them back.
    ///
    /// Directories are expanded to the files beneath them.  Files the
    /// package already provides are skipped.  A file the package ignores is
    /// moved but neither tracked nor linked.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is not planted, a path is outside the
    /// garden or missing, another package provides it, or the package
    /// already has a file there.
    pub fn cultivate<P: AsRef<Path>>(
        &mut self,
        name: &str,
        files: &[P],
        options: TendOptions,
    ) -> Result<Plan, GardenError> {
        self.atomically(|garden| {
            let mut plan = Plan::new();
            garden.plan_tend(&mut plan, options)?;

            let idx = garden.position(name)?;
            let providers = garden.providers()?;
            let paths = garden.garden_paths(files)?;

            let package = garden
                .records
                .get(idx)
                .map(|r| r.package.to_ref())
                .ok_or_else(|| PreconditionError::UnknownPackage(name.to_string()))?;

            for path in paths {
                let abs = garden.root.join(&path);
                let target = package.root.join(&path);

                match providers.iter().rev().find(|(_, set)| set.contains(&path)) {
                    Some((owner, _)) if *owner == idx => continue,
                    Some((owner, _)) => {
                        let owner = garden
                            .records
                            .get(*owner)
                            .map(|r| r.name().to_string())
                            .unwrap_or_default();
                        return Err(OwnershipError::OwnedByOther { path, owner }.into());
                    }
                    None => {}
                }

                if lexists(&target) {
                    return Err(PreconditionError::PackageHasFile {
                        package: package.name.clone(),
                        path,
                    }
                    .into());
                }
                if !lexists(&abs) {
                    return Err(PreconditionError::MissingFile(abs).into());
                }

                plan.push(MoveIntoPackage::new(
                    package.clone(),
                    abs.clone(),
                    target.clone(),
                ));
                let Some(record) = garden.records.get_mut(idx) else {
                    continue;
                };
                if !record.package.is_ignored(&path) {
                    record.tracked.insert(path);
                    garden.dirty = true;
                    plan.push(WriteSymlink::new(package.clone(), abs, target, true));
                }
            }

            garden.clean(&mut plan)?;
            Ok(plan)
        })
    }

    /// Move files out of the package that provides them, leaving plain
    /// files in the garden.
    ///
    /// # Errors
    ///
    /// Returns an error if a path is outside the garden or is provided by
    /// more than one package.
    pub fn fallow<P: AsRef<Path>>(
        &mut self,
        files: &[P],
        options: TendOptions,
    ) -> Result<Plan, GardenError> {
        self.atomically(|garden| {
            let mut plan = Plan::new();
            garden.plan_tend(&mut plan, options)?;

            let providers = garden.providers()?;
            let paths = garden.garden_paths(files)?;

            for path in paths {
                let mut owners: Vec<usize> = providers
                    .iter()
                    .filter(|(_, set)| set.contains(&path))
                    .map(|(idx, _)| *idx)
                    .collect();
                let Some(winner) = owners.pop() else {
                    continue;
                };
                let abs = garden.root.join(&path);
                if !owners.is_empty() {
                    let shadowed = owners
                        .iter()
                        .filter_map(|i| garden.records.get(*i))
                        .map(|r| r.name().to_string())
                        .collect();
                    return Err(OwnershipError::MultipleProviders {
                        path: abs,
                        shadowed,
                    }
                    .into());
                }

                let Some(record) = garden.records.get_mut(winner) else {
                    continue;
                };
                record.tracked.remove(&path);
                garden.dirty = true;
                let from = record.package.root().join(&path);
                plan.push(MoveOutOfPackage::new(record.package.to_ref(), from, abs));
            }

            garden.clean(&mut plan)?;
            Ok(plan)
        })
    }

    /// Move the package `name` to the highest (`front`) or lowest
    /// precedence, then tend.
    ///
    /// # Errors
    ///
    /// Returns [`PreconditionError::UnknownPackage`] if `name` is not
    /// planted, or any tend error.
    pub fn arrange(
        &mut self,
        name: &str,
        front: bool,
        options: TendOptions,
    ) -> Result<Plan, GardenError> {
        self.atomically(|garden| {
            let idx = garden.position(name)?;
            let before = garden.package_names();

            let record = garden.records.remove(idx);
            if front {
                garden.records.push(record);
            } else {
                garden.records.insert(0, record);
            }
            if garden.package_names() != before {
                garden.dirty = true;
            }

            let mut plan = Plan::new();
            garden.plan_tend(&mut plan, options)?;
            garden.clean(&mut plan)?;
            Ok(plan)
        })
    }

    /// What each active record provides right now, in precedence order.
    fn providers(&self) -> Result<Vec<(usize, BTreeSet<PathBuf>)>, GardenError> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_active())
            .map(|(idx, r)| Ok((idx, r.package.paths()?)))
            .collect()
    }

    /// Resolve command-line paths to garden-relative files, expanding
    /// directories.  Overlapping arguments yield each file once.
    fn garden_paths<P: AsRef<Path>>(
        &self,
        files: &[P],
    ) -> Result<BTreeSet<PathBuf>, GardenError> {
        let mut out = BTreeSet::new();
        for file in files {
            let file = file.as_ref();
            let abs = absolute(file).map_err(|e| GardenError::io(file, e))?;
            let outside = || PreconditionError::OutsideGarden {
                path: abs.clone(),
                garden: self.root.clone(),
            };
            let rel = abs.strip_prefix(&self.root).map_err(|_| outside())?;
            if rel.components().any(|c| c.as_os_str() == SHED_NAME) {
                return Err(outside().into());
            }

            if abs.is_dir() {
                out.extend(files_under(&abs, &self.root)?);
            } else {
                out.insert(rel.to_path_buf());
            }
        }
        Ok(out)
    }
}

#[cfg(all(test, unix))]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::actions::Action;
    use crate::config::test_helpers::write_file;
    use crate::garden::{Liveness, WeedStrategy};

    fn setup() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let garden = dir.path().join("garden");
        let pkgs = dir.path().join("pkgs");
        std::fs::create_dir_all(&garden).unwrap();
        std::fs::create_dir_all(&pkgs).unwrap();
        (dir, garden, pkgs)
    }

    fn package(pkgs: &Path, name: &str, files: &[&str]) -> Package {
        let root = pkgs.join(name);
        std::fs::create_dir_all(&root).unwrap();
        for file in files {
            write_file(&root, file, name);
        }
        Package::load(name, &root).unwrap()
    }

    fn opts() -> TendOptions {
        TendOptions::default()
    }

    // -----------------------------------------------------------------------
    // prepare
    // -----------------------------------------------------------------------

    #[test]
    fn prepare_writes_empty_manifest() {
        let (_dir, garden_root, _) = setup();
        let mut garden = Garden::open(&garden_root).unwrap();

        let plan = garden.prepare(false, opts()).unwrap();
        assert_eq!(plan.len(), 1);
        plan.apply().unwrap();

        assert_eq!(
            std::fs::read_to_string(garden_root.join(".symlink-garden/manifest.json")).unwrap(),
            "{}"
        );
        assert!(matches!(
            Garden::open(&garden_root).unwrap().prepare(false, opts()),
            Err(GardenError::Precondition(PreconditionError::GardenExists(_)))
        ));
    }

    #[test]
    fn prepare_reset_prunes_everything() {
        let (_dir, garden_root, pkgs) = setup();
        let mut garden = Garden::open(&garden_root).unwrap();
        garden.prepare(false, opts()).unwrap().apply().unwrap();
        let a = package(&pkgs, "a", &["x"]);
        garden.plant(vec![a], false, opts()).unwrap().apply().unwrap();

        garden.prepare(true, opts()).unwrap().apply().unwrap();

        assert!(!lexists(&garden_root.join("x")));
        assert!(Garden::open(&garden_root).unwrap().package_names().is_empty());
    }

    // -----------------------------------------------------------------------
    // plant
    // -----------------------------------------------------------------------

    #[test]
    fn plant_rejects_missing_root_and_duplicates() {
        let (_dir, garden_root, pkgs) = setup();
        let mut garden = Garden::open(&garden_root).unwrap();
        let missing = Package::load("m", &pkgs.join("m")).unwrap();
        assert!(matches!(
            garden.plant(vec![missing], false, opts()),
            Err(GardenError::Precondition(PreconditionError::NotADirectory { role: "package", .. }))
        ));

        let a = package(&pkgs, "a", &["x"]);
        garden.plant(vec![a.clone()], false, opts()).unwrap().apply().unwrap();
        assert!(matches!(
            garden.plant(vec![a], false, opts()),
            Err(GardenError::Precondition(PreconditionError::DuplicatePackage { .. }))
        ));
    }

    #[test]
    fn plant_replace_swaps_root_in_place() {
        let (_dir, garden_root, pkgs) = setup();
        let mut garden = Garden::open(&garden_root).unwrap();
        let a = package(&pkgs, "a", &["x", "only_old"]);
        let b = package(&pkgs, "b", &["z"]);
        garden.plant(vec![a, b], false, opts()).unwrap().apply().unwrap();

        let new_root = pkgs.join("a2");
        write_file(&new_root, "x", "new");
        let replacement = Package::load("a", &new_root).unwrap();
        garden
            .plant(vec![replacement], true, opts())
            .unwrap()
            .apply()
            .unwrap();

        assert_eq!(garden.package_names(), ["a", "b"]);
        assert_eq!(std::fs::read_to_string(garden_root.join("x")).unwrap(), "new");
        assert!(!lexists(&garden_root.join("only_old")));
    }

    #[test]
    fn plant_replace_same_root_keeps_links() {
        let (_dir, garden_root, pkgs) = setup();
        let mut garden = Garden::open(&garden_root).unwrap();
        let a = package(&pkgs, "a", &["x"]);
        garden.plant(vec![a.clone()], false, opts()).unwrap().apply().unwrap();

        let plan = garden.plant(vec![a], true, opts()).unwrap();
        assert!(!plan.iter().any(|a| matches!(a, Action::PruneSymlink(_))));
        plan.apply().unwrap();

        assert!(lexists(&garden_root.join("x")));
        assert!(garden.tend(opts()).unwrap().is_empty());
    }

    // -----------------------------------------------------------------------
    // prune
    // -----------------------------------------------------------------------

    #[test]
    fn prune_unlinks_and_reveals_shadowed() {
        let (_dir, garden_root, pkgs) = setup();
        let mut garden = Garden::open(&garden_root).unwrap();
        let a = package(&pkgs, "a", &["p"]);
        let b = package(&pkgs, "b", &["p", "q"]);
        garden.plant(vec![a, b], false, opts()).unwrap().apply().unwrap();

        let plan = garden.prune(&["b"], opts()).unwrap();
        assert_eq!(garden.records()[1].liveness.get(), Liveness::Dying);
        plan.apply().unwrap();
        assert_eq!(garden.records()[1].liveness.get(), Liveness::Gone);

        assert_eq!(std::fs::read_to_string(garden_root.join("p")).unwrap(), "a");
        assert!(!lexists(&garden_root.join("q")));
        assert!(garden.tend(opts()).unwrap().is_empty());
        assert_eq!(garden.package_names(), ["a"]);
    }

    #[test]
    fn prune_unknown_package() {
        let (_dir, garden_root, _) = setup();
        let mut garden = Garden::open(&garden_root).unwrap();
        assert!(matches!(
            garden.prune(&["nope"], opts()),
            Err(GardenError::Precondition(PreconditionError::UnknownPackage(_)))
        ));
    }

    #[test]
    fn failed_prune_leaves_the_garden_untouched() {
        let (_dir, garden_root, pkgs) = setup();
        let mut garden = Garden::open(&garden_root).unwrap();
        let a = package(&pkgs, "a", &["x"]);
        garden.plant(vec![a], false, opts()).unwrap().apply().unwrap();

        assert!(garden.prune(&["a", "nope"], opts()).is_err());

        assert!(garden.record("a").unwrap().is_active());
        assert!(garden.tend(opts()).unwrap().is_empty());
        assert!(lexists(&garden_root.join("x")));
    }

    #[test]
    fn failed_plant_is_forgotten() {
        let (_dir, garden_root, pkgs) = setup();
        let mut garden = Garden::open(&garden_root).unwrap();
        let a = package(&pkgs, "a", &["bin/foo"]);
        write_file(&garden_root, "bin/foo", "mine");

        assert!(matches!(
            garden.plant(vec![a], false, opts()),
            Err(GardenError::Ownership(OwnershipError::Weed { .. }))
        ));

        let herbicide = TendOptions {
            weeds: WeedStrategy::Herbicide,
            ..TendOptions::default()
        };
        assert!(garden.tend(herbicide).unwrap().is_empty());
        assert!(garden.package_names().is_empty());
    }

    // -----------------------------------------------------------------------
    // cultivate / fallow
    // -----------------------------------------------------------------------

    #[test]
    fn cultivate_then_fallow_round_trip() {
        let (_dir, garden_root, pkgs) = setup();
        let mut garden = Garden::open(&garden_root).unwrap();
        let a = package(&pkgs, "a", &[]);
        garden.plant(vec![a], false, opts()).unwrap().apply().unwrap();
        let readme = write_file(&garden_root, "README.md", "hello");

        garden
            .cultivate("a", &[&readme], opts())
            .unwrap()
            .apply()
            .unwrap();

        assert!(readme.symlink_metadata().unwrap().is_symlink());
        assert_eq!(
            std::fs::read_to_string(pkgs.join("a/README.md")).unwrap(),
            "hello"
        );
        assert!(garden.record("a").unwrap().tracked.contains(Path::new("README.md")));

        garden.fallow(&[&readme], opts()).unwrap().apply().unwrap();

        assert!(!readme.symlink_metadata().unwrap().is_symlink());
        assert_eq!(std::fs::read_to_string(&readme).unwrap(), "hello");
        assert!(!lexists(&pkgs.join("a/README.md")));
        assert!(garden.record("a").unwrap().tracked.is_empty());
    }

    #[test]
    fn cultivate_expands_directories_and_skips_owned() {
        let (_dir, garden_root, pkgs) = setup();
        let mut garden = Garden::open(&garden_root).unwrap();
        let a = package(&pkgs, "a", &["conf/linked"]);
        garden.plant(vec![a], false, opts()).unwrap().apply().unwrap();
        write_file(&garden_root, "conf/new", "n");

        let plan = garden
            .cultivate("a", &[garden_root.join("conf")], opts())
            .unwrap();

        assert_eq!(plan.len(), 3, "{:?}", plan.descriptions());
        plan.apply().unwrap();
        assert!(pkgs.join("a/conf/new").exists());
    }

    #[test]
    fn overlapping_arguments_are_handled_once() {
        let (_dir, garden_root, pkgs) = setup();
        let mut garden = Garden::open(&garden_root).unwrap();
        let a = package(&pkgs, "a", &[]);
        garden.plant(vec![a], false, opts()).unwrap().apply().unwrap();
        write_file(&garden_root, "conf/rc", "hello");
        let args = [garden_root.join("conf"), garden_root.join("conf/rc")];

        let plan = garden.cultivate("a", &args, opts()).unwrap();
        assert_eq!(plan.len(), 3, "{:?}", plan.descriptions());
        plan.apply().unwrap();
        assert_eq!(
            std::fs::read_to_string(pkgs.join("a/conf/rc")).unwrap(),
            "hello"
        );

        let plan = garden.fallow(&args, opts()).unwrap();
        assert_eq!(plan.len(), 2, "{:?}", plan.descriptions());
        plan.apply().unwrap();
        assert_eq!(
            std::fs::read_to_string(garden_root.join("conf/rc")).unwrap(),
            "hello"
        );
        assert!(!lexists(&pkgs.join("a/conf/rc")));
    }

    #[test]
    fn cultivate_refuses_other_owner_and_outside_paths() {
        let (dir, garden_root, pkgs) = setup();
        let mut garden = Garden::open(&garden_root).unwrap();
        let a = package(&pkgs, "a", &[]);
        let b = package(&pkgs, "b", &["x"]);
        garden.plant(vec![a, b], false, opts()).unwrap().apply().unwrap();

        assert!(matches!(
            garden.cultivate("a", &[garden_root.join("x")], opts()),
            Err(GardenError::Ownership(OwnershipError::OwnedByOther { .. }))
        ));
        assert!(matches!(
            garden.cultivate("a", &[dir.path().join("elsewhere")], opts()),
            Err(GardenError::Precondition(PreconditionError::OutsideGarden { .. }))
        ));
        assert!(matches!(
            garden.cultivate("a", &[garden_root.join("missing")], opts()),
            Err(GardenError::Precondition(PreconditionError::MissingFile(_)))
        ));
    }

    #[test]
    fn cultivate_ignored_file_is_moved_not_linked() {
        let (_dir, garden_root, pkgs) = setup();
        let mut garden = Garden::open(&garden_root).unwrap();
        let root = pkgs.join("a");
        write_file(&root, "GARDEN_PACKAGE.json", r#"{"ignore": ["*.log"]}"#);
        let a = Package::load("a", &root).unwrap();
        garden.plant(vec![a], false, opts()).unwrap().apply().unwrap();
        let log = write_file(&garden_root, "run.log", "");

        garden.cultivate("a", &[&log], opts()).unwrap().apply().unwrap();

        assert!(!lexists(&log));
        assert!(root.join("run.log").exists());
        assert!(garden.record("a").unwrap().tracked.is_empty());
    }

    #[test]
    fn fallow_refuses_shadowed_path() {
        let (_dir, garden_root, pkgs) = setup();
        let mut garden = Garden::open(&garden_root).unwrap();
        let a = package(&pkgs, "a", &["p"]);
        let b = package(&pkgs, "b", &["p"]);
        garden.plant(vec![a, b], false, opts()).unwrap().apply().unwrap();

        let err = garden.fallow(&[garden_root.join("p")], opts()).unwrap_err();
        assert!(matches!(
            err,
            GardenError::Ownership(OwnershipError::MultipleProviders { ref shadowed, .. })
                if shadowed == &["a".to_string()]
        ));
    }

    // -----------------------------------------------------------------------
    // arrange
    // -----------------------------------------------------------------------

    #[test]
    fn arrange_front_changes_winner() {
        let (_dir, garden_root, pkgs) = setup();
        let mut garden = Garden::open(&garden_root).unwrap();
        let a = package(&pkgs, "a", &["p"]);
        let b = package(&pkgs, "b", &["p"]);
        garden.plant(vec![a, b], false, opts()).unwrap().apply().unwrap();

        garden.arrange("a", true, opts()).unwrap().apply().unwrap();

        assert_eq!(garden.package_names(), ["b", "a"]);
        assert_eq!(std::fs::read_to_string(garden_root.join("p")).unwrap(), "a");
        assert!(garden.arrange("a", true, opts()).unwrap().is_empty());
    }
}
