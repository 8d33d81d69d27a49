//! Reconciliation: bring the garden's links in line with its packages.
//!
//! Tending compares three views of every path: what each package provides
//! now, what the manifest says it last linked, and what is actually on
//! disk.  The result is a plan plus an updated in-memory manifest.
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use super::Garden;
use super::weeds::{CompostBin, WeedStrategy};
use crate::actions::helpers::fs::is_real_dir;
use crate::actions::{Plan, PruneSymlink, WriteSymlink};
use crate::error::{GardenError, OwnershipError, PreconditionError};

/// Policy shared by every operation that tends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TendOptions {
    /// How to deal with weeds blocking a link.
    pub weeds: WeedStrategy,
    /// Fail instead of letting a later package shadow an earlier one.
    pub no_shadow: bool,
}

impl Garden {
    /// Plan the reconciliation of every planted package.
    ///
    /// # Errors
    ///
    /// Returns an error on a shadow conflict (with `no_shadow`), a weed
    /// conflict (with [`WeedStrategy::Fail`]), a directory where a link
    /// belongs, or a package that cannot be read.  No plan is returned in
    /// that case.
    pub fn tend(&mut self, options: TendOptions) -> Result<Plan, GardenError> {
        self.atomically(|garden| {
            let mut plan = Plan::new();
            garden.plan_tend(&mut plan, options)?;
            garden.clean(&mut plan)?;
            Ok(plan)
        })
    }

    /// Append a tend to `plan` without committing the manifest.
    pub(super) fn plan_tend(
        &mut self,
        plan: &mut Plan,
        options: TendOptions,
    ) -> Result<(), GardenError> {
        self.purge_gone();

        let missing: Vec<String> = self
            .records
            .iter()
            .filter(|r| r.is_active() && !r.package.root().is_dir())
            .map(|r| r.name().to_string())
            .collect();
        for name in missing {
            tracing::info!(package = %name, "package directory is gone, pruning");
            self.plan_prune_one(plan, &name)?;
        }

        let provided = self
            .records
            .iter()
            .map(|r| r.is_active().then(|| r.package.paths()).transpose())
            .collect::<Result<Vec<Option<BTreeSet<PathBuf>>>, GardenError>>()?;

        let (links, disowned) = self.link_map(&provided, options.no_shadow)?;

        // Paths a package no longer provides.
        let root = self.root.clone();
        for (record, good) in self.records.iter_mut().zip(&provided) {
            let Some(good) = good else { continue };
            let bad: Vec<PathBuf> = record.tracked.difference(good).cloned().collect();
            for path in bad {
                record.tracked.remove(&path);
                self.dirty = true;
                let abs = root.join(&path);
                if record.package.owns(&abs) {
                    plan.push(PruneSymlink::new(record.package.to_ref(), abs));
                }
            }
        }

        let mut bin = CompostBin::new(&self.shed_path());
        for (path, &winner) in &links {
            let abs = root.join(path);
            if !self.owns(&abs) {
                if is_real_dir(&abs) {
                    return Err(PreconditionError::DirectoryInTheWay(abs).into());
                }
                tracing::debug!(path = %abs.display(), strategy = ?options.weeds, "found weed");
                plan.push(options.weeds.resolve(&root, path, &mut bin)?);
            }

            let Some(record) = self.records.get_mut(winner) else {
                continue;
            };
            if record.tracked.insert(path.clone()) {
                self.dirty = true;
            }
            if !record.package.owns(&abs) {
                let target = record.package.root().join(path);
                plan.push(WriteSymlink::new(
                    record.package.to_ref(),
                    abs,
                    target,
                    options.no_shadow,
                ));
            }
        }

        for (loser, paths) in disowned {
            if let Some(record) = self.records.get_mut(loser) {
                for path in &paths {
                    if record.tracked.remove(path) {
                        self.dirty = true;
                    }
                }
            }
        }

        Ok(())
    }

    /// Decide which record wins each provided path.
    ///
    /// Returns the winner per path, and for every record that lost a path
    /// to a later one, the paths it lost.
    #[allow(clippy::type_complexity)]
    fn link_map(
        &self,
        provided: &[Option<BTreeSet<PathBuf>>],
        no_shadow: bool,
    ) -> Result<(BTreeMap<PathBuf, usize>, BTreeMap<usize, BTreeSet<PathBuf>>), GardenError> {
        let mut links: BTreeMap<PathBuf, usize> = BTreeMap::new();
        let mut disowned: BTreeMap<usize, BTreeSet<PathBuf>> = BTreeMap::new();

        for (idx, good) in provided.iter().enumerate() {
            let Some(good) = good else { continue };
            for path in good {
                if let Some(previous) = links.insert(path.clone(), idx) {
                    if no_shadow {
                        return Err(OwnershipError::Shadow {
                            path: path.clone(),
                            package: self.root_of(idx),
                            shadowed: self.root_of(previous),
                        }
                        .into());
                    }
                    disowned.entry(previous).or_default().insert(path.clone());
                }
            }
        }
        Ok((links, disowned))
    }

    fn root_of(&self, idx: usize) -> String {
        self.records
            .get(idx)
            .map(|r| r.package.root().display().to_string())
            .unwrap_or_default()
    }
}
