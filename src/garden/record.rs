//! Installed state of one package.
use std::cell::Cell;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::rc::Rc;

use super::package::Package;

/// Where a record is in its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Liveness {
    /// Planted; serialised into the manifest and eligible to provide links.
    #[default]
    Active,
    /// Pruned during this planning pass; still answers ownership queries
    /// until its finalize action runs.
    Dying,
    /// Prune finished; purged at the next planning pass.
    Gone,
}

/// Shared view of a record's [`Liveness`].
///
/// The record and its [`FinalizePrune`](crate::actions::FinalizePrune)
/// action hold clones of the same handle, so applying the action is
/// visible to the garden without the action borrowing it.
#[derive(Debug, Clone, Default)]
pub struct LivenessHandle(Rc<Cell<Liveness>>);

impl LivenessHandle {
    /// Current state.
    #[must_use]
    pub fn get(&self) -> Liveness {
        self.0.get()
    }

    /// `Active` → `Dying`.
    pub fn kill(&self) {
        self.0.set(Liveness::Dying);
    }

    /// `Dying` → `Gone`.
    pub fn finish(&self) {
        self.0.set(Liveness::Gone);
    }

    /// Force the state back to `liveness` when a plan is abandoned.
    pub(crate) fn reset(&self, liveness: Liveness) {
        self.0.set(liveness);
    }
}

/// A planted package together with the paths it currently has linked.
#[derive(Debug, Clone)]
pub struct PackageRecord {
    /// The package as loaded from its directory.
    pub package: Package,
    /// Garden-relative paths represented by live symlinks.
    pub tracked: BTreeSet<PathBuf>,
    /// Lifetime state, shared with a pending finalize action.
    pub liveness: LivenessHandle,
}

impl PackageRecord {
    /// A fresh, empty, active record.
    #[must_use]
    pub fn new(package: Package) -> Self {
        Self::with_tracked(package, BTreeSet::new())
    }

    /// An active record with a known set of tracked paths.
    #[must_use]
    pub fn with_tracked(package: Package, tracked: BTreeSet<PathBuf>) -> Self {
        Self {
            package,
            tracked,
            liveness: LivenessHandle::default(),
        }
    }

    /// Package name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.package.name()
    }

    /// `true` while the record is planted.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.liveness.get() == Liveness::Active
    }

    /// `true` while the record's links must not be treated as weeds.
    #[must_use]
    pub fn answers_ownership(&self) -> bool {
        self.liveness.get() != Liveness::Gone
    }
}
