//! Deferred filesystem mutations.
//!
//! Planning code never touches the filesystem; it emits [`Action`] values
//! collected into a [`Plan`].  A plan can be described (dry run) or applied
//! in order by the [`runner`](crate::runner).
pub mod bookkeeping;
pub mod error;
pub mod helpers;
pub mod relocate;
pub mod symlink;

use std::path::{Path, PathBuf};

use anyhow::Result;

pub use bookkeeping::{FinalizePrune, WriteManifest};
pub use relocate::{DeleteWeed, MoveIntoPackage, MoveOutOfPackage};
pub use symlink::{PruneSymlink, WriteSymlink};

/// Interface shared by every kind of mutation.
pub trait Mutation {
    /// Human-readable description of the mutation.
    fn description(&self) -> String;

    /// Perform the mutation.
    ///
    /// # Errors
    ///
    /// Returns an error if the filesystem no longer matches what planning
    /// saw (see [`error::ActionError`]) or if an I/O operation fails.
    fn apply(&self) -> Result<()>;
}

/// Name and root of the package an action acts on behalf of.
///
/// Actions carry this instead of a full [`Package`](crate::garden::Package)
/// so they stay cheap to clone and free of ignore rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRef {
    /// Package name.
    pub name: String,
    /// Absolute package root.
    pub root: PathBuf,
}

impl PackageRef {
    /// Create a reference to the package `name` rooted at `root`.
    #[must_use]
    pub const fn new(name: String, root: PathBuf) -> Self {
        Self { name, root }
    }

    /// Return `true` if `path` is a symlink pointing into this package.
    #[must_use]
    pub fn owns(&self, path: &Path) -> bool {
        helpers::fs::points_under(path, &self.root)
    }
}

/// One filesystem mutation.
#[derive(Debug, Clone)]
pub enum Action {
    /// Delete an unowned file from the garden.
    DeleteWeed(DeleteWeed),
    /// Remove a package's symlink from the garden.
    PruneSymlink(PruneSymlink),
    /// Move a garden file into a package.
    MoveIntoPackage(MoveIntoPackage),
    /// Move a package file back into the garden.
    MoveOutOfPackage(MoveOutOfPackage),
    /// Link a garden path to a package file.
    WriteSymlink(WriteSymlink),
    /// Persist the manifest.
    WriteManifest(WriteManifest),
    /// Mark a pruned package record as gone.
    FinalizePrune(FinalizePrune),
}

impl Action {
    fn inner(&self) -> &dyn Mutation {
        match self {
            Self::DeleteWeed(a) => a,
            Self::PruneSymlink(a) => a,
            Self::MoveIntoPackage(a) => a,
            Self::MoveOutOfPackage(a) => a,
            Self::WriteSymlink(a) => a,
            Self::WriteManifest(a) => a,
            Self::FinalizePrune(a) => a,
        }
    }
}

impl Mutation for Action {
    fn description(&self) -> String {
        self.inner().description()
    }

    fn apply(&self) -> Result<()> {
        self.inner().apply()
    }
}

macro_rules! impl_from_mutation {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Action {
                fn from(action: $variant) -> Self {
                    Self::$variant(action)
                }
            }
        )*
    };
}

impl_from_mutation!(
    DeleteWeed,
    PruneSymlink,
    MoveIntoPackage,
    MoveOutOfPackage,
    WriteSymlink,
    WriteManifest,
    FinalizePrune,
);

/// An ordered list of actions produced by one planning operation.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    actions: Vec<Action>,
}

impl Plan {
    /// Create an empty plan.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    /// Append an action.
    pub fn push(&mut self, action: impl Into<Action>) {
        self.actions.push(action.into());
    }

    /// Number of actions.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.actions.len()
    }

    /// Return `true` if the plan does nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Iterate over the actions in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Action> {
        self.actions.iter()
    }

    /// Descriptions of every action, in order.
    #[must_use]
    pub fn descriptions(&self) -> Vec<String> {
        self.actions.iter().map(Mutation::description).collect()
    }

    /// Apply every action in order, stopping at the first failure.
    ///
    /// This is the quiet variant for library callers; the CLI goes through
    /// [`runner::execute`](crate::runner::execute) for progress output and
    /// cancellation.
    ///
    /// # Errors
    ///
    /// Returns the first action's error, with its description as context.
    pub fn apply(&self) -> Result<()> {
        use anyhow::Context as _;
        for action in &self.actions {
            action
                .apply()
                .with_context(|| format!("action failed: {}", action.description()))?;
        }
        Ok(())
    }
}

impl IntoIterator for Plan {
    type Item = Action;
    type IntoIter = std::vec::IntoIter<Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.into_iter()
    }
}

impl<'a> IntoIterator for &'a Plan {
    type Item = &'a Action;
    type IntoIter = std::slice::Iter<'a, Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}
