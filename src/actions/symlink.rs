//! Symlink actions.
use anyhow::{Context as _, Result};
use std::path::PathBuf;

use super::error::ActionError;
use super::helpers::fs::{create_symlink, ensure_parent_dir, lexists, remove_symlink};
use super::{Mutation, PackageRef};

/// Link a garden path to a file inside a package.
#[derive(Debug, Clone)]
pub struct WriteSymlink {
    /// Package that provides the target.
    pub package: PackageRef,
    /// Absolute garden path where the link is written.
    pub link: PathBuf,
    /// Absolute path of the package file.
    pub target: PathBuf,
    /// Refuse to replace anything that already exists at `link`.
    pub no_shadow: bool,
}

impl WriteSymlink {
    /// Create a new symlink action.
    #[must_use]
    pub const fn new(package: PackageRef, link: PathBuf, target: PathBuf, no_shadow: bool) -> Self {
        Self {
            package,
            link,
            target,
            no_shadow,
        }
    }
}

impl Mutation for WriteSymlink {
    fn description(&self) -> String {
        format!(
            "Write symlink {} -> {}",
            self.link.display(),
            self.target.display()
        )
    }

    fn apply(&self) -> Result<()> {
        if self.target.is_dir() {
            return Err(ActionError::TargetIsDirectory(self.target.clone()).into());
        }

        let existing = self.link.symlink_metadata().ok();
        if let Some(meta) = &existing {
            if !meta.is_symlink() {
                return Err(ActionError::UnresolvedWeed(self.link.clone()).into());
            }
            if self.no_shadow {
                return Err(ActionError::WouldShadow(self.link.clone()).into());
            }
        }

        ensure_parent_dir(&self.link)?;
        if existing.is_some() {
            remove_symlink(&self.link)
                .with_context(|| format!("remove existing: {}", self.link.display()))?;
        }
        create_symlink(&self.target, &self.link)
            .with_context(|| format!("create link: {}", self.link.display()))
    }
}

/// Remove a package's symlink from the garden.
#[derive(Debug, Clone)]
pub struct PruneSymlink {
    /// Package that should own the link.
    pub package: PackageRef,
    /// Absolute garden path of the link.
    pub link: PathBuf,
}

impl PruneSymlink {
    /// Create a new prune action.
    #[must_use]
    pub const fn new(package: PackageRef, link: PathBuf) -> Self {
        Self { package, link }
    }
}

impl Mutation for PruneSymlink {
    fn description(&self) -> String {
        format!(
            "Prune symlink from package '{}' at {}",
            self.package.name,
            self.link.display()
        )
    }

    fn apply(&self) -> Result<()> {
        if !lexists(&self.link) {
            return Ok(());
        }
        if !self.package.owns(&self.link) {
            return Err(ActionError::NotOwned {
                path: self.link.clone(),
                package: self.package.name.clone(),
            }
            .into());
        }
        remove_symlink(&self.link)
    }
}
