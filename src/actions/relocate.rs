//! Actions that delete or move real files.
use anyhow::{Context as _, Result};
use std::path::PathBuf;

use super::error::ActionError;
use super::helpers::fs::{ensure_parent_dir, lexists, move_adjust, remove_symlink};
use super::{Mutation, PackageRef};

/// Delete an unowned file from the garden.
#[derive(Debug, Clone)]
pub struct DeleteWeed {
    /// Absolute garden path of the weed.
    pub path: PathBuf,
}

impl DeleteWeed {
    /// Create a new delete action.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Mutation for DeleteWeed {
    fn description(&self) -> String {
        format!("Delete weed at {}", self.path.display())
    }

    fn apply(&self) -> Result<()> {
        remove_symlink(&self.path).with_context(|| format!("delete weed: {}", self.path.display()))
    }
}

/// Move a file from the garden into a package.
#[derive(Debug, Clone)]
pub struct MoveIntoPackage {
    /// Receiving package.
    pub package: PackageRef,
    /// Absolute garden path.
    pub from: PathBuf,
    /// Absolute path inside the package.
    pub to: PathBuf,
}

impl MoveIntoPackage {
    /// Create a new move action.
    #[must_use]
    pub const fn new(package: PackageRef, from: PathBuf, to: PathBuf) -> Self {
        Self { package, from, to }
    }
}

impl Mutation for MoveIntoPackage {
    fn description(&self) -> String {
        format!("Move {} to {}", self.from.display(), self.to.display())
    }

    fn apply(&self) -> Result<()> {
        if lexists(&self.to) {
            return Err(ActionError::DestinationExists {
                package: self.package.name.clone(),
                path: self.to.clone(),
            }
            .into());
        }
        ensure_parent_dir(&self.to)?;
        move_adjust(&self.from, &self.to)
    }
}

/// Move a file out of a package, replacing the garden symlink to it.
#[derive(Debug, Clone)]
pub struct MoveOutOfPackage {
    /// Package giving up the file.
    pub package: PackageRef,
    /// Absolute path inside the package.
    pub from: PathBuf,
    /// Absolute garden path.
    pub to: PathBuf,
}

impl MoveOutOfPackage {
    /// Create a new move action.
    #[must_use]
    pub const fn new(package: PackageRef, from: PathBuf, to: PathBuf) -> Self {
        Self { package, from, to }
    }
}

impl Mutation for MoveOutOfPackage {
    fn description(&self) -> String {
        format!("Move {} to {}", self.from.display(), self.to.display())
    }

    fn apply(&self) -> Result<()> {
        if lexists(&self.to) {
            if !self.package.owns(&self.to) {
                return Err(ActionError::NotOwned {
                    path: self.to.clone(),
                    package: self.package.name.clone(),
                }
                .into());
            }
            remove_symlink(&self.to)?;
        }
        ensure_parent_dir(&self.to)?;
        move_adjust(&self.from, &self.to)
    }
}
