//! Weed conflict policy.
//!
//! A weed is a file in the garden that is neither empty space nor a
//! symlink owned by a known package.  Weeds are only looked at when a
//! package wants the path they occupy.
use std::path::{Path, PathBuf};

use clap::ValueEnum;

use super::package::Package;
use crate::actions::{Action, DeleteWeed, MoveIntoPackage};
use crate::error::{GardenError, OwnershipError};

/// What to do with a weed that blocks a package's symlink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum WeedStrategy {
    /// Abort planning with a conflict error.
    #[default]
    Fail,
    /// Move the weed into a freshly created compost-bin package.
    Compost,
    /// Delete the weed.
    Herbicide,
}

/// Lazily created rescue package for composted weeds.
///
/// One bin exists per tend; it is only materialised on the first weed.
#[derive(Debug)]
pub struct CompostBin {
    weeds_dir: PathBuf,
    package: Option<Package>,
}

impl CompostBin {
    /// A bin that will live under `<shed>/weeds/` once used.
    #[must_use]
    pub fn new(shed: &Path) -> Self {
        Self {
            weeds_dir: shed.join("weeds"),
            package: None,
        }
    }

    /// The bin's package, created on first call.
    ///
    /// # Errors
    ///
    /// Returns an error if the bin's path cannot be made absolute.
    pub fn package(&mut self) -> Result<&Package, GardenError> {
        let package = match self.package.take() {
            Some(package) => package,
            None => {
                let name = format!("weeds-{}", chrono::Utc::now().format("%Y%m%dT%H%M%S%.6fZ"));
                tracing::debug!(bin = %name, "opened compost bin");
                Package::load(name.clone(), &self.weeds_dir.join(&name))?
            }
        };
        Ok(self.package.insert(package))
    }
}

impl WeedStrategy {
    /// Plan the resolution of the weed at garden-relative `path`.
    ///
    /// # Errors
    ///
    /// [`WeedStrategy::Fail`] always errors with a weed conflict.
    pub fn resolve(
        self,
        garden_root: &Path,
        path: &Path,
        bin: &mut CompostBin,
    ) -> Result<Action, GardenError> {
        let abs = garden_root.join(path);
        match self {
            Self::Fail => Err(OwnershipError::Weed { path: abs }.into()),
            Self::Compost => {
                let package = bin.package()?;
                let to = package.root().join(path);
                Ok(MoveIntoPackage::new(package.to_ref(), abs, to).into())
            }
            Self::Herbicide => Ok(DeleteWeed::new(abs).into()),
        }
    }
}
