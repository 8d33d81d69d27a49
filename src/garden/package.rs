//! Packages: source directories projected into the garden.
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::SHED_NAME;
use crate::actions::PackageRef;
use crate::actions::helpers::fs::{absolute, lexists, points_under};
use crate::config::{IgnoreRules, PackageConfig};
use crate::error::GardenError;

/// A directory whose files should appear in the garden as symlinks.
#[derive(Debug, Clone)]
pub struct Package {
    name: String,
    root: PathBuf,
    config_file: &'static str,
    ignore: IgnoreRules,
}

impl Package {
    /// Load the package `name` rooted at `root`.
    ///
    /// A missing root is allowed so that records for deleted packages can
    /// still be loaded from the manifest; its config is then the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be made absolute, or if the
    /// package config exists but is unreadable or has an invalid pattern.
    pub fn load(name: impl Into<String>, root: &Path) -> Result<Self, GardenError> {
        let root = absolute(root).map_err(|e| GardenError::io(root, e))?;
        let config = PackageConfig::load(&root)?;
        let ignore = IgnoreRules::new(&config.ignore)?;
        Ok(Self {
            name: name.into(),
            config_file: PackageConfig::file_name_for(&root),
            root,
            ignore,
        })
    }

    /// Load a package named after the last component of `path`.
    ///
    /// # Errors
    ///
    /// See [`Package::load`].
    pub fn from_path(path: &Path) -> Result<Self, GardenError> {
        let abs = absolute(path).map_err(|e| GardenError::io(path, e))?;
        let name = abs
            .file_name()
            .map_or_else(|| abs.display().to_string(), |n| n.to_string_lossy().into_owned());
        Self::load(name, &abs)
    }

    /// Package name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute package root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every file the package currently provides, relative to its root.
    ///
    /// Directory symlinks are followed; broken symlinks count as files.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory tree cannot be read.
    pub fn paths(&self) -> Result<BTreeSet<PathBuf>, GardenError> {
        Ok(files_under(&self.root, &self.root)?
            .into_iter()
            .filter(|rel| !self.is_ignored(rel))
            .collect())
    }

    /// Return `true` if the package-relative `path` is excluded from the
    /// garden.
    ///
    /// Only the config file in effect is hidden; a stale legacy config next
    /// to a preferred one is an ordinary file.
    #[must_use]
    pub fn is_ignored(&self, path: &Path) -> bool {
        path == Path::new(self.config_file)
            || path.components().any(|c| c.as_os_str() == SHED_NAME)
            || self.ignore.is_match(path)
    }

    /// Return `true` if `abs_path` is a symlink pointing into this package.
    #[must_use]
    pub fn owns(&self, abs_path: &Path) -> bool {
        points_under(abs_path, &self.root)
    }

    /// Lightweight reference carried by actions.
    #[must_use]
    pub fn to_ref(&self) -> PackageRef {
        PackageRef::new(self.name.clone(), self.root.clone())
    }
}

/// Walk `dir` and return every non-directory entry relative to `base`,
/// sorted, skipping `.symlink-garden` directories below `dir`.
///
/// # Errors
///
/// Returns an error if an entry cannot be read.
pub(crate) fn files_under(dir: &Path, base: &Path) -> Result<Vec<PathBuf>, GardenError> {
    let walker = WalkDir::new(dir)
        .follow_links(true)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || e.file_name() != SHED_NAME);

    let mut files = Vec::new();
    for entry in walker {
        let path = match entry {
            Ok(entry) if entry.file_type().is_dir() => continue,
            Ok(entry) => entry.into_path(),
            Err(err) => match err.path() {
                // A dangling symlink cannot be followed, but it is still a file.
                Some(p) if lexists(p) && !p.exists() => p.to_path_buf(),
                _ => {
                    let path = err.path().unwrap_or(dir).to_path_buf();
                    return Err(GardenError::io(path, err.into()));
                }
            },
        };
        if let Ok(rel) = path.strip_prefix(base) {
            files.push(rel.to_path_buf());
        }
    }
    Ok(files)
}
