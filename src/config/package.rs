//! `GARDEN_PACKAGE.json` loading.
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Preferred name of the package config file.
pub const CONFIG_FILE_NAME: &str = "GARDEN_PACKAGE.json";

/// Older name still honoured when the preferred file is absent.
pub const LEGACY_CONFIG_FILE_NAME: &str = ".garden-package.json";

/// Per-package settings, merged over the built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PackageConfig {
    /// Glob patterns (relative to the package root) excluded from the garden.
    pub ignore: Vec<String>,
}

impl PackageConfig {
    /// Return the config path for a package rooted at `root`.
    ///
    /// The preferred name wins whenever it exists; otherwise the legacy
    /// dotfile path is returned, whether or not it exists.
    #[must_use]
    pub fn path_for(root: &Path) -> PathBuf {
        root.join(Self::file_name_for(root))
    }

    /// File name of the config that governs the package at `root`.
    #[must_use]
    pub fn file_name_for(root: &Path) -> &'static str {
        if root.join(CONFIG_FILE_NAME).exists() {
            CONFIG_FILE_NAME
        } else {
            LEGACY_CONFIG_FILE_NAME
        }
    }

    /// Load the config of the package rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        load_json(&Self::path_for(root))
    }
}

/// Deserialize a JSON file, returning `T::default()` when it does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, ConfigError> {
    if !path.exists() {
        return Ok(T::default());
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
