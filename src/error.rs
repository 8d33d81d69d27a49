//! Domain-specific error types for the garden engine.
//!
//! Planning code returns [`GardenError`]; command handlers at the CLI
//! boundary convert it to [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! GardenError
//! ├── Ownership(OwnershipError)       - shadow and weed conflicts, foreign owners
//! ├── Precondition(PreconditionError) - missing directories, duplicate names, …
//! ├── Config(ConfigError)             - package config parsing, ignore globs
//! ├── Manifest(ManifestError)         - manifest.json read/parse/serialise
//! └── Io                              - filesystem reads during planning
//! ```
//!
//! Errors raised while *executing* a plan live in
//! [`crate::actions::error::ActionError`] and [`RunError`].

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for planning operations.
#[derive(Error, Debug)]
pub enum GardenError {
    /// Two parties claim the same garden path.
    #[error(transparent)]
    Ownership(#[from] OwnershipError),

    /// The request cannot be planned in the current state.
    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    /// A package configuration file is unreadable or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The garden manifest is unreadable or invalid.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// A filesystem read failed while planning.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that was being inspected.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl GardenError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Conflicts over who owns a garden path.
#[derive(Error, Debug)]
pub enum OwnershipError {
    /// `--no-shadow` was requested and two packages provide the same path.
    #[error("symlink to {package}/{path} would shadow symlink to {shadowed}/{path}")]
    Shadow {
        /// Relative path provided by both packages.
        path: PathBuf,
        /// Package with higher precedence.
        package: String,
        /// Package that would be shadowed.
        shadowed: String,
    },

    /// A file exists in the garden that no package owns.
    #[error("weed conflict at {path}: file already exists, but is not owned by the garden")]
    Weed {
        /// Absolute garden path of the weed.
        path: PathBuf,
    },

    /// The path is already provided by a different package.
    #[error("the file at {path} is owned by another package: '{owner}'")]
    OwnedByOther {
        /// Relative garden path.
        path: PathBuf,
        /// Name of the owning package.
        owner: String,
    },

    /// Several packages provide the path, so removing one would cascade.
    #[error(
        "{path} is provided by multiple packages, would result in weed conflict cascade; \
         shadowed packages: {shadowed:?}"
    )]
    MultipleProviders {
        /// Absolute garden path.
        path: PathBuf,
        /// Lower-precedence providers of the path.
        shadowed: Vec<String>,
    },
}

/// The garden or a package is not in a state that allows the operation.
#[derive(Error, Debug)]
pub enum PreconditionError {
    /// A package root or garden root is not a directory.
    #[error("{path} is not a directory and cannot be used as a {role} root")]
    NotADirectory {
        /// Offending path.
        path: PathBuf,
        /// `"package"` or `"garden"`.
        role: &'static str,
    },

    /// A package with this name is already planted.
    #[error("a package named '{name}' is already planted in {garden}")]
    DuplicatePackage {
        /// Package name.
        name: String,
        /// Garden root.
        garden: PathBuf,
    },

    /// No planted package has this name.
    #[error("no package named '{0}' is planted in this garden")]
    UnknownPackage(String),

    /// `prepare` was run on an existing garden without `--reset`.
    #[error("garden already exists at {0}")]
    GardenExists(PathBuf),

    /// No `.symlink-garden` directory was found in the directory or its parents.
    #[error("could not find a garden from {0}; use `garden prepare` to create one")]
    GardenNotFound(PathBuf),

    /// The package already contains a file at the path being cultivated.
    #[error("the package '{package}' already has a file at {path}")]
    PackageHasFile {
        /// Package name.
        package: String,
        /// Relative path.
        path: PathBuf,
    },

    /// A path argument does not live under the garden root.
    #[error("{path} is not inside the garden at {garden}")]
    OutsideGarden {
        /// Offending path.
        path: PathBuf,
        /// Garden root.
        garden: PathBuf,
    },

    /// A real directory sits where a package wants to place a file.
    #[error("{0} is a directory where a file is expected")]
    DirectoryInTheWay(PathBuf),

    /// Nothing exists at a garden path that was expected to hold a file.
    #[error("no file exists at {0}")]
    MissingFile(PathBuf),
}

/// Errors reading a package's `GARDEN_PACKAGE.json`.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("IO error reading package config {path}: {source}")]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid JSON of the expected shape.
    #[error("invalid package config {path}: {source}")]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_json::Error,
    },

    /// An ignore pattern is not a valid glob.
    #[error("invalid ignore pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The pattern as written in the config.
        pattern: String,
        /// Underlying glob error.
        source: globset::Error,
    },
}

/// Errors reading or writing `manifest.json`.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// The manifest exists but could not be read.
    #[error("IO error reading manifest {path}: {source}")]
    Read {
        /// Manifest path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The manifest is not valid JSON.
    #[error("invalid manifest {path}: {source}")]
    Parse {
        /// Manifest path.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_json::Error,
    },

    /// The manifest is valid JSON but not a name → record object.
    #[error("invalid manifest {path}: {message}")]
    Shape {
        /// Manifest path.
        path: PathBuf,
        /// What was wrong.
        message: String,
    },

    /// The in-memory manifest could not be serialised.
    #[error("cannot serialise manifest: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Errors from executing a plan.
#[derive(Error, Debug)]
pub enum RunError {
    /// An action failed; the remaining actions were not attempted.
    #[error("action failed: {action} ({} subsequent action(s) not performed)", .abandoned.len())]
    ActionFailed {
        /// Description of the failed action.
        action: String,
        /// Descriptions of the actions that were never attempted.
        abandoned: Vec<String>,
        /// Underlying failure.
        #[source]
        source: anyhow::Error,
    },

    /// Execution was interrupted (Ctrl-C) between two actions.
    #[error("interrupted; {} action(s) not performed", .abandoned.len())]
    Cancelled {
        /// Descriptions of the actions that were never attempted.
        abandoned: Vec<String>,
    },
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::io;

    // -----------------------------------------------------------------------
    // OwnershipError
    // -----------------------------------------------------------------------

    #[test]
    fn shadow_display_names_both_packages() {
        let e = OwnershipError::Shadow {
            path: PathBuf::from("bin/foo"),
            package: "/pkgs/b".to_string(),
            shadowed: "/pkgs/a".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "symlink to /pkgs/b/bin/foo would shadow symlink to /pkgs/a/bin/foo"
        );
    }

    #[test]
    fn weed_display() {
        let e = OwnershipError::Weed {
            path: PathBuf::from("/garden/bin/foo"),
        };
        assert!(e.to_string().starts_with("weed conflict at /garden/bin/foo"));
    }

    #[test]
    fn multiple_providers_lists_shadowed() {
        let e = OwnershipError::MultipleProviders {
            path: PathBuf::from("/garden/x"),
            shadowed: vec!["a".to_string()],
        };
        assert!(e.to_string().contains("[\"a\"]"));
    }

    // -----------------------------------------------------------------------
    // PreconditionError
    // -----------------------------------------------------------------------

    #[test]
    fn not_a_directory_mentions_role() {
        let e = PreconditionError::NotADirectory {
            path: PathBuf::from("/nope"),
            role: "package",
        };
        assert_eq!(
            e.to_string(),
            "/nope is not a directory and cannot be used as a package root"
        );
    }

    #[test]
    fn unknown_package_display() {
        let e = PreconditionError::UnknownPackage("dots".to_string());
        assert_eq!(
            e.to_string(),
            "no package named 'dots' is planted in this garden"
        );
    }

    // -----------------------------------------------------------------------
    // GardenError conversions
    // -----------------------------------------------------------------------

    #[test]
    fn garden_error_is_transparent_over_ownership() {
        let e: GardenError = OwnershipError::Weed {
            path: PathBuf::from("/g/f"),
        }
        .into();
        assert!(matches!(e, GardenError::Ownership(_)));
        assert!(e.to_string().starts_with("weed conflict"));
    }

    #[test]
    fn garden_error_io_has_source() {
        use std::error::Error as StdError;
        let e = GardenError::io(
            "/garden",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(e.source().is_some());
        assert!(e.to_string().contains("/garden"));
    }

    #[test]
    fn run_error_counts_abandoned() {
        let e = RunError::ActionFailed {
            action: "Delete weed at /g/x".to_string(),
            abandoned: vec!["a".to_string(), "b".to_string()],
            source: anyhow::anyhow!("boom"),
        };
        assert_eq!(
            e.to_string(),
            "action failed: Delete weed at /g/x (2 subsequent action(s) not performed)"
        );
    }

    // -----------------------------------------------------------------------
    // Send + Sync bounds
    // -----------------------------------------------------------------------

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn all_error_types_are_send_sync() {
        assert_send_sync::<GardenError>();
        assert_send_sync::<OwnershipError>();
        assert_send_sync::<PreconditionError>();
        assert_send_sync::<ConfigError>();
        assert_send_sync::<ManifestError>();
        assert_send_sync::<RunError>();
    }

    #[test]
    fn garden_error_converts_to_anyhow() {
        let e: GardenError = PreconditionError::GardenExists(PathBuf::from("/g")).into();
        let _anyhow_err: anyhow::Error = e.into();
    }
}
