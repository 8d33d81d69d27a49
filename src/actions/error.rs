//! Typed error variants for plan execution.
//!
//! This module provides [`ActionError`], raised when an action discovers at
//! execution time that the filesystem no longer matches what planning saw.
//! Callers convert to [`anyhow::Error`] via `?`.

use std::path::PathBuf;

use thiserror::Error;

/// Refusals raised while applying an [`Action`](super::Action).
#[derive(Error, Debug)]
pub enum ActionError {
    /// The path is not a symlink owned by the package.
    #[error("{path} is not owned by package '{package}' and cannot be removed")]
    NotOwned {
        /// Garden path.
        path: PathBuf,
        /// Package name.
        package: String,
    },

    /// A real file sits where a symlink should be written.
    #[error("unresolved weed conflict at {0}")]
    UnresolvedWeed(PathBuf),

    /// `--no-shadow` forbids replacing what exists at the link path.
    #[error("symlink would shadow at {0}")]
    WouldShadow(PathBuf),

    /// The symlink target is a directory; only files are linked.
    #[error("{0} must be a file, not a directory")]
    TargetIsDirectory(PathBuf),

    /// The package already contains a file at the destination.
    #[error("the package '{package}' already contains a file at {path}")]
    DestinationExists {
        /// Package name.
        package: String,
        /// Destination path.
        path: PathBuf,
    },
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn not_owned_display() {
        let e = ActionError::NotOwned {
            path: PathBuf::from("/g/bin/foo"),
            package: "tools".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "/g/bin/foo is not owned by package 'tools' and cannot be removed"
        );
    }

    #[test]
    fn destination_exists_display() {
        let e = ActionError::DestinationExists {
            package: "weeds-1".to_string(),
            path: PathBuf::from("/p/x"),
        };
        assert!(e.to_string().contains("weeds-1"));
        assert!(e.to_string().contains("/p/x"));
    }

    #[test]
    fn action_error_converts_to_anyhow() {
        let e = ActionError::WouldShadow(PathBuf::from("/g/x"));
        let err: anyhow::Error = e.into();
        assert!(err.downcast_ref::<ActionError>().is_some());
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn action_error_is_send_sync() {
        assert_send_sync::<ActionError>();
    }
}
