//! Actions that update garden bookkeeping rather than package files.
use anyhow::{Context as _, Result};
use std::path::PathBuf;

use super::Mutation;
use super::helpers::fs::ensure_parent_dir;
use crate::garden::record::LivenessHandle;

/// Write a serialised manifest to disk.
#[derive(Debug, Clone)]
pub struct WriteManifest {
    /// Absolute path of `manifest.json`.
    pub path: PathBuf,
    /// Complete file contents.
    pub contents: String,
}

impl WriteManifest {
    /// Create a new manifest write.
    #[must_use]
    pub const fn new(path: PathBuf, contents: String) -> Self {
        Self { path, contents }
    }
}

impl Mutation for WriteManifest {
    fn description(&self) -> String {
        "Commit changes to the garden's manifest".to_string()
    }

    fn apply(&self) -> Result<()> {
        ensure_parent_dir(&self.path)?;
        // Stage next to the manifest so the rename stays on one filesystem.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &self.contents)
            .with_context(|| format!("write {}", tmp.display()))?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e).with_context(|| {
                format!("rename {} to {}", tmp.display(), self.path.display())
            });
        }
        Ok(())
    }
}

/// Advance a pruned package record from dying to gone.
#[derive(Debug, Clone)]
pub struct FinalizePrune {
    /// Name of the pruned package.
    pub package: String,
    /// Liveness shared with the record in the garden.
    pub liveness: LivenessHandle,
}

impl FinalizePrune {
    /// Create a new finalize action.
    #[must_use]
    pub const fn new(package: String, liveness: LivenessHandle) -> Self {
        Self { package, liveness }
    }
}

impl Mutation for FinalizePrune {
    fn description(&self) -> String {
        format!("Finalize prune of package '{}'", self.package)
    }

    fn apply(&self) -> Result<()> {
        self.liveness.finish();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::garden::record::Liveness;

    #[test]
    fn write_manifest_creates_shed_and_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".symlink-garden/manifest.json");

        WriteManifest::new(path.clone(), "{}".to_string())
            .apply()
            .unwrap();
        WriteManifest::new(path.clone(), "{\"a\": 1}".to_string())
            .apply()
            .unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"a\": 1}");
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn finalize_prune_marks_gone() {
        let liveness = LivenessHandle::default();
        liveness.kill();
        let action = FinalizePrune::new("pkg".to_string(), liveness.clone());
        assert_eq!(liveness.get(), Liveness::Dying);

        action.apply().unwrap();

        assert_eq!(liveness.get(), Liveness::Gone);
        assert_eq!(action.description(), "Finalize prune of package 'pkg'");
    }
}
