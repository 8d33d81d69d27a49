//! `manifest.json`: the persisted ownership records.
//!
//! The manifest is a JSON object keyed by package name, in precedence order
//! (lowest first).  Each value records the package root and the paths it
//! has linked into the garden:
//!
//! ```json
//! {
//!     "dots": {
//!         "root": "/home/me/dots",
//!         "paths": [
//!             ".bashrc"
//!         ]
//!     }
//! }
//! ```
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use super::package::Package;
use super::record::PackageRecord;
use crate::error::{GardenError, ManifestError};

/// One manifest value.
#[derive(Debug, Serialize, Deserialize)]
struct Entry {
    root: PathBuf,
    paths: Vec<PathBuf>,
}

/// Read the manifest at `path`, in precedence order.  A missing file is an
/// empty manifest.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not a JSON object of
/// records, or names a package whose config is invalid.
pub fn load(path: &Path) -> Result<Vec<PackageRecord>, GardenError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(ManifestError::Read {
                path: path.to_path_buf(),
                source,
            }
            .into());
        }
    };

    let raw: Map<String, Value> =
        serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let mut records = Vec::with_capacity(raw.len());
    for (name, value) in raw {
        let entry: Entry = serde_json::from_value(value).map_err(|e| ManifestError::Shape {
            path: path.to_path_buf(),
            message: format!("record '{name}': {e}"),
        })?;
        let package = Package::load(name, &entry.root)?;
        records.push(PackageRecord::with_tracked(
            package,
            entry.paths.into_iter().collect(),
        ));
    }
    Ok(records)
}

/// Serialise the active records with four-space indentation and sorted
/// paths.
///
/// # Errors
///
/// Returns an error if a path is not valid UTF-8.
pub fn render(records: &[PackageRecord]) -> Result<String, ManifestError> {
    let mut map = Map::new();
    for record in records.iter().filter(|r| r.is_active()) {
        let entry = Entry {
            root: record.package.root().to_path_buf(),
            paths: record.tracked.iter().cloned().collect(),
        };
        let value = serde_json::to_value(entry).map_err(ManifestError::Serialize)?;
        map.insert(record.name().to_string(), value);
    }

    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    map.serialize(&mut ser).map_err(ManifestError::Serialize)?;
    // serde_json only ever emits UTF-8.
    Ok(String::from_utf8_lossy(&out).into_owned())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::test_helpers::write_file;

    #[test]
    fn missing_manifest_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(&dir.path().join("manifest.json")).unwrap().is_empty());
    }

    #[test]
    fn load_keeps_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "manifest.json",
            r#"{
                "zeta": {"root": "/pkgs/zeta", "paths": ["b", "a"]},
                "alpha": {"root": "/pkgs/alpha", "paths": []}
            }"#,
        );

        let records = load(&path).unwrap();
        let names: Vec<&str> = records.iter().map(PackageRecord::name).collect();
        assert_eq!(names, ["zeta", "alpha"]);
        assert_eq!(records[0].tracked.len(), 2);
        assert!(records.iter().all(PackageRecord::is_active));
    }

    #[test]
    fn load_rejects_wrong_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "manifest.json", r#"{"p": {"root": 3}}"#);
        let err = load(&path).unwrap_err();
        assert!(matches!(
            err,
            GardenError::Manifest(ManifestError::Shape { .. })
        ));
        assert!(err.to_string().contains("record 'p'"));
    }

    #[test]
    fn load_rejects_non_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "manifest.json", "[]");
        assert!(matches!(
            load(&path).unwrap_err(),
            GardenError::Manifest(ManifestError::Parse { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn render_skips_dying_records_and_sorts_paths() {
        let first = Package::load("first", Path::new("/pkgs/first")).unwrap();
        let second = Package::load("second", Path::new("/pkgs/second")).unwrap();
        let gone = Package::load("gone", Path::new("/pkgs/gone")).unwrap();

        let records = vec![
            PackageRecord::with_tracked(
                first,
                ["z/last", ".bashrc", "bin/tool"]
                    .into_iter()
                    .map(PathBuf::from)
                    .collect(),
            ),
            PackageRecord::new(second),
            PackageRecord::new(gone),
        ];
        records[2].liveness.kill();

        insta::assert_snapshot!(render(&records).unwrap(), @r#"
        {
            "first": {
                "root": "/pkgs/first",
                "paths": [
                    ".bashrc",
                    "bin/tool",
                    "z/last"
                ]
            },
            "second": {
                "root": "/pkgs/second",
                "paths": []
            }
        }
        "#);
    }

    #[test]
    fn render_then_load_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let records: Vec<PackageRecord> = ["b", "a", "c"]
            .into_iter()
            .map(|n| PackageRecord::new(Package::load(n, &dir.path().join(n)).unwrap()))
            .collect();
        let path = write_file(dir.path(), "manifest.json", &render(&records).unwrap());

        let names: Vec<String> = load(&path)
            .unwrap()
            .iter()
            .map(|r| r.name().to_string())
            .collect();
        assert_eq!(names, ["b", "a", "c"]);
    }
}
