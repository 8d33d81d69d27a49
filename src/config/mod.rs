//! Package configuration: `GARDEN_PACKAGE.json` loading and ignore rules.
//!
//! A package may carry a small JSON config at its root.  Everything in it is
//! optional; a missing file behaves exactly like `{"ignore": []}`.
pub mod ignore;
pub mod package;

pub use ignore::IgnoreRules;
pub use package::{CONFIG_FILE_NAME, LEGACY_CONFIG_FILE_NAME, PackageConfig};
