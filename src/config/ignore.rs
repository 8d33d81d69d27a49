//! Ignore rules: compiled glob patterns from a package config.
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::Path;

use crate::error::ConfigError;

/// Compiled ignore patterns for one package.
///
/// Patterns match from the right: a relative pattern such as `*.pyc`
/// matches when it matches the trailing components of a path, so it hits
/// both `x.pyc` and `a/b/x.pyc`.  A leading `/` anchors the pattern at the
/// package root.  `*` never crosses a `/`.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    set: GlobSet,
}

impl IgnoreRules {
    /// Compile `patterns` into a matcher.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPattern`] for the first pattern that is
    /// not a valid glob.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let anchored = pattern.strip_prefix('/');
            let expanded = anchored.map_or_else(|| format!("**/{pattern}"), str::to_string);
            let glob = GlobBuilder::new(&expanded)
                .literal_separator(true)
                .build()
                .map_err(|source| ConfigError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                })?;
            builder.add(glob);
        }
        let set = builder.build().map_err(|source| ConfigError::InvalidPattern {
            pattern: patterns
                .iter()
                .map(AsRef::as_ref)
                .collect::<Vec<_>>()
                .join(", "),
            source,
        })?;
        Ok(Self { set })
    }

    /// Return `true` if the package-relative `path` matches any pattern.
    #[must_use]
    pub fn is_match(&self, path: &Path) -> bool {
        self.set.is_match(path)
    }
}
