//! Archives considered changed for an incremental build.
//!
//! The change set usually comes from surrounding tooling (for example a
//! `git diff --name-only` listing). Only archive paths are kept.

use crate::error::{BuildError, Result};
use crate::walk::is_archive;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Set of changed archive paths, iterated in lexicographic order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    paths: BTreeSet<PathBuf>,
}

impl ChangeSet {
    /// Create an empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect archive paths, ignoring anything without the archive
    /// extension.
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let paths = paths
            .into_iter()
            .map(Into::into)
            .filter(|p: &PathBuf| is_archive(p))
            .collect();
        Self { paths }
    }

    /// Parse a newline-separated path list. Blank lines and `#` comments are
    /// skipped.
    pub fn from_list(text: &str) -> Self {
        Self::from_paths(
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#')),
        )
    }

    /// Read a path list from disk.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Io`] if the file cannot be read.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
        Ok(Self::from_list(&text))
    }

    /// Add one path (ignored unless it is an archive).
    pub fn insert(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if is_archive(&path) {
            self.paths.insert(path);
        }
    }

    /// Iterate in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }

    /// Number of paths.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl<P: Into<PathBuf>> FromIterator<P> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self::from_paths(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_keeps_only_archives_in_order() {
        let set = ChangeSet::from_list(
            "# changed files\ndownloads/b_1.0_all.deb\n\nindex.yaml\ndownloads/a_1.0_all.deb\n  downloads/b_1.0_all.deb  \n",
        );
        let paths: Vec<_> = set.iter().collect();
        assert_eq!(
            paths,
            [
                Path::new("downloads/a_1.0_all.deb"),
                Path::new("downloads/b_1.0_all.deb")
            ]
        );
    }

    #[test]
    fn insert_ignores_non_archives() {
        let mut set = ChangeSet::new();
        set.insert("Packages");
        set.insert("x.deb");
        assert_eq!(set.len(), 1);
    }
}
