//! Archive directory traversal.

use crate::error::{BuildError, Result};
use debdex_schema::ARCHIVE_EXTENSION;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A flat directory of `.deb` archives and the prefix their `Filename`
/// fields are written with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveDir {
    dir: PathBuf,
    prefix: String,
}

impl ArchiveDir {
    /// Use `dir` both as the archive location and, with `/` separators, as
    /// the `Filename` prefix (e.g. `downloads` -> `downloads/a.deb`).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let prefix = dir.to_string_lossy().replace('\\', "/");
        Self { dir, prefix }
    }

    /// Override the `Filename` prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Directory holding the archives.
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// List every archive, sorted lexicographically by file name.
    ///
    /// Only regular files (or symlinks to them) directly inside the directory
    /// with the archive extension are returned.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Io`] if the directory cannot be read.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        let mut archives = Vec::new();
        let walker = WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.map_err(|e| BuildError::io(&self.dir, e.into()))?;
            if entry.file_type().is_file() && is_archive(entry.path()) {
                archives.push(entry.into_path());
            }
        }
        Ok(archives)
    }

    /// The `Filename` field value for an archive: prefix plus base name.
    pub fn filename_for(&self, archive: &Path) -> String {
        let base = archive
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let prefix = self.prefix.trim_end_matches('/');
        if prefix.is_empty() || prefix == "." {
            base
        } else {
            format!("{prefix}/{base}")
        }
    }

    /// Locate a changed archive inside this directory. The directory is flat,
    /// so only the base name of `changed` matters.
    pub fn resolve(&self, changed: &Path) -> PathBuf {
        match changed.file_name() {
            Some(name) => self.dir.join(name),
            None => self.dir.join(changed),
        }
    }
}

/// Whether a path carries the archive extension.
pub fn is_archive(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == ARCHIVE_EXTENSION)
}
