//! Errors raised while building a repository index.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Everything that can go wrong during a build run.
///
/// Per-archive failures ([`BuildError::MalformedArchive`], and I/O errors on
/// a single archive during an incremental merge) are recovered by the merger;
/// everything else aborts the run.
#[derive(Error, Debug)]
pub enum BuildError {
    /// The archive's control data is unreadable or lacks an identity field.
    #[error("malformed archive {}: {reason}", path.display())]
    MalformedArchive {
        /// Archive path.
        path: PathBuf,
        /// What was wrong.
        reason: String,
    },

    /// A required configuration file does not exist.
    #[error("configuration missing: {}", path.display())]
    ConfigurationMissing {
        /// Expected location.
        path: PathBuf,
    },

    /// A configuration file exists but cannot be parsed.
    #[error("invalid configuration {}: {reason}", path.display())]
    InvalidConfiguration {
        /// Configuration path.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// The external control-metadata reader cannot be used.
    #[error("metadata reader unavailable: {0}")]
    ReaderUnavailable(String),

    /// Reading an input or writing an artifact failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

impl BuildError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a [`BuildError::MalformedArchive`].
    pub fn malformed(path: impl AsRef<Path>, reason: impl std::fmt::Display) -> Self {
        Self::MalformedArchive {
            path: path.as_ref().to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Whether this is an I/O error caused by a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// Result alias for core operations.
pub type Result<T, E = BuildError> = std::result::Result<T, E>;
