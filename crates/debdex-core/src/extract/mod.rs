//! Archive metadata extraction.
//!
//! Reading the control stanza is delegated to a [`MetadataReader`]; this
//! module adds the file statistics and digests and validates the identity.

/// `dpkg-deb` subprocess reader.
pub mod dpkg;
/// Pure-Rust `ar`/`tar` reader.
pub mod native;

pub use dpkg::DpkgDeb;
pub use native::NativeDeb;

use crate::error::{BuildError, Result};
use debdex_schema::{FileDigests, IdentityKey, Stanza};
use std::path::Path;
use tracing::debug;

/// Source of an archive's control stanza.
///
/// Implementations return the stanza as plain `Key: Value` text. A failure
/// specific to one archive must be reported as
/// [`BuildError::MalformedArchive`] so the merger can skip it.
pub trait MetadataReader: Send + Sync {
    /// Read the control stanza of `archive`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::MalformedArchive`] for unreadable control data
    /// and [`BuildError::Io`] when the file itself cannot be read.
    fn read_control(&self, archive: &Path) -> Result<String>;
}

impl<T: MetadataReader + ?Sized> MetadataReader for &T {
    fn read_control(&self, archive: &Path) -> Result<String> {
        (**self).read_control(archive)
    }
}

impl<T: MetadataReader + ?Sized> MetadataReader for Box<T> {
    fn read_control(&self, archive: &Path) -> Result<String> {
        (**self).read_control(archive)
    }
}

/// One archive's control stanza plus everything computed from the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRecord {
    /// Identity from the control stanza.
    pub key: IdentityKey,
    /// Control fields in archive order.
    pub control: Stanza,
    /// Value of the `Filename` field.
    pub filename: String,
    /// Byte size and digests of the whole archive.
    pub digests: FileDigests,
}

/// Extract one archive.
///
/// The archive is hashed first, in a single streaming pass, so a missing or
/// unreadable file surfaces as [`BuildError::Io`] regardless of the reader.
///
/// # Errors
///
/// Returns [`BuildError::Io`] if the archive cannot be read and
/// [`BuildError::MalformedArchive`] if the control stanza is unreadable or
/// lacks `Package`, `Version` or `Architecture`.
pub fn extract_archive(
    archive: &Path,
    filename: String,
    reader: &dyn MetadataReader,
) -> Result<ArchiveRecord> {
    let digests = FileDigests::compute_file(archive).map_err(|e| BuildError::io(archive, e))?;

    let text = reader.read_control(archive)?;
    let control = Stanza::parse(&text);
    let key = IdentityKey::from_stanza(&control).map_err(|e| BuildError::malformed(archive, e))?;

    debug!(archive = %archive.display(), key = %key, size = digests.size, "extracted");

    Ok(ArchiveRecord {
        key,
        control,
        filename,
        digests,
    })
}
