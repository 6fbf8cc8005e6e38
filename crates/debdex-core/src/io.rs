//! Artifact file writes.

use crate::error::{BuildError, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Replace `path` with `data` atomically.
///
/// The bytes go to a temporary file in the same directory which is then
/// renamed over `path`, so readers see either the old or the new file and a
/// crash never leaves a partially written artifact behind.
///
/// # Errors
///
/// Returns [`BuildError::Io`] if the temporary file cannot be created,
/// written, synced or renamed.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| BuildError::io(dir, e))?;
    tmp.write_all(data).map_err(|e| BuildError::io(path, e))?;

    // Temporary files are created 0600; artifacts are served publicly.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))
            .map_err(|e| BuildError::io(path, e))?;
    }

    tmp.as_file()
        .sync_all()
        .map_err(|e| BuildError::io(path, e))?;
    tmp.persist(path).map_err(|e| BuildError::io(path, e.error))?;
    Ok(())
}
