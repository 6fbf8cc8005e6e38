use super::MetadataReader;
use crate::error::{BuildError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Reads control stanzas by running `dpkg-deb -f <archive>`.
#[derive(Debug, Clone)]
pub struct DpkgDeb {
    program: PathBuf,
}

impl DpkgDeb {
    /// Find `dpkg-deb` on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::ReaderUnavailable`] if it is not installed.
    pub fn locate() -> Result<Self> {
        which::which("dpkg-deb")
            .map(Self::with_program)
            .map_err(|e| BuildError::ReaderUnavailable(format!("dpkg-deb: {e}")))
    }

    /// Use an explicit program path.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl MetadataReader for DpkgDeb {
    fn read_control(&self, archive: &Path) -> Result<String> {
        let output = Command::new(&self.program)
            .arg("-f")
            .arg(archive)
            .output()
            .map_err(|e| BuildError::ReaderUnavailable(format!("{}: {e}", self.program.display())))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BuildError::malformed(
                archive,
                format!("dpkg-deb exited with {}: {}", output.status, stderr.trim()),
            ));
        }

        String::from_utf8(output.stdout)
            .map_err(|_| BuildError::malformed(archive, "control stanza is not valid UTF-8"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_is_unavailable() {
        let reader = DpkgDeb::with_program("/nonexistent/dpkg-deb");
        let err = reader.read_control(Path::new("a.deb")).unwrap_err();
        assert!(matches!(err, BuildError::ReaderUnavailable(_)));
    }
}
