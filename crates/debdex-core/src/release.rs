//! The `Release` digest summary.
//!
//! Header lines come first, then one block per digest kind. Every block
//! lists the same artifacts in the same order; clients address entries by
//! position within a block.
//!
//! ```text
//! Origin: debdex
//! ...
//! Date: Mon, 19 Oct 2026 08:00:00 +0000
//! MD5Sum:
//!  <hex> <size> Packages
//!  <hex> <size> Packages.gz
//! SHA1:
//! ...
//! ```

use crate::config::ReleaseMetadata;
use crate::error::{BuildError, Result};
use chrono::{DateTime, Utc};
use debdex_schema::{DigestKind, FileDigests};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// `Date` header format. The offset is always the literal `+0000`.
pub const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S +0000";

/// One file listed in `Release`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseArtifact {
    /// Base file name.
    pub name: String,
    /// Size and digests.
    pub digests: FileDigests,
}

impl ReleaseArtifact {
    /// Hash a file on disk. Each artifact is read once for all four digests.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Io`] if the file cannot be read.
    pub fn from_file(path: &Path) -> Result<Self> {
        let digests = FileDigests::compute_file(path).map_err(|e| BuildError::io(path, e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { name, digests })
    }
}

/// Format a timestamp for the `Date` header.
pub fn format_date(date: DateTime<Utc>) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Render a `Release` document.
pub fn render_release(
    meta: &ReleaseMetadata,
    artifacts: &[ReleaseArtifact],
    date: DateTime<Utc>,
) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(out, "Origin: {}", meta.origin);
    let _ = writeln!(out, "Label: {}", meta.label);
    let _ = writeln!(out, "Suite: {}", meta.suite);
    let _ = writeln!(out, "Version: {}", meta.version);
    let _ = writeln!(out, "Codename: {}", meta.codename);
    let _ = writeln!(out, "Architectures: {}", meta.architectures.join(" "));
    let _ = writeln!(out, "Components: {}", meta.components.join(" "));
    let _ = writeln!(out, "Description: {}", meta.description);
    let _ = writeln!(out, "Date: {}", format_date(date));

    for kind in DigestKind::ALL {
        let _ = writeln!(out, "{}:", kind.release_header());
        for artifact in artifacts {
            let _ = writeln!(
                out,
                " {} {} {}",
                artifact.digests.get(kind),
                artifact.digests.size,
                artifact.name
            );
        }
    }
    out
}

/// Hash `paths` in order, one read per file.
///
/// # Errors
///
/// Returns [`BuildError::Io`] if any artifact cannot be read.
pub fn hash_artifacts(paths: &[PathBuf]) -> Result<Vec<ReleaseArtifact>> {
    paths
        .iter()
        .map(|p| ReleaseArtifact::from_file(p))
        .collect()
}

/// One `<digest> <size> <name>` line of a `Release` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseEntry {
    /// Block the line belongs to.
    pub kind: DigestKind,
    /// Hex digest.
    pub digest: String,
    /// Declared size.
    pub size: u64,
    /// File name relative to the `Release` directory.
    pub name: String,
}

/// Parse the digest blocks of a `Release` document. Header lines and
/// unrecognised blocks are ignored.
pub fn parse_release(text: &str) -> Vec<ReleaseEntry> {
    let mut entries = Vec::new();
    let mut current: Option<DigestKind> = None;

    for line in text.lines() {
        if let Some(body) = line.strip_prefix(' ') {
            let Some(kind) = current else { continue };
            let mut parts = body.split_whitespace();
            if let (Some(digest), Some(size), Some(name)) = (parts.next(), parts.next(), parts.next())
            {
                if let Ok(size) = size.parse() {
                    entries.push(ReleaseEntry {
                        kind,
                        digest: digest.to_ascii_lowercase(),
                        size,
                        name: name.to_string(),
                    });
                }
            }
            continue;
        }

        current = line.strip_suffix(':').and_then(|header| {
            DigestKind::ALL
                .into_iter()
                .find(|k| k.release_header().eq_ignore_ascii_case(header))
        });
    }
    entries
}

/// A `Release` entry that does not match the file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    /// The offending entry.
    pub entry: ReleaseEntry,
    /// What was found instead.
    pub problem: String,
}

/// Check every entry of `release_text` against files in `dir`.
///
/// Each listed file is hashed once. Returns the mismatches; an empty vector
/// means the artifact set is consistent.
///
/// # Errors
///
/// Only unexpected I/O failures propagate; a missing file is a mismatch.
pub fn verify_release(release_text: &str, dir: &Path) -> Result<Vec<Mismatch>> {
    let mut cache: Vec<(String, Option<FileDigests>)> = Vec::new();
    let mut mismatches = Vec::new();

    for entry in parse_release(release_text) {
        let idx = if let Some(i) = cache.iter().position(|(n, _)| *n == entry.name) {
            i
        } else {
            let path = dir.join(&entry.name);
            let digests = match FileDigests::compute_file(&path) {
                Ok(d) => Some(d),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
                Err(e) => return Err(BuildError::io(&path, e)),
            };
            cache.push((entry.name.clone(), digests));
            cache.len() - 1
        };

        let problem = match &cache[idx].1 {
            None => Some("file is missing".to_string()),
            Some(actual) if actual.size != entry.size => {
                Some(format!("size is {}, expected {}", actual.size, entry.size))
            }
            Some(actual) if actual.get(entry.kind) != entry.digest => Some(format!(
                "{} is {}",
                entry.kind.release_header(),
                actual.get(entry.kind)
            )),
            Some(_) => None,
        };

        if let Some(problem) = problem {
            mismatches.push(Mismatch { entry, problem });
        }
    }
    Ok(mismatches)
}
