//! End-to-end build run.
//!
//! Stages run in order: merge the index, write `Packages` and its
//! compressed variants, then hash those five files into `Release`. `Release`
//! is only written once every index artifact has been written, so a failed
//! run never leaves a summary pointing at missing or stale files.

use crate::changes::ChangeSet;
use crate::compress::fan_out;
use crate::config::RepoConfig;
use crate::error::{BuildError, Result};
use crate::extract::MetadataReader;
use crate::io::write_atomic;
use crate::merge::{IndexMerger, MergeOutcome, MergeSummary};
use crate::release::{ReleaseArtifact, format_date, hash_artifacts, render_release};
use crate::walk::ArchiveDir;
use crate::INDEX_ARTIFACTS;
use chrono::{DateTime, Utc};
use debdex_schema::{IndexDocument, PACKAGES_FILE, RELEASE_FILE};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Which archives a run processes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildMode {
    /// Every archive in the directory.
    Full,
    /// Only the listed archives, merged into the previous `Packages`.
    Incremental(ChangeSet),
}

impl BuildMode {
    /// Incremental when a change set is given, full otherwise.
    pub fn from_changes(changes: Option<ChangeSet>) -> Self {
        changes.map_or(Self::Full, Self::Incremental)
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Incremental(_) => "incremental",
        }
    }
}

/// Machine-readable summary of a run.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    /// `full` or `incremental`. A requested incremental run with no previous
    /// index reports `full`.
    pub mode: &'static str,
    /// Merge counters.
    pub summary: MergeSummary,
    /// The artifacts listed in `Release`, in order.
    pub artifacts: Vec<ReleaseArtifact>,
    /// `Date` header of the written `Release`.
    pub date: String,
}

impl BuildReport {
    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Drives a build run over one archive directory and one output directory.
pub struct RepoBuilder<'a> {
    config: &'a RepoConfig,
    archives: ArchiveDir,
    output_dir: PathBuf,
    reader: &'a dyn MetadataReader,
}

impl std::fmt::Debug for RepoBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepoBuilder")
            .field("archives", &self.archives)
            .field("output_dir", &self.output_dir)
            .finish_non_exhaustive()
    }
}

impl<'a> RepoBuilder<'a> {
    /// Create a builder.
    pub fn new(
        config: &'a RepoConfig,
        archives: ArchiveDir,
        output_dir: impl Into<PathBuf>,
        reader: &'a dyn MetadataReader,
    ) -> Self {
        Self {
            config,
            archives,
            output_dir: output_dir.into(),
            reader,
        }
    }

    /// Output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path of the uncompressed index.
    pub fn index_path(&self) -> PathBuf {
        self.output_dir.join(PACKAGES_FILE)
    }

    /// Path of the `Release` document.
    pub fn release_path(&self) -> PathBuf {
        self.output_dir.join(RELEASE_FILE)
    }

    /// The five index artifacts, in `Release` order.
    pub fn artifact_paths(&self) -> Vec<PathBuf> {
        INDEX_ARTIFACTS
            .iter()
            .map(|name| self.output_dir.join(name))
            .collect()
    }

    /// Run the merge for `mode`.
    ///
    /// An incremental run without a previous `Packages` falls back to a full
    /// rebuild, since merging into nothing would drop every unchanged
    /// archive.
    ///
    /// # Errors
    ///
    /// Propagates fatal merge errors and failures reading the previous index.
    pub fn build_index(&self, mode: &BuildMode) -> Result<(MergeOutcome, &'static str)> {
        let merger = IndexMerger::new(&self.archives, self.reader, &self.config.tables);

        let BuildMode::Incremental(changes) = mode else {
            return Ok((merger.full_rebuild()?, mode.label()));
        };

        let index_path = self.index_path();
        match fs::read_to_string(&index_path) {
            Ok(previous) => Ok((merger.incremental(&previous, changes)?, mode.label())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    path = %index_path.display(),
                    "no previous index, falling back to full rebuild"
                );
                Ok((merger.full_rebuild()?, BuildMode::Full.label()))
            }
            Err(e) => Err(BuildError::io(&index_path, e)),
        }
    }

    /// Write `Packages` and its compressed variants. Returns their paths in
    /// `Release` order once all of them are on disk.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Io`] if any artifact cannot be written.
    pub fn write_index(&self, document: &IndexDocument) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.output_dir).map_err(|e| BuildError::io(&self.output_dir, e))?;

        let text = document.serialize();
        let index_path = self.index_path();
        write_atomic(&index_path, text.as_bytes())?;
        info!(path = %index_path.display(), entries = document.len(), "wrote index");

        let mut written = vec![index_path.clone()];
        let encoded = fan_out(text.as_bytes()).map_err(|e| BuildError::io(&index_path, e))?;
        for (encoding, bytes) in encoded {
            let path = self.output_dir.join(encoding.file_name(PACKAGES_FILE));
            write_atomic(&path, &bytes)?;
            info!(path = %path.display(), bytes = bytes.len(), "wrote compressed index");
            written.push(path);
        }
        Ok(written)
    }

    /// Hash `artifacts` and write `Release`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Io`] if an artifact cannot be read or `Release`
    /// cannot be written.
    pub fn write_release(
        &self,
        artifacts: &[PathBuf],
        date: DateTime<Utc>,
    ) -> Result<Vec<ReleaseArtifact>> {
        let hashed = hash_artifacts(artifacts)?;
        let text = render_release(&self.config.release, &hashed, date);
        let path = self.release_path();
        write_atomic(&path, text.as_bytes())?;
        info!(path = %path.display(), artifacts = hashed.len(), "wrote release");
        Ok(hashed)
    }

    /// Run every stage.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error; per-archive failures are logged and
    /// counted in the report instead.
    pub fn run(&self, mode: &BuildMode) -> Result<BuildReport> {
        let (outcome, label) = self.build_index(mode)?;
        let written = self.write_index(&outcome.document)?;

        let date = Utc::now();
        let artifacts = self.write_release(&written, date)?;

        info!(
            mode = label,
            written = outcome.summary.written,
            hidden = outcome.summary.hidden,
            skipped = outcome.summary.skipped,
            "build complete"
        );

        Ok(BuildReport {
            mode: label,
            summary: outcome.summary,
            artifacts,
            date: format_date(date),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::Encoding;
    use std::path::Path;
    use tempfile::TempDir;

    /// Treats the archive bytes as the control stanza.
    struct PlainReader;

    impl MetadataReader for PlainReader {
        fn read_control(&self, archive: &Path) -> Result<String> {
            fs::read_to_string(archive).map_err(|e| BuildError::io(archive, e))
        }
    }

    fn setup(archives: &[(&str, &str)]) -> TempDir {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("downloads");
        fs::create_dir(&dir).unwrap();
        for (name, control) in archives {
            fs::write(dir.join(name), control).unwrap();
        }
        tmp
    }

    fn builder<'a>(tmp: &TempDir, config: &'a RepoConfig) -> RepoBuilder<'a> {
        let archives = ArchiveDir::new(tmp.path().join("downloads")).with_prefix("downloads");
        RepoBuilder::new(config, archives, tmp.path().join("repo"), &PlainReader)
    }

    #[test]
    fn run_writes_every_artifact_and_release() {
        let tmp = setup(&[("pkg_1.0_arm64.deb", "Package: pkg\nVersion: 1.0\nArchitecture: arm64\n")]);
        let config = RepoConfig::default();
        let builder = builder(&tmp, &config);

        let report = builder.run(&BuildMode::Full).unwrap();
        assert_eq!(report.mode, "full");
        assert_eq!(report.summary.written, 1);

        for path in builder.artifact_paths() {
            assert!(path.is_file(), "{}", path.display());
        }
        let names: Vec<_> = report.artifacts.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, INDEX_ARTIFACTS);

        let packages = fs::read(builder.index_path()).unwrap();
        let xz = fs::read(builder.output_dir().join("Packages.xz")).unwrap();
        assert_eq!(Encoding::Xz.decode(&xz).unwrap(), packages);

        let release = fs::read_to_string(builder.release_path()).unwrap();
        let mismatches = crate::release::verify_release(&release, builder.output_dir()).unwrap();
        assert!(mismatches.is_empty(), "{mismatches:?}");
    }

    #[test]
    fn incremental_without_previous_index_falls_back_to_full() {
        let tmp = setup(&[
            ("a.deb", "Package: a\nVersion: 1\nArchitecture: all\n"),
            ("b.deb", "Package: b\nVersion: 1\nArchitecture: all\n"),
        ]);
        let config = RepoConfig::default();
        let builder = builder(&tmp, &config);

        let mode = BuildMode::Incremental(ChangeSet::from_paths(["a.deb"]));
        let report = builder.run(&mode).unwrap();
        assert_eq!(report.mode, "full");
        assert_eq!(report.summary.written, 2);
    }

    #[test]
    fn incremental_merges_into_previous_index() {
        let tmp = setup(&[
            ("a.deb", "Package: a\nVersion: 1\nArchitecture: all\n"),
            ("b.deb", "Package: b\nVersion: 1\nArchitecture: all\n"),
        ]);
        let config = RepoConfig::default();
        let builder = builder(&tmp, &config);
        builder.run(&BuildMode::Full).unwrap();

        fs::write(
            tmp.path().join("downloads/b.deb"),
            "Package: b\nVersion: 2\nArchitecture: all\n",
        )
        .unwrap();
        let mode = BuildMode::Incremental(ChangeSet::from_paths(["downloads/b.deb"]));
        let report = builder.run(&mode).unwrap();
        assert_eq!(report.mode, "incremental");
        assert_eq!(report.summary.evicted, 1);

        let packages = fs::read_to_string(builder.index_path()).unwrap();
        assert!(packages.contains("Version: 2"));
        assert!(!packages.contains("Package: b\nVersion: 1"));
        assert!(packages.contains("Package: a"));
    }

    #[test]
    fn empty_directory_yields_empty_index() {
        let tmp = setup(&[]);
        let config = RepoConfig::default();
        let builder = builder(&tmp, &config);

        let report = builder.run(&BuildMode::Full).unwrap();
        assert_eq!(report.summary.written, 0);
        assert!(fs::read(builder.index_path()).unwrap().is_empty());
        assert_eq!(report.artifacts[0].digests.size, 0);
    }

    #[test]
    fn report_serializes_counters() {
        let tmp = setup(&[("a.deb", "Package: a\nVersion: 1\nArchitecture: all\n")]);
        let config = RepoConfig::default();
        let report = builder(&tmp, &config).run(&BuildMode::Full).unwrap();

        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["mode"], "full");
        assert_eq!(value["summary"]["written"], 1);
        assert_eq!(value["artifacts"][0]["name"], "Packages");
        assert_eq!(value["artifacts"][0]["digests"]["size"], report.artifacts[0].digests.size);
    }

    #[test]
    fn from_changes_picks_mode() {
        assert_eq!(BuildMode::from_changes(None), BuildMode::Full);
        assert!(matches!(
            BuildMode::from_changes(Some(ChangeSet::new())),
            BuildMode::Incremental(_)
        ));
    }
}
