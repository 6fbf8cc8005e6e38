//! Command implementations

pub mod build;
pub mod hash;
pub mod packages;
pub mod release;
pub mod verify;

use crate::{IndexArgs, ReaderKind};
use anyhow::{Context, Result};
use debdex_core::{ArchiveDir, BuildMode, ChangeSet, DpkgDeb, MetadataReader, NativeDeb, RepoConfig};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Load the repository config and icon map.
pub fn load_config(path: &Path, icons: Option<&Path>) -> Result<RepoConfig> {
    RepoConfig::load(path, icons).with_context(|| format!("failed to load {}", path.display()))
}

/// Instantiate the requested control metadata reader.
pub fn open_reader(kind: ReaderKind) -> Result<Box<dyn MetadataReader>> {
    match kind {
        ReaderKind::Native => Ok(Box::new(NativeDeb)),
        ReaderKind::Dpkg => Ok(Box::new(DpkgDeb::locate()?)),
        ReaderKind::Auto => match DpkgDeb::locate() {
            Ok(dpkg) => Ok(Box::new(dpkg)),
            Err(e) => {
                debug!("{e}, using built-in reader");
                Ok(Box::new(NativeDeb))
            }
        },
    }
}

/// The archive directory and its `Filename` prefix.
pub fn archive_dir(args: &IndexArgs) -> ArchiveDir {
    let dir = ArchiveDir::new(&args.archives);
    match &args.prefix {
        Some(prefix) => dir.with_prefix(prefix.clone()),
        None => dir,
    }
}

/// Full unless changed archives were given (and `--full` was not).
pub fn build_mode(args: &IndexArgs) -> Result<BuildMode> {
    if args.full || (args.changes.is_none() && args.changed.is_empty()) {
        return Ok(BuildMode::Full);
    }

    let mut changes = match &args.changes {
        Some(path) => ChangeSet::load(path)
            .with_context(|| format!("failed to read change list {}", path.display()))?,
        None => ChangeSet::new(),
    };
    for path in &args.changed {
        changes.insert(path.clone());
    }
    Ok(BuildMode::Incremental(changes))
}

/// Base file name for display.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

/// Output-relative paths of `names`.
pub fn output_paths(output: &Path, names: &[&str]) -> Vec<PathBuf> {
    names.iter().map(|n| output.join(n)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cli, Commands};
    use clap::Parser;

    fn index_args(argv: &[&str]) -> IndexArgs {
        let mut full = vec!["debdex", "packages"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Commands::Packages { index } => index,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn no_changes_means_full() {
        assert_eq!(build_mode(&index_args(&[])).unwrap(), BuildMode::Full);
    }

    #[test]
    fn changed_archives_mean_incremental() {
        let mode = build_mode(&index_args(&["--changed", "downloads/a.deb", "--changed", "b.deb"]))
            .unwrap();
        let BuildMode::Incremental(changes) = mode else {
            panic!("expected incremental");
        };
        assert_eq!(changes.len(), 2);
    }

    #[test]
    fn full_conflicts_with_changes() {
        let parsed = Cli::try_parse_from(["debdex", "build", "--full", "--changed", "a.deb"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn prefix_defaults_to_archive_path() {
        let dir = archive_dir(&index_args(&["--archives", "pool/main"]));
        assert_eq!(dir.filename_for(Path::new("x.deb")), "pool/main/x.deb");

        let dir = archive_dir(&index_args(&["--archives", "/srv/debs", "--prefix", "debs"]));
        assert_eq!(dir.filename_for(Path::new("x.deb")), "debs/x.deb");
    }

    #[test]
    fn native_reader_is_always_available() {
        assert!(open_reader(ReaderKind::Native).is_ok());
        assert!(open_reader(ReaderKind::Auto).is_ok());
    }
}
