//! debdex - APT/Cydia repository index builder
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
//!
//! Scans a flat directory of `.deb` archives and writes the repository
//! metadata clients fetch:
//!
//! ```text
//! <output>/
//! ├── Packages       # one stanza per visible archive
//! ├── Packages.gz
//! ├── Packages.bz2
//! ├── Packages.xz
//! ├── Packages.zst
//! └── Release        # digests of the five files above
//! ```

pub mod cmd;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "debdex")]
#[command(author, version, about = "debdex - APT/Cydia repository index builder")]
pub struct Cli {
    /// Repository config file (YAML, or TOML with a .toml extension)
    #[arg(short, long, global = true, default_value = "index.yaml")]
    pub config: PathBuf,

    /// Icon map; defaults to icons/index.yaml next to the config file
    #[arg(long, global = true)]
    pub icons: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build Packages, its compressed variants and Release
    Build {
        #[command(flatten)]
        index: IndexArgs,
        /// Write a JSON build report to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Build Packages and its compressed variants only
    Packages {
        #[command(flatten)]
        index: IndexArgs,
    },
    /// Regenerate Release from the artifacts already in the output directory
    Release {
        /// Directory holding the Packages files
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
    /// Print size and MD5/SHA1/SHA256/SHA512 digests of files
    Hash {
        /// Files to hash
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Print JSON instead of stanza fields
        #[arg(long)]
        json: bool,
    },
    /// Check Release entries against the files on disk
    Verify {
        /// Directory holding Release and the Packages files
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
}

/// Options shared by the commands that build the index.
#[derive(Debug, Clone, Args)]
pub struct IndexArgs {
    /// Directory of .deb archives
    #[arg(short, long, default_value = "downloads")]
    pub archives: PathBuf,

    /// Prefix for Filename fields; defaults to the archives path
    #[arg(long)]
    pub prefix: Option<String>,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// File listing changed archives, one path per line
    #[arg(long, conflicts_with = "full")]
    pub changes: Option<PathBuf>,

    /// Changed archive (repeatable)
    #[arg(long = "changed", conflicts_with = "full")]
    pub changed: Vec<PathBuf>,

    /// Rebuild from every archive, ignoring the previous index
    #[arg(long)]
    pub full: bool,

    /// Control metadata reader
    #[arg(long, value_enum, default_value_t = ReaderKind::Auto)]
    pub reader: ReaderKind,
}

/// Which control metadata reader to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReaderKind {
    /// dpkg-deb when it is on PATH, the built-in reader otherwise
    Auto,
    /// dpkg-deb subprocess
    Dpkg,
    /// Built-in ar/tar reader
    Native,
}
