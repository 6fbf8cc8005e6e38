//! Core library for debdex.
//!
//! Turns a flat directory of `.deb` archives into a `Packages` index, its
//! four compressed variants and a `Release` digest summary. The stages run in
//! order:
//!
//! ```text
//! extract -> enrich -> merge -> compress -> release
//! ```
//!
//! [`pipeline::RepoBuilder`] drives them; each stage is also usable on its own.

pub mod changes;
pub mod compress;
pub mod config;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod io;
pub mod merge;
pub mod pipeline;
pub mod release;
pub mod walk;

pub use changes::ChangeSet;
pub use config::{MappingTables, ReleaseMetadata, RepoConfig};
pub use error::{BuildError, Result};
pub use extract::{DpkgDeb, MetadataReader, NativeDeb};
pub use merge::{IndexMerger, MergeOutcome, MergeSummary};
pub use pipeline::{BuildMode, BuildReport, RepoBuilder};
pub use walk::ArchiveDir;

/// Names of the artifacts a build produces, in `Release` order.
pub const INDEX_ARTIFACTS: [&str; 5] = [
    "Packages",
    "Packages.gz",
    "Packages.bz2",
    "Packages.xz",
    "Packages.zst",
];
