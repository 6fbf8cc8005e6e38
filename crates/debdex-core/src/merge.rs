//! Index merging.
//!
//! Two modes:
//!
//! - **Full rebuild**: every archive in the directory, in file-name order.
//!   The output keeps that enumeration order.
//! - **Incremental**: only the archives of a [`ChangeSet`], merged into the
//!   previous index. The output is sorted by identity key.
//!
//! Incremental invalidation is keyed on the `Filename` field, not on the
//! identity: the same archive file can be re-uploaded with different control
//! data, and an archive that becomes hidden must take its old visible stanza
//! with it. Every archive the run processed "touches" its filename, and
//! previous stanzas with a touched filename are dropped before the new
//! records are inserted.
//!
//! Extraction runs in parallel; the merge itself runs on the calling thread
//! over the fully collected results.

use crate::changes::ChangeSet;
use crate::config::MappingTables;
use crate::enrich::{Enrichment, PackageRecord, enrich};
use crate::error::{BuildError, Result};
use crate::extract::{MetadataReader, extract_archive};
use crate::walk::ArchiveDir;
use debdex_schema::{IdentityKey, IndexDocument, IndexEntry};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Outcome of processing one archive, before merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Staged {
    /// A record for the index.
    Visible(PackageRecord),
    /// Suppressed by the hidden set. Still touches its filename.
    Hidden {
        /// Identity of the suppressed package.
        key: IdentityKey,
        /// The archive's `Filename` value.
        filename: String,
    },
    /// The archive no longer exists. Touches its filename, so its previous
    /// stanza is dropped.
    Removed {
        /// The archive's `Filename` value.
        filename: String,
    },
    /// Extraction failed; the archive is ignored and its previous stanza, if
    /// any, is kept.
    Skipped {
        /// The archive's `Filename` value.
        filename: String,
    },
}

impl Staged {
    /// The `Filename` value this outcome concerns.
    pub fn filename(&self) -> &str {
        match self {
            Self::Visible(record) => &record.filename,
            Self::Hidden { filename, .. }
            | Self::Removed { filename }
            | Self::Skipped { filename } => filename,
        }
    }

    /// Whether this outcome invalidates previous stanzas for its filename.
    pub fn touches(&self) -> bool {
        !matches!(self, Self::Skipped { .. })
    }
}

impl From<Enrichment> for Staged {
    fn from(enrichment: Enrichment) -> Self {
        match enrichment {
            Enrichment::Visible(record) => Self::Visible(record),
            Enrichment::Hidden { key, filename } => Self::Hidden { key, filename },
        }
    }
}

/// Counters describing a merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    /// Archives processed this run.
    pub processed: usize,
    /// Stanzas in the output document.
    pub written: usize,
    /// Archives suppressed by the hidden set.
    pub hidden: usize,
    /// Archives skipped after an extraction failure.
    pub skipped: usize,
    /// Archives listed as changed that no longer exist.
    pub removed: usize,
    /// Previous stanzas dropped because their filename was touched.
    pub evicted: usize,
    /// Records that replaced another record with the same identity.
    pub replaced: usize,
    /// Previous stanzas dropped for lacking identity fields.
    pub rejected: usize,
}

/// The merged document and its counters.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// The new index.
    pub document: IndexDocument,
    /// What happened.
    pub summary: MergeSummary,
}

/// How extraction failures are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailurePolicy {
    /// I/O failures abort; a partial index is unacceptable.
    Strict,
    /// I/O failures skip the archive; missing files count as removals.
    Lenient,
}

/// Builds index documents from an archive directory.
pub struct IndexMerger<'a> {
    archives: &'a ArchiveDir,
    reader: &'a dyn MetadataReader,
    tables: &'a MappingTables,
}

impl std::fmt::Debug for IndexMerger<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexMerger")
            .field("archives", &self.archives)
            .finish_non_exhaustive()
    }
}

impl<'a> IndexMerger<'a> {
    /// Create a merger over `archives`.
    pub fn new(
        archives: &'a ArchiveDir,
        reader: &'a dyn MetadataReader,
        tables: &'a MappingTables,
    ) -> Self {
        Self {
            archives,
            reader,
            tables,
        }
    }

    /// Rebuild the index from every archive in the directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed or any archive
    /// cannot be read. Malformed archives are skipped.
    pub fn full_rebuild(&self) -> Result<MergeOutcome> {
        let paths = self.archives.list()?;
        info!(archives = paths.len(), "full rebuild");
        let staged = self.stage(&paths, FailurePolicy::Strict)?;
        Ok(merge_full(staged))
    }

    /// Merge the archives of `changes` into the `previous` index text.
    ///
    /// # Errors
    ///
    /// Only fatal reader errors propagate; per-archive failures are skipped.
    pub fn incremental(&self, previous: &str, changes: &ChangeSet) -> Result<MergeOutcome> {
        let parsed = IndexDocument::parse(previous);
        for rejected in &parsed.rejected {
            warn!("dropping previous stanza: {rejected}");
        }

        let paths: Vec<PathBuf> = changes.iter().map(|p| self.archives.resolve(p)).collect();
        info!(
            previous = parsed.document.len(),
            changed = paths.len(),
            "incremental merge"
        );
        let staged = self.stage(&paths, FailurePolicy::Lenient)?;

        let mut outcome = merge_incremental(parsed.document, staged);
        outcome.summary.rejected = parsed.rejected.len();
        Ok(outcome)
    }

    /// Extract and enrich archives in parallel, preserving input order.
    fn stage(&self, paths: &[PathBuf], policy: FailurePolicy) -> Result<Vec<Staged>> {
        paths
            .par_iter()
            .map(|path| self.stage_one(path, policy))
            .collect()
    }

    fn stage_one(&self, path: &Path, policy: FailurePolicy) -> Result<Staged> {
        let filename = self.archives.filename_for(path);
        match extract_archive(path, filename.clone(), self.reader) {
            Ok(record) => Ok(enrich(record, self.tables).into()),
            Err(err) => triage(err, filename, policy),
        }
    }
}

/// Decide whether an extraction failure is fatal.
fn triage(err: BuildError, filename: String, policy: FailurePolicy) -> Result<Staged> {
    match (&err, policy) {
        (BuildError::MalformedArchive { .. }, _) => {
            warn!("skipping: {err}");
            Ok(Staged::Skipped { filename })
        }
        (BuildError::Io { .. }, FailurePolicy::Lenient) if err.is_not_found() => {
            info!(filename = %filename, "archive removed");
            Ok(Staged::Removed { filename })
        }
        (BuildError::Io { .. }, FailurePolicy::Lenient) => {
            warn!("skipping: {err}");
            Ok(Staged::Skipped { filename })
        }
        _ => Err(err),
    }
}

fn count_outcomes(staged: &[Staged], summary: &mut MergeSummary) {
    summary.processed = staged.len();
    for s in staged {
        match s {
            Staged::Visible(_) => {}
            Staged::Hidden { .. } => summary.hidden += 1,
            Staged::Removed { .. } => summary.removed += 1,
            Staged::Skipped { .. } => summary.skipped += 1,
        }
    }
}

/// Merge for a full rebuild.
///
/// Records keep their enumeration order. When two records share an identity
/// the later one wins and keeps its own position.
pub fn merge_full(staged: Vec<Staged>) -> MergeOutcome {
    let mut summary = MergeSummary::default();
    count_outcomes(&staged, &mut summary);

    let mut seen = HashSet::new();
    let mut kept: Vec<IndexEntry> = Vec::new();
    for s in staged.into_iter().rev() {
        let Staged::Visible(record) = s else { continue };
        if seen.insert(record.key.clone()) {
            kept.push(record.into_entry());
        } else {
            warn!(key = %record.key, filename = %record.filename, "superseded by a later archive");
            summary.replaced += 1;
        }
    }
    kept.reverse();

    summary.written = kept.len();
    MergeOutcome {
        document: kept.into_iter().collect(),
        summary,
    }
}

/// Merge for an incremental build.
///
/// Previous stanzas whose `Filename` was touched are dropped, the new
/// records are inserted (replacing any stanza with the same identity), and
/// the result is sorted by identity key.
pub fn merge_incremental(previous: IndexDocument, staged: Vec<Staged>) -> MergeOutcome {
    let mut summary = MergeSummary::default();
    count_outcomes(&staged, &mut summary);

    let touched: HashSet<&str> = staged
        .iter()
        .filter(|s| s.touches())
        .map(Staged::filename)
        .collect();

    let mut merged: BTreeMap<IdentityKey, IndexEntry> = BTreeMap::new();
    for entry in previous {
        if entry.filename().is_some_and(|f| touched.contains(f)) {
            debug!(key = %entry.key, "evicted");
            summary.evicted += 1;
            continue;
        }
        if merged.insert(entry.key.clone(), entry).is_some() {
            summary.replaced += 1;
        }
    }

    for s in &staged {
        let Staged::Visible(record) = s else { continue };
        if merged
            .insert(record.key.clone(), record.clone().into_entry())
            .is_some()
        {
            debug!(key = %record.key, "replaced");
            summary.replaced += 1;
        }
    }

    summary.written = merged.len();
    MergeOutcome {
        document: merged.into_values().collect(),
        summary,
    }
}
