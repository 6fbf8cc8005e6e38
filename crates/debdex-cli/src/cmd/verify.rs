//! Verify command

use anyhow::{Context, Result, bail};
use debdex_core::release::{parse_release, verify_release};
use debdex_schema::RELEASE_FILE;
use std::fs;
use std::path::Path;

/// Check every `Release` entry against the files in `output`.
///
/// Fails when any size or digest differs or a listed file is missing.
pub fn verify(output: &Path) -> Result<()> {
    let path = output.join(RELEASE_FILE);
    let text =
        fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;

    let entries = parse_release(&text);
    if entries.is_empty() {
        bail!("{} lists no artifacts", path.display());
    }

    let mismatches = verify_release(&text, output)?;
    if mismatches.is_empty() {
        println!("  ok {} entries", entries.len());
        return Ok(());
    }

    for m in &mismatches {
        eprintln!(
            "  mismatch {} [{}]: {}",
            m.entry.name,
            m.entry.kind.release_header(),
            m.problem
        );
    }
    bail!("{} of {} entries do not match", mismatches.len(), entries.len())
}
