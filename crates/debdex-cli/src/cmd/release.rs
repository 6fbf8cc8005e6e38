//! Release command

use super::output_paths;
use anyhow::{Context, Result};
use chrono::Utc;
use debdex_core::io::write_atomic;
use debdex_core::release::{hash_artifacts, render_release};
use debdex_core::{INDEX_ARTIFACTS, RepoConfig};
use debdex_schema::RELEASE_FILE;
use std::path::Path;

/// Re-hash the index artifacts in `output` and rewrite `Release`.
pub fn release(config: &RepoConfig, output: &Path) -> Result<()> {
    let paths = output_paths(output, &INDEX_ARTIFACTS);
    let artifacts = hash_artifacts(&paths)
        .context("failed to hash index artifacts (run `debdex packages` first)")?;

    let text = render_release(&config.release, &artifacts, Utc::now());
    let path = output.join(RELEASE_FILE);
    write_atomic(&path, text.as_bytes())?;

    println!("  wrote {RELEASE_FILE} ({} artifacts)", artifacts.len());
    Ok(())
}
