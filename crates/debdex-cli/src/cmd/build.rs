//! Build command

use super::{archive_dir, build_mode, open_reader};
use crate::IndexArgs;
use anyhow::{Context, Result};
use debdex_core::{RepoBuilder, RepoConfig};
use std::fs;
use std::path::Path;

/// Run the whole pipeline: index, compressed variants, Release.
pub fn build(config: &RepoConfig, args: &IndexArgs, report_path: Option<&Path>) -> Result<()> {
    let reader = open_reader(args.reader)?;
    let mode = build_mode(args)?;
    let builder = RepoBuilder::new(config, archive_dir(args), &args.output, &*reader);

    let report = builder.run(&mode).context("build failed")?;

    for artifact in &report.artifacts {
        println!("  wrote {} ({} bytes)", artifact.name, artifact.digests.size);
    }
    println!("  wrote Release");

    let s = &report.summary;
    println!(
        "  {} build: {} packages, {} hidden, {} skipped, {} removed",
        report.mode, s.written, s.hidden, s.skipped, s.removed
    );

    if let Some(path) = report_path {
        let json = report.to_json().context("failed to serialize report")?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        println!("  wrote report {}", path.display());
    }
    Ok(())
}
