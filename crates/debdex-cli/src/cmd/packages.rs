//! Packages command

use super::{archive_dir, build_mode, display_name, open_reader};
use crate::IndexArgs;
use anyhow::{Context, Result};
use debdex_core::{RepoBuilder, RepoConfig};

/// Write `Packages` and its compressed variants without touching `Release`.
pub fn packages(config: &RepoConfig, args: &IndexArgs) -> Result<()> {
    let reader = open_reader(args.reader)?;
    let mode = build_mode(args)?;
    let builder = RepoBuilder::new(config, archive_dir(args), &args.output, &*reader);

    let (outcome, label) = builder.build_index(&mode).context("failed to build index")?;
    let written = builder
        .write_index(&outcome.document)
        .context("failed to write index")?;

    for path in &written {
        println!("  wrote {}", display_name(path));
    }
    println!(
        "  {label} build: {} packages, {} hidden, {} skipped",
        outcome.summary.written, outcome.summary.hidden, outcome.summary.skipped
    );
    Ok(())
}
