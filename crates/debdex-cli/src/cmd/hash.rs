//! Hash command

use anyhow::{Context, Result};
use debdex_schema::{DigestKind, FileDigests};
use std::path::PathBuf;

/// Print size and digests of each file, as `Packages` stanza fields or JSON.
pub fn hash(files: &[PathBuf], json: bool) -> Result<()> {
    let mut all = Vec::with_capacity(files.len());
    for file in files {
        let digests = FileDigests::compute_file(file)
            .with_context(|| format!("failed to hash {}", file.display()))?;
        all.push((file, digests));
    }

    if json {
        let entries: Vec<_> = all
            .iter()
            .map(|(file, digests)| {
                serde_json::json!({
                    "path": file.display().to_string(),
                    "digests": digests,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for (file, digests) in &all {
        println!("{}", file.display());
        println!("  Size: {}", digests.size);
        for kind in DigestKind::ALL {
            println!("  {}: {}", kind.package_field(), digests.get(kind));
        }
    }
    Ok(())
}
