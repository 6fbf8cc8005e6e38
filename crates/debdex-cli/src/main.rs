//! debdex - APT/Cydia repository index builder

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use debdex_cli::cmd;
use debdex_cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Build { index, report } => {
            let config = cmd::load_config(&cli.config, cli.icons.as_deref())?;
            cmd::build::build(&config, &index, report.as_deref())
        }
        Commands::Packages { index } => {
            let config = cmd::load_config(&cli.config, cli.icons.as_deref())?;
            cmd::packages::packages(&config, &index)
        }
        Commands::Release { output } => {
            let config = cmd::load_config(&cli.config, cli.icons.as_deref())?;
            cmd::release::release(&config, &output)
        }
        Commands::Hash { files, json } => cmd::hash::hash(&files, json),
        Commands::Verify { output } => cmd::verify::verify(&output),
    }
}
