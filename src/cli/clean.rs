//! CLI entry-point for text normalization.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tracing::{info, instrument};

use crate::{config::Settings, text};

/// Args for the `clean` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Text file with one review per line.
    #[arg(long)]
    pub input: PathBuf,
    /// Write cleaned lines here instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[instrument(skip(_settings))]
pub async fn run(args: Args, _settings: Settings) -> Result<()> {
    let raw = tokio::fs::read_to_string(&args.input)
        .await
        .with_context(|| format!("reading {}", args.input.display()))?;
    let cleaned: Vec<String> = raw.lines().map(text::clean).collect();

    match args.output {
        Some(path) => {
            tokio::fs::write(&path, cleaned.join("\n"))
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            info!(lines = cleaned.len(), path = %path.display(), "wrote cleaned text");
        }
        None => {
            for line in cleaned {
                println!("{line}");
            }
        }
    }
    Ok(())
}
