//! CLI entry-point for one full clustering run.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tracing::{info, instrument};

use crate::{
    config::Settings,
    nlp::ModelContext,
    pipeline::{self, TaskMessage},
};

/// Args for the `cluster` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// CSV file with `text` and `src` columns (optional `ID`).
    #[arg(long, required_unless_present = "message", conflicts_with = "message")]
    pub input: Option<PathBuf>,
    /// JSON task message carrying `csv_data` and `task_arg_id`, as queued
    /// by an upstream producer.
    #[arg(long)]
    pub message: Option<PathBuf>,
    /// Identifier carried through the logs when reading plain CSV.
    #[arg(long, default_value = "local")]
    pub task_id: String,
    /// Write the JSON result here instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let (csv_data, task_id) = match (&args.input, &args.message) {
        (_, Some(path)) => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            let message: TaskMessage = serde_json::from_str(&raw)
                .with_context(|| format!("decoding task message {}", path.display()))?;
            (message.csv_data, message.task_arg_id)
        }
        (Some(path), None) => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            (raw, args.task_id.clone())
        }
        (None, None) => unreachable!("clap enforces input or message"),
    };

    let models = ModelContext::initialise(&settings)?;
    let result = pipeline::run_clustering_task(&models, &settings, &csv_data, &task_id)?;

    let rendered = serde_json::to_string_pretty(&result)?;
    match args.output {
        Some(path) => {
            tokio::fs::write(&path, rendered)
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "wrote clustering result");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
