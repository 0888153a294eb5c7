//! Command-line interface wiring for review-insight.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::Settings;

pub mod clean;
pub mod cluster;
pub mod serve;

/// Top-level CLI definition.
#[derive(Debug, Parser)]
#[command(author, version, about = "Review sentiment and topic analysis", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Parse CLI arguments from the environment.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Dispatch the selected sub-command.
    pub async fn dispatch(self, settings: Settings) -> Result<()> {
        match self.command {
            Commands::Cluster(args) => cluster::run(args, settings).await,
            Commands::Clean(args) => clean::run(args, settings).await,
            Commands::Serve(args) => serve::run(args, settings).await,
        }
    }
}

/// Supported sub-commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the full clustering task over a CSV batch.
    Cluster(cluster::Args),
    /// Normalize raw review text without touching any model.
    Clean(clean::Args),
    /// Serve the JSON prediction API.
    Serve(serve::Args),
}
