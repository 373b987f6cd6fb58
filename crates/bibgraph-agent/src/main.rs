//! bibgraph — PubMed to VIVO citation ingestion.
//! Entry point for the command-line binary.

mod artifacts;
mod cli;
mod pipeline;

use anyhow::Context;
use bibgraph_common::Config;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::artifacts::RunArtifacts;
use crate::cli::{Cli, Commands};
use crate::pipeline::IngestOptions;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("bibgraph=info,warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Ingest { config, api, rdf, database } => {
            let config = Config::load(&config)
                .with_context(|| format!("loading configuration from {}", config.display()))?;
            info!("Version: {}", env!("CARGO_PKG_VERSION"));

            let today = chrono::Local::now().date_naive();
            let artifacts = RunArtifacts::for_date(&config.folder_for_logs, today);
            let options = IngestOptions { api, rdf, database };

            let outcome = pipeline::ingest(&config, options, &artifacts).await?;
            info!(
                articles = outcome.articles_found,
                uploads = outcome.had_uploads,
                folder = %artifacts.folder.display(),
                "Run finished"
            );

            if let Some(failure) = outcome.failure {
                error!("Run incomplete, see {}", artifacts.output.display());
                return Err(failure);
            }
        }
        Commands::Resolve { config, category, key, label } => {
            let config = Config::load(&config)
                .with_context(|| format!("loading configuration from {}", config.display()))?;
            pipeline::resolve(&config, category, &label, key.as_deref()).await?;
        }
    }

    Ok(())
}
