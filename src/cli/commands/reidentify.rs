//! Reidentify command implementation
//!
//! Replaces tokens in masked documents with the originals from the mapping
//! store.

use super::{load_cli_config, report_summary};
use crate::config::PhimaskConfig;
use crate::core::pipeline::{collect_inputs, run_batch, Reidentifier};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

/// Arguments for the reidentify command
#[derive(Args, Debug)]
pub struct ReidentifyArgs {
    /// Masked document or directory of masked documents
    #[arg(short, long)]
    pub input: PathBuf,

    /// Override the output directory
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Override the mapping store file
    #[arg(long)]
    pub mapping: Option<PathBuf>,

    /// Override the number of documents processed concurrently
    #[arg(long, value_name = "N")]
    pub parallel: Option<usize>,
}

impl ReidentifyArgs {
    /// Execute the reidentify command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(input = %self.input.display(), "Starting reidentify command");

        let mut config = match load_cli_config(config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("{e}");
                return Ok(2); // Configuration error exit code
            }
        };
        self.apply_overrides(&mut config);

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2);
        }

        let inputs = match collect_inputs(&self.input, &config.document.extension) {
            Ok(inputs) => inputs,
            Err(e) => {
                tracing::error!(error = %e, "Invalid input");
                eprintln!("{e}");
                return Ok(3); // Input error exit code
            }
        };

        let job = Reidentifier::from_config(&config, inputs.folder.as_deref());
        if !job.store().path().exists() {
            tracing::warn!(
                mapping = %job.store().path().display(),
                "Mapping store not found, every document will fail"
            );
        }

        let summary = run_batch(
            Arc::new(job),
            inputs.documents,
            config.batch.parallel_documents,
        )
        .await;

        Ok(report_summary(&summary, false))
    }

    fn apply_overrides(&self, config: &mut PhimaskConfig) {
        if let Some(dir) = &self.output_dir {
            tracing::info!(output_dir = %dir.display(), "Overriding output directory from CLI");
            config.output.reidentified_dir = dir.clone();
        }
        if let Some(mapping) = &self.mapping {
            tracing::info!(mapping = %mapping.display(), "Overriding mapping store from CLI");
            config.mapping.path = mapping.clone();
        }
        if let Some(parallel) = self.parallel {
            config.batch.parallel_documents = parallel;
        }
    }
}
