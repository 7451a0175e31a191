//! Deidentify command implementation
//!
//! Masks every rule-selected field of the input documents and merges the
//! new tokens into the mapping store.

use super::{load_cli_config, report_summary};
use crate::config::PhimaskConfig;
use crate::core::pipeline::{collect_inputs, run_batch, Deidentifier};
use crate::tokenization::CollisionPolicy;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

/// Arguments for the deidentify command
#[derive(Args, Debug)]
pub struct DeidentifyArgs {
    /// Input document or directory of documents
    #[arg(short, long)]
    pub input: PathBuf,

    /// Override the output directory
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Override the rule set file
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Override the mapping store file
    #[arg(long)]
    pub mapping: Option<PathBuf>,

    /// Override the collision policy (disambiguate, reject, overwrite)
    #[arg(long, value_name = "POLICY")]
    pub collision_policy: Option<CollisionPolicy>,

    /// Override the number of documents processed concurrently
    #[arg(long, value_name = "N")]
    pub parallel: Option<usize>,

    /// Dry run mode - mask in memory without writing documents or mappings
    #[arg(long)]
    pub dry_run: bool,
}

impl DeidentifyArgs {
    /// Execute the deidentify command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(input = %self.input.display(), "Starting deidentify command");

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

        let job = match Deidentifier::from_config(&config, inputs.folder.as_deref()) {
            Ok(job) => job,
            Err(e) => {
                tracing::error!(error = %e, kind = e.kind(), "Failed to prepare de-identification");
                eprintln!("{e}");
                return Ok(2);
            }
        };

        if job.is_dry_run() {
            println!("🔍 Dry run: no documents or mappings will be written");
        }

        let summary = run_batch(
            Arc::new(job),
            inputs.documents,
            config.batch.parallel_documents,
        )
        .await;

        Ok(report_summary(&summary, config.application.dry_run))
    }

    fn apply_overrides(&self, config: &mut PhimaskConfig) {
        if let Some(dir) = &self.output_dir {
            tracing::info!(output_dir = %dir.display(), "Overriding output directory from CLI");
            config.output.deidentified_dir = dir.clone();
        }
        if let Some(rules) = &self.rules {
            tracing::info!(rules = %rules.display(), "Overriding rule set from CLI");
            config.rules.path = rules.clone();
        }
        if let Some(mapping) = &self.mapping {
            tracing::info!(mapping = %mapping.display(), "Overriding mapping store from CLI");
            config.mapping.path = mapping.clone();
        }
        if let Some(policy) = self.collision_policy {
            tracing::info!(policy = %policy, "Overriding collision policy from CLI");
            config.mapping.collision_policy = policy;
        }
        if let Some(parallel) = self.parallel {
            config.batch.parallel_documents = parallel;
        }
        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.application.dry_run = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> DeidentifyArgs {
        DeidentifyArgs {
            input: PathBuf::from("in"),
            output_dir: Some(PathBuf::from("masked")),
            rules: None,
            mapping: Some(PathBuf::from("store.json")),
            collision_policy: Some(CollisionPolicy::Reject),
            parallel: Some(2),
            dry_run: true,
        }
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = PhimaskConfig::default();
        args().apply_overrides(&mut config);

        assert_eq!(config.output.deidentified_dir, PathBuf::from("masked"));
        assert_eq!(config.rules.path, PhimaskConfig::default().rules.path);
        assert_eq!(config.mapping.path, PathBuf::from("store.json"));
        assert_eq!(config.mapping.collision_policy, CollisionPolicy::Reject);
        assert_eq!(config.batch.parallel_documents, 2);
        assert!(config.application.dry_run);
    }
}
