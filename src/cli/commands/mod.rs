//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod deidentify;
pub mod init;
pub mod reidentify;
pub mod validate;

use crate::cli::DEFAULT_CONFIG_FILE;
use crate::config::{load_config, load_config_or_default, PhimaskConfig};
use crate::core::pipeline::BatchSummary;
use crate::domain::Result;

/// Load the configuration for a command
///
/// The default file may be absent, in which case built-in defaults apply.
/// An explicitly named file must exist.
pub fn load_cli_config(config_path: &str) -> Result<PhimaskConfig> {
    if config_path == DEFAULT_CONFIG_FILE {
        load_config_or_default(config_path)
    } else {
        load_config(config_path)
    }
}

/// Print per-document results and the closing summary line
///
/// Returns the exit code: 0 when every document succeeded, 1 otherwise.
fn report_summary(summary: &BatchSummary, dry_run: bool) -> i32 {
    for outcome in &summary.outcomes {
        match &outcome.result {
            Ok(processed) if processed.written => {
                println!(
                    "✅ {} -> {} ({} fields)",
                    outcome.input.display(),
                    processed.output.display(),
                    processed.fields
                );
            }
            Ok(processed) => {
                println!(
                    "🔍 {} would be written to {} ({} fields)",
                    outcome.input.display(),
                    processed.output.display(),
                    processed.fields
                );
            }
            Err(failure) => {
                println!("❌ {}: {}", outcome.input.display(), failure.message);
            }
        }
    }

    println!();
    println!(
        "{}{}: {} documents, {} succeeded, {} failed, {} fields in {:.2}s",
        summary.job,
        if dry_run { " (dry run)" } else { "" },
        summary.total_documents,
        summary.succeeded,
        summary.failed,
        summary.total_fields,
        summary.duration.as_secs_f64()
    );

    if summary.is_successful() {
        0
    } else {
        1
    }
}
