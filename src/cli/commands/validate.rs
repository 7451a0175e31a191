//! Validate config command implementation
//!
//! Loads the configuration and the rule set it points at, and reports any
//! replacement labels shared between fields.

use super::load_cli_config;
use crate::tokenization::{CollisionPolicy, RuleSet};
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_cli_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration loaded and valid");
                c
            }
            Err(e) => {
                println!("❌ Failed to load configuration");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        let rules = match RuleSet::from_file(&config.rules.path) {
            Ok(rules) => {
                println!("✅ Rule set loaded");
                rules
            }
            Err(e) => {
                println!("❌ Failed to load rule set");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Rule Set: {}", config.rules.path.display());
        println!(
            "  Rules: {} fields in {} groups",
            rules.rule_count(),
            rules.group_count()
        );
        println!("  Mapping Store: {}", config.mapping.path.display());
        println!("  Collision Policy: {}", config.mapping.collision_policy);
        println!(
            "  Document Layout: <{} {}=...> / <{} {}=...>",
            config.document.group_tag,
            config.document.id_attribute,
            config.document.field_tags.join("|"),
            config.document.id_attribute
        );
        println!("  Input Extension: .{}", config.document.extension);
        println!(
            "  De-identified Output: {}",
            config.output.deidentified_dir.display()
        );
        println!(
            "  Re-identified Output: {}",
            config.output.reidentified_dir.display()
        );
        println!("  Parallel Documents: {}", config.batch.parallel_documents);
        println!(
            "  Audit: {}",
            if config.audit.enabled {
                config.audit.log_path.display().to_string()
            } else {
                "disabled".to_string()
            }
        );

        let duplicates = rules.duplicate_labels();
        if !duplicates.is_empty() {
            println!();
            println!("⚠️  Shared replacement labels:");
            for duplicate in &duplicates {
                let locations: Vec<String> = duplicate
                    .locations
                    .iter()
                    .map(|(group, field)| format!("{group}/{field}"))
                    .collect();
                println!("  {}: {}", duplicate.label, locations.join(", "));
            }
            if config.mapping.collision_policy == CollisionPolicy::Overwrite {
                println!("  With collision_policy = \"overwrite\" these can lose original values");
            }
        }
        println!();

        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_validate_missing_explicit_config() {
        let code = ValidateArgs {}
            .execute("/nonexistent/phimask.toml")
            .await
            .unwrap();
        assert_eq!(code, 2);
    }

    #[tokio::test]
    async fn test_validate_with_rules() {
        let mut rules = NamedTempFile::with_suffix(".json").unwrap();
        rules
            .write_all(br#"{"N1": {"1035": "NAME"}, "N2": {"1035": "NAME"}}"#)
            .unwrap();

        let mut config = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            config,
            "[rules]\npath = {:?}",
            rules.path().to_string_lossy()
        )
        .unwrap();

        let code = ValidateArgs {}
            .execute(&config.path().to_string_lossy())
            .await
            .unwrap();
        assert_eq!(code, 0);
    }
}
