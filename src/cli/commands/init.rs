//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file and, optionally, a sample rule set.

use crate::cli::DEFAULT_CONFIG_FILE;
use crate::config::PhimaskConfig;
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub output: String,

    /// Also write a sample rule set at the configured rules path
    #[arg(long)]
    pub with_rules: bool,

    /// Overwrite existing files
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing phimask configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2); // Configuration error exit code
        }

        let rules_path = PhimaskConfig::default().rules.path;
        if self.with_rules && rules_path.exists() && !self.force {
            println!("❌ Rule set already exists: {}", rules_path.display());
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        if let Err(e) = write_file(Path::new(&self.output), SAMPLE_CONFIG) {
            println!("❌ Failed to write configuration file");
            println!("   Error: {e}");
            return Ok(5); // Fatal error exit code
        }
        println!("✅ Configuration file created: {}", self.output);

        if self.with_rules {
            if let Err(e) = write_file(&rules_path, SAMPLE_RULES) {
                println!("❌ Failed to write rule set");
                println!("   Error: {e}");
                return Ok(5);
            }
            println!("✅ Rule set created: {}", rules_path.display());
        }

        println!();
        println!("Next steps:");
        println!("  1. Edit {} with your settings", self.output);
        println!(
            "  2. List the fields to mask in {} (group id -> field id -> label)",
            rules_path.display()
        );
        println!("  3. Validate configuration: phimask validate-config");
        println!("  4. Mask documents: phimask deidentify --input data/xml_files");
        println!("  5. Restore documents: phimask reidentify --input data/xml_files/deidentified");
        println!();
        Ok(0)
    }
}

fn write_file(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)
}

/// Sample configuration with every setting at its default
const SAMPLE_CONFIG: &str = r#"# phimask Configuration File
# Reversible PHI tokenization for X12 documents rendered as XML
#
# Every setting below shows its default. Any value can be overridden with
# PHIMASK_<SECTION>_<KEY>, e.g. PHIMASK_MAPPING_PATH.

[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# Mask in memory only; write no documents and no mappings
dry_run = false

[rules]
# group id -> field id -> replacement label (.json or .toml)
path = "rules/phi_fields_to_mask.json"

[mapping]
# token -> original value, shared by deidentify and reidentify
path = "rules/phi_deid_reid_mapping.json"

# When a token is already mapped to a different value:
#   disambiguate - advance to the next free LABEL_n (default)
#   reject       - fail the document
#   overwrite    - replace the earlier entry
collision_policy = "disambiguate"

[document]
group_tag = "loop"
field_tags = ["ele"]
id_attribute = "id"
extension = "xml"

[output]
deidentified_dir = "data/xml_files/deidentified"
reidentified_dir = "data/xml_files/reidentified"

[batch]
# Documents processed concurrently (1-64)
parallel_documents = 1

[audit]
# One entry per de-identified document; originals are stored as SHA-256 hashes
enabled = false
log_path = "logs/phimask_audit.log"
json_format = true

[logging]
local_enabled = false
local_path = "logs"
local_rotation = "daily"  # daily | hourly | never
"#;

/// Sample rule set covering common 837 subscriber and patient fields
const SAMPLE_RULES: &str = r#"{
  "2010BA": {
    "NM103": "SUBSCRIBER_LAST_NAME",
    "NM104": "SUBSCRIBER_FIRST_NAME",
    "NM109": "SUBSCRIBER_MEMBER_ID",
    "N301": "SUBSCRIBER_ADDRESS",
    "DMG02": "SUBSCRIBER_DOB"
  },
  "2010CA": {
    "NM103": "PATIENT_LAST_NAME",
    "NM104": "PATIENT_FIRST_NAME",
    "N301": "PATIENT_ADDRESS",
    "DMG02": "PATIENT_DOB"
  }
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::tokenization::RuleSet;
    use tempfile::tempdir;

    #[test]
    fn test_sample_config_matches_defaults() {
        let config = parse_config(SAMPLE_CONFIG).unwrap();
        let defaults = PhimaskConfig::default();

        assert_eq!(config.rules.path, defaults.rules.path);
        assert_eq!(config.mapping.path, defaults.mapping.path);
        assert_eq!(config.document.field_tags, defaults.document.field_tags);
        assert_eq!(config.batch.parallel_documents, defaults.batch.parallel_documents);
    }

    #[test]
    fn test_sample_rules_parse() {
        let rules = RuleSet::from_json(SAMPLE_RULES).unwrap();
        assert_eq!(rules.group_count(), 2);
        assert!(rules.duplicate_labels().is_empty());
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("phimask.toml");
        fs::write(&output, "# existing").unwrap();

        let args = InitArgs {
            output: output.to_string_lossy().into_owned(),
            with_rules: false,
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 2);
        assert_eq!(fs::read_to_string(&output).unwrap(), "# existing");
    }

    #[tokio::test]
    async fn test_init_writes_config() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("conf").join("phimask.toml");

        let args = InitArgs {
            output: output.to_string_lossy().into_owned(),
            with_rules: false,
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 0);
        assert!(fs::read_to_string(&output).unwrap().contains("[mapping]"));
    }
}
