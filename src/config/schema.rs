//! Configuration schema types
//!
//! Every section has defaults, so an empty file (or no file at all) yields a
//! working configuration matching the conventional project layout.

use crate::tokenization::CollisionPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main phimask configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhimaskConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Masking rule set location
    #[serde(default)]
    pub rules: RulesConfig,

    /// Mapping store location and collision handling
    #[serde(default)]
    pub mapping: MappingConfig,

    /// Element and attribute names of the document layout
    #[serde(default)]
    pub document: DocumentConfig,

    /// Output directories
    #[serde(default)]
    pub output: OutputConfig,

    /// Batch processing
    #[serde(default)]
    pub batch: BatchConfig,

    /// Audit trail
    #[serde(default)]
    pub audit: AuditConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PhimaskConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.rules.validate()?;
        self.mapping.validate()?;
        self.document.validate()?;
        self.output.validate()?;
        self.batch.validate()?;
        self.audit.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Dry run mode (mask in memory, write nothing)
    #[serde(default)]
    pub dry_run: bool,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
        }
    }
}

/// Rule set configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Rule set file (`.json` or `.toml`)
    #[serde(default = "default_rules_path")]
    pub path: PathBuf,
}

impl RulesConfig {
    fn validate(&self) -> Result<(), String> {
        if self.path.as_os_str().is_empty() {
            return Err("rules.path cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            path: default_rules_path(),
        }
    }
}

/// Mapping store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingConfig {
    /// Mapping store file shared by de- and re-identification
    #[serde(default = "default_mapping_path")]
    pub path: PathBuf,

    /// What to do when a token is already mapped to a different value
    #[serde(default)]
    pub collision_policy: CollisionPolicy,
}

impl MappingConfig {
    fn validate(&self) -> Result<(), String> {
        if self.path.as_os_str().is_empty() {
            return Err("mapping.path cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            path: default_mapping_path(),
            collision_policy: CollisionPolicy::default(),
        }
    }
}

/// Document layout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// Element name of group nodes
    #[serde(default = "default_group_tag")]
    pub group_tag: String,

    /// Element names of field nodes
    #[serde(default = "default_field_tags")]
    pub field_tags: Vec<String>,

    /// Attribute holding group and field identifiers
    #[serde(default = "default_id_attribute")]
    pub id_attribute: String,

    /// File extension picked up from input directories
    #[serde(default = "default_extension")]
    pub extension: String,
}

impl DocumentConfig {
    fn validate(&self) -> Result<(), String> {
        if self.group_tag.trim().is_empty() {
            return Err("document.group_tag cannot be empty".to_string());
        }
        if self.field_tags.is_empty() || self.field_tags.iter().any(|t| t.trim().is_empty()) {
            return Err("document.field_tags must list at least one non-empty tag".to_string());
        }
        if self.field_tags.contains(&self.group_tag) {
            return Err(format!(
                "document.group_tag '{}' cannot also be a field tag",
                self.group_tag
            ));
        }
        if self.id_attribute.trim().is_empty() {
            return Err("document.id_attribute cannot be empty".to_string());
        }
        if self.extension.trim().is_empty() || self.extension.starts_with('.') {
            return Err(format!(
                "Invalid document.extension '{}'. Use the bare extension, e.g. 'xml'",
                self.extension
            ));
        }
        Ok(())
    }
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            group_tag: default_group_tag(),
            field_tags: default_field_tags(),
            id_attribute: default_id_attribute(),
            extension: default_extension(),
        }
    }
}

/// Output directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Where de-identified documents are written
    #[serde(default = "default_deidentified_dir")]
    pub deidentified_dir: PathBuf,

    /// Where re-identified documents are written
    #[serde(default = "default_reidentified_dir")]
    pub reidentified_dir: PathBuf,
}

impl OutputConfig {
    fn validate(&self) -> Result<(), String> {
        if self.deidentified_dir.as_os_str().is_empty() {
            return Err("output.deidentified_dir cannot be empty".to_string());
        }
        if self.reidentified_dir.as_os_str().is_empty() {
            return Err("output.reidentified_dir cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            deidentified_dir: default_deidentified_dir(),
            reidentified_dir: default_reidentified_dir(),
        }
    }
}

/// Batch processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Documents processed concurrently (1-64)
    #[serde(default = "default_parallel_documents")]
    pub parallel_documents: usize,
}

impl BatchConfig {
    fn validate(&self) -> Result<(), String> {
        if self.parallel_documents < 1 || self.parallel_documents > 64 {
            return Err(format!(
                "batch.parallel_documents must be between 1 and 64, got {}",
                self.parallel_documents
            ));
        }
        Ok(())
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            parallel_documents: default_parallel_documents(),
        }
    }
}

/// Audit trail configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Write one audit entry per de-identified document
    #[serde(default)]
    pub enabled: bool,

    /// Audit log file
    #[serde(default = "default_audit_log_path")]
    pub log_path: PathBuf,

    /// JSON lines (true) or plain text (false)
    #[serde(default = "default_true")]
    pub json_format: bool,
}

impl AuditConfig {
    fn validate(&self) -> Result<(), String> {
        if self.enabled && self.log_path.as_os_str().is_empty() {
            return Err("audit.log_path cannot be empty when audit is enabled".to_string());
        }
        Ok(())
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_path: default_audit_log_path(),
            json_format: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_rules_path() -> PathBuf {
    PathBuf::from("rules/phi_fields_to_mask.json")
}

fn default_mapping_path() -> PathBuf {
    PathBuf::from("rules/phi_deid_reid_mapping.json")
}

fn default_group_tag() -> String {
    "loop".to_string()
}

fn default_field_tags() -> Vec<String> {
    vec!["ele".to_string()]
}

fn default_id_attribute() -> String {
    "id".to_string()
}

fn default_extension() -> String {
    "xml".to_string()
}

fn default_deidentified_dir() -> PathBuf {
    PathBuf::from("data/xml_files/deidentified")
}

fn default_reidentified_dir() -> PathBuf {
    PathBuf::from("data/xml_files/reidentified")
}

fn default_parallel_documents() -> usize {
    1
}

fn default_audit_log_path() -> PathBuf {
    PathBuf::from("logs/phimask_audit.log")
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
