//! Configuration management for phimask.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! phimask uses an optional TOML configuration file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `PHIMASK_<SECTION>_<KEY>` environment overrides
//! - Default values for every setting
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use phimask::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("phimask.toml")?;
//!
//! println!("Rules: {}", config.rules.path.display());
//! println!("Mapping store: {}", config.mapping.path.display());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level and dry run
//! - [`RulesConfig`] - Masking rule set file
//! - [`MappingConfig`] - Mapping store file and collision policy
//! - [`DocumentConfig`] - Group/field tag names and input extension
//! - [`OutputConfig`] - Output directories
//! - [`BatchConfig`] - Concurrent documents
//! - [`AuditConfig`] - Audit trail
//! - [`LoggingConfig`] - Logging configuration
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [rules]
//! path = "rules/phi_fields_to_mask.json"
//!
//! [mapping]
//! path = "${PHIMASK_STORE_DIR}/phi_deid_reid_mapping.json"
//! collision_policy = "disambiguate"
//!
//! [document]
//! group_tag = "loop"
//! field_tags = ["ele"]
//! id_attribute = "id"
//!
//! [batch]
//! parallel_documents = 4
//! ```

pub mod loader;
pub mod schema;

// Re-export commonly used types
pub use loader::{load_config, load_config_or_default, parse_config};
pub use schema::{
    ApplicationConfig, AuditConfig, BatchConfig, DocumentConfig, LoggingConfig, MappingConfig,
    OutputConfig, PhimaskConfig, RulesConfig,
};
