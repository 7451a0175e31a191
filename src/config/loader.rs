//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::PhimaskConfig;
use crate::domain::errors::PhimaskError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into PhimaskConfig
/// 4. Applies environment variable overrides (PHIMASK_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use phimask::config::loader::load_config;
///
/// let config = load_config("phimask.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<PhimaskConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(PhimaskError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        PhimaskError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let config = parse_config(&contents)?;
    tracing::debug!(path = %path.display(), "Configuration loaded");
    Ok(config)
}

/// Loads configuration, falling back to built-in defaults if the file is absent
///
/// Environment overrides and validation apply in both cases.
pub fn load_config_or_default(path: impl AsRef<Path>) -> Result<PhimaskConfig> {
    let path = path.as_ref();
    if path.exists() {
        return load_config(path);
    }

    tracing::debug!(
        path = %path.display(),
        "Configuration file not found, using built-in defaults"
    );
    let mut config = PhimaskConfig::default();
    apply_env_overrides(&mut config)?;
    validate(&config)?;
    Ok(config)
}

/// Parses configuration from TOML content
///
/// Substitution, overrides and validation are applied as in [`load_config`].
pub fn parse_config(contents: &str) -> Result<PhimaskConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: PhimaskConfig = toml::from_str(&contents)
        .map_err(|e| PhimaskError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;
    validate(&config)?;

    Ok(config)
}

fn validate(config: &PhimaskConfig) -> Result<()> {
    config.validate().map_err(|e| {
        PhimaskError::Configuration(format!("Configuration validation failed: {e}"))
    })
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| PhimaskError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut lines = Vec::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        lines.push(processed_line);
    }

    if !missing_vars.is_empty() {
        return Err(PhimaskError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

/// Parses an override value, naming the variable on failure
fn parse_override<T: std::str::FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e| {
        PhimaskError::Configuration(format!("Invalid value '{value}' for {name}: {e}"))
    })
}

/// Applies environment variable overrides using PHIMASK_* prefix
///
/// Environment variables follow the pattern: PHIMASK_<SECTION>_<KEY>
/// For example: PHIMASK_MAPPING_PATH, PHIMASK_BATCH_PARALLEL_DOCUMENTS
fn apply_env_overrides(config: &mut PhimaskConfig) -> Result<()> {
    let var = |name: &str| std::env::var(name).ok();

    // Application overrides
    if let Some(val) = var("PHIMASK_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Some(val) = var("PHIMASK_APPLICATION_DRY_RUN") {
        config.application.dry_run = parse_override("PHIMASK_APPLICATION_DRY_RUN", &val)?;
    }

    // Rules and mapping overrides
    if let Some(val) = var("PHIMASK_RULES_PATH") {
        config.rules.path = val.into();
    }
    if let Some(val) = var("PHIMASK_MAPPING_PATH") {
        config.mapping.path = val.into();
    }
    if let Some(val) = var("PHIMASK_MAPPING_COLLISION_POLICY") {
        config.mapping.collision_policy =
            parse_override("PHIMASK_MAPPING_COLLISION_POLICY", &val)?;
    }

    // Document overrides
    if let Some(val) = var("PHIMASK_DOCUMENT_GROUP_TAG") {
        config.document.group_tag = val;
    }
    if let Some(val) = var("PHIMASK_DOCUMENT_FIELD_TAGS") {
        config.document.field_tags = val
            .split(',')
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect();
    }
    if let Some(val) = var("PHIMASK_DOCUMENT_ID_ATTRIBUTE") {
        config.document.id_attribute = val;
    }
    if let Some(val) = var("PHIMASK_DOCUMENT_EXTENSION") {
        config.document.extension = val;
    }

    // Output overrides
    if let Some(val) = var("PHIMASK_OUTPUT_DEIDENTIFIED_DIR") {
        config.output.deidentified_dir = val.into();
    }
    if let Some(val) = var("PHIMASK_OUTPUT_REIDENTIFIED_DIR") {
        config.output.reidentified_dir = val.into();
    }

    // Batch overrides
    if let Some(val) = var("PHIMASK_BATCH_PARALLEL_DOCUMENTS") {
        config.batch.parallel_documents =
            parse_override("PHIMASK_BATCH_PARALLEL_DOCUMENTS", &val)?;
    }

    // Audit overrides
    if let Some(val) = var("PHIMASK_AUDIT_ENABLED") {
        config.audit.enabled = parse_override("PHIMASK_AUDIT_ENABLED", &val)?;
    }
    if let Some(val) = var("PHIMASK_AUDIT_LOG_PATH") {
        config.audit.log_path = val.into();
    }
    if let Some(val) = var("PHIMASK_AUDIT_JSON_FORMAT") {
        config.audit.json_format = parse_override("PHIMASK_AUDIT_JSON_FORMAT", &val)?;
    }

    // Logging overrides
    if let Some(val) = var("PHIMASK_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_override("PHIMASK_LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Some(val) = var("PHIMASK_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Some(val) = var("PHIMASK_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}
