//! Integration tests for configuration loading and validation
//!
//! Note: Tests that modify environment variables should be run with --test-threads=1
//! to avoid interference between tests.

use phimask::config::{load_config, load_config_or_default, PhimaskConfig};
use phimask::tokenization::CollisionPolicy;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Helper function to clean up environment variables
fn cleanup_env_vars() {
    std::env::remove_var("PHIMASK_APPLICATION_LOG_LEVEL");
    std::env::remove_var("PHIMASK_APPLICATION_DRY_RUN");
    std::env::remove_var("PHIMASK_MAPPING_PATH");
    std::env::remove_var("PHIMASK_MAPPING_COLLISION_POLICY");
    std::env::remove_var("PHIMASK_DOCUMENT_FIELD_TAGS");
    std::env::remove_var("PHIMASK_BATCH_PARALLEL_DOCUMENTS");
    std::env::remove_var("TEST_PHIMASK_DATA_DIR");
}

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(".toml").unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_complete_config() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    let file = write_config(
        r#"
[application]
log_level = "debug"
dry_run = true

[rules]
path = "conf/rules.toml"

[mapping]
path = "conf/mapping.json"
collision_policy = "reject"

[document]
group_tag = "Loop"
field_tags = ["Element", "Composite"]
id_attribute = "code"
extension = "XML"

[output]
deidentified_dir = "out/masked"
reidentified_dir = "out/restored"

[batch]
parallel_documents = 8

[audit]
enabled = true
log_path = "audit/phimask.log"
json_format = false

[logging]
local_enabled = true
local_path = "/var/log/phimask"
local_rotation = "hourly"
"#,
    );

    let config = load_config(file.path()).unwrap();

    assert_eq!(config.application.log_level, "debug");
    assert!(config.application.dry_run);
    assert_eq!(config.rules.path, PathBuf::from("conf/rules.toml"));
    assert_eq!(config.mapping.collision_policy, CollisionPolicy::Reject);
    assert_eq!(config.document.group_tag, "Loop");
    assert_eq!(config.document.field_tags, vec!["Element", "Composite"]);
    assert_eq!(config.document.id_attribute, "code");
    assert_eq!(config.output.reidentified_dir, PathBuf::from("out/restored"));
    assert_eq!(config.batch.parallel_documents, 8);
    assert!(config.audit.enabled);
    assert!(!config.audit.json_format);
    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_minimal_config_uses_defaults() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    let file = write_config("[mapping]\npath = \"store.json\"\n");

    let config = load_config(file.path()).unwrap();
    let defaults = PhimaskConfig::default();

    assert_eq!(config.mapping.path, PathBuf::from("store.json"));
    assert_eq!(config.rules.path, defaults.rules.path);
    assert_eq!(config.mapping.collision_policy, CollisionPolicy::Disambiguate);
    assert_eq!(config.document.group_tag, "loop");
    assert_eq!(config.batch.parallel_documents, 1);
    assert!(!config.logging.local_enabled);
}

#[test]
fn test_env_substitution_in_file() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("TEST_PHIMASK_DATA_DIR", "/srv/phi");
    let file = write_config("[mapping]\npath = \"${TEST_PHIMASK_DATA_DIR}/mapping.json\"\n");

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.mapping.path, PathBuf::from("/srv/phi/mapping.json"));

    cleanup_env_vars();
}

#[test]
fn test_env_overrides_file_values() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("PHIMASK_MAPPING_COLLISION_POLICY", "overwrite");
    std::env::set_var("PHIMASK_BATCH_PARALLEL_DOCUMENTS", "4");
    std::env::set_var("PHIMASK_DOCUMENT_FIELD_TAGS", "ele, comp");
    let file = write_config("[batch]\nparallel_documents = 2\n");

    let config = load_config(file.path()).unwrap();

    assert_eq!(config.mapping.collision_policy, CollisionPolicy::Overwrite);
    assert_eq!(config.batch.parallel_documents, 4);
    assert_eq!(config.document.field_tags, vec!["ele", "comp"]);

    cleanup_env_vars();
}

#[test]
fn test_invalid_env_override_rejected() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("PHIMASK_APPLICATION_DRY_RUN", "maybe");
    let file = write_config("");

    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("PHIMASK_APPLICATION_DRY_RUN"));

    cleanup_env_vars();
}

#[test]
fn test_validation_rejects_out_of_range_parallelism() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    let file = write_config("[batch]\nparallel_documents = 0\n");

    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("parallel_documents"));
}

#[test]
fn test_missing_file_is_an_error_unless_defaulted() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    let missing = std::env::temp_dir().join("phimask-missing-config.toml");

    assert!(load_config(&missing).is_err());

    std::env::set_var("PHIMASK_MAPPING_PATH", "env/mapping.json");
    let config = load_config_or_default(&missing).unwrap();
    assert_eq!(config.mapping.path, PathBuf::from("env/mapping.json"));

    cleanup_env_vars();
}
