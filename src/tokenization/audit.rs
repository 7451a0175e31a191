//! Audit trail for de-identification runs
//!
//! One entry per masked document. Original values are recorded only as
//! SHA-256 hashes.

use super::masker::MaskingOutcome;
use anyhow::{Context, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

/// Audit log entry
#[derive(Debug, Serialize)]
struct AuditLogEntry {
    timestamp: String,
    run_id: String,
    input: String,
    output: String,
    masked_count: usize,
    dry_run: bool,
    fields: Vec<AuditField>,
}

/// Audit entry for one masked field (with hashed original)
#[derive(Debug, Serialize)]
struct AuditField {
    group_id: String,
    field_id: String,
    token: String,
    /// SHA-256 hash of the original value (never log plaintext PHI)
    value_hash: String,
}

/// Audit logger for masking runs
///
/// Entries from concurrent workers are written one line at a time.
pub struct AuditLogger {
    log_path: PathBuf,
    json_format: bool,
    enabled: bool,
    run_id: Uuid,
    write_lock: Mutex<()>,
}

impl AuditLogger {
    /// Create a new audit logger
    pub fn new(log_path: PathBuf, json_format: bool, enabled: bool) -> Result<Self> {
        if enabled {
            if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create audit log directory: {}", parent.display())
                })?;
            }
        }

        Ok(Self {
            log_path,
            json_format,
            enabled,
            run_id: Uuid::new_v4(),
            write_lock: Mutex::new(()),
        })
    }

    /// A logger that records nothing
    pub fn disabled() -> Self {
        Self {
            log_path: PathBuf::new(),
            json_format: true,
            enabled: false,
            run_id: Uuid::new_v4(),
            write_lock: Mutex::new(()),
        }
    }

    /// Identifier shared by every entry of this run
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Log one masked document
    pub fn log_masking(
        &self,
        input: &Path,
        output: &Path,
        outcome: &MaskingOutcome,
        dry_run: bool,
    ) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let entry = AuditLogEntry {
            timestamp: chrono::Utc::now().to_rfc3339(),
            run_id: self.run_id.to_string(),
            input: input.display().to_string(),
            output: output.display().to_string(),
            masked_count: outcome.masked_count(),
            dry_run,
            fields: outcome
                .masked
                .iter()
                .map(|field| AuditField {
                    group_id: field.group_id.to_string(),
                    field_id: field.field_id.to_string(),
                    token: field.token.clone(),
                    value_hash: field.value_hash.clone(),
                })
                .collect(),
        };

        self.write_entry(&entry)
    }

    /// Write an audit entry to the log file
    fn write_entry(&self, entry: &AuditLogEntry) -> Result<()> {
        let line = if self.json_format {
            serde_json::to_string(entry).context("Failed to serialize audit entry")?
        } else {
            format!(
                "[{}] Run: {} | Input: {} | Output: {} | Masked: {}{}",
                entry.timestamp,
                entry.run_id,
                entry.input,
                entry.output,
                entry.masked_count,
                if entry.dry_run { " | dry run" } else { "" }
            )
        };

        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .with_context(|| format!("Failed to open audit log: {}", self.log_path.display()))?;
        writeln!(file, "{line}").context("Failed to write audit entry")?;

        Ok(())
    }
}

/// Hash a PHI value using SHA-256
pub(crate) fn hash_value(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let result = hasher.finalize();
    format!("{result:x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::tokenization::{CollisionPolicy, MaskingEngine, RuleSet};
    use tempfile::tempdir;

    fn masked_outcome() -> MaskingOutcome {
        let rules = RuleSet::from_json(r#"{"N1": {"1035": "PATIENT_NAME"}}"#).unwrap();
        let mut document =
            Document::parse(r#"<loop id="N1"><ele id="1035">Alice Smith</ele></loop>"#).unwrap();
        MaskingEngine::new(rules).mask(&mut document).unwrap()
    }

    #[test]
    fn test_hash_value() {
        assert_eq!(hash_value("Alice"), hash_value("Alice"));
        assert_ne!(hash_value("Alice"), hash_value("Bob"));
        assert_eq!(hash_value("").len(), 64);
    }

    #[test]
    fn test_log_masking_json() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("audit").join("audit.log");
        let logger = AuditLogger::new(log_path.clone(), true, true).unwrap();

        logger
            .log_masking(
                Path::new("in/claim.xml"),
                Path::new("out/claim_deidentified.xml"),
                &masked_outcome(),
                false,
            )
            .unwrap();

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert!(!content.contains("Alice Smith"));

        let entry: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(entry["run_id"], logger.run_id().to_string());
        assert_eq!(entry["masked_count"], 1);
        assert_eq!(entry["fields"][0]["token"], "PATIENT_NAME");
        assert_eq!(entry["fields"][0]["value_hash"], hash_value("Alice Smith"));
    }

    #[test]
    fn test_overwritten_token_keeps_each_value_hash() {
        let rules = RuleSet::from_json(
            r#"{"2010BA": {"NM103": "LAST_NAME"}, "2010CA": {"NM103": "LAST_NAME"}}"#,
        )
        .unwrap();
        let mut document = Document::parse(
            r#"<x12><loop id="2010BA"><ele id="NM103">DOE</ele></loop><loop id="2010CA"><ele id="NM103">ROE</ele></loop></x12>"#,
        )
        .unwrap();
        let outcome = MaskingEngine::new(rules)
            .with_policy(CollisionPolicy::Overwrite)
            .mask(&mut document)
            .unwrap();

        let dir = tempdir().unwrap();
        let log_path = dir.path().join("audit.log");
        let logger = AuditLogger::new(log_path.clone(), true, true).unwrap();
        logger
            .log_masking(Path::new("a.xml"), Path::new("b.xml"), &outcome, false)
            .unwrap();

        let content = std::fs::read_to_string(&log_path).unwrap();
        let entry: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(entry["fields"][0]["token"], "LAST_NAME");
        assert_eq!(entry["fields"][1]["token"], "LAST_NAME");
        assert_eq!(entry["fields"][0]["value_hash"], hash_value("DOE"));
        assert_eq!(entry["fields"][1]["value_hash"], hash_value("ROE"));
    }

    #[test]
    fn test_log_masking_plain_text() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("audit.log");
        let logger = AuditLogger::new(log_path.clone(), false, true).unwrap();

        logger
            .log_masking(Path::new("a.xml"), Path::new("b.xml"), &masked_outcome(), true)
            .unwrap();

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert!(content.contains("Input: a.xml"));
        assert!(content.contains("Masked: 1 | dry run"));
    }

    #[test]
    fn test_disabled_logger_writes_nothing() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("audit.log");
        let logger = AuditLogger::new(log_path.clone(), true, false).unwrap();

        logger
            .log_masking(Path::new("a.xml"), Path::new("b.xml"), &masked_outcome(), false)
            .unwrap();
        assert!(!log_path.exists());
        assert!(!AuditLogger::disabled().is_enabled());
    }
}
