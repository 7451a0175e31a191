//! De-identification of one document

use super::naming::{output_path, Direction};
use super::{DocumentJob, ProcessedDocument};
use crate::config::PhimaskConfig;
use crate::document::{Document, DocumentSchema};
use crate::domain::{PhimaskError, Result};
use crate::tokenization::{AuditLogger, MappingStore, MaskingEngine, RuleSet};
use std::path::{Path, PathBuf};

/// Masks documents and records their tokens in the mapping store
pub struct Deidentifier {
    engine: MaskingEngine,
    store: MappingStore,
    output_dir: PathBuf,
    folder: Option<String>,
    dry_run: bool,
    audit: AuditLogger,
}

impl Deidentifier {
    pub fn new(engine: MaskingEngine, store: MappingStore, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            engine,
            store,
            output_dir: output_dir.into(),
            folder: None,
            dry_run: false,
            audit: AuditLogger::disabled(),
        }
    }

    /// Build from configuration, loading the rule set
    ///
    /// `folder` is the input directory name when processing a directory.
    pub fn from_config(config: &PhimaskConfig, folder: Option<&str>) -> Result<Self> {
        let rules = RuleSet::from_file(&config.rules.path)?;
        for duplicate in rules.duplicate_labels() {
            tracing::warn!(
                label = %duplicate.label,
                uses = duplicate.locations.len(),
                "Replacement label is shared by several fields"
            );
        }

        let engine = MaskingEngine::new(rules)
            .with_schema(DocumentSchema::from(&config.document))
            .with_policy(config.mapping.collision_policy);
        let audit = AuditLogger::new(
            config.audit.log_path.clone(),
            config.audit.json_format,
            config.audit.enabled,
        )
        .map_err(|e| PhimaskError::Configuration(format!("{e:#}")))?;

        Ok(Self::new(
            engine,
            MappingStore::new(&config.mapping.path),
            &config.output.deidentified_dir,
        )
        .with_folder(folder.map(str::to_string))
        .with_dry_run(config.application.dry_run)
        .with_audit(audit))
    }

    pub fn with_folder(mut self, folder: Option<String>) -> Self {
        self.folder = folder;
        self
    }

    /// Mask in memory only; nothing is written
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_audit(mut self, audit: AuditLogger) -> Self {
        self.audit = audit;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn store(&self) -> &MappingStore {
        &self.store
    }
}

impl DocumentJob for Deidentifier {
    fn name(&self) -> &'static str {
        "deidentify"
    }

    fn process_one_document(&self, input: &Path) -> Result<ProcessedDocument> {
        let mut document = Document::read_from(input)?;
        let output = output_path(
            &self.output_dir,
            input,
            self.folder.as_deref(),
            Direction::Deidentify,
        );

        // Tokens are committed to the store before the document is written
        let outcome = if self.dry_run {
            let reserved = self.store.load_or_empty()?;
            self.engine.mask_against(&mut document, &reserved)?
        } else {
            self.store.update(|reserved| {
                let outcome = self.engine.mask_against(&mut document, reserved)?;
                Ok((outcome.mapping.clone(), outcome))
            })?
        };

        if !self.dry_run {
            document.write_to(&output)?;
        }

        if let Err(e) = self.audit.log_masking(input, &output, &outcome, self.dry_run) {
            tracing::warn!(input = %input.display(), error = %e, "Failed to write audit entry");
        }

        tracing::debug!(
            input = %input.display(),
            output = %output.display(),
            masked = outcome.masked_count(),
            dry_run = self.dry_run,
            "Document de-identified"
        );

        Ok(ProcessedDocument {
            output,
            fields: outcome.masked_count(),
            written: !self.dry_run,
        })
    }
}
