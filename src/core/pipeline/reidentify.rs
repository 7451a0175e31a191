//! Re-identification of one document

use super::naming::{output_path, Direction};
use super::{DocumentJob, ProcessedDocument};
use crate::config::PhimaskConfig;
use crate::document::{Document, DocumentSchema};
use crate::domain::Result;
use crate::tokenization::{MappingStore, RestorationEngine};
use std::path::{Path, PathBuf};

/// Restores masked documents from the mapping store
///
/// The store is re-read for every document, so tokens committed by a
/// concurrent de-identification run are picked up.
pub struct Reidentifier {
    store: MappingStore,
    schema: DocumentSchema,
    output_dir: PathBuf,
    folder: Option<String>,
}

impl Reidentifier {
    pub fn new(store: MappingStore, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            schema: DocumentSchema::default(),
            output_dir: output_dir.into(),
            folder: None,
        }
    }

    /// Build from configuration
    pub fn from_config(config: &PhimaskConfig, folder: Option<&str>) -> Self {
        Self::new(
            MappingStore::new(&config.mapping.path),
            &config.output.reidentified_dir,
        )
        .with_schema(DocumentSchema::from(&config.document))
        .with_folder(folder.map(str::to_string))
    }

    pub fn with_schema(mut self, schema: DocumentSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_folder(mut self, folder: Option<String>) -> Self {
        self.folder = folder;
        self
    }

    pub fn store(&self) -> &MappingStore {
        &self.store
    }
}

impl DocumentJob for Reidentifier {
    fn name(&self) -> &'static str {
        "reidentify"
    }

    fn process_one_document(&self, input: &Path) -> Result<ProcessedDocument> {
        let mapping = self.store.load()?;
        let mut document = Document::read_from(input)?;

        let engine = RestorationEngine::new(mapping).with_schema(self.schema.clone());
        let outcome = engine.restore(&mut document);

        let output = output_path(
            &self.output_dir,
            input,
            self.folder.as_deref(),
            Direction::Reidentify,
        );
        document.write_to(&output)?;

        tracing::debug!(
            input = %input.display(),
            output = %output.display(),
            fields_seen = outcome.fields_seen,
            restored = outcome.restored,
            "Document re-identified"
        );

        Ok(ProcessedDocument {
            output,
            fields: outcome.restored,
            written: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PhimaskError;
    use tempfile::tempdir;

    #[test]
    fn test_process_one_document() {
        let dir = tempdir().unwrap();
        let store_path = dir.path().join("mapping.json");
        std::fs::write(&store_path, r#"{"PATIENT_NAME": "Alice"}"#).unwrap();
        let input = dir.path().join("claim_deidentified.xml");
        std::fs::write(
            &input,
            r#"<x12><loop id="N1"><ele id="1035">PATIENT_NAME</ele><ele id="1036">OTHER</ele></loop></x12>"#,
        )
        .unwrap();

        let job = Reidentifier::new(MappingStore::new(&store_path), dir.path().join("out"));
        let processed = job.process_one_document(&input).unwrap();

        assert_eq!(processed.output, dir.path().join("out").join("claim_reidentified.xml"));
        assert_eq!(processed.fields, 1);
        let written = std::fs::read_to_string(&processed.output).unwrap();
        assert!(written.contains(">Alice<"));
        assert!(written.contains(">OTHER<"));
    }

    #[test]
    fn test_missing_store() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("claim.xml");
        std::fs::write(&input, "<x12/>").unwrap();

        let job = Reidentifier::new(MappingStore::new(dir.path().join("none.json")), dir.path());
        let err = job.process_one_document(&input).unwrap_err();
        assert!(matches!(err, PhimaskError::MappingLoad { .. }));
    }
}
