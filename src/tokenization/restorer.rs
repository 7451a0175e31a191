//! Restoration engine

use super::mapping::TokenMapping;
use crate::document::{Document, DocumentSchema};
use std::convert::Infallible;

/// Counts from restoring one document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestorationOutcome {
    /// Field elements visited
    pub fields_seen: usize,
    /// Fields whose token was replaced by its original
    pub restored: usize,
}

/// Replaces tokens with their originals
///
/// Every field is a candidate regardless of its group; only an exact match on
/// a mapping key is replaced. Text that is not a known token passes through,
/// which makes restoring an already restored document a no-op.
#[derive(Debug, Clone)]
pub struct RestorationEngine {
    mapping: TokenMapping,
    schema: DocumentSchema,
}

impl RestorationEngine {
    pub fn new(mapping: TokenMapping) -> Self {
        Self {
            mapping,
            schema: DocumentSchema::default(),
        }
    }

    /// Use a different document schema
    pub fn with_schema(mut self, schema: DocumentSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn mapping(&self) -> &TokenMapping {
        &self.mapping
    }

    /// Restore a document in place
    pub fn restore(&self, document: &mut Document) -> RestorationOutcome {
        let mut outcome = RestorationOutcome::default();

        let visited = document.visit_fields_mut(&self.schema, |slot| {
            outcome.fields_seen += 1;
            let original = slot.text().and_then(|text| self.mapping.get(&text));
            if let Some(original) = original {
                slot.set_text(original.to_string());
                outcome.restored += 1;
            }
            Ok::<(), Infallible>(())
        });
        if let Err(never) = visited {
            match never {}
        }

        tracing::debug!(
            fields_seen = outcome.fields_seen,
            restored = outcome.restored,
            "Document restored"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping() -> TokenMapping {
        [
            ("PATIENT_NAME", "Alice"),
            ("PATIENT_NAME_2", "Bob"),
            ("AMP", "Smith & Co"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn texts(document: &Document) -> Vec<String> {
        document
            .fields(&DocumentSchema::default())
            .into_iter()
            .filter_map(|f| f.text)
            .collect()
    }

    #[test]
    fn test_restores_tokens_in_any_group() {
        let mut document = Document::parse(
            r#"<x12><loop id="N1"><ele id="1035">PATIENT_NAME</ele></loop><loop id="ZZ"><ele id="9">PATIENT_NAME_2</ele></loop><ele id="X">AMP</ele></x12>"#,
        )
        .unwrap();

        let outcome = RestorationEngine::new(mapping()).restore(&mut document);

        assert_eq!(outcome, RestorationOutcome { fields_seen: 3, restored: 3 });
        assert_eq!(texts(&document), vec!["Alice", "Bob", "Smith & Co"]);
        let out = String::from_utf8(document.to_bytes().unwrap()).unwrap();
        assert!(out.contains(">Smith &amp; Co<"));
    }

    #[test]
    fn test_unknown_tokens_pass_through() {
        let mut document = Document::parse(
            r#"<loop id="N1"><ele id="1035">MEMBER_ID</ele><ele id="1036"> PATIENT_NAME</ele><ele id="1037"/></loop>"#,
        )
        .unwrap();

        let outcome = RestorationEngine::new(mapping()).restore(&mut document);

        assert_eq!(outcome.fields_seen, 3);
        assert_eq!(outcome.restored, 0);
        assert_eq!(texts(&document), vec!["MEMBER_ID", " PATIENT_NAME"]);
    }

    #[test]
    fn test_restore_is_idempotent() {
        let mut document =
            Document::parse(r#"<loop id="N1"><ele id="1035">PATIENT_NAME</ele></loop>"#).unwrap();
        let engine = RestorationEngine::new(mapping());

        engine.restore(&mut document);
        let first = document.to_bytes().unwrap();
        let outcome = engine.restore(&mut document);

        assert_eq!(outcome.restored, 0);
        assert_eq!(document.to_bytes().unwrap(), first);
    }
}
