//! Batch summary and reporting

use super::ProcessedDocument;
use crate::domain::PhimaskError;
use std::path::PathBuf;
use std::time::Duration;

/// Why a document was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFailure {
    /// Stable error category, see [`PhimaskError::kind`]
    pub kind: &'static str,
    /// Error message
    pub message: String,
}

impl From<&PhimaskError> for DocumentFailure {
    fn from(error: &PhimaskError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Result for one input document
#[derive(Debug, Clone)]
pub struct DocumentOutcome {
    pub input: PathBuf,
    pub result: Result<ProcessedDocument, DocumentFailure>,
}

/// Summary of a batch run
#[derive(Debug, Clone)]
pub struct BatchSummary {
    /// Job that produced this summary
    pub job: &'static str,

    /// Number of documents attempted
    pub total_documents: usize,

    /// Documents processed successfully
    pub succeeded: usize,

    /// Documents that failed and were skipped
    pub failed: usize,

    /// Fields masked or restored across all documents
    pub total_fields: usize,

    /// Wall-clock duration of the batch
    pub duration: Duration,

    /// Per-document results in input order
    pub outcomes: Vec<DocumentOutcome>,
}

impl BatchSummary {
    /// Create a new empty summary
    pub fn new(job: &'static str) -> Self {
        Self {
            job,
            total_documents: 0,
            succeeded: 0,
            failed: 0,
            total_fields: 0,
            duration: Duration::from_secs(0),
            outcomes: Vec::new(),
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Record a successful document
    pub fn add_success(&mut self, input: PathBuf, processed: ProcessedDocument) {
        self.total_documents += 1;
        self.succeeded += 1;
        self.total_fields += processed.fields;
        self.outcomes.push(DocumentOutcome {
            input,
            result: Ok(processed),
        });
    }

    /// Record a failed document
    pub fn add_failure(&mut self, input: PathBuf, error: &PhimaskError) {
        self.total_documents += 1;
        self.failed += 1;
        self.outcomes.push(DocumentOutcome {
            input,
            result: Err(DocumentFailure::from(error)),
        });
    }

    /// Check if every document succeeded
    pub fn is_successful(&self) -> bool {
        self.failed == 0
    }

    /// Failed documents in input order
    pub fn failures(&self) -> impl Iterator<Item = (&PathBuf, &DocumentFailure)> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.as_ref().err().map(|f| (&outcome.input, f)))
    }

    /// Get success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_documents == 0 {
            return 100.0;
        }
        (self.succeeded as f64 / self.total_documents as f64) * 100.0
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            job = self.job,
            total_documents = self.total_documents,
            succeeded = self.succeeded,
            failed = self.failed,
            total_fields = self.total_fields,
            duration_ms = self.duration.as_millis() as u64,
            success_rate = format!("{:.2}%", self.success_rate()),
            "Batch completed"
        );

        if !self.is_successful() {
            tracing::warn!(failed = self.failed, "Batch completed with errors");
            for (input, failure) in self.failures() {
                tracing::warn!(
                    input = %input.display(),
                    kind = failure.kind,
                    message = %failure.message,
                    "Document error"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processed(fields: usize) -> ProcessedDocument {
        ProcessedDocument {
            output: PathBuf::from("out.xml"),
            fields,
            written: true,
        }
    }

    #[test]
    fn test_empty_summary() {
        let summary = BatchSummary::new("deidentify");
        assert!(summary.is_successful());
        assert_eq!(summary.success_rate(), 100.0);
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = BatchSummary::new("deidentify");
        summary.add_success(PathBuf::from("a.xml"), processed(3));
        summary.add_failure(
            PathBuf::from("b.xml"),
            &PhimaskError::Input("unreadable".to_string()),
        );
        summary.add_success(PathBuf::from("c.xml"), processed(2));

        assert_eq!(summary.total_documents, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total_fields, 5);
        assert!(!summary.is_successful());

        let failures: Vec<_> = summary.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, &PathBuf::from("b.xml"));
        assert_eq!(failures[0].1.kind, "input");
    }
}
