//! Document pipeline
//!
//! A [`DocumentJob`] turns one input file into one output file. The batch
//! runner drives any job over a list of inputs, isolating failures per
//! document.

pub mod batch;
pub mod deidentify;
pub mod inputs;
pub mod naming;
pub mod reidentify;
pub mod summary;

use crate::domain::Result;
use std::path::{Path, PathBuf};

pub use batch::run_batch;
pub use deidentify::Deidentifier;
pub use inputs::{collect_inputs, InputSet};
pub use naming::{deidentified_file_name, output_path, reidentified_file_name, Direction};
pub use reidentify::Reidentifier;
pub use summary::{BatchSummary, DocumentFailure, DocumentOutcome};

/// Result of processing one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedDocument {
    /// Where the output was (or, in a dry run, would have been) written
    pub output: PathBuf,
    /// Fields masked or restored
    pub fields: usize,
    /// False for a dry run
    pub written: bool,
}

/// One direction of processing, applied a document at a time
///
/// Implementations are synchronous and may be called from several worker
/// threads at once. Given identical input and an unchanged mapping store the
/// result is the same on every call.
pub trait DocumentJob: Send + Sync {
    /// Short name for logs and summaries
    fn name(&self) -> &'static str;

    /// Process one input file
    fn process_one_document(&self, input: &Path) -> Result<ProcessedDocument>;
}
