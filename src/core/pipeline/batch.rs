//! Batch runner
//!
//! Each document runs as a blocking task on the tokio runtime. At most
//! `parallel` documents are in flight; results come back in input order.

use super::summary::BatchSummary;
use super::DocumentJob;
use crate::domain::PhimaskError;
use crate::{log_batch_progress, log_document_failed, log_document_processed};
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Run `job` over every input, skipping documents that fail
pub async fn run_batch<J>(job: Arc<J>, inputs: Vec<PathBuf>, parallel: usize) -> BatchSummary
where
    J: DocumentJob + 'static,
{
    let started = Instant::now();
    let total = inputs.len();
    let mut summary = BatchSummary::new(job.name());

    tracing::info!(
        job = job.name(),
        documents = total,
        parallel,
        "Starting batch"
    );

    let tasks = inputs.into_iter().map(|input| {
        let job = Arc::clone(&job);
        async move {
            let path = input.clone();
            let result = tokio::task::spawn_blocking(move || job.process_one_document(&path))
                .await
                .unwrap_or_else(|e| {
                    Err(PhimaskError::Other(format!("Document worker failed: {e}")))
                });
            (input, result)
        }
    });

    let mut results = stream::iter(tasks).buffered(parallel.max(1));
    let mut current = 0usize;
    while let Some((input, result)) = results.next().await {
        current += 1;
        log_batch_progress!(current, total);
        match result {
            Ok(processed) => {
                log_document_processed!(input, processed.output);
                summary.add_success(input, processed);
            }
            Err(e) => {
                log_document_failed!(input, e);
                summary.add_failure(input, &e);
            }
        }
    }

    let summary = summary.with_duration(started.elapsed());
    summary.log_summary();
    summary
}
