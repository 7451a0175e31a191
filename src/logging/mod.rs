//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Human-readable console output
//! - Configurable log levels
//! - JSON file logging with rotation
//!
//! Original field values never appear in log events; tokens, identifiers
//! and paths do.
//!
//! # Example
//!
//! ```no_run
//! use phimask::logging::init_logging;
//! use phimask::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log a document that was processed successfully
///
/// # Example
///
/// ```no_run
/// use phimask::log_document_processed;
/// use std::path::Path;
///
/// log_document_processed!(Path::new("in/claim.xml"), Path::new("out/claim_deidentified.xml"));
/// ```
#[macro_export]
macro_rules! log_document_processed {
    ($input:expr, $output:expr) => {
        tracing::info!(
            input = %$input.display(),
            output = %$output.display(),
            "Document processed"
        );
    };
}

/// Log a document that failed and was skipped
///
/// # Example
///
/// ```no_run
/// use phimask::log_document_failed;
/// use phimask::domain::PhimaskError;
/// use std::path::Path;
///
/// let error = PhimaskError::Input("not found".to_string());
/// log_document_failed!(Path::new("in/claim.xml"), &error);
/// ```
#[macro_export]
macro_rules! log_document_failed {
    ($input:expr, $error:expr) => {
        tracing::error!(
            input = %$input.display(),
            error = %$error,
            kind = $error.kind(),
            "Document failed, skipping"
        );
    };
}

/// Log batch progress
///
/// # Example
///
/// ```no_run
/// use phimask::log_batch_progress;
///
/// log_batch_progress!(10, 40);
/// ```
#[macro_export]
macro_rules! log_batch_progress {
    ($current:expr, $total:expr) => {
        tracing::debug!(
            current = $current,
            total = $total,
            progress_pct = ($current as f64 / $total as f64 * 100.0),
            "Processing batch"
        );
    };
}
