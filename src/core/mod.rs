//! Core business logic for phimask.
//!
//! # Modules
//!
//! - [`pipeline`] - Per-document de- and re-identification, input discovery,
//!   output naming and the batch runner
//!
//! # Workflow
//!
//! 1. **Discover**: a single file, or the matching files of one directory
//! 2. **Process**: each document is parsed, masked or restored, and written
//! 3. **Persist**: new tokens are merged into the mapping store
//! 4. **Report**: a [`BatchSummary`](pipeline::BatchSummary) in input order
//!
//! # Example
//!
//! ```rust,no_run
//! use phimask::config::load_config;
//! use phimask::core::pipeline::{collect_inputs, run_batch, Deidentifier};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("phimask.toml")?;
//! let inputs = collect_inputs("data/xml_files".as_ref(), &config.document.extension)?;
//!
//! let job = Arc::new(Deidentifier::from_config(&config, inputs.folder.as_deref())?);
//! let summary = run_batch(job, inputs.documents, config.batch.parallel_documents).await;
//!
//! println!("Succeeded: {}", summary.succeeded);
//! println!("Failed: {}", summary.failed);
//! # Ok(())
//! # }
//! ```

pub mod pipeline;
