// phimask - Reversible PHI tokenization for X12 XML documents
// Copyright (c) 2025 phimask Contributors
// Licensed under the MIT License

//! # phimask - Reversible PHI tokenization
//!
//! phimask masks protected health information in X12 EDI documents rendered
//! as XML, replacing selected field values with deterministic tokens and
//! keeping a `token -> original` mapping so the documents can be restored.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Masking** rule-selected fields with `LABEL`, `LABEL_2`, ... tokens
//! - **Restoring** masked documents from the mapping store
//! - **Persisting** mappings atomically in a JSON store shared across runs
//! - **Batch processing** single files or directories of documents
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Per-document pipeline and batch runner
//! - [`tokenization`] - Masking and restoration engines, rule set, mapping store
//! - [`document`] - Lossless XML document model
//! - [`domain`] - Errors and identifier types
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust
//! use phimask::document::Document;
//! use phimask::tokenization::{MaskingEngine, RestorationEngine, RuleSet};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let rules = RuleSet::from_json(r#"{"N1": {"1035": "PATIENT_NAME"}}"#)?;
//! let original = r#"<x12><loop id="N1"><ele id="1035">Alice</ele></loop><loop id="N1"><ele id="1035">Bob</ele></loop></x12>"#;
//!
//! let mut document = Document::parse(original)?;
//! let outcome = MaskingEngine::new(rules).mask(&mut document)?;
//! assert_eq!(outcome.mapping.get("PATIENT_NAME_2"), Some("Bob"));
//!
//! RestorationEngine::new(outcome.mapping).restore(&mut document);
//! assert_eq!(document.to_bytes()?, Document::parse(original)?.to_bytes()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! phimask uses the [`domain::PhimaskError`] type for all library errors.
//! In a batch every per-document error is recorded against that document and
//! the remaining documents are still processed.
//!
//! ## Logging
//!
//! phimask uses structured logging with the `tracing` crate. Original field
//! values are never logged:
//!
//! ```rust,no_run
//! use tracing::info;
//!
//! info!(token = "PATIENT_NAME", group_id = "N1", "Field masked");
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod document;
pub mod domain;
pub mod logging;
pub mod tokenization;
